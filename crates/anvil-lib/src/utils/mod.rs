pub mod hash;
pub mod process;
pub mod properties;
pub mod version;
