pub mod catalog;
pub mod types;

pub use catalog::VersionCatalog;
pub use types::LoaderId;
