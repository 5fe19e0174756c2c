pub mod fabric;
pub mod forge;
pub mod neoforge;
pub mod paper;
pub mod purpur;

pub use fabric::MetaLoaderProvider;
pub use forge::ForgeProvider;
pub use neoforge::NeoForgeProvider;
pub use paper::PaperFamilyProvider;
pub use purpur::PurpurProvider;
