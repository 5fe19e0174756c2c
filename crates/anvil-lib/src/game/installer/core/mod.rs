pub mod runner;
pub mod traits;
