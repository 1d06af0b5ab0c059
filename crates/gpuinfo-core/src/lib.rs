pub mod config;
pub mod types;

pub use config::GpuInfoConfig;
pub use types::*;
