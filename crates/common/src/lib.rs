pub mod config;
pub mod infrastructure;
pub mod logging;

pub use config::SpillConfig;
