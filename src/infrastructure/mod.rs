//! Infrastructure layer
//!
//! Configuration loading and logging setup.

mod config;
mod logging;

pub use config::{CONFIG_FILE_NAME, CallSite, Config, ConfigError, FailurePolicies, ToolsConfig};
pub use logging::init_logging;
