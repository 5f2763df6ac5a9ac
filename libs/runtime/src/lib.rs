//! Process-level plumbing shared by Songdap binaries: layered configuration,
//! logging initialisation and home directory resolution.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, ApiConfig, AppConfig, AuthConfig, CliArgs, LoggingConfig, Section,
};
