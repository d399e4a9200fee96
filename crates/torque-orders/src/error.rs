//! # Configuration Error Types
//!
//! Wizard and checkout operations fail with
//! [`CoreError`](torque_core::CoreError); this module only covers loading
//! and saving `torque.toml`.

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is present but unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or write the config file.
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`OrdersConfig`](crate::config::OrdersConfig).
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No platform config directory and no explicit path.
    #[error("No config path available")]
    NoConfigPath,
}
