//! Email configuration.
//!
//! Provides the configuration record, its sources, and the validated
//! snapshot the service runs on.

mod model;
mod provider;

pub use model::{EmailConfig, MAX_DIAL_TIMEOUT, MIN_DIAL_TIMEOUT, RetryPolicy, Settings};
pub use provider::{ConfigError, ConfigProvider, JsonFileConfig, StaticConfig};
