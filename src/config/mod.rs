//! Configuration module for pumptech.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Collection loop (enable flag, interval)
//! - Hardware source (mode, polling intervals, simulation knobs)
//! - Sink (backend, InfluxDB connection, retry budget)
//! - Status server and logging

mod app;
mod validation;

pub use app::{
    AppConfig, CollectionConfig, HardwareConfig, HardwareMode, LogFormat, LoggingConfig,
    PollingConfig, ServerConfig, SinkConfig, SinkKind,
};
pub use validation::{ConfigError, expand_env_vars, parse_duration};

// Re-export constants
pub use app::{DEFAULT_LOG_LEVEL, DEFAULT_SINK_TIMEOUT, DEFAULT_SINK_URL};
