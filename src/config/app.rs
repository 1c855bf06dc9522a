//! Application configuration structures.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::validation::{ConfigError, expand_env_vars, validate_http_url, validate_non_zero};
use crate::engine::{DEFAULT_CONNECT_RETRIES, DEFAULT_HOST, DEFAULT_RETRY_INTERVAL, EngineSettings};
use crate::hardware::SimulationConfig;
use crate::sink::InfluxConfig;

// =============================================================================
// Constants
// =============================================================================

/// Default InfluxDB URL.
pub const DEFAULT_SINK_URL: &str = "http://localhost:8087";

/// Default sink request timeout (10 seconds).
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info,pumptech=debug";

fn default_true() -> bool {
    true
}

fn default_temperature_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_pressure_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_flow_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_alarm_probability() -> f64 {
    0.01
}

fn default_sink_url() -> String {
    DEFAULT_SINK_URL.to_string()
}

fn default_org() -> String {
    "myorg".to_string()
}

fn default_bucket() -> String {
    "mybucket".to_string()
}

fn default_sink_timeout() -> Duration {
    DEFAULT_SINK_TIMEOUT
}

fn default_connect_retries() -> u32 {
    DEFAULT_CONNECT_RETRIES
}

fn default_retry_interval() -> Duration {
    DEFAULT_RETRY_INTERVAL
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

// =============================================================================
// Collection
// =============================================================================

/// Collection loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// When false the binary exits without collecting.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cycle interval. Defaults to the fastest hardware polling interval.
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: None,
        }
    }
}

// =============================================================================
// Hardware
// =============================================================================

/// Hardware source selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HardwareMode {
    #[default]
    Simulated,
    Real,
}

/// Per-sensor-type polling intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_temperature_interval", with = "humantime_serde")]
    pub temperature: Duration,

    #[serde(default = "default_pressure_interval", with = "humantime_serde")]
    pub pressure: Duration,

    #[serde(default = "default_flow_interval", with = "humantime_serde")]
    pub flow: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature_interval(),
            pressure: default_pressure_interval(),
            flow: default_flow_interval(),
        }
    }
}

impl PollingConfig {
    /// The fastest of the configured intervals.
    pub fn fastest(&self) -> Duration {
        self.temperature.min(self.pressure).min(self.flow)
    }
}

/// Hardware source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareConfig {
    #[serde(default)]
    pub mode: HardwareMode,

    #[serde(default)]
    pub polling: PollingConfig,

    /// Pumps to poll. Omit to poll every pump the source reports.
    #[serde(default)]
    pub pump_ids: Option<Vec<String>>,

    /// Simulation RNG seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Start every simulated pump at this speed percent.
    #[serde(default)]
    pub pump_autostart_speed: Option<f64>,

    /// Chance of a random simulated alarm per poll (default: 0.01).
    #[serde(default = "default_alarm_probability")]
    pub alarm_probability: f64,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            mode: HardwareMode::Simulated,
            polling: PollingConfig::default(),
            pump_ids: None,
            seed: None,
            pump_autostart_speed: None,
            alarm_probability: default_alarm_probability(),
        }
    }
}

impl HardwareConfig {
    pub fn simulation(&self) -> SimulationConfig {
        let mut sim = SimulationConfig::default().with_alarm_probability(self.alarm_probability);
        if let Some(seed) = self.seed {
            sim = sim.with_seed(seed);
        }
        if let Some(speed) = self.pump_autostart_speed {
            sim = sim.with_pump_autostart(speed);
        }
        sim
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == HardwareMode::Real {
            return Err(ConfigError::invalid(
                "hardware mode 'real' is not supported: no real hardware adapter is available",
            ));
        }

        validate_non_zero("hardware.polling.temperature", self.polling.temperature)?;
        validate_non_zero("hardware.polling.pressure", self.polling.pressure)?;
        validate_non_zero("hardware.polling.flow", self.polling.flow)?;

        if let Some(ids) = &self.pump_ids
            && ids.iter().any(|id| id.trim().is_empty())
        {
            return Err(ConfigError::invalid("hardware.pump_ids must not contain empty ids"));
        }

        if let Some(speed) = self.pump_autostart_speed
            && !(0.0..=100.0).contains(&speed)
        {
            return Err(ConfigError::invalid(format!(
                "hardware.pump_autostart_speed must be between 0 and 100, got {speed}"
            )));
        }

        if !(0.0..=1.0).contains(&self.alarm_probability) {
            return Err(ConfigError::invalid(format!(
                "hardware.alarm_probability must be between 0 and 1, got {}",
                self.alarm_probability
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Sink
// =============================================================================

/// Sink backend selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SinkKind {
    #[default]
    Influx,
    Stdout,
}

/// Time-series sink configuration.
///
/// `url`, `token`, `org` and `bucket` support `${VAR}` / `${VAR:-default}`.
#[derive(Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default)]
    pub kind: SinkKind,

    #[serde(default = "default_sink_url")]
    pub url: String,

    #[serde(default)]
    pub token: String,

    #[serde(default = "default_org")]
    pub org: String,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Per-request timeout (default: 10s).
    #[serde(default = "default_sink_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Connection attempts on start (default: 30).
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    /// Pause between connection attempts (default: 2s).
    #[serde(default = "default_retry_interval", with = "humantime_serde")]
    pub retry_interval: Duration,

    /// `host` tag on system metrics.
    #[serde(default = "default_host")]
    pub host: String,
}

impl std::fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkConfig")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("timeout", &self.timeout)
            .field("connect_retries", &self.connect_retries)
            .field("retry_interval", &self.retry_interval)
            .field("host", &self.host)
            .finish()
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Influx,
            url: default_sink_url(),
            token: String::new(),
            org: default_org(),
            bucket: default_bucket(),
            timeout: DEFAULT_SINK_TIMEOUT,
            connect_retries: DEFAULT_CONNECT_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            host: default_host(),
        }
    }
}

impl SinkConfig {
    pub fn influx(&self) -> InfluxConfig {
        InfluxConfig::new(&self.url, &self.token, &self.org, &self.bucket)
            .with_timeout(self.timeout)
    }

    fn expand_env(&mut self) {
        for value in [&mut self.url, &mut self.token, &mut self.org, &mut self.bucket] {
            let expanded = expand_env_vars(value);
            *value = expanded;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_retries == 0 {
            return Err(ConfigError::invalid("sink.connect_retries must be positive"));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid("sink.host must not be empty"));
        }

        if self.kind == SinkKind::Influx {
            validate_http_url("sink.url", &self.url)?;
            validate_non_zero("sink.timeout", self.timeout)?;
            if self.org.trim().is_empty() {
                return Err(ConfigError::invalid("sink.org must not be empty"));
            }
            if self.bucket.trim().is_empty() {
                return Err(ConfigError::invalid("sink.bucket must not be empty"));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Server & Logging
// =============================================================================

/// Status server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Serve `/healthz`, `/readyz` and `/status` (default: false).
    pub enabled: bool,

    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 8080).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Log output format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives (default: "info,pumptech=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub hardware: HardwareConfig,

    #[serde(default)]
    pub sink: SinkConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse, expand environment references and validate.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.sink.expand_env();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::invalid(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server port must be non-zero"));
        }

        if let Some(interval) = self.collection.interval {
            validate_non_zero("collection.interval", interval)?;
        }

        self.hardware.validate()?;
        self.sink.validate()?;

        Ok(())
    }

    /// Effective cycle interval: the explicit one, else the fastest polling
    /// interval.
    pub fn collection_interval(&self) -> Duration {
        self.collection
            .interval
            .unwrap_or_else(|| self.hardware.polling.fastest())
    }

    /// Engine parameters derived from the hardware and sink sections.
    pub fn engine_settings(&self) -> EngineSettings {
        let settings = EngineSettings::default()
            .with_host(&self.sink.host)
            .with_connect_retry(self.sink.connect_retries, self.sink.retry_interval);
        match &self.hardware.pump_ids {
            Some(ids) => settings.with_pump_ids(ids.clone()),
            None => settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert!(config.collection.enabled);
        assert_eq!(config.hardware.mode, HardwareMode::Simulated);
        assert_eq!(config.sink.kind, SinkKind::Influx);
        assert_eq!(config.sink.url, DEFAULT_SINK_URL);
        assert_eq!(config.sink.connect_retries, 30);
        assert_eq!(config.sink.retry_interval, Duration::from_secs(2));
        assert_eq!(config.sink.host, "pumptech_system");
        assert!(!config.server.enabled);
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_interval_defaults_to_fastest_polling() {
        let config = AppConfig::default();
        assert_eq!(config.collection_interval(), Duration::from_millis(500));

        let config = AppConfig::from_yaml(
            "hardware:\n  polling:\n    temperature: 250ms\n    flow: 2s\n",
        )
        .unwrap();
        assert_eq!(config.collection_interval(), Duration::from_millis(250));

        let config = AppConfig::from_yaml("collection:\n  interval: 5s\n").unwrap();
        assert_eq!(config.collection_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
collection:
  enabled: true
  interval: 2s
hardware:
  mode: simulated
  pump_ids: [pump_001]
  seed: 42
  pump_autostart_speed: 60
sink:
  kind: stdout
  host: station_a
server:
  enabled: true
  bind: 127.0.0.1
  port: 9100
logging:
  level: debug
  format: json
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.sink.kind, SinkKind::Stdout);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.port, 9100);

        let settings = config.engine_settings();
        assert_eq!(settings.host, "station_a");
        assert_eq!(settings.pump_ids, Some(vec!["pump_001".to_string()]));

        let sim = config.hardware.simulation();
        assert_eq!(sim.seed, Some(42));
        assert_eq!(sim.pump_autostart_speed, Some(60.0));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load("/nonexistent/pumptech.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_sink_fields_expand_env() {
        let config = AppConfig::from_yaml(
            "sink:\n  url: ${PUMPTECH_TEST_UNSET_URL:-http://influx:8086}\n  token: ${PUMPTECH_TEST_UNSET_TOKEN:-dev-token}\n",
        )
        .unwrap();
        assert_eq!(config.sink.url, "http://influx:8086");
        assert_eq!(config.sink.token, "dev-token");

        let influx = config.sink.influx();
        assert_eq!(influx.url, "http://influx:8086");
        assert_eq!(influx.timeout, DEFAULT_SINK_TIMEOUT);
    }

    #[test]
    fn test_real_hardware_is_rejected() {
        let err = AppConfig::from_yaml("hardware:\n  mode: real\n").unwrap_err();
        assert!(err.to_string().contains("real"));
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            "server:\n  bind: not-an-ip\n",
            "server:\n  port: 0\n",
            "collection:\n  interval: 0s\n",
            "hardware:\n  polling:\n    flow: 0s\n",
            "hardware:\n  pump_autostart_speed: 120\n",
            "hardware:\n  alarm_probability: 1.5\n",
            "hardware:\n  pump_ids: [pump_001, '']\n",
            "sink:\n  url: localhost:8087\n",
            "sink:\n  connect_retries: 0\n",
            "sink:\n  bucket: ''\n",
        ];
        for yaml in cases {
            let err = AppConfig::from_yaml(yaml).unwrap_err();
            assert!(
                matches!(err, ConfigError::ValidationError(_)),
                "expected validation error for {yaml:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_stdout_sink_skips_influx_checks() {
        let config = AppConfig::from_yaml("sink:\n  kind: stdout\n  url: ''\n").unwrap();
        assert_eq!(config.sink.kind, SinkKind::Stdout);
    }

    #[test]
    fn test_unknown_mode_is_parse_error() {
        let err = AppConfig::from_yaml("hardware:\n  mode: quantum\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let sink = SinkConfig {
            token: "super-secret".to_string(),
            ..Default::default()
        };
        let debug = format!("{sink:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
