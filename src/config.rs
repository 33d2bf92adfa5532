//! Configuration for the sampler and viewer processes.
//!
//! Both processes are configured entirely from the command line (with
//! environment fallbacks); these are the validated structs the CLI
//! layer produces.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default probe target (Google public DNS).
pub const DEFAULT_TARGET: &str = "8.8.8.8";

/// Default number of probes per session document (one hour at 1s cadence).
pub const DEFAULT_PINGS_PER_FILE: usize = 3600;

/// Default cadence between probe starts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default per-probe timeout. Kept at the cadence interval so a lost
/// probe cannot stall the scheduler past the next deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default data directory for the implicit single source.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default source name when no mapping is configured.
pub const DEFAULT_SOURCE: &str = "starlink";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to establish a configured directory.
    #[error("failed to set up directory: {0}")]
    Io(#[from] std::io::Error),

    /// A `name:path` source mapping could not be parsed.
    #[error("invalid source mapping '{0}': expected name:path")]
    InvalidMapping(String),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Sampler process configuration.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Probe target (IP address or hostname).
    pub target: String,
    /// Egress interface for probes (`ping -I`), if pinned.
    pub interface: Option<String>,
    /// Probes per session document.
    pub pings_per_file: usize,
    /// Target interval between probe starts.
    pub interval: Duration,
    /// Per-probe timeout.
    pub timeout: Duration,
    /// Directory session documents are published to.
    pub data_dir: PathBuf,
    /// Probe executable (overridable for tests).
    pub ping_program: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            interface: None,
            pings_per_file: DEFAULT_PINGS_PER_FILE,
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            ping_program: "ping".to_string(),
        }
    }
}

impl SamplerConfig {
    /// Create a configuration for the given target with defaults.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.is_empty() {
            return Err(ConfigError::Validation(
                "probe target must not be empty".to_string(),
            ));
        }

        if self.pings_per_file == 0 {
            return Err(ConfigError::Validation(
                "pings_per_file must be positive".to_string(),
            ));
        }

        // A timeout past the cadence interval would let one lost probe
        // push the next probe past its deadline. Interval 0 disables
        // pacing entirely, so any timeout is fine there.
        if !self.interval.is_zero() && self.timeout > self.interval {
            return Err(ConfigError::Validation(format!(
                "probe timeout ({:?}) must not exceed the cadence interval ({:?})",
                self.timeout, self.interval
            )));
        }

        Ok(())
    }

    /// Set the egress interface.
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Set the number of probes per session.
    pub fn with_pings_per_file(mut self, n: usize) -> Self {
        self.pings_per_file = n;
        self
    }

    /// Set the cadence interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the output directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Override the probe executable.
    pub fn with_ping_program(mut self, program: impl Into<String>) -> Self {
        self.ping_program = program.into();
        self
    }
}

/// Viewer process configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,
    /// Server port (default: 8000).
    pub port: u16,
    /// Document root for static assets.
    pub static_root: PathBuf,
    /// Device-management endpoint for the live-status proxy.
    pub device_endpoint: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
            static_root: PathBuf::from("static"),
            device_endpoint: "192.168.100.1:9200".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::Validation(format!("invalid server bind address: '{}'", self.bind))
        })?;

        if self.port == 0 {
            return Err(ConfigError::Validation(
                "server port must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a `name:path` source mapping pair.
///
/// # Errors
/// Returns `ConfigError::InvalidMapping` if the pair has no `:` or an
/// empty name or path.
pub fn parse_mapping(pair: &str) -> Result<(String, PathBuf), ConfigError> {
    let (name, path) = pair
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidMapping(pair.to_string()))?;
    if name.is_empty() || path.is_empty() {
        return Err(ConfigError::InvalidMapping(pair.to_string()));
    }
    Ok((name.to_string(), PathBuf::from(path)))
}

/// Parse a duration string using humantime.
///
/// Supports formats like `1s`, `500ms`, `2m30s`. The bare string `0`
/// is accepted as a zero duration for test-mode invocations.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration string is empty".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}
