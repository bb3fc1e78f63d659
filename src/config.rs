//! Configuration for the streaming runner.
//!
//! Supports YAML configuration with precedence: CLI > file > defaults.
//! Defaults reproduce the reference stream: amplitude 10, frequency 0.1 Hz,
//! seasonality 24 s, noise 2, one sample per second, window 100,
//! threshold 2.5, drift sensitivity 0.01, 100 displayed points.

use crate::detector::DetectorConfig;
use crate::error::{Error, Result};
use crate::sink::DisplayConfig;
use crate::source::SignalParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Signal generator settings.
    #[serde(default)]
    pub signal: SignalParams,

    /// Detector settings.
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Display settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            signal: SignalParams::default(),
            detector: DetectorConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| Error::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error with line number if parsing fails.
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map(|l| l.line()).unwrap_or(0);
            Error::ConfigParse { line, message: e.to_string() }
        })
    }

    /// Serialises the configuration back to YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self)
            .map_err(|e| Error::ConfigParse { line: 0, message: e.to_string() })
    }

    /// Loads configuration with fallback to defaults.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Default configuration file location
    /// (`<config dir>/trueno-anomaly/config.yaml`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("trueno-anomaly").join("config.yaml"))
    }

    /// Checks every section without building anything.
    ///
    /// # Errors
    ///
    /// Returns the first signal or detector parameter error.
    pub fn validate(&self) -> Result<()> {
        self.signal.validate()?;
        self.detector.build().map(|_| ())
    }
}
