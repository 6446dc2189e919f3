//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use reseq_core::{JsonTimestamp, ResequencerConfig, TimestampUnit};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine settings: mode, tolerance and tie/tail policies.
    pub resequencer: ResequencerConfig,

    /// Where event timestamps live and how to read them.
    pub timestamp: TimestampConfig,
}

/// Location and format of the timestamp inside each JSON event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampConfig {
    /// Field name, dotted path, or JSON pointer.
    pub field: String,

    /// How the field value is interpreted.
    pub unit: TimestampUnit,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            field: "timestamp".to_string(),
            unit: TimestampUnit::Auto,
        }
    }
}

impl TimestampConfig {
    /// Builds the extractor described by this configuration.
    pub fn extractor(&self) -> JsonTimestamp {
        JsonTimestamp::new(self.field.clone(), self.unit)
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Environment overrides, e.g. RESEQ_RESEQUENCER__TOLERANCE_MS=250
        figment = figment.merge(Env::prefixed("RESEQ_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for reseq.
///
/// On Linux: `~/.config/reseq`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("reseq"))
}
