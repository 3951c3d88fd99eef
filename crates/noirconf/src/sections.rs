//! Config sections. Values stay as plain strings here; the binary parses
//! them into engine types so this crate does not depend on the engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the n-gram and cadence tables come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablesConfig {
    /// Corpus JSON file. `None` uses the tables compiled into the engine.
    #[serde(default)]
    pub corpus: Option<PathBuf>,

    /// Cadence weight JSON file. `None` uses the compiled-in table.
    #[serde(default)]
    pub cadence: Option<PathBuf>,
}

/// Prediction context used when the command line leaves it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Tonic note name.
    /// Default: C
    #[serde(default = "DefaultsConfig::default_key")]
    pub key: String,

    /// Section tag (Verse, Pre, Cho, D).
    /// Default: Verse
    #[serde(default = "DefaultsConfig::default_section")]
    pub section: String,

    /// Style names. Empty means the engine's default style.
    #[serde(default)]
    pub styles: Vec<String>,

    /// Mood name, `-` for none.
    #[serde(default = "DefaultsConfig::default_mood")]
    pub mood: String,
}

impl DefaultsConfig {
    fn default_key() -> String {
        "C".to_string()
    }

    fn default_section() -> String {
        "Verse".to_string()
    }

    fn default_mood() -> String {
        "-".to_string()
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            key: Self::default_key(),
            section: Self::default_section(),
            styles: Vec::new(),
            mood: Self::default_mood(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Memoize predictions by full input.
    #[serde(default)]
    pub memoize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// tracing filter directive.
    /// Default: warn
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "warn".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
