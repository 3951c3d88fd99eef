//! Configuration loading for the noirchord tools.
//!
//! Kept free of any engine dependency: values are plain strings and paths,
//! parsed into engine types by the binary.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/noirchord/config.toml` (system)
//! 2. `~/.config/noirchord/config.toml` (user)
//! 3. `./noirchord.toml` (local override, or `--config <path>`)
//! 4. Environment variables (`NOIRCHORD_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [tables]
//! corpus = "~/noirchord/corpus.json"
//! cadence = "~/noirchord/cadence.json"
//!
//! [defaults]
//! key = "A"
//! section = "Cho"
//! styles = ["Anison(cool)", "Rock"]
//! mood = "Emotional"
//!
//! [engine]
//! memoize = true
//!
//! [telemetry]
//! log_level = "progression=debug"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{DefaultsConfig, EngineConfig, TablesConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete noirchord configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoirConfig {
    #[serde(default)]
    pub tables: TablesConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl NoirConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/noirchord/config.toml`
    /// 3. `~/.config/noirchord/config.toml`
    /// 4. `./noirchord.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` replacing the local override.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and return information about sources.
    pub fn load_with_sources() -> Result<(Self, ConfigSources), ConfigError> {
        Self::load_with_sources_from(None)
    }

    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = NoirConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand so unset table paths become comments
        let mut output = String::new();

        output.push_str("# noirchord configuration\n\n");

        output.push_str("[tables]\n");
        match &self.tables.corpus {
            Some(path) => output.push_str(&format!("corpus = {:?}\n", path.display().to_string())),
            None => output.push_str("# corpus = \"...\"  (bundled)\n"),
        }
        match &self.tables.cadence {
            Some(path) => output.push_str(&format!("cadence = {:?}\n", path.display().to_string())),
            None => output.push_str("# cadence = \"...\"  (bundled)\n"),
        }

        output.push_str("\n[defaults]\n");
        output.push_str(&format!("key = {:?}\n", self.defaults.key));
        output.push_str(&format!("section = {:?}\n", self.defaults.section));
        output.push_str(&format!("styles = {:?}\n", self.defaults.styles));
        output.push_str(&format!("mood = {:?}\n", self.defaults.mood));

        output.push_str("\n[engine]\n");
        output.push_str(&format!("memoize = {}\n", self.engine.memoize));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = {:?}\n", self.telemetry.log_level));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = NoirConfig::default();
        assert_eq!(config.defaults.key, "C");
        assert_eq!(config.defaults.mood, "-");
        assert!(config.defaults.styles.is_empty());
        assert!(!config.engine.memoize);
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = NoirConfig::default();
        config.tables.corpus = Some(PathBuf::from("/srv/corpus.json"));
        config.defaults.styles = vec!["City Pop".into(), "Jazz".into()];
        config.engine.memoize = true;

        let rendered = config.to_toml();
        assert!(rendered.contains("[tables]"));
        assert!(rendered.contains("# cadence"));

        let reparsed: NoirConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noirchord.toml");
        fs::write(&path, "[defaults]\nsection = \"D\"\nmood = \"Eerie\"\n").unwrap();

        let (config, sources) = NoirConfig::load_with_sources_from(Some(&path)).unwrap();
        assert_eq!(config.defaults.section, "D");
        assert_eq!(sources.files.last(), Some(&path));
    }

    #[test]
    fn test_broken_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[engine\nmemoize = ").unwrap();

        let err = NoirConfig::load_from(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
