//! Config file discovery, loading, and environment variable overlay.

use crate::sections::{DefaultsConfig, TelemetryConfig};
use crate::{ConfigError, NoirConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/noirchord/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("noirchord/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("noirchord.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<NoirConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

fn string_list(value: &toml::Value) -> Option<Vec<String>> {
    match value {
        toml::Value::String(s) => Some(split_list(s)),
        toml::Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse config from TOML string.
fn parse_toml(contents: &str, path: &Path) -> Result<NoirConfig, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut config = NoirConfig::default();

    if let Some(tables) = table.get("tables").and_then(|v| v.as_table()) {
        if let Some(v) = tables.get("corpus").and_then(|v| v.as_str()) {
            config.tables.corpus = Some(expand_path(v));
        }
        if let Some(v) = tables.get("cadence").and_then(|v| v.as_str()) {
            config.tables.cadence = Some(expand_path(v));
        }
    }

    if let Some(defaults) = table.get("defaults").and_then(|v| v.as_table()) {
        if let Some(v) = defaults.get("key").and_then(|v| v.as_str()) {
            config.defaults.key = v.to_string();
        }
        if let Some(v) = defaults.get("section").and_then(|v| v.as_str()) {
            config.defaults.section = v.to_string();
        }
        // `style = "Jazz"` and `styles = ["Jazz", "Lo-fi"]` both work
        if let Some(v) = defaults
            .get("styles")
            .or_else(|| defaults.get("style"))
            .and_then(string_list)
        {
            config.defaults.styles = v;
        }
        if let Some(v) = defaults.get("mood").and_then(|v| v.as_str()) {
            config.defaults.mood = v.to_string();
        }
    }

    if let Some(engine) = table.get("engine").and_then(|v| v.as_table()) {
        if let Some(v) = engine.get("memoize").and_then(|v| v.as_bool()) {
            config.engine.memoize = v;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
    }

    Ok(config)
}

fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Merge two configs, with `overlay` taking precedence where it differs from defaults.
pub fn merge_configs(base: NoirConfig, overlay: NoirConfig) -> NoirConfig {
    let defaults = DefaultsConfig::default();
    let telemetry = TelemetryConfig::default();

    NoirConfig {
        tables: crate::sections::TablesConfig {
            corpus: overlay.tables.corpus.or(base.tables.corpus),
            cadence: overlay.tables.cadence.or(base.tables.cadence),
        },
        defaults: DefaultsConfig {
            key: pick(base.defaults.key, overlay.defaults.key, defaults.key),
            section: pick(base.defaults.section, overlay.defaults.section, defaults.section),
            styles: pick(base.defaults.styles, overlay.defaults.styles, defaults.styles),
            mood: pick(base.defaults.mood, overlay.defaults.mood, defaults.mood),
        },
        engine: crate::sections::EngineConfig {
            memoize: overlay.engine.memoize || base.engine.memoize,
        },
        telemetry: TelemetryConfig {
            log_level: pick(
                base.telemetry.log_level,
                overlay.telemetry.log_level,
                telemetry.log_level,
            ),
        },
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut NoirConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |name| env::var(name).ok());
}

/// Apply overrides from an arbitrary variable lookup.
pub fn apply_overrides_from(
    config: &mut NoirConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let mut take = |name: &str| -> Option<String> {
        let value = lookup(name)?;
        sources.env_overrides.push(name.to_string());
        Some(value)
    };

    if let Some(v) = take("NOIRCHORD_CORPUS") {
        config.tables.corpus = Some(expand_path(&v));
    }
    if let Some(v) = take("NOIRCHORD_CADENCE") {
        config.tables.cadence = Some(expand_path(&v));
    }
    if let Some(v) = take("NOIRCHORD_KEY") {
        config.defaults.key = v;
    }
    if let Some(v) = take("NOIRCHORD_SECTION") {
        config.defaults.section = v;
    }
    if let Some(v) = take("NOIRCHORD_STYLE") {
        config.defaults.styles = split_list(&v);
    }
    if let Some(v) = take("NOIRCHORD_MOOD") {
        config.defaults.mood = v;
    }
    if let Some(v) = take("NOIRCHORD_MEMOIZE") {
        config.engine.memoize = matches!(v.trim(), "1" | "true" | "yes" | "on");
    }
    if let Some(v) = take("NOIRCHORD_LOG_LEVEL") {
        config.telemetry.log_level = v;
    }
    // Also support RUST_LOG
    if let Some(v) = take("RUST_LOG") {
        config.telemetry.log_level = v;
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        let (var_name, rest) = match stripped.split_once('/') {
            Some((var_name, rest)) => (var_name, Some(rest)),
            None => (stripped, None),
        };
        match (env::var(var_name), rest) {
            (Ok(value), Some(rest)) => PathBuf::from(value).join(rest),
            (Ok(value), None) => PathBuf::from(value),
            (Err(_), _) => PathBuf::from(path),
        }
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/tables/corpus.json");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("tables/corpus.json"));
    }

    #[test]
    fn test_expand_path_absolute() {
        assert_eq!(expand_path("/srv/corpus.json"), PathBuf::from("/srv/corpus.json"));
    }

    #[test]
    fn test_expand_path_unknown_var_is_literal() {
        let raw = "$NOIRCHORD_SURELY_UNSET_VAR/corpus.json";
        assert_eq!(expand_path(raw), PathBuf::from(raw));
    }

    #[test]
    fn test_discover_config_files() {
        // Just verify it doesn't panic
        let _files = discover_config_files();
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
[defaults]
key = "F#"
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.defaults.key, "F#");
        assert_eq!(config.defaults.section, "Verse");
        assert_eq!(config.tables.corpus, None);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
[tables]
corpus = "/data/corpus.json"
cadence = "/data/cadence.json"

[defaults]
key = "Eb"
section = "Cho"
styles = ["Jazz", "Lo-fi"]
mood = "Stylish"

[engine]
memoize = true

[telemetry]
log_level = "debug"
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();

        assert_eq!(config.tables.corpus, Some(PathBuf::from("/data/corpus.json")));
        assert_eq!(config.tables.cadence, Some(PathBuf::from("/data/cadence.json")));
        assert_eq!(config.defaults.key, "Eb");
        assert_eq!(config.defaults.section, "Cho");
        assert_eq!(config.defaults.styles, vec!["Jazz", "Lo-fi"]);
        assert_eq!(config.defaults.mood, "Stylish");
        assert!(config.engine.memoize);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_single_style_string() {
        let toml = "[defaults]\nstyle = \"Rock, EDM\"\n";
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.defaults.styles, vec!["Rock", "EDM"]);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = parse_toml("[defaults\nkey = ", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_merge_keeps_base_where_overlay_is_default() {
        let base = parse_toml(
            "[defaults]\nkey = \"D\"\nmood = \"Fun\"\n[tables]\ncorpus = \"/a.json\"\n",
            Path::new("base.toml"),
        )
        .unwrap();
        let overlay = parse_toml("[defaults]\nkey = \"A\"\n", Path::new("overlay.toml")).unwrap();

        let merged = merge_configs(base, overlay);
        assert_eq!(merged.defaults.key, "A");
        assert_eq!(merged.defaults.mood, "Fun");
        assert_eq!(merged.tables.corpus, Some(PathBuf::from("/a.json")));
    }

    #[test]
    fn test_env_overrides_are_recorded() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("NOIRCHORD_STYLE", "City Pop,Jazz"),
            ("NOIRCHORD_MEMOIZE", "true"),
            ("RUST_LOG", "progression=debug"),
        ]);
        let mut config = NoirConfig::default();
        let mut sources = ConfigSources::default();

        apply_overrides_from(&mut config, &mut sources, |name| {
            vars.get(name).map(|v| v.to_string())
        });

        assert_eq!(config.defaults.styles, vec!["City Pop", "Jazz"]);
        assert!(config.engine.memoize);
        assert_eq!(config.telemetry.log_level, "progression=debug");
        assert_eq!(
            sources.env_overrides,
            vec!["NOIRCHORD_STYLE", "NOIRCHORD_MEMOIZE", "RUST_LOG"]
        );
    }
}
