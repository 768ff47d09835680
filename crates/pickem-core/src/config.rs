// Configuration loading and parsing (config/pickem.toml).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

/// File name of the configuration inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "pickem.toml";

const DEFAULT_DB_FILE: &str = "pickem.db";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// pickem.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file. When omitted, the platform data directory
    /// is used.
    pub path: Option<String>,
}

impl DatabaseConfig {
    /// Resolve the database location. Relative paths are relative to
    /// `base_dir`; `":memory:"` is passed through untouched.
    pub fn resolve_path(&self, base_dir: &Path) -> PathBuf {
        match self.path.as_deref() {
            Some(":memory:") => PathBuf::from(":memory:"),
            Some(p) if Path::new(p).is_absolute() => PathBuf::from(p),
            Some(p) => base_dir.join(p),
            None => ProjectDirs::from("", "", "pickem")
                .map(|dirs| dirs.data_dir().join(DEFAULT_DB_FILE))
                .unwrap_or_else(|| base_dir.join(DEFAULT_DB_FILE)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum participated weeks for a player to get a trend record; also
    /// the size of the early/recent averaging windows.
    #[serde(default = "default_min_weeks")]
    pub min_weeks: usize,
    /// Trailing window for rolling averages.
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,
    /// Season used when a command does not name one.
    #[serde(default)]
    pub default_season: Option<i32>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_weeks: default_min_weeks(),
            rolling_window: default_rolling_window(),
            default_season: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Directory for the log file; relative paths are resolved like the
    /// database path.
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

impl LoggingConfig {
    /// Resolve the log directory against `base_dir` unless it is absolute.
    pub fn resolve_dir(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.dir)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            dir: default_log_dir(),
        }
    }
}

fn default_min_weeks() -> usize {
    3
}

fn default_rolling_window() -> usize {
    3
}

fn default_log_filter() -> String {
    "pickem=info,warn".into()
}

fn default_log_dir() -> String {
    "logs".into()
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/pickem.toml` relative to `base_dir`.
///
/// This does not copy defaults; prefer [`load_config`] for the binary.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config = parse_config(&text, &path)?;
    validate(&config)?;
    Ok(config)
}

/// Parse configuration text. `path` is only used for error messages.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

/// Copy `defaults/pickem.toml` into `config/` unless a config is already
/// there. Returns the path written, if any.
pub fn ensure_config_files(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    let target = config_dir.join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        if config_dir.exists() {
            // Let loading report the missing file.
            return Ok(None);
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither defaults/{CONFIG_FILE} nor config/ found in {}; \
                 run from the project root or pass --config-dir",
                base_dir.display()
            ),
        });
    }

    let copy = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    };
    std::fs::create_dir_all(&config_dir).map_err(copy)?;
    std::fs::copy(&source, &target).map_err(copy)?;
    Ok(Some(target))
}

/// Copy missing defaults into `base_dir/config`, then load from there.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let sizes: &[(&str, usize)] = &[
        ("analysis.min_weeks", config.analysis.min_weeks),
        ("analysis.rolling_window", config.analysis.rolling_window),
    ];
    for (name, val) in sizes {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be greater than 0".into(),
            });
        }
    }

    if config.logging.filter.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.filter".into(),
            message: "must not be empty".into(),
        });
    }

    if config.database.path.as_deref().is_some_and(|p| p.trim().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty when set".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Workspace root, where the shipped `defaults/` directory lives.
    fn project_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    fn write_config(dir: &Path, text: &str) {
        fs::write(dir.join("config").join(CONFIG_FILE), text).unwrap();
    }

    #[test]
    fn load_shipped_defaults() {
        let tmp = std::env::temp_dir().join("pickem_config_shipped");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            tmp.join("defaults").join(CONFIG_FILE),
        )
        .unwrap();

        let config = load_config(&tmp).expect("shipped defaults should load");
        assert_eq!(config.database.path.as_deref(), Some("pickem.db"));
        assert_eq!(config.analysis.min_weeks, 3);
        assert_eq!(config.analysis.rolling_window, 3);
        assert_eq!(config.logging.filter, "pickem=info,warn");
        assert_eq!(config.logging.dir, "logs");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let tmp = scratch_dir("pickem_config_empty");
        write_config(&tmp, "");

        let config = load_config_from(&tmp).unwrap();
        assert!(config.database.path.is_none());
        assert_eq!(config.analysis.min_weeks, 3);
        assert!(config.analysis.default_season.is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let tmp = scratch_dir("pickem_config_partial");
        write_config(&tmp, "[analysis]\nmin_weeks = 4\ndefault_season = 2024\n");

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.analysis.min_weeks, 4);
        assert_eq!(config.analysis.rolling_window, 3);
        assert_eq!(config.analysis.default_season, Some(2024));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_min_weeks() {
        let tmp = scratch_dir("pickem_config_zero_min_weeks");
        write_config(&tmp, "[analysis]\nmin_weeks = 0\n");

        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "analysis.min_weeks"),
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_blank_log_filter() {
        let tmp = scratch_dir("pickem_config_blank_filter");
        write_config(&tmp, "[logging]\nfilter = \"  \"\n");

        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "logging.filter"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch_dir("pickem_config_invalid");
        write_config(&tmp, "[analysis\nmin_weeks = ");

        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = scratch_dir("pickem_config_missing");

        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_once() {
        let tmp = std::env::temp_dir().join("pickem_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::write(defaults_dir.join(CONFIG_FILE), "[analysis]\nmin_weeks = 3\n").unwrap();
        fs::write(defaults_dir.join("local.toml.example"), "# example\n").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        let target = tmp.join("config").join(CONFIG_FILE);
        assert_eq!(copied.as_deref(), Some(target.as_path()));
        assert!(!tmp.join("config").join("local.toml.example").exists());

        fs::write(&target, "# custom\n").unwrap();
        assert!(ensure_config_files(&tmp).unwrap().is_none());
        assert_eq!(fs::read_to_string(&target).unwrap(), "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("pickem_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn log_dir_follows_base_dir() {
        let base = Path::new("/srv/league");
        let relative = LoggingConfig::default();
        assert_eq!(relative.resolve_dir(base), base.join("logs"));

        let absolute = LoggingConfig {
            dir: "/var/log/pickem".into(),
            ..LoggingConfig::default()
        };
        assert_eq!(absolute.resolve_dir(base), PathBuf::from("/var/log/pickem"));
    }

    #[test]
    fn resolve_db_path() {
        let base = Path::new("/srv/league");
        let relative = DatabaseConfig {
            path: Some("data/pickem.db".into()),
        };
        assert_eq!(relative.resolve_path(base), base.join("data/pickem.db"));

        let memory = DatabaseConfig {
            path: Some(":memory:".into()),
        };
        assert_eq!(memory.resolve_path(base), PathBuf::from(":memory:"));

        let unset = DatabaseConfig::default();
        assert!(unset.resolve_path(base).ends_with(DEFAULT_DB_FILE));
    }
}
