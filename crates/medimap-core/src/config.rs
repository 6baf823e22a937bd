//! Configuration types for MediMap components.
//!
//! Runtime settings of the binaries come from CLI flags and environment
//! variables (see `medimap-server` and `medimap-cli`). This module holds the
//! pieces shared between them: database pool sizing and the batch loader's
//! `sources.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Year of the bundled pre-aggregated extract.
pub const DEFAULT_YEAR: i32 = 2023;

/// Database connection pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbConfig {
    pub max_connections: u32,
}

impl DbConfig {
    /// Builds the configuration from `DB_MAX_CONNECTIONS`, falling back to defaults.
    ///
    /// Unparseable or zero values are ignored with a warning.
    pub fn from_env() -> Self {
        match std::env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => Self::from_raw(&raw),
            Err(_) => Self::default(),
        }
    }

    fn from_raw(raw: &str) -> Self {
        match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => Self { max_connections: n },
            _ => {
                tracing::warn!(
                    "Ignoring invalid DB_MAX_CONNECTIONS value '{}', using default",
                    raw
                );
                Self::default()
            }
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { max_connections: 5 }
    }
}

// =============================================================================
// Load sources (sources.toml)
// =============================================================================

/// Input files of one batch load.
///
/// # Example
///
/// ```toml
/// year = 2023
/// regions = "data/processed/agregation_regions_2023.csv"
/// drugs = "data/processed/agregation_medicaments_2023.csv"
/// classes = "data/processed/agregation_classes_2023.csv"
/// ```
///
/// Relative paths are resolved against the directory of the file they were
/// read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Year assigned to every loaded consumption fact.
    #[serde(default = "default_year")]
    pub year: i32,

    /// Pre-aggregated per-region totals.
    #[serde(default = "default_regions_path")]
    pub regions: PathBuf,

    /// Drug reference list.
    #[serde(default = "default_drugs_path")]
    pub drugs: PathBuf,

    /// Therapeutic class reference list.
    #[serde(default = "default_classes_path")]
    pub classes: PathBuf,
}

fn default_year() -> i32 {
    DEFAULT_YEAR
}

fn default_regions_path() -> PathBuf {
    PathBuf::from("data/processed/agregation_regions_2023.csv")
}

fn default_drugs_path() -> PathBuf {
    PathBuf::from("data/processed/agregation_medicaments_2023.csv")
}

fn default_classes_path() -> PathBuf {
    PathBuf::from("data/processed/agregation_classes_2023.csv")
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
            regions: default_regions_path(),
            drugs: default_drugs_path(),
            classes: default_classes_path(),
        }
    }
}

impl SourcesConfig {
    /// Resolves relative paths against `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        for path in [&mut self.regions, &mut self.drugs, &mut self.classes] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "sources.toml";

/// Returns the default configuration directory path.
///
/// Uses XDG Base Directory specification: `~/.config/medimap/`
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("medimap"))
}

/// Returns the default configuration file path.
///
/// Path: `~/.config/medimap/sources.toml`
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join(CONFIG_FILE_NAME))
}

/// Load the batch loader sources from a TOML file.
///
/// # Arguments
/// * `path` - Optional custom path. If `None`, uses default XDG path.
///
/// # Returns
/// * `Ok(config)` - Configuration loaded, or built-in defaults when no file
///   exists at the default path (paths then stay relative to the working directory)
/// * `Err(e)` - A custom path does not exist, or the file is invalid
pub fn load_sources_config(path: Option<PathBuf>) -> Result<SourcesConfig, AppError> {
    let using_default_path = path.is_none();
    let config_path = match path.or_else(default_config_path) {
        Some(p) => p,
        None => return Ok(SourcesConfig::default()),
    };

    if !config_path.exists() {
        if using_default_path {
            tracing::debug!(
                "No sources file at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(SourcesConfig::default());
        }
        return Err(AppError::ConfigError(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    }

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        AppError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            config_path.display(),
            e
        ))
    })?;

    let config: SourcesConfig = toml::from_str(&content).map_err(|e| {
        AppError::ConfigError(format!(
            "Invalid TOML in '{}': {}",
            config_path.display(),
            e
        ))
    })?;

    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.relative_to(base))
}
