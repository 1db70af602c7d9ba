//! Bootstrap configuration and root folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. TOML config file
//! 4. OS-dependent compiled defaults (fallback)
//!
//! A missing or broken TOML file never stops startup: it is logged and the
//! lower tiers apply.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "CINEMA_ROOT_FOLDER";
/// Shorter alias checked after [`ROOT_FOLDER_ENV`]
pub const ROOT_FOLDER_ENV_ALIAS: &str = "CINEMA_ROOT";
/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;
/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "cinema.db";

/// Built-in defaults for the current platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub port: u16,
    pub bind_address: String,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("cinema"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\cinema"))
        } else {
            // ~/.local/share/cinema on Linux, ~/Library/Application Support/cinema on macOS
            dirs::data_dir()
                .map(|d| d.join("cinema"))
                .unwrap_or_else(|| PathBuf::from("./cinema_data"))
        };

        Self {
            root_folder,
            port: DEFAULT_PORT,
            bind_address: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Logging section of the TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error (or a full EnvFilter directive)
    #[serde(default)]
    pub level: Option<String>,
}

/// Contents of `config.toml`; every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub bind_address: Option<String>,
    /// Answer invalid review submissions with 422 instead of dropping them
    #[serde(default)]
    pub reject_invalid_reviews: Option<bool>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `<config dir>/cinema/config.toml` for the current user
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cinema").join("config.toml"))
}

/// Parse a TOML config file
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

/// Load the TOML tier, downgrading every failure to a warning
fn load_toml_tier(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => path,
        None => {
            warn!("Could not determine config directory; using defaults");
            return TomlConfig::default();
        }
    };

    match load_toml_config(&path) {
        Ok(Some(config)) => {
            info!("Loaded configuration from {}", path.display());
            config
        }
        Ok(None) => {
            if explicit.is_some() {
                warn!("Config file {} not found; using defaults", path.display());
            }
            TomlConfig::default()
        }
        Err(e) => {
            warn!("Ignoring unreadable config file: {}", e);
            TomlConfig::default()
        }
    }
}

/// Resolves the root folder across the four tiers
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml_value(mut self, path: Option<PathBuf>) -> Self {
        self.toml_value = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV, ROOT_FOLDER_ENV_ALIAS] {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    return PathBuf::from(value);
                }
            }
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates the database inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Values supplied on the command line (clap also folds in `CINEMA_PORT`)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub config_file: Option<PathBuf>,
}

/// Fully resolved bootstrap configuration of the site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub root_folder: PathBuf,
    pub port: u16,
    pub bind_address: String,
    pub reject_invalid_reviews: bool,
    pub log_level: String,
}

impl SiteConfig {
    /// Resolve against the config file named in `overrides` (or the default one)
    pub fn resolve(overrides: &Overrides) -> Self {
        let toml = load_toml_tier(overrides.config_file.as_deref());
        Self::resolve_with(overrides, toml)
    }

    /// Resolve against an already-loaded TOML tier
    pub fn resolve_with(overrides: &Overrides, toml: TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();

        let root_folder = RootFolderResolver::new()
            .with_cli_arg(overrides.root_folder.clone())
            .with_toml_value(toml.root_folder)
            .resolve();

        Self {
            root_folder,
            port: overrides.port.or(toml.port).unwrap_or(defaults.port),
            bind_address: overrides
                .bind_address
                .clone()
                .or(toml.bind_address)
                .unwrap_or(defaults.bind_address),
            reject_invalid_reviews: toml.reject_invalid_reviews.unwrap_or(false),
            log_level: toml.logging.level.unwrap_or(defaults.log_level),
        }
    }

    /// `host:port` for the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
