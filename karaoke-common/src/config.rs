//! Bootstrap configuration loading and database path resolution
//!
//! Two layers, resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is not an error: the service logs a warning and
//! starts on compiled defaults. A TOML file that exists but does not parse
//! is a configuration error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit TOML config file
pub const CONFIG_ENV_VAR: &str = "KARAOKE_CONFIG";

/// Environment variable overriding the database path
pub const DATABASE_ENV_VAR: &str = "KARAOKE_DATABASE";

/// Bootstrap configuration loaded from TOML
///
/// These settings cannot change while the service runs.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Interface the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub hub: HubConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Live fan-out hub tuning
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Pending notifications a single subscriber may hold before it is
    /// considered hung and dropped
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,

    /// SSE keep-alive / WebSocket ping interval
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_outbox_capacity() -> usize {
    64
}

fn default_keepalive_secs() -> u64 {
    15
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            bind_address: default_bind_address(),
            port: default_port(),
            logging: LoggingConfig::default(),
            hub: HubConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: default_outbox_capacity(),
            keepalive_secs: default_keepalive_secs(),
        }
    }
}

/// Compiled-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub data_folder: PathBuf,
    pub database_path: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let data_folder = default_data_folder();
        Self {
            database_path: data_folder.join("karaoke.db"),
            data_folder,
            log_level: default_log_level(),
        }
    }
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/karaoke (or /var/lib/karaoke for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("karaoke"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/karaoke"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("karaoke"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/karaoke"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("karaoke"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\karaoke"))
    } else {
        PathBuf::from("./karaoke_data")
    }
}

/// Locate the TOML config file, if any
///
/// Explicit paths (CLI or environment) are returned even when they do not
/// exist so the caller can report them; the platform locations are only
/// returned when present.
pub fn locate_config_file(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // ~/.config/karaoke/config.toml first, then /etc/karaoke/config.toml
    let user_config = dirs::config_dir().map(|d| d.join("karaoke").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/karaoke/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Load the bootstrap config, falling back to defaults when no file exists
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match locate_config_file(cli_arg) {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            info!("No config file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Resolve the database path following the standard priority order
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.database_path {
        return path.clone();
    }

    CompiledDefaults::for_current_platform().database_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: TomlConfig = toml::from_str("port = 6000").unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.hub.outbox_capacity, 64);
        assert_eq!(config.hub.keepalive_secs, 15);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_hub_section_parsed() {
        let config: TomlConfig = toml::from_str(
            r#"
            database_path = "/tmp/k.db"

            [hub]
            outbox_capacity = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.hub.outbox_capacity, 8);
        assert_eq!(config.hub.keepalive_secs, 15);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/k.db")));
    }

    #[test]
    fn test_compiled_default_database_name() {
        let defaults = CompiledDefaults::for_current_platform();
        assert!(defaults.database_path.ends_with("karaoke.db"));
        assert!(defaults.database_path.starts_with(&defaults.data_folder));
    }
}
