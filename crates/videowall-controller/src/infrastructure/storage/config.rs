//! TOML-based configuration persistence for the video wall controller.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\NVXVideoWall\config.toml`
//! - Linux:    `~/.config/nvxvideowall/config.toml`
//! - macOS:    `~/Library/Application Support/NVXVideoWall/config.toml`
//!
//! An explicit path (the `--config` flag) bypasses the platform lookup.
//!
//! ```toml
//! [controller]
//! log_level = "info"
//!
//! [wall]
//! width = 4
//! height = 2
//!
//! [inputs]
//! count = 8
//!
//! [network]
//! bind_address = "0.0.0.0"
//! control_port = 24850
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file, so a missing
//! or partial file still yields a usable configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use videowall_core::domain::layout::{DEFAULT_WALL_HEIGHT, DEFAULT_WALL_WIDTH};
use videowall_core::{WallDimensions, WallError};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The wall section describes an impossible wall.
    #[error("invalid [wall] section: {0}")]
    Wall(#[from] WallError),

    /// The inputs section allows no input to be selected.
    #[error("invalid [inputs] section: count must be at least 1")]
    NoInputs,

    /// The network section does not form a socket address.
    #[error("invalid [network] section: '{address}' is not a valid bind address")]
    BindAddress { address: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub wall: WallConfig,
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// General controller behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Physical size of the wall in panels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WallConfig {
    #[serde(default = "default_wall_width")]
    pub width: u16,
    #[serde(default = "default_wall_height")]
    pub height: u16,
}

/// Video input buttons on the control surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputsConfig {
    /// Number of selectable inputs; valid inputs are `1..=count`.
    #[serde(default = "default_input_count")]
    pub count: u16,
}

/// Control server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// IP address to bind to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// TCP port for the control protocol.
    #[serde(default = "default_control_port")]
    pub control_port: u16,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_wall_width() -> u16 {
    DEFAULT_WALL_WIDTH
}
fn default_wall_height() -> u16 {
    DEFAULT_WALL_HEIGHT
}
fn default_input_count() -> u16 {
    8
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_control_port() -> u16 {
    24850
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            width: default_wall_width(),
            height: default_wall_height(),
        }
    }
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            count: default_input_count(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            control_port: default_control_port(),
        }
    }
}

impl AppConfig {
    /// Checks the values serde cannot check.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Wall`] when a wall dimension is outside
    /// `1..=9`, [`ConfigError::NoInputs`] for an input count of zero, and
    /// [`ConfigError::BindAddress`] when the bind address and port do not
    /// parse as a socket address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wall_dimensions()?;
        if self.inputs.count == 0 {
            return Err(ConfigError::NoInputs);
        }
        self.bind_addr()?;
        Ok(())
    }

    /// The validated wall dimensions.
    pub fn wall_dimensions(&self) -> Result<WallDimensions, ConfigError> {
        Ok(WallDimensions::new(self.wall.width, self.wall.height)?)
    }

    /// The control server socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = format!("{}:{}", self.network.bind_address, self.network.control_port);
        address
            .parse()
            .map_err(|_| ConfigError::BindAddress { address })
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file, returning
/// `AppConfig::default()` if the file does not yet exist.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to the platform config file.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config directory, including the application subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("NVXVideoWall"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("nvxvideowall"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("NVXVideoWall")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
