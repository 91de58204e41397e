//! Settings file loading
//!
//! Optional TOML file carrying defaults for the command-line options.
//!
//! ```toml
//! hosts = ["10.0.0.1", "10.0.0.2"]
//! user = "deploy"
//! key = "/home/deploy/.ssh/id_ed25519"
//! timeout = 10
//! ```

use std::path::{Path, PathBuf};

use eyre::WrapErr;
use serde::Deserialize;

/// Environment variable naming a settings file
pub const CONFIG_ENV: &str = "RCMD_CONFIG";

/// Defaults for the command-line options, all optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Target hosts
    #[serde(default)]
    pub hosts: Option<Vec<String>>,
    /// Remote username
    #[serde(default)]
    pub user: Option<String>,
    /// Path to the private key
    #[serde(default)]
    pub key: Option<PathBuf>,
    /// Connect timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
    /// SSH port
    #[serde(default)]
    pub port: Option<u16>,
    /// Show host address on every line
    #[serde(default)]
    pub show_ip: Option<bool>,
}

impl Settings {
    /// Load settings from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read settings file {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .wrap_err_with(|| format!("invalid settings file {}", path.display()))?;
        Ok(settings)
    }

    /// Load from an explicit path, the environment or default paths
    ///
    /// An explicit path or `RCMD_CONFIG` must exist. Default locations are
    /// skipped when absent, falling back to empty settings.
    ///
    /// # Errors
    /// Returns error if a selected file cannot be read or parsed
    pub fn load_default(explicit: Option<&Path>) -> eyre::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }

        for path in default_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "using settings file");
                return Self::load(&path);
            }
        }

        Ok(Settings::default())
    }
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("rcmd.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("rcmd/rcmd.toml"));
    }
    paths
}
