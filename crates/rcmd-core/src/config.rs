//! Run configuration and parameter validation

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rcmd_exec::ssh::DEFAULT_PORT;
pub use rcmd_exec::ssh::DEFAULT_TIMEOUT_SECS;
use tracing::debug;

use crate::error::ParamError;

/// Separator between entries of the host list
pub const HOST_DELIMITER: char = ',';

/// Unvalidated run parameters as sourced by the caller
///
/// Empty strings count as missing.
#[derive(Debug, Clone, Default)]
pub struct RawParams {
    /// Delimiter-separated host list
    pub hosts: Option<String>,
    /// Path to the private key
    pub key_path: Option<PathBuf>,
    /// Remote login
    pub user: Option<String>,
    /// Shell command to run on every host
    pub command: Option<String>,
    /// Connect timeout in seconds
    pub timeout: Option<u64>,
    /// SSH port
    pub port: Option<u16>,
    /// Prefix each output line with its host label
    pub show_host_label: Option<bool>,
}

/// Validated, immutable run configuration shared by all workers
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Target hosts in the order given; order fixes label colours
    pub hosts: Vec<String>,
    /// Raw private key material
    pub key: Vec<u8>,
    /// Remote login
    pub user: String,
    /// Shell command to run on every host
    pub command: String,
    /// Bound on connecting to one host
    pub timeout: Duration,
    /// SSH port
    pub port: u16,
    /// Prefix each output line with its host label
    pub show_host_label: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("hosts", &self.hosts)
            .field("key", &format_args!("<{} bytes>", self.key.len()))
            .field("user", &self.user)
            .field("command", &self.command)
            .field("timeout", &self.timeout)
            .field("port", &self.port)
            .field("show_host_label", &self.show_host_label)
            .finish()
    }
}

impl RawParams {
    /// Validate into a `Config`
    ///
    /// Checks run in a fixed order and stop at the first failure: user,
    /// command, then key. `read_key` is only called once user and command
    /// are known to be present.
    ///
    /// Hosts are split on [`HOST_DELIMITER`] without trimming or address
    /// validation.
    ///
    /// # Errors
    /// Returns the first violated `ParamError`
    pub fn validate<F, E>(self, read_key: F) -> Result<Config, ParamError>
    where
        F: FnOnce(&Path) -> Result<Vec<u8>, E>,
        E: Display,
    {
        let user = non_empty(self.user).ok_or(ParamError::MissingUser)?;
        let command = non_empty(self.command).ok_or(ParamError::MissingCommand)?;

        let key_path = self.key_path.ok_or(ParamError::MissingKey)?;
        let key = read_key(&key_path).map_err(|e| {
            debug!(path = %key_path.display(), error = %e, "failed to read key");
            ParamError::MissingKey
        })?;

        let hosts = self
            .hosts
            .unwrap_or_default()
            .split(HOST_DELIMITER)
            .map(str::to_string)
            .collect();

        Ok(Config {
            hosts,
            key,
            user,
            command,
            timeout: Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            port: self.port.unwrap_or(DEFAULT_PORT),
            show_host_label: self.show_host_label.unwrap_or(true),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
