//! Core error types for rcmd-core

use thiserror::Error;

/// Run parameter validation failures
///
/// Checked in declaration order; only the first violation is reported.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamError {
    /// No remote login given
    #[error("Argument error: user")]
    MissingUser,

    /// No command given
    #[error("Argument error: command")]
    MissingCommand,

    /// Key path absent or unreadable
    #[error("Argument error: key path")]
    MissingKey,
}

impl ParamError {
    /// Name of the offending argument
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            ParamError::MissingUser => "user",
            ParamError::MissingCommand => "command",
            ParamError::MissingKey => "key path",
        }
    }
}
