//! Error types for rcmd-exec

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running a command on one host
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Failed to connect to remote host
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Connection was not established within the configured timeout
    #[error("connection timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Failed to open a command session on an established connection
    #[error("failed to create session: {0}")]
    SessionOpen(String),

    /// Failed to attach to the session's stdout
    #[error("unable to acquire stdout pipe: {0}")]
    StdoutAttach(String),

    /// Remote side refused to start the command
    #[error("unable to execute remote command: {0}")]
    CommandStart(String),

    /// Reading the output stream failed before end-of-stream
    #[error("read error: {0}")]
    Read(String),

    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    SpawnError(String),
}

impl ExecError {
    /// Which lifecycle step produced the error, for log fields
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            ExecError::ConnectionFailed(_)
            | ExecError::AuthenticationFailed(_)
            | ExecError::Timeout { .. } => "connect",
            ExecError::SessionOpen(_) => "session",
            ExecError::StdoutAttach(_) => "stdout",
            ExecError::CommandStart(_) | ExecError::SpawnError(_) => "start",
            ExecError::Read(_) => "read",
        }
    }
}
