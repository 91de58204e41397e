//! Connector traits
//!
//! A connection moves through three owned stages: connector → connection →
//! output stream. Each stage fails with its own `ExecError` kind so callers
//! can log which step broke.

use async_trait::async_trait;

use crate::error::ExecError;

/// Turns a host address into an authenticated connection
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    /// Dial and authenticate, bounded by the connector's timeout
    async fn connect(&self, host: &str) -> Result<Box<dyn RemoteConnection>, ExecError>;

    fn connector_type(&self) -> &'static str;
}

/// An established connection able to run a command
#[async_trait]
pub trait RemoteConnection: Send {
    /// Open a session, attach to its stdout and start `command`
    ///
    /// # Errors
    /// `SessionOpen`, `StdoutAttach` or `CommandStart` depending on the step
    /// that failed.
    async fn exec(&mut self, command: &str) -> Result<Box<dyn OutputStream>, ExecError>;

    /// Tear down the connection. Errors are logged, not returned.
    async fn close(&mut self);
}

/// Line-oriented view of a running command's stdout
#[async_trait]
pub trait OutputStream: Send {
    /// Next newline-terminated line, `None` at end-of-stream
    async fn next_line(&mut self) -> Result<Option<String>, ExecError>;

    /// Close the session. Errors are logged, not returned.
    async fn close(&mut self);
}
