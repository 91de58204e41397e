//! Local command execution using `tokio::process`

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, instrument};

use crate::error::ExecError;
use crate::traits::{OutputStream, RemoteConnection, RemoteConnector};

/// Local connector
///
/// Ignores the host address and runs the command through `sh -c` on this
/// machine. Lets the fan-out engine be driven without an SSH server.
#[derive(Debug, Clone, Default)]
pub struct LocalConnector;

impl LocalConnector {
    /// Create a new local connector
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteConnector for LocalConnector {
    async fn connect(&self, host: &str) -> Result<Box<dyn RemoteConnection>, ExecError> {
        Ok(Box::new(LocalConnection {
            host: host.to_string(),
        }))
    }

    fn connector_type(&self) -> &'static str {
        "local"
    }
}

struct LocalConnection {
    host: String,
}

#[async_trait]
impl RemoteConnection for LocalConnection {
    #[instrument(skip(self), fields(host = %self.host), level = "debug")]
    async fn exec(&mut self, command: &str) -> Result<Box<dyn OutputStream>, ExecError> {
        debug!(command = %command, "executing local command");

        // Use shell to support pipes, redirections, etc.
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecError::SpawnError(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExecError::StdoutAttach("stdout not piped".to_string()))?;

        Ok(Box::new(LocalOutput {
            child,
            reader: BufReader::new(stdout),
        }))
    }

    async fn close(&mut self) {}
}

struct LocalOutput {
    child: Child,
    reader: BufReader<ChildStdout>,
}

#[async_trait]
impl OutputStream for LocalOutput {
    async fn next_line(&mut self) -> Result<Option<String>, ExecError> {
        let mut line = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(|e| ExecError::Read(e.to_string()))?;

        if n == 0 {
            return Ok(None);
        }
        if line.last() != Some(&b'\n') {
            debug!(bytes = n, "dropping unterminated last line");
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    async fn close(&mut self) {
        // The command may still be running if it closed stdout early
        let _ = self.child.start_kill();
        match self.child.wait().await {
            Ok(status) => debug!(status = ?status.code(), "local command finished"),
            Err(e) => debug!(error = %e, "failed to reap local command"),
        }
    }
}
