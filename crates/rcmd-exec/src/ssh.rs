//! SSH command execution using russh crate

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::keys::PrivateKeyWithHashAlg;
use russh::keys::ssh_key::{self, PrivateKey};
use russh::{Channel, ChannelMsg, Disconnect, client};
use tokio::time::timeout;
use tracing::{debug, info, instrument, trace};

use crate::error::ExecError;
use crate::lines::LineBuffer;
use crate::traits::{OutputStream, RemoteConnection, RemoteConnector};

/// Standard SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Default connect timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// SSH client handler for russh
#[derive(Debug)]
struct SshClientHandler;

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Accept all server keys (like StrictHostKeyChecking=no)
        debug!(
            fingerprint = %server_public_key.fingerprint(ssh_key::HashAlg::Sha256),
            "accepting server key"
        );
        Ok(true)
    }
}

/// SSH connector
///
/// Holds the credential, user and timeout shared by every host. One
/// connector is built per run and handed to all session workers.
pub struct SshConnector {
    /// russh client configuration
    config: Arc<client::Config>,
    /// Remote login
    user: String,
    /// Parsed private key
    key: Arc<PrivateKey>,
    /// Remote port
    port: u16,
    /// Bound on dial + authentication
    timeout: Duration,
}

impl std::fmt::Debug for SshConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConnector")
            .field("user", &self.user)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SshConnector {
    /// Start building a connector for `user` authenticating with `key`
    pub fn builder(user: impl Into<String>, key: PrivateKey) -> SshConnectorBuilder {
        SshConnectorBuilder::new(user, key)
    }

    #[cfg(test)]
    fn user(&self) -> &str {
        &self.user
    }

    #[cfg(test)]
    fn port(&self) -> u16 {
        self.port
    }

    #[cfg(test)]
    fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Open the TCP connection, run the handshake and authenticate
    async fn dial(&self, host: &str) -> Result<client::Handle<SshClientHandler>, ExecError> {
        debug!(host = %host, port = self.port, user = %self.user, "connecting to SSH");

        let mut session = client::connect(self.config.clone(), (host, self.port), SshClientHandler)
            .await
            .map_err(|e| ExecError::ConnectionFailed(e.to_string()))?;

        let hash_alg = session
            .best_supported_rsa_hash()
            .await
            .ok()
            .flatten()
            .flatten();
        let auth_res = session
            .authenticate_publickey(
                &self.user,
                PrivateKeyWithHashAlg::new(self.key.clone(), hash_alg),
            )
            .await
            .map_err(|e| ExecError::AuthenticationFailed(e.to_string()))?;

        if !auth_res.success() {
            return Err(ExecError::AuthenticationFailed(
                "public key authentication failed".to_string(),
            ));
        }

        info!(host = %host, "SSH connected and authenticated");
        Ok(session)
    }
}

#[async_trait]
impl RemoteConnector for SshConnector {
    #[instrument(skip(self), fields(port = self.port))]
    async fn connect(&self, host: &str) -> Result<Box<dyn RemoteConnection>, ExecError> {
        let handle = match timeout(self.timeout, self.dial(host)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ExecError::Timeout {
                    timeout: self.timeout,
                });
            }
        };

        Ok(Box::new(SshConnection {
            host: host.to_string(),
            handle,
        }))
    }

    fn connector_type(&self) -> &'static str {
        "ssh"
    }
}

/// An authenticated SSH connection to one host
struct SshConnection {
    host: String,
    handle: client::Handle<SshClientHandler>,
}

#[async_trait]
impl RemoteConnection for SshConnection {
    #[instrument(skip(self, command), fields(host = %self.host))]
    async fn exec(&mut self, command: &str) -> Result<Box<dyn OutputStream>, ExecError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| ExecError::SessionOpen(e.to_string()))?;

        // stdout is the channel's data stream, attaching to it cannot fail

        debug!(command = %command, "executing remote command");
        channel
            .exec(true, command)
            .await
            .map_err(|e| ExecError::CommandStart(e.to_string()))?;

        // Wait for the server to accept the exec request. Anything that
        // arrives first is kept for the reader.
        let mut buffer = LineBuffer::new();
        let mut eof = false;
        loop {
            match channel.wait().await {
                Some(ChannelMsg::Success) => break,
                Some(ChannelMsg::Failure) => {
                    return Err(ExecError::CommandStart(
                        "exec request refused by server".to_string(),
                    ));
                }
                Some(ChannelMsg::Data { data }) => buffer.extend(&data),
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                    eof = true;
                    break;
                }
                Some(_) => {}
            }
        }

        Ok(Box::new(SshOutput {
            host: self.host.clone(),
            channel,
            buffer,
            eof,
        }))
    }

    async fn close(&mut self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            debug!(host = %self.host, error = %e, "disconnect failed");
        } else {
            debug!(host = %self.host, "SSH disconnected");
        }
    }
}

/// stdout of a remote command, framed into lines
struct SshOutput {
    host: String,
    channel: Channel<client::Msg>,
    buffer: LineBuffer,
    eof: bool,
}

#[async_trait]
impl OutputStream for SshOutput {
    async fn next_line(&mut self) -> Result<Option<String>, ExecError> {
        loop {
            if let Some(line) = self.buffer.next_line() {
                return Ok(Some(line));
            }
            if self.eof {
                let dropped = self.buffer.discard_tail();
                if dropped > 0 {
                    debug!(host = %self.host, bytes = dropped, "dropping unterminated last line");
                }
                return Ok(None);
            }

            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => self.buffer.extend(&data),
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    trace!(host = %self.host, ext, len = data.len(), "ignoring extended data");
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    debug!(host = %self.host, exit_status, "remote command exited");
                }
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => self.eof = true,
                Some(_) => {}
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.channel.close().await {
            debug!(host = %self.host, error = %e, "channel close failed");
        }
    }
}

/// Builder for `SshConnector`
pub struct SshConnectorBuilder {
    user: String,
    key: PrivateKey,
    port: u16,
    timeout: Duration,
}

impl SshConnectorBuilder {
    /// Create builder with required fields
    pub fn new(user: impl Into<String>, key: PrivateKey) -> Self {
        Self {
            user: user.into(),
            key,
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set connect timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the connector
    #[must_use]
    pub fn build(self) -> SshConnector {
        SshConnector {
            config: Arc::new(client::Config::default()),
            user: self.user,
            key: Arc::new(self.key),
            port: self.port,
            timeout: self.timeout,
        }
    }
}
