//! Session workers: one task per host
//!
//! Each worker connects, starts the command and forwards stdout line by line
//! to the shared output channel. Failures end that worker only and are
//! reported through tracing, never on the output channel.

use std::sync::Arc;

use rcmd_exec::traits::RemoteConnector;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::label::format_label;

/// Write half of the shared output channel
pub type OutputSender = mpsc::UnboundedSender<String>;

/// Read half of the shared output channel
pub type OutputReceiver = mpsc::UnboundedReceiver<String>;

/// Create the shared output channel
#[must_use]
pub fn output_channel() -> (OutputSender, OutputReceiver) {
    mpsc::unbounded_channel()
}

/// Owns the remote session for one host
pub struct SessionWorker {
    /// Position in the host list, selects the label colour
    index: usize,
    /// Host address as given
    host: String,
    /// Command shared by all workers
    command: Arc<str>,
    /// Prefix rendered once per worker, empty when labels are off
    label: String,
    /// Opens the connection
    connector: Arc<dyn RemoteConnector>,
    /// Shared output channel
    outbound: OutputSender,
}

impl SessionWorker {
    pub fn new(
        index: usize,
        host: impl Into<String>,
        command: Arc<str>,
        show_host_label: bool,
        connector: Arc<dyn RemoteConnector>,
        outbound: OutputSender,
    ) -> Self {
        let host = host.into();
        let label = format_label(&host, index, show_host_label);
        Self {
            index,
            host,
            command,
            label,
            connector,
            outbound,
        }
    }

    /// Run on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Connect, execute and stream until end-of-stream or error
    #[instrument(skip(self), fields(host = %self.host, index = self.index))]
    pub async fn run(self) {
        let mut conn = match self.connector.connect(&self.host).await {
            Ok(conn) => conn,
            Err(e) => {
                error!(stage = e.stage(), error = %e, "unable to connect");
                return;
            }
        };

        let mut output = match conn.exec(&self.command).await {
            Ok(output) => output,
            Err(e) => {
                error!(stage = e.stage(), error = %e, "unable to start command");
                conn.close().await;
                return;
            }
        };

        let mut forwarded = 0u64;
        loop {
            match output.next_line().await {
                Ok(Some(line)) => {
                    if self.outbound.send(format!("{}{line}", self.label)).is_err() {
                        debug!("output channel closed");
                        break;
                    }
                    forwarded += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "eof: stream ended with error");
                    break;
                }
            }
        }

        output.close().await;
        conn.close().await;
        info!(lines = forwarded, "session finished");
    }
}

/// Spawn one worker per configured host
///
/// Workers start immediately and run independently. The returned handles
/// may be dropped; nothing waits on them during a normal run.
pub fn dispatch(
    config: &Config,
    connector: &Arc<dyn RemoteConnector>,
    outbound: &OutputSender,
) -> Vec<JoinHandle<()>> {
    let command: Arc<str> = Arc::from(config.command.as_str());

    debug!(
        hosts = config.hosts.len(),
        connector = connector.connector_type(),
        "dispatching workers"
    );

    config
        .hosts
        .iter()
        .enumerate()
        .map(|(index, host)| {
            SessionWorker::new(
                index,
                host.clone(),
                command.clone(),
                config.show_host_label,
                connector.clone(),
                outbound.clone(),
            )
            .spawn()
        })
        .collect()
}
