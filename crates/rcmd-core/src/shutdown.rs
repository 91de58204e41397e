//! Shutdown coordination
//!
//! The coordinator is the single control loop of a run. It races the next
//! output line against the operator interrupt and only ever stops on the
//! interrupt.

use std::future::Future;

use tokio::io::AsyncWrite;
use tracing::{debug, error, info, warn};

use crate::multiplexer::Multiplexer;
use crate::worker::OutputReceiver;

/// Printed once when the operator interrupts
pub const FAREWELL: &str = "\nBye!\n";

/// Drives the multiplexer until interrupted
pub struct Coordinator<W> {
    rx: OutputReceiver,
    mux: Multiplexer<W>,
}

impl<W: AsyncWrite + Unpin> Coordinator<W> {
    pub fn new(rx: OutputReceiver, writer: W) -> Self {
        Self {
            rx,
            mux: Multiplexer::new(writer),
        }
    }

    /// Forward lines until `interrupt` resolves
    ///
    /// On interrupt the farewell is written and the channel is closed so
    /// remaining workers see their sends fail. When every sender is gone the
    /// loop keeps waiting for the interrupt; a run has no other end.
    ///
    /// Returns the multiplexer so the caller can inspect what was written.
    pub async fn run<F>(mut self, interrupt: F) -> Multiplexer<W>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        let mut senders_gone = false;

        loop {
            tokio::select! {
                line = self.rx.recv(), if !senders_gone => match line {
                    Some(line) => {
                        if let Err(e) = self.mux.write_line(&line).await {
                            warn!(error = %e, "failed to write output line");
                        }
                    }
                    None => {
                        debug!("all workers finished, waiting for interrupt");
                        senders_gone = true;
                    }
                },
                () = &mut interrupt => {
                    info!(lines = self.mux.lines_written(), "interrupted");
                    if let Err(e) = self.mux.write_raw(FAREWELL).await {
                        warn!(error = %e, "failed to write farewell");
                    }
                    self.rx.close();
                    break;
                }
            }
        }

        self.mux
    }
}

/// Resolves on the first operator interrupt (Ctrl-C)
///
/// If the handler cannot be installed the future never resolves.
pub async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "unable to listen for interrupt");
        std::future::pending::<()>().await;
    }
}
