//! rcmd-core: Fan-out engine
//!
//! Validates run parameters, spawns one session worker per host and merges
//! their output into a single labelled stream until the operator interrupts.

pub mod config;
pub mod error;
pub mod label;
pub mod multiplexer;
pub mod shutdown;
pub mod worker;

pub use config::{Config, DEFAULT_TIMEOUT_SECS, HOST_DELIMITER, RawParams};
pub use error::ParamError;
pub use label::{LABEL_WIDTH, PALETTE, format_label, label_color};
pub use multiplexer::Multiplexer;
pub use shutdown::{Coordinator, FAREWELL, interrupt_signal};
pub use worker::{OutputReceiver, OutputSender, SessionWorker, dispatch, output_channel};
