//! Logging setup
//!
//! Logs go to stderr; stdout carries only the merged host output.

use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG` if set, otherwise from `-v` count
pub fn create_env_filter(verbosity: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbosity {
            0 => EnvFilter::new("rcmd=warn,rcmd_core=warn,rcmd_exec=warn"),
            1 => EnvFilter::new("rcmd=info,rcmd_core=info,rcmd_exec=info"),
            // russh handshake details help with auth failures
            2 => EnvFilter::new("rcmd=debug,rcmd_core=debug,rcmd_exec=debug,russh=debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}

pub fn init(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(create_env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
