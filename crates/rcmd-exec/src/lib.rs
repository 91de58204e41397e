//! rcmd-exec: Remote execution abstraction
//!
//! Provides the connector traits used by session workers plus implementations
//! for SSH (russh) and the local shell.

pub mod error;
pub mod keys;
pub mod lines;
pub mod local;
pub mod ssh;
pub mod traits;

pub use error::ExecError;
pub use keys::{KeyError, parse_private_key, read_key_file};
pub use local::LocalConnector;
pub use ssh::{DEFAULT_PORT, DEFAULT_TIMEOUT_SECS, SshConnector, SshConnectorBuilder};
pub use traits::{OutputStream, RemoteConnection, RemoteConnector};
