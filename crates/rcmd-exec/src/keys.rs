//! SSH key loading and parsing

use std::path::Path;

use russh::keys::ssh_key::PrivateKey;
use tracing::{debug, warn};

/// Key loading errors
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key file not found: {0}")]
    NotFound(String),

    #[error("key is not valid UTF-8 text")]
    InvalidUtf8,

    #[error("can't parse private key: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read raw key material from `path`
///
/// This is the default read capability handed to the parameter validator.
///
/// # Errors
/// Returns `KeyError::NotFound` if the path does not exist, `KeyError::Io`
/// for any other read failure.
pub fn read_key_file(path: &Path) -> Result<Vec<u8>, KeyError> {
    if !path.exists() {
        return Err(KeyError::NotFound(path.display().to_string()));
    }

    warn_on_open_permissions(path);

    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), len = bytes.len(), "read key file");
    Ok(bytes)
}

/// Parse an OpenSSH/PEM private key blob
///
/// Encrypted keys are not supported.
///
/// # Errors
/// Returns `KeyError::InvalidUtf8` or `KeyError::Parse`
pub fn parse_private_key(bytes: &[u8]) -> Result<PrivateKey, KeyError> {
    let text = std::str::from_utf8(bytes).map_err(|_| KeyError::InvalidUtf8)?;
    russh::keys::decode_secret_key(text, None).map_err(|e| KeyError::Parse(e.to_string()))
}

#[cfg(unix)]
fn warn_on_open_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let Ok(metadata) = std::fs::metadata(path) else {
        return;
    };

    // group/other bits set
    if metadata.permissions().mode() & 0o77 != 0 {
        warn!(path = %path.display(), "key file permissions too open (should be 600)");
    }
}

#[cfg(not(unix))]
fn warn_on_open_permissions(_path: &Path) {}
