//! Error types for mtfleet-exec

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while running a command over an open session
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Command timed out
    #[error("command timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Channel could not be opened or the command could not be sent
    #[error("channel error: {0}")]
    ChannelError(String),

    /// I/O error during execution
    #[error("I/O error: {0}")]
    IoError(String),

    /// Session already closed
    #[error("not connected")]
    NotConnected,
}

/// Classified failure to open a session against a device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// No response within the connect timeout
    #[error("timed out")]
    Timeout,

    /// Remote refused the connection (SSH service disabled)
    #[error("SSH not enabled: {0}")]
    ServiceUnavailable(String),

    /// Any other transport or authentication failure
    #[error("unknown error [{0}]")]
    Unknown(String),
}

impl ConnectionError {
    /// Short classification label used in log lines
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionError::Timeout => "Timeout",
            ConnectionError::ServiceUnavailable(_) => "ServiceUnavailable",
            ConnectionError::Unknown(_) => "Unknown",
        }
    }

    /// Classify an I/O error raised while establishing the transport
    #[must_use]
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => ConnectionError::Timeout,
            io::ErrorKind::ConnectionRefused => {
                ConnectionError::ServiceUnavailable(err.to_string())
            }
            _ => ConnectionError::Unknown(err.to_string()),
        }
    }
}

impl From<russh::Error> for ConnectionError {
    fn from(err: russh::Error) -> Self {
        match err {
            russh::Error::IO(ref io_err) => ConnectionError::from_io(io_err),
            other => ConnectionError::Unknown(other.to_string()),
        }
    }
}
