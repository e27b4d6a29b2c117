//! Error types for mtfleet-device

use mtfleet_exec::ExecError;
use thiserror::Error;

/// Command output did not have the expected shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Device printed nothing
    #[error("empty output")]
    EmptyOutput,

    /// Positional token is out of range
    #[error("no {field} at token {index} (output has {found} tokens)")]
    MissingToken {
        /// Name of the field being extracted
        field: &'static str,
        /// Expected position
        index: usize,
        /// Number of tokens actually present
        found: usize,
    },
}

/// Errors raised while talking to a device
#[derive(Error, Debug, Clone)]
pub enum DeviceError {
    /// Command could not be executed
    #[error("execution error: {0}")]
    Exec(#[from] ExecError),

    /// Output could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}
