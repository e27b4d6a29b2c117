//! Core error types for mtfleet-core

use thiserror::Error;

use crate::state::DeviceStage;

/// Errors that can occur in core orchestration
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Per-device steps were attempted out of order
    #[error("invalid stage transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current stage
        from: DeviceStage,
        /// Attempted target stage
        to: DeviceStage,
    },

    /// Inventory has no devices
    #[error("inventory is empty")]
    EmptyInventory,

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}
