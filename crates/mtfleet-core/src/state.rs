//! Per-device stage machine
//!
//! A device moves through `Connecting -> Inspecting -> Acting -> Closing ->
//! Settling -> Verifying -> Done`. Acting before inspecting would lose the
//! baseline, and verifying before settling would race the reboot, so the
//! tracker refuses any other order.

use tracing::debug;

use crate::error::CoreError;

/// Stage of one device within a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStage {
    Pending,
    Connecting,
    Inspecting,
    Acting,
    Closing,
    Settling,
    Verifying,
    Done,
}

impl DeviceStage {
    /// Whether `next` may follow `self`
    #[must_use]
    pub fn can_transition_to(self, next: DeviceStage) -> bool {
        use DeviceStage::{Acting, Closing, Connecting, Done, Inspecting, Pending, Settling, Verifying};

        matches!(
            (self, next),
            (Pending, Connecting | Done)
                | (Connecting, Inspecting | Done)
                | (Inspecting, Acting | Closing)
                | (Acting, Closing)
                | (Closing, Settling | Done)
                | (Settling, Verifying)
                | (Verifying, Done)
        )
    }
}

impl std::fmt::Display for DeviceStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceStage::Pending => "pending",
            DeviceStage::Connecting => "connecting",
            DeviceStage::Inspecting => "inspecting",
            DeviceStage::Acting => "acting",
            DeviceStage::Closing => "closing",
            DeviceStage::Settling => "settling",
            DeviceStage::Verifying => "verifying",
            DeviceStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Tracks and validates the stage of one device
#[derive(Debug, Clone)]
pub struct StageTracker {
    device: String,
    stage: DeviceStage,
    history: Vec<DeviceStage>,
}

impl StageTracker {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            stage: DeviceStage::Pending,
            history: vec![DeviceStage::Pending],
        }
    }

    #[must_use]
    pub fn stage(&self) -> DeviceStage {
        self.stage
    }

    /// Stages visited so far, in order
    #[must_use]
    pub fn history(&self) -> &[DeviceStage] {
        &self.history
    }

    /// Move to `next`
    ///
    /// # Errors
    /// Returns `CoreError::InvalidTransition` if `next` may not follow the current stage
    pub fn advance(&mut self, next: DeviceStage) -> Result<(), CoreError> {
        if !self.stage.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }

        debug!(device = %self.device, from = %self.stage, to = %next, "stage transition");
        self.stage = next;
        self.history.push(next);
        Ok(())
    }
}
