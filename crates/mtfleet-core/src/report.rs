//! Per-device sweep reports

use chrono::{DateTime, Utc};
use mtfleet_device::ActionOutcome;

use crate::state::DeviceStage;
use crate::verifier::Verification;

/// Purpose of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    /// Check, download and install RouterOS packages
    PackageUpdate,
    /// Upgrade routerboard firmware to the stored version
    FirmwareUpgrade,
    /// Disable the SSH service
    RemoteShellLockdown,
}

impl std::fmt::Display for SweepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepKind::PackageUpdate => write!(f, "package update"),
            SweepKind::FirmwareUpgrade => write!(f, "firmware upgrade"),
            SweepKind::RemoteShellLockdown => write!(f, "remote shell lockdown"),
        }
    }
}

/// What happened to one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceResult {
    /// Action applied; device came back after reboot
    Updated,
    /// Nothing to do
    UpToDate,
    /// No session could be opened
    Skipped,
    /// Handling failed
    Failed(String),
    /// Run was aborted before this device started
    Cancelled,
}

/// Record of one device's handling within a sweep
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub address: String,
    pub sweep: SweepKind,
    pub result: DeviceResult,
    /// Outcome of the mutating command, if one ran
    pub outcome: Option<ActionOutcome>,
    /// Verifier result, if the device was rebooted
    pub verification: Option<Verification>,
    /// Stages visited, in order
    pub stages: Vec<DeviceStage>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DeviceReport {
    /// Report for a device whose handling never produced its own report
    pub fn failed(address: impl Into<String>, sweep: SweepKind, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            address: address.into(),
            sweep,
            result: DeviceResult::Failed(reason.into()),
            outcome: None,
            verification: None,
            stages: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Report for a device skipped because the run was aborted
    pub fn cancelled(address: impl Into<String>, sweep: SweepKind) -> Self {
        let now = Utc::now();
        Self {
            address: address.into(),
            sweep,
            result: DeviceResult::Cancelled,
            outcome: None,
            verification: None,
            stages: vec![DeviceStage::Pending, DeviceStage::Done],
            started_at: now,
            finished_at: now,
        }
    }
}
