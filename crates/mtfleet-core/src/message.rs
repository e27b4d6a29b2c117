//! Message types for actor communication
//!
//! Message handlers are implemented in their respective actor modules.

use kameo_macros::Reply;

use crate::report::{DeviceReport, DeviceResult, SweepKind};

/// Run one sweep over the whole inventory
#[derive(Debug)]
pub struct RunSweep {
    pub kind: SweepKind,
}

/// Sweep result
#[derive(Debug, Clone, Reply)]
pub struct SweepSummary {
    /// Sweep that produced this summary
    pub kind: SweepKind,
    /// Devices in the inventory
    pub total: usize,
    /// Devices where the action was applied
    pub updated: usize,
    /// Devices with nothing to do
    pub up_to_date: usize,
    /// Devices without a session
    pub skipped: usize,
    /// Devices whose handling failed
    pub failed: usize,
    /// Devices not started because the run was aborted
    pub cancelled: usize,
    /// Per-device reports, in inventory order
    pub reports: Vec<DeviceReport>,
}

impl SweepSummary {
    /// Tally per-device reports
    #[must_use]
    pub fn from_reports(kind: SweepKind, reports: Vec<DeviceReport>) -> Self {
        let count = |f: fn(&DeviceResult) -> bool| reports.iter().filter(|r| f(&r.result)).count();

        Self {
            kind,
            total: reports.len(),
            updated: count(|r| matches!(r, DeviceResult::Updated)),
            up_to_date: count(|r| matches!(r, DeviceResult::UpToDate)),
            skipped: count(|r| matches!(r, DeviceResult::Skipped)),
            failed: count(|r| matches!(r, DeviceResult::Failed(_))),
            cancelled: count(|r| matches!(r, DeviceResult::Cancelled)),
            reports,
        }
    }

    /// Report for a device address
    #[must_use]
    pub fn report(&self, address: &str) -> Option<&DeviceReport> {
        self.reports.iter().find(|r| r.address == address)
    }
}
