//! Per-device update workflow
//!
//! One call handles one device for one sweep: open a session, inspect,
//! act, close, and when the action rebooted the device wait for it to
//! settle and hand over to the verifier. The session is closed on every
//! path before any wait starts.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mtfleet_device::{ActionOutcome, DeviceInspector, UpdateActuator, VersionFact};
use mtfleet_exec::{Connector, DeviceTarget, RemoteSession};
use tracing::{error, info, instrument};

use crate::config::FleetConfig;
use crate::error::CoreError;
use crate::report::{DeviceReport, DeviceResult, SweepKind};
use crate::session::SessionManager;
use crate::state::{DeviceStage, StageTracker};
use crate::timer::Timer;
use crate::verifier::{PostActionVerifier, Probe, Verification};

/// Result of the inspect/act part, decided while the session is open
struct Step {
    baseline: Option<VersionFact>,
    /// `None` when inspection failed and no decision could be made
    outcome: Option<ActionOutcome>,
}

/// In-flight bookkeeping for one device
struct DeviceRun {
    address: String,
    sweep: SweepKind,
    tracker: StageTracker,
    outcome: Option<ActionOutcome>,
    verification: Option<Verification>,
    started_at: DateTime<Utc>,
}

impl DeviceRun {
    fn new(target: &DeviceTarget, sweep: SweepKind) -> Self {
        Self {
            address: target.address.clone(),
            sweep,
            tracker: StageTracker::new(&target.address),
            outcome: None,
            verification: None,
            started_at: Utc::now(),
        }
    }

    fn advance(&mut self, next: DeviceStage) -> Result<(), CoreError> {
        self.tracker.advance(next)
    }

    fn finish(mut self, result: DeviceResult) -> Result<DeviceReport, CoreError> {
        self.tracker.advance(DeviceStage::Done)?;
        Ok(DeviceReport {
            address: self.address,
            sweep: self.sweep,
            result,
            outcome: self.outcome,
            verification: self.verification,
            stages: self.tracker.history().to_vec(),
            started_at: self.started_at,
            finished_at: Utc::now(),
        })
    }
}

fn probe_for(sweep: SweepKind) -> Option<Probe> {
    match sweep {
        SweepKind::PackageUpdate => Some(Probe::PackageVersion),
        SweepKind::FirmwareUpgrade => Some(Probe::CurrentFirmware),
        SweepKind::RemoteShellLockdown => None,
    }
}

/// Sequences inspector, actuator and verifier for a single device
pub struct DeviceWorkflow {
    sessions: SessionManager,
    inspector: Arc<DeviceInspector>,
    actuator: UpdateActuator,
    verifier: PostActionVerifier,
    timer: Arc<dyn Timer>,
    settle_delay: Duration,
}

impl std::fmt::Debug for DeviceWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceWorkflow")
            .field("sessions", &self.sessions)
            .field("verifier", &self.verifier)
            .field("settle_delay", &self.settle_delay)
            .finish_non_exhaustive()
    }
}

impl DeviceWorkflow {
    /// Wire up a workflow
    ///
    /// # Arguments
    /// * `connector` - Opens sessions for both the sweep and the verifier
    /// * `inspector` - Read-only fact extraction
    /// * `actuator` - Mutating commands
    /// * `timer` - Source of settle and backoff delays
    /// * `config` - Settle delay and verifier retry budget
    pub fn new(
        connector: Arc<dyn Connector>,
        inspector: DeviceInspector,
        actuator: UpdateActuator,
        timer: Arc<dyn Timer>,
        config: &FleetConfig,
    ) -> Self {
        let sessions = SessionManager::new(connector);
        let inspector = Arc::new(inspector);
        let verifier = PostActionVerifier::new(
            sessions.clone(),
            Arc::clone(&inspector),
            Arc::clone(&timer),
            config.retry,
        );

        Self {
            sessions,
            inspector,
            actuator,
            verifier,
            timer,
            settle_delay: config.settle_delay,
        }
    }

    /// Handle one device for the given sweep
    ///
    /// # Errors
    /// Returns `CoreError::InvalidTransition` if the steps ran out of order
    #[instrument(skip_all, fields(device = %target.address, sweep = %sweep))]
    pub async fn run(
        &self,
        sweep: SweepKind,
        target: &DeviceTarget,
    ) -> Result<DeviceReport, CoreError> {
        let mut run = DeviceRun::new(target, sweep);
        run.advance(DeviceStage::Connecting)?;

        let Some(session) = self.sessions.open(target).await else {
            return run.finish(DeviceResult::Skipped);
        };

        let step = self.act(sweep, &mut run, session.as_ref()).await;
        self.sessions.close(session).await;
        let step = step?;

        run.advance(DeviceStage::Closing)?;
        run.outcome = step.outcome;

        let result = match (step.outcome, probe_for(sweep)) {
            (Some(ActionOutcome::Applied), Some(probe)) => {
                run.advance(DeviceStage::Settling)?;
                self.timer.sleep(self.settle_delay).await;

                run.advance(DeviceStage::Verifying)?;
                let verification = self
                    .verifier
                    .verify(target, probe, step.baseline.as_ref())
                    .await;
                let result = if verification.is_unreachable() {
                    DeviceResult::Failed("unreachable after reboot".to_string())
                } else {
                    DeviceResult::Updated
                };
                run.verification = Some(verification);
                result
            }
            (Some(ActionOutcome::Applied), None) => DeviceResult::Updated,
            (Some(ActionOutcome::NotNeeded), _) => DeviceResult::UpToDate,
            (Some(ActionOutcome::InsufficientResource), _) => {
                DeviceResult::Failed("not enough disk space".to_string())
            }
            (Some(ActionOutcome::Unconfirmed), _) => {
                DeviceResult::Failed("reboot could not be sent".to_string())
            }
            (Some(ActionOutcome::TransportFailure), _) => {
                DeviceResult::Failed(format!("{sweep} failed"))
            }
            (None, _) => DeviceResult::Failed("inspection failed".to_string()),
        };

        run.finish(result)
    }

    async fn act(
        &self,
        sweep: SweepKind,
        run: &mut DeviceRun,
        session: &dyn RemoteSession,
    ) -> Result<Step, CoreError> {
        run.advance(DeviceStage::Inspecting)?;
        let device = session.address();

        match sweep {
            SweepKind::PackageUpdate => {
                let baseline = self.inspector.package_version(session).await;
                if let Some(version) = &baseline {
                    info!(device = %device, version = %version, "installed version");
                }

                match self.actuator.try_check_for_update(session).await {
                    Ok(true) => {}
                    Ok(false) => {
                        return Ok(Step {
                            baseline,
                            outcome: Some(ActionOutcome::NotNeeded),
                        });
                    }
                    Err(e) => {
                        error!(device = %device, error = %e, "update check failed");
                        return Ok(Step {
                            baseline,
                            outcome: Some(ActionOutcome::TransportFailure),
                        });
                    }
                }

                run.advance(DeviceStage::Acting)?;
                let outcome = self.actuator.download_update(session).await;
                Ok(Step {
                    baseline,
                    outcome: Some(outcome),
                })
            }
            SweepKind::FirmwareUpgrade => {
                let Some(firmware) = self.inspector.firmware_versions(session).await else {
                    return Ok(Step {
                        baseline: None,
                        outcome: None,
                    });
                };

                if !firmware.needs_upgrade() {
                    info!(device = %device, firmware = %firmware.current, "firmware is already up to date");
                    return Ok(Step {
                        baseline: Some(firmware.current),
                        outcome: Some(ActionOutcome::NotNeeded),
                    });
                }

                info!(
                    device = %device,
                    current = %firmware.current,
                    stored = %firmware.stored,
                    "firmware needs upgrade"
                );
                run.advance(DeviceStage::Acting)?;
                let outcome = self.actuator.upgrade_firmware(session).await;
                Ok(Step {
                    baseline: Some(firmware.current),
                    outcome: Some(outcome),
                })
            }
            SweepKind::RemoteShellLockdown => {
                info!(device = %device, "disabling ssh service");

                run.advance(DeviceStage::Acting)?;
                let outcome = self.actuator.disable_remote_shell(session).await;
                Ok(Step {
                    baseline: None,
                    outcome: Some(outcome),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mtfleet_device::CommandTable;

    use super::*;
    use crate::report::DeviceResult;
    use crate::testing::{self, NoWait, StubConnector, capture_logs};

    fn workflow(connector: StubConnector) -> DeviceWorkflow {
        DeviceWorkflow::new(
            Arc::new(connector),
            testing::inspector(),
            UpdateActuator::new(Arc::new(CommandTable::routeros()), Duration::from_secs(5)),
            Arc::new(NoWait),
            &FleetConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_current_firmware_is_logged_as_info_only() {
        let connector = StubConnector::new().respond(
            "system routerboard print",
            testing::routerboard_print("6.49.7", "6.49.7"),
        );
        let (logs, _guard) = capture_logs();

        let report = workflow(connector)
            .run(SweepKind::FirmwareUpgrade, &DeviceTarget::new("10.0.0.1", "admin", ""))
            .await
            .unwrap();

        assert_eq!(report.result, DeviceResult::UpToDate);
        let lines = logs.lines_containing("firmware is already up to date");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains("6.49.7"));
        assert!(logs.lines_containing("ERROR").is_empty());
        assert!(logs.lines_containing("WARN").is_empty());
    }

    #[tokio::test]
    async fn test_lockdown_only_disables_ssh() {
        let (logs, _guard) = capture_logs();

        let report = workflow(StubConnector::new())
            .run(SweepKind::RemoteShellLockdown, &DeviceTarget::new("10.0.0.1", "admin", ""))
            .await
            .unwrap();

        assert_eq!(report.result, DeviceResult::Updated);
        assert_eq!(logs.lines_containing("disabling ssh service").len(), 1);
        assert!(logs.lines_containing("read package version").is_empty());
    }
}
