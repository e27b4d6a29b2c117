//! Post-action verifier
//!
//! Entered after an action that reboots the device. Reboot time varies per
//! model, so the verifier polls with a fixed backoff instead of waiting a
//! fixed total. Worst case it sleeps `(max_attempts - 1) * backoff`.

use std::cmp::Ordering;
use std::sync::Arc;

use mtfleet_device::{DeviceInspector, VersionFact};
use mtfleet_exec::{DeviceTarget, RemoteSession};
use tracing::{debug, error, info, instrument};

use crate::config::RetryBudget;
use crate::session::SessionManager;
use crate::timer::Timer;

/// Which fact to re-read after reconnecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Installed package version
    PackageVersion,
    /// Currently running routerboard firmware
    CurrentFirmware,
}

/// How the post-action fact relates to the baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// New fact sorts after the baseline
    Newer { old: VersionFact, new: VersionFact },
    /// Nothing changed; the latest version was already installed
    Same(VersionFact),
    /// New fact sorts before the baseline
    Older { old: VersionFact, new: VersionFact },
    /// No baseline was recorded before the action
    MissingBaseline { new: Option<VersionFact> },
    /// Fact could not be read after reconnecting
    MissingCurrent { old: VersionFact },
}

impl Comparison {
    /// Compare two facts with byte-wise string order
    #[must_use]
    pub fn of(baseline: Option<&VersionFact>, current: Option<VersionFact>) -> Self {
        match (baseline, current) {
            (None, new) => Comparison::MissingBaseline { new },
            (Some(old), None) => Comparison::MissingCurrent { old: old.clone() },
            (Some(old), Some(new)) => match new.compare_lexical(old) {
                Ordering::Greater => Comparison::Newer {
                    old: old.clone(),
                    new,
                },
                Ordering::Equal => Comparison::Same(new),
                Ordering::Less => Comparison::Older {
                    old: old.clone(),
                    new,
                },
            },
        }
    }

    fn log(&self, device: &str) {
        match self {
            Comparison::Newer { old, new } => {
                info!(device = %device, old = %old, new = %new, "newer version installed");
            }
            Comparison::Same(version) => {
                info!(device = %device, version = %version, "latest already installed");
            }
            Comparison::Older { old, new } => {
                error!(device = %device, old = %old, new = %new, "version went backwards after action");
            }
            Comparison::MissingBaseline { new } => {
                let new = new.as_ref().map_or("unknown", VersionFact::as_str);
                error!(device = %device, new = %new, "no version recorded before action");
            }
            Comparison::MissingCurrent { old } => {
                error!(device = %device, old = %old, "version unreadable after action");
            }
        }
    }
}

/// Terminal state of a verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Device came back and the fact was compared
    Verified(Comparison),
    /// Device never accepted a session within the retry budget
    Unreachable { attempts: u32 },
}

impl Verification {
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Verification::Unreachable { .. })
    }
}

/// Non-terminal verifier states
enum Phase {
    AwaitingReconnect { attempt: u32 },
    Comparing { session: Box<dyn RemoteSession> },
}

/// Reconnects after a reboot and compares the fact against its baseline
#[derive(Clone)]
pub struct PostActionVerifier {
    sessions: SessionManager,
    inspector: Arc<DeviceInspector>,
    timer: Arc<dyn Timer>,
    budget: RetryBudget,
}

impl std::fmt::Debug for PostActionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostActionVerifier")
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

impl PostActionVerifier {
    #[must_use]
    pub fn new(
        sessions: SessionManager,
        inspector: Arc<DeviceInspector>,
        timer: Arc<dyn Timer>,
        budget: RetryBudget,
    ) -> Self {
        Self {
            sessions,
            inspector,
            timer,
            budget,
        }
    }

    async fn read(&self, probe: Probe, session: &dyn RemoteSession) -> Option<VersionFact> {
        match probe {
            Probe::PackageVersion => self.inspector.package_version(session).await,
            Probe::CurrentFirmware => self
                .inspector
                .firmware_versions(session)
                .await
                .map(|firmware| firmware.current),
        }
    }

    /// Run the reconnect/compare state machine to a terminal state
    #[instrument(skip_all, fields(device = %target.address, probe = ?probe))]
    pub async fn verify(
        &self,
        target: &DeviceTarget,
        probe: Probe,
        baseline: Option<&VersionFact>,
    ) -> Verification {
        let mut phase = Phase::AwaitingReconnect { attempt: 1 };

        loop {
            phase = match phase {
                Phase::AwaitingReconnect { attempt } => {
                    if attempt > 1 {
                        self.timer.sleep(self.budget.backoff).await;
                    }
                    debug!(attempt, max = self.budget.max_attempts, "reconnecting");

                    match self.sessions.open(target).await {
                        Some(session) => Phase::Comparing { session },
                        None if attempt < self.budget.max_attempts => {
                            Phase::AwaitingReconnect {
                                attempt: attempt + 1,
                            }
                        }
                        None => {
                            error!(device = %target.address, attempts = attempt, "can't connect after action");
                            return Verification::Unreachable { attempts: attempt };
                        }
                    }
                }
                Phase::Comparing { session } => {
                    let current = self.read(probe, session.as_ref()).await;
                    self.sessions.close(session).await;

                    let comparison = Comparison::of(baseline, current);
                    comparison.log(&target.address);
                    return Verification::Verified(comparison);
                }
            };
        }
    }
}
