//! `OrchestratorActor`: Fleet-wide sweeps
//!
//! Owns the inventory and runs sweeps over it. Every device is handled in
//! its own task so that an error or panic stays within that device.

use std::sync::Arc;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use mtfleet_exec::DeviceTarget;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::FleetConfig;
use crate::error::CoreError;
use crate::message::{RunSweep, SweepSummary};
use crate::report::{DeviceReport, DeviceResult, SweepKind};
use crate::workflow::DeviceWorkflow;

/// Arguments for spawning an `OrchestratorActor`
pub struct OrchestratorActorArgs {
    /// Devices in sweep order
    pub inventory: Vec<DeviceTarget>,
    /// Per-device workflow shared by all tasks
    pub workflow: Arc<DeviceWorkflow>,
    /// Fleet settings
    pub config: FleetConfig,
    /// Set to `true` to stop before the next device
    pub shutdown: watch::Receiver<bool>,
}

/// Fleet orchestrator
pub struct OrchestratorActor {
    inventory: Vec<DeviceTarget>,
    workflow: Arc<DeviceWorkflow>,
    config: FleetConfig,
    shutdown: watch::Receiver<bool>,
}

impl OrchestratorActor {
    fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn sweep(&self, kind: SweepKind) -> SweepSummary {
        let total = self.inventory.len();
        let mut reports = Vec::with_capacity(total);

        info!(
            sweep = %kind,
            total_devices = total,
            concurrency = self.config.concurrency,
            "starting sweep"
        );

        for batch in self.inventory.chunks(self.config.concurrency) {
            if self.is_shutting_down() {
                warn!(sweep = %kind, remaining = total - reports.len(), "sweep aborted");
                reports.extend(
                    self.inventory[reports.len()..]
                        .iter()
                        .map(|t| DeviceReport::cancelled(&t.address, kind)),
                );
                break;
            }

            let mut handles = Vec::with_capacity(batch.len());

            for target in batch {
                let workflow = Arc::clone(&self.workflow);
                let device = target.clone();

                let handle = tokio::spawn(async move { workflow.run(kind, &device).await });
                handles.push((target.address.clone(), handle));
            }

            // Reports are collected in inventory order
            for (address, handle) in handles {
                let report = match handle.await {
                    Ok(Ok(report)) => report,
                    Ok(Err(e)) => {
                        error!(device = %address, error = %e, "device handling failed");
                        DeviceReport::failed(&address, kind, e.to_string())
                    }
                    Err(e) => {
                        error!(device = %address, error = %e, "device task panicked");
                        DeviceReport::failed(&address, kind, format!("task panicked: {e}"))
                    }
                };

                match &report.result {
                    DeviceResult::Failed(reason) => {
                        info!(device = %address, reason = %reason, "device finished with failure");
                    }
                    result => info!(device = %address, result = ?result, "device finished"),
                }
                reports.push(report);
            }
        }

        let summary = SweepSummary::from_reports(kind, reports);

        info!(
            sweep = %kind,
            total = summary.total,
            updated = summary.updated,
            up_to_date = summary.up_to_date,
            skipped = summary.skipped,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "sweep finished"
        );

        summary
    }
}

impl Actor for OrchestratorActor {
    type Args = OrchestratorActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        if args.inventory.is_empty() {
            return Err(CoreError::EmptyInventory);
        }
        args.config.validate()?;

        info!(
            id = %actor_ref.id(),
            devices = args.inventory.len(),
            "OrchestratorActor starting"
        );

        Ok(Self {
            inventory: args.inventory,
            workflow: args.workflow,
            config: args.config,
            shutdown: args.shutdown,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(reason = ?reason, "OrchestratorActor stopping");
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<RunSweep> for OrchestratorActor {
    type Reply = Result<SweepSummary, CoreError>;

    async fn handle(
        &mut self,
        msg: RunSweep,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.sweep(msg.kind).await)
    }
}
