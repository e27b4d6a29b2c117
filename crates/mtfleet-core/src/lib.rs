//! mtfleet-core: Fleet update orchestration
//!
//! Implements the session manager, the post-action verifier, the per-device
//! update workflow and the `OrchestratorActor` that sweeps the inventory.

pub mod actor;
pub mod config;
pub mod error;
pub mod message;
pub mod report;
pub mod session;
pub mod state;
pub mod timer;
pub mod verifier;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use actor::orchestrator::{OrchestratorActor, OrchestratorActorArgs};
pub use config::{FleetConfig, RetryBudget};
pub use error::CoreError;
pub use message::{RunSweep, SweepSummary};
pub use report::{DeviceReport, DeviceResult, SweepKind};
pub use session::SessionManager;
pub use state::{DeviceStage, StageTracker};
pub use timer::{Timer, TokioTimer};
pub use verifier::{Comparison, PostActionVerifier, Probe, Verification};
pub use workflow::DeviceWorkflow;
