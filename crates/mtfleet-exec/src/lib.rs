//! mtfleet-exec: Remote command channel abstraction
//!
//! Provides the session traits the fleet core talks to, plus an SSH
//! implementation built on russh with a configurable host-key policy.

pub mod error;
pub mod host_keys;
pub mod result;
pub mod ssh;
pub mod traits;

pub use error::{ConnectionError, ExecError};
pub use host_keys::{HostKeyDecision, HostKeyPolicy, HostKeyVerifier};
pub use result::{CommandResult, DeviceTarget};
pub use ssh::{SshConnector, SshSession};
pub use traits::{Connector, RemoteSession};
