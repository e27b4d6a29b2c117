//! Session and connector traits

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ConnectionError, ExecError};
use crate::result::{CommandResult, DeviceTarget};

/// An open, authenticated command channel bound to one device.
///
/// Owned by whoever opened it. Callers must call [`RemoteSession::close`]
/// on every exit path; any command issued afterwards fails with
/// [`ExecError::NotConnected`].
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Address of the device this session is bound to
    fn address(&self) -> &str;

    /// Run a command and collect its full output
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError>;

    /// Run a command, giving up after `timeout`
    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<CommandResult, ExecError>;

    /// Send a command and wait only until the device accepts it (used for
    /// reboot). No output is collected.
    async fn dispatch(&self, cmd: &str) -> Result<(), ExecError>;

    /// Close the underlying connection
    async fn close(&self) -> Result<(), ExecError>;

    /// Whether the session is still open
    fn is_open(&self) -> bool;
}

/// Opens sessions against device targets
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open and authenticate a session
    async fn open(&self, target: &DeviceTarget) -> Result<Box<dyn RemoteSession>, ConnectionError>;

    fn connector_type(&self) -> &'static str;
}
