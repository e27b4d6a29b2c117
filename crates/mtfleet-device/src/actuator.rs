//! Mutating device commands
//!
//! RouterOS reports the result of `check-for-updates` and `download` as a
//! `status:` line, and the routerboard upgrade stays silent on success. The
//! markers below are matched literally.

use std::sync::Arc;
use std::time::Duration;

use mtfleet_exec::{ExecError, RemoteSession};
use tracing::{error, info, instrument};

use crate::commands::{CommandTable, DeviceCommand};
use crate::types::ActionOutcome;

/// Marker printed by `check-for-updates` when a newer package exists
pub const NEW_VERSION_MARKER: &str = "status: New version is available";
/// Marker printed by `download` once the package is staged
pub const DOWNLOADED_MARKER: &str = "status: Downloaded, please reboot router to upgrade it";
/// Marker printed by `download` when storage is full
pub const NO_DISK_SPACE_MARKER: &str = "ERROR: not enough disk space";

/// Extract the value of the `status:` line, if any
fn status_line(output: &str) -> Option<&str> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("status:"))
        .map(str::trim)
        .last()
}

/// Runs update, upgrade and reboot commands
#[derive(Debug, Clone)]
pub struct UpdateActuator {
    commands: Arc<CommandTable>,
    command_timeout: Duration,
}

impl UpdateActuator {
    /// Create a new actuator
    #[must_use]
    pub fn new(commands: Arc<CommandTable>, command_timeout: Duration) -> Self {
        Self {
            commands,
            command_timeout,
        }
    }

    /// Whether the update server offers a newer package, propagating
    /// transport errors.
    ///
    /// A device without internet access answers with an error status and is
    /// reported as having no update, not as a failure.
    ///
    /// # Errors
    /// Returns `ExecError` if the command could not be run
    #[instrument(skip_all, fields(device = %session.address()))]
    pub async fn try_check_for_update(&self, session: &dyn RemoteSession) -> Result<bool, ExecError> {
        let device = session.address();
        let cmd = self.commands.get(DeviceCommand::UpdateCheck);

        let result = session.run_with_timeout(cmd, self.command_timeout).await?;
        if result.stdout.contains(NEW_VERSION_MARKER) {
            info!(device = %device, "new version is available");
            Ok(true)
        } else {
            let status = status_line(&result.stdout).unwrap_or("no status reported");
            info!(device = %device, status = %status, "new version is not available");
            Ok(false)
        }
    }

    /// Whether the update server offers a newer package, or `false` after
    /// logging a transport failure
    pub async fn check_for_update(&self, session: &dyn RemoteSession) -> bool {
        match self.try_check_for_update(session).await {
            Ok(available) => available,
            Err(e) => {
                error!(device = %session.address(), error = %e, "update check failed");
                false
            }
        }
    }

    /// Download the newer package and reboot into it
    #[instrument(skip_all, fields(device = %session.address()))]
    pub async fn download_update(&self, session: &dyn RemoteSession) -> ActionOutcome {
        let device = session.address();
        let cmd = self.commands.get(DeviceCommand::UpdateDownload);

        let output = match session.run_with_timeout(cmd, self.command_timeout).await {
            Ok(result) => result.stdout,
            Err(e) => {
                error!(device = %device, error = %e, "update download failed");
                return ActionOutcome::TransportFailure;
            }
        };

        if output.contains(DOWNLOADED_MARKER) {
            info!(device = %device, "update downloaded, rebooting to install");
            self.reboot(session).await
        } else if output.contains(NO_DISK_SPACE_MARKER) {
            error!(device = %device, "not enough disk space");
            ActionOutcome::InsufficientResource
        } else {
            error!(device = %device, response = %output.trim(), "update was not downloaded");
            ActionOutcome::TransportFailure
        }
    }

    /// Stage the routerboard firmware upgrade and reboot to apply it
    #[instrument(skip_all, fields(device = %session.address()))]
    pub async fn upgrade_firmware(&self, session: &dyn RemoteSession) -> ActionOutcome {
        let device = session.address();
        let cmd = self.commands.get(DeviceCommand::FirmwareUpgrade);

        match session.run_with_timeout(cmd, self.command_timeout).await {
            Ok(result) if result.is_silent() => {
                info!(device = %device, "firmware upgrade staged, rebooting");
                self.reboot(session).await
            }
            Ok(result) => {
                error!(device = %device, response = %result.stdout, "firmware upgrade refused");
                ActionOutcome::TransportFailure
            }
            Err(e) => {
                error!(device = %device, error = %e, "firmware upgrade failed");
                ActionOutcome::TransportFailure
            }
        }
    }

    /// Turn off the SSH service; the current session stays usable until closed
    #[instrument(skip_all, fields(device = %session.address()))]
    pub async fn disable_remote_shell(&self, session: &dyn RemoteSession) -> ActionOutcome {
        let device = session.address();
        let cmd = self.commands.get(DeviceCommand::DisableSsh);

        match session.run_with_timeout(cmd, self.command_timeout).await {
            Ok(result) if result.is_silent() => {
                info!(device = %device, "ssh service disabled");
                ActionOutcome::Applied
            }
            Ok(result) => {
                error!(device = %device, response = %result.stdout, "ssh service not disabled");
                ActionOutcome::TransportFailure
            }
            Err(e) => {
                error!(device = %device, error = %e, "disable ssh failed");
                ActionOutcome::TransportFailure
            }
        }
    }

    /// Fire the reboot without waiting for the device to go down
    async fn reboot(&self, session: &dyn RemoteSession) -> ActionOutcome {
        let device = session.address();
        let cmd = self.commands.get(DeviceCommand::SystemReboot);

        match session.dispatch(cmd).await {
            Ok(()) => {
                info!(device = %device, "reboot sent");
                ActionOutcome::Applied
            }
            Err(e) => {
                error!(device = %device, error = %e, "reboot could not be sent");
                ActionOutcome::Unconfirmed
            }
        }
    }
}
