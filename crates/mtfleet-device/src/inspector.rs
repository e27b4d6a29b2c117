//! Read-only device inspection

use std::sync::Arc;
use std::time::Duration;

use mtfleet_exec::RemoteSession;
use tracing::{debug, error, instrument};

use crate::commands::{CommandTable, DeviceCommand};
use crate::error::DeviceError;
use crate::parser::{FactParser, ParserLayout};
use crate::types::{FirmwareVersions, VersionFact};

/// Runs inspection commands and parses their output into facts
#[derive(Debug, Clone)]
pub struct DeviceInspector {
    commands: Arc<CommandTable>,
    layout: ParserLayout,
    command_timeout: Duration,
}

impl DeviceInspector {
    /// Create a new inspector
    ///
    /// # Arguments
    /// * `commands` - Command table shared with the actuator
    /// * `layout` - Token positions of the inspected fields
    /// * `command_timeout` - Upper bound for each inspection command
    #[must_use]
    pub fn new(commands: Arc<CommandTable>, layout: ParserLayout, command_timeout: Duration) -> Self {
        Self {
            commands,
            layout,
            command_timeout,
        }
    }

    async fn read(
        &self,
        session: &dyn RemoteSession,
        command: DeviceCommand,
    ) -> Result<String, DeviceError> {
        let result = session
            .run_with_timeout(self.commands.get(command), self.command_timeout)
            .await?;
        Ok(result.stdout)
    }

    /// Installed package version, propagating errors
    ///
    /// # Errors
    /// Returns `DeviceError` if the command fails or its output is malformed
    pub async fn try_package_version(
        &self,
        session: &dyn RemoteSession,
    ) -> Result<VersionFact, DeviceError> {
        let output = self.read(session, DeviceCommand::VersionCheck).await?;
        Ok(self.layout.package.parse(&output)?)
    }

    /// Routerboard firmware versions, propagating errors
    ///
    /// # Errors
    /// Returns `DeviceError` if the command fails or its output is malformed
    pub async fn try_firmware_versions(
        &self,
        session: &dyn RemoteSession,
    ) -> Result<FirmwareVersions, DeviceError> {
        let output = self.read(session, DeviceCommand::FirmwareCheck).await?;
        Ok(self.layout.firmware.parse(&output)?)
    }

    /// Installed package version, or `None` after logging the failure
    #[instrument(skip_all, fields(device = %session.address()))]
    pub async fn package_version(&self, session: &dyn RemoteSession) -> Option<VersionFact> {
        match self.try_package_version(session).await {
            Ok(version) => {
                debug!(version = %version, "read package version");
                Some(version)
            }
            Err(e) => {
                error!(device = %session.address(), error = %e, "version check failed");
                None
            }
        }
    }

    /// Routerboard firmware versions, or `None` after logging the failure
    #[instrument(skip_all, fields(device = %session.address()))]
    pub async fn firmware_versions(&self, session: &dyn RemoteSession) -> Option<FirmwareVersions> {
        match self.try_firmware_versions(session).await {
            Ok(firmware) => {
                debug!(current = %firmware.current, stored = %firmware.stored, "read firmware versions");
                Some(firmware)
            }
            Err(e) => {
                error!(device = %session.address(), error = %e, "firmware check failed");
                None
            }
        }
    }
}
