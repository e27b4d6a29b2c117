//! RouterOS command table
//!
//! The device side only understands these exact strings. The table is built
//! once (defaults or configuration) and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Actions the fleet tooling can ask a device to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCommand {
    /// Print installed package version
    VersionCheck,
    /// Print routerboard firmware versions
    FirmwareCheck,
    /// Stage the routerboard firmware upgrade
    FirmwareUpgrade,
    /// Ask the update server for a newer package
    UpdateCheck,
    /// Download the newer package
    UpdateDownload,
    /// Disable the SSH service
    DisableSsh,
    /// Reboot the router
    SystemReboot,
}

impl DeviceCommand {
    /// Every command, in table order
    pub const ALL: [DeviceCommand; 7] = [
        DeviceCommand::VersionCheck,
        DeviceCommand::FirmwareCheck,
        DeviceCommand::FirmwareUpgrade,
        DeviceCommand::UpdateCheck,
        DeviceCommand::UpdateDownload,
        DeviceCommand::DisableSsh,
        DeviceCommand::SystemReboot,
    ];
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceCommand::VersionCheck => write!(f, "version check"),
            DeviceCommand::FirmwareCheck => write!(f, "firmware check"),
            DeviceCommand::FirmwareUpgrade => write!(f, "firmware upgrade"),
            DeviceCommand::UpdateCheck => write!(f, "update check"),
            DeviceCommand::UpdateDownload => write!(f, "update download"),
            DeviceCommand::DisableSsh => write!(f, "disable ssh"),
            DeviceCommand::SystemReboot => write!(f, "system reboot"),
        }
    }
}

/// Immutable mapping from [`DeviceCommand`] to the literal command string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandTable {
    version_check: String,
    firmware_check: String,
    firmware_upgrade: String,
    update_check: String,
    update_download: String,
    disable_ssh: String,
    system_reboot: String,
}

impl CommandTable {
    /// Command set understood by RouterOS 6.x/7.x
    #[must_use]
    pub fn routeros() -> Self {
        Self {
            version_check: "system package update print".to_string(),
            firmware_check: "system routerboard print".to_string(),
            firmware_upgrade: "system routerboard upgrade".to_string(),
            update_check: "system package update check-for-updates".to_string(),
            update_download: "system package update download".to_string(),
            disable_ssh: "ip service disable ssh".to_string(),
            system_reboot: "system reboot".to_string(),
        }
    }

    /// Literal command for an action
    #[must_use]
    pub fn get(&self, command: DeviceCommand) -> &str {
        match command {
            DeviceCommand::VersionCheck => &self.version_check,
            DeviceCommand::FirmwareCheck => &self.firmware_check,
            DeviceCommand::FirmwareUpgrade => &self.firmware_upgrade,
            DeviceCommand::UpdateCheck => &self.update_check,
            DeviceCommand::UpdateDownload => &self.update_download,
            DeviceCommand::DisableSsh => &self.disable_ssh,
            DeviceCommand::SystemReboot => &self.system_reboot,
        }
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::routeros()
    }
}
