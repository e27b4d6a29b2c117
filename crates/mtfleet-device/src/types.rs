//! Type definitions for device facts and action outcomes

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A version token read from a device at one point in time
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionFact(String);

impl VersionFact {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte-wise string order, as RouterOS tooling has always compared
    /// versions. `"10.0"` sorts before `"9.0"`.
    #[must_use]
    pub fn compare_lexical(&self, other: &VersionFact) -> Ordering {
        self.0.as_bytes().cmp(other.0.as_bytes())
    }
}

impl std::fmt::Display for VersionFact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routerboard firmware versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersions {
    /// Firmware currently running
    pub current: VersionFact,
    /// Firmware stored on the device, applied on next upgrade
    pub stored: VersionFact,
}

impl FirmwareVersions {
    /// An upgrade is needed whenever the two fields differ
    #[must_use]
    pub fn needs_upgrade(&self) -> bool {
        self.current != self.stored
    }
}

/// Result of a mutating command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Command succeeded and the reboot was dispatched
    Applied,
    /// Nothing to do on this device
    NotNeeded,
    /// Device reported not enough disk space
    InsufficientResource,
    /// Command succeeded but the reboot could not be dispatched
    Unconfirmed,
    /// Command failed or returned an unexpected response
    TransportFailure,
}

impl std::fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionOutcome::Applied => write!(f, "applied"),
            ActionOutcome::NotNeeded => write!(f, "not needed"),
            ActionOutcome::InsufficientResource => write!(f, "insufficient resource"),
            ActionOutcome::Unconfirmed => write!(f, "unconfirmed"),
            ActionOutcome::TransportFailure => write!(f, "transport failure"),
        }
    }
}
