//! Configuration loading and types

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mtfleet_core::{FleetConfig, RetryBudget};
use mtfleet_device::{CommandTable, FirmwareLayout, PackageVersionLayout, ParserLayout};
use mtfleet_exec::{DeviceTarget, HostKeyPolicy};
use serde::{Deserialize, Serialize};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "MTFLEET_CONFIG";
/// Environment variable overriding the default login secret
pub const SECRET_ENV: &str = "MTFLEET_SECRET";

/// Top-level configuration for mtfleet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Credentials applied to every device without overrides
    pub defaults: Defaults,
    /// Devices with optional per-device overrides
    #[serde(rename = "device")]
    pub devices: Vec<DeviceEntry>,
    /// Bare device addresses using the defaults
    pub hosts: Vec<String>,
    pub ssh: SshSettings,
    pub fleet: FleetSettings,
    pub parser: ParserSettings,
    /// RouterOS command strings
    pub commands: CommandTable,
    pub logging: LoggingConfig,
}

/// Fleet-wide login defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub port: u16,
    pub username: String,
    pub secret: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            port: 22,
            username: "admin".to_string(),
            secret: String::new(),
        }
    }
}

/// One `[[device]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub address: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub secret: Option<String>,
}

/// SSH transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshSettings {
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
    pub host_key_policy: HostKeyPolicy,
    /// Pinned fingerprints keyed by device address
    pub known_hosts: HashMap<String, String>,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            command_timeout_secs: 60,
            host_key_policy: HostKeyPolicy::default(),
            known_hosts: HashMap::new(),
        }
    }
}

impl SshSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// Sweep timing and parallelism
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetSettings {
    pub settle_delay_secs: u64,
    pub verify_attempts: u32,
    pub verify_backoff_secs: u64,
    pub concurrency: usize,
    pub disable_remote_shell: bool,
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            settle_delay_secs: 20,
            verify_attempts: 3,
            verify_backoff_secs: 20,
            concurrency: 1,
            disable_remote_shell: false,
        }
    }
}

/// Token positions in command output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    pub package_version_index: usize,
    pub firmware_current_index: usize,
    pub firmware_stored_index: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        let layout = ParserLayout::default();
        Self {
            package_version_index: layout.package.installed_version,
            firmware_current_index: layout.firmware.current,
            firmware_stored_index: layout.firmware.stored,
        }
    }
}

impl ParserSettings {
    pub fn layout(&self) -> ParserLayout {
        ParserLayout {
            package: PackageVersionLayout {
                installed_version: self.package_version_index,
            },
            firmware: FirmwareLayout {
                current: self.firmware_current_index,
                stored: self.firmware_stored_index,
            },
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Directory for the daily rolling log file; console only when unset
    pub directory: Option<PathBuf>,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("failed to read {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("failed to parse {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Find the configuration file to use
    ///
    /// An explicit path wins, then `MTFLEET_CONFIG`, then the first of the
    /// common locations that exists.
    pub fn locate(explicit: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        let paths = [
            Some(PathBuf::from("mtfleet.toml")),
            Some(PathBuf::from("/etc/mtfleet/mtfleet.toml")),
            dirs::config_dir().map(|p| p.join("mtfleet/mtfleet.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Apply overrides from the environment
    pub fn apply_env(&mut self) {
        self.override_secret(std::env::var(SECRET_ENV).ok());
    }

    fn override_secret(&mut self, secret: Option<String>) {
        if let Some(secret) = secret {
            self.defaults.secret = secret;
        }
    }

    /// Resolve every configured device, `[[device]]` entries first
    pub fn inventory(&self) -> Vec<DeviceTarget> {
        let entries = self.devices.iter().map(|entry| {
            DeviceTarget::new(
                &entry.address,
                entry.username.as_deref().unwrap_or(&self.defaults.username),
                entry.secret.as_deref().unwrap_or(&self.defaults.secret),
            )
            .with_port(entry.port.unwrap_or(self.defaults.port))
        });

        let hosts = self.hosts.iter().map(|address| {
            DeviceTarget::new(address, &self.defaults.username, &self.defaults.secret)
                .with_port(self.defaults.port)
        });

        entries.chain(hosts).collect()
    }

    /// Sweep settings for the orchestrator
    pub fn fleet_config(&self) -> FleetConfig {
        FleetConfig {
            settle_delay: Duration::from_secs(self.fleet.settle_delay_secs),
            retry: RetryBudget {
                max_attempts: self.fleet.verify_attempts,
                backoff: Duration::from_secs(self.fleet.verify_backoff_secs),
            },
            concurrency: self.fleet.concurrency,
            disable_remote_shell: self.fleet.disable_remote_shell,
        }
    }

    /// Reject configurations no sweep can run with
    ///
    /// # Errors
    /// Returns error on an empty inventory, blank addresses or invalid fleet settings
    pub fn validate(&self) -> eyre::Result<()> {
        let inventory = self.inventory();
        if inventory.is_empty() {
            eyre::bail!("no devices configured; add [[device]] entries or a hosts list");
        }
        if let Some(target) = inventory.iter().find(|t| t.address.trim().is_empty()) {
            eyre::bail!("device with empty address (user {})", target.username);
        }
        self.fleet_config()
            .validate()
            .map_err(|e| eyre::eyre!("invalid [fleet] section: {e}"))?;
        Ok(())
    }
}
