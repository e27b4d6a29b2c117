//! Builds the device workflow from configuration

use std::sync::Arc;

use mtfleet_core::{DeviceWorkflow, TokioTimer};
use mtfleet_device::{DeviceInspector, UpdateActuator};
use mtfleet_exec::{HostKeyVerifier, SshConnector};
use tracing::info;

use crate::config::Config;

/// Wire SSH transport, inspector, actuator and verifier into one workflow
pub fn build_workflow(config: &Config) -> Arc<DeviceWorkflow> {
    let verifier = Arc::new(HostKeyVerifier::new(
        config.ssh.host_key_policy,
        config.ssh.known_hosts.clone(),
    ));
    let connector = Arc::new(SshConnector::new(verifier, config.ssh.connect_timeout()));

    let commands = Arc::new(config.commands.clone());
    let command_timeout = config.ssh.command_timeout();
    let inspector = DeviceInspector::new(Arc::clone(&commands), config.parser.layout(), command_timeout);
    let actuator = UpdateActuator::new(commands, command_timeout);

    info!(
        host_key_policy = ?config.ssh.host_key_policy,
        pinned = config.ssh.known_hosts.len(),
        connect_timeout = ?config.ssh.connect_timeout(),
        "ssh transport configured"
    );

    Arc::new(DeviceWorkflow::new(
        connector,
        inspector,
        actuator,
        Arc::new(TokioTimer),
        &config.fleet_config(),
    ))
}
