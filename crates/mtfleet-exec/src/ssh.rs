//! SSH sessions using russh crate

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use russh::keys::ssh_key::{self, HashAlg};
use russh::{ChannelMsg, Disconnect, client};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

use crate::error::{ConnectionError, ExecError};
use crate::host_keys::HostKeyVerifier;
use crate::result::{CommandResult, DeviceTarget};
use crate::traits::{Connector, RemoteSession};

/// SSH client handler for russh
#[derive(Debug)]
struct SshClientHandler {
    host: String,
    port: u16,
    verifier: Arc<HostKeyVerifier>,
}

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        let decision = self
            .verifier
            .check(&self.host, self.port, &fingerprint)
            .await;
        Ok(decision.is_trusted())
    }
}

/// Opens password-authenticated SSH sessions
pub struct SshConnector {
    config: Arc<client::Config>,
    verifier: Arc<HostKeyVerifier>,
    connect_timeout: Duration,
}

impl std::fmt::Debug for SshConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConnector")
            .field("policy", &self.verifier.policy())
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl SshConnector {
    /// Create a connector
    ///
    /// # Arguments
    /// * `verifier` - Host-key policy shared by every session of the run
    /// * `connect_timeout` - Upper bound for TCP connect, handshake and auth
    #[must_use]
    pub fn new(verifier: Arc<HostKeyVerifier>, connect_timeout: Duration) -> Self {
        Self {
            config: Arc::new(client::Config::default()),
            verifier,
            connect_timeout,
        }
    }

    async fn connect(
        &self,
        target: &DeviceTarget,
    ) -> Result<client::Handle<SshClientHandler>, ConnectionError> {
        let handler = SshClientHandler {
            host: target.address.clone(),
            port: target.port,
            verifier: Arc::clone(&self.verifier),
        };

        let mut session = client::connect(
            Arc::clone(&self.config),
            (&target.address[..], target.port),
            handler,
        )
        .await?;

        let auth_res = session
            .authenticate_password(target.username.as_str(), target.secret.as_str())
            .await?;

        if !auth_res.success() {
            return Err(ConnectionError::Unknown(
                "password authentication failed".to_string(),
            ));
        }

        Ok(session)
    }
}

#[async_trait]
impl Connector for SshConnector {
    #[instrument(skip(self, target), fields(device = %target.address))]
    async fn open(&self, target: &DeviceTarget) -> Result<Box<dyn RemoteSession>, ConnectionError> {
        debug!(
            port = target.port,
            user = %target.username,
            "connecting to SSH"
        );

        let session = timeout(self.connect_timeout, self.connect(target))
            .await
            .map_err(|_| ConnectionError::Timeout)??;

        info!(device = %target.address, "SSH connected and authenticated");

        Ok(Box::new(SshSession {
            address: target.address.clone(),
            session: Mutex::new(Some(session)),
        }))
    }

    fn connector_type(&self) -> &'static str {
        "ssh"
    }
}

/// An authenticated SSH connection to one device
pub struct SshSession {
    address: String,
    session: Mutex<Option<client::Handle<SshClientHandler>>>,
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("address", &self.address)
            .field("open", &self.is_open())
            .finish()
    }
}

impl SshSession {
    /// Execute command on remote host
    async fn execute_remote(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        let session_lock = self.session.lock().await;
        let session = session_lock.as_ref().ok_or(ExecError::NotConnected)?;

        debug!(command = %cmd, "executing remote command");

        let start = Instant::now();

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| ExecError::ChannelError(e.to_string()))?;

        channel
            .exec(true, cmd)
            .await
            .map_err(|e| ExecError::ChannelError(e.to_string()))?;

        let mut status = -1;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == 1 {
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    status = exit_status.cast_signed();
                }
                Some(ChannelMsg::Eof) | None => break,
                _ => {}
            }
        }

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&stdout).to_string();
        let stderr = String::from_utf8_lossy(&stderr).to_string();

        debug!(
            command = %cmd,
            status = status,
            duration = ?duration,
            "remote command completed"
        );

        Ok(CommandResult {
            status,
            stdout,
            stderr,
            duration,
        })
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    fn address(&self) -> &str {
        &self.address
    }

    #[instrument(skip(self), fields(device = %self.address))]
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        self.execute_remote(cmd).await
    }

    #[instrument(skip(self), fields(device = %self.address))]
    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout_duration: Duration,
    ) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        match timeout(timeout_duration, self.execute_remote(cmd)).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    command = %cmd,
                    timeout = ?timeout_duration,
                    elapsed = ?start.elapsed(),
                    "command timed out"
                );
                Err(ExecError::Timeout {
                    timeout: timeout_duration,
                })
            }
        }
    }

    #[instrument(skip(self), fields(device = %self.address))]
    async fn dispatch(&self, cmd: &str) -> Result<(), ExecError> {
        let session_lock = self.session.lock().await;
        let session = session_lock.as_ref().ok_or(ExecError::NotConnected)?;

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| ExecError::ChannelError(e.to_string()))?;

        channel
            .exec(true, cmd)
            .await
            .map_err(|e| ExecError::ChannelError(e.to_string()))?;

        // Wait for the exec request to be accepted, not for output:
        // the device drops the link while executing
        loop {
            match channel.wait().await {
                Some(ChannelMsg::Success) => {
                    debug!(command = %cmd, "command accepted");
                    return Ok(());
                }
                Some(ChannelMsg::Failure) => {
                    return Err(ExecError::ChannelError(format!(
                        "device refused to execute '{cmd}'"
                    )));
                }
                Some(_) => {}
                None => {
                    return Err(ExecError::ChannelError(
                        "channel closed before the command was accepted".to_string(),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), ExecError> {
        let mut session_lock = self.session.lock().await;

        if let Some(session) = session_lock.take() {
            session
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
                .map_err(|e| ExecError::IoError(e.to_string()))?;
            debug!(device = %self.address, "SSH disconnected");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        // Synchronous check; a locked session is in use and therefore open
        self.session
            .try_lock()
            .map(|s| s.is_some())
            .unwrap_or(true)
    }
}
