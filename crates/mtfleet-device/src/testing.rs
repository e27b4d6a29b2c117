//! Scripted session used by unit tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mtfleet_exec::{CommandResult, ExecError, RemoteSession};

/// Session that answers commands from a fixed script and records every call
#[derive(Default)]
pub(crate) struct ScriptedSession {
    responses: HashMap<String, Result<String, ExecError>>,
    executed: Mutex<Vec<String>>,
    dispatched: Mutex<Vec<String>>,
    fail_dispatch: bool,
    closed: AtomicBool,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, cmd: &str, stdout: &str) -> Self {
        self.responses.insert(cmd.to_string(), Ok(stdout.to_string()));
        self
    }

    pub fn fail(mut self, cmd: &str, err: ExecError) -> Self {
        self.responses.insert(cmd.to_string(), Err(err));
        self
    }

    pub fn fail_dispatch(mut self) -> Self {
        self.fail_dispatch = true;
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn dispatched(&self) -> Vec<String> {
        self.dispatched.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    fn address(&self) -> &str {
        "10.0.0.1"
    }

    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ExecError::NotConnected);
        }
        self.executed.lock().unwrap().push(cmd.to_string());
        match self.responses.get(cmd) {
            Some(Ok(stdout)) => Ok(CommandResult::from_stdout(stdout.clone())),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(CommandResult::from_stdout("")),
        }
    }

    async fn run_with_timeout(
        &self,
        cmd: &str,
        _timeout: Duration,
    ) -> Result<CommandResult, ExecError> {
        self.run(cmd).await
    }

    async fn dispatch(&self, cmd: &str) -> Result<(), ExecError> {
        if self.fail_dispatch {
            return Err(ExecError::ChannelError("channel refused".to_string()));
        }
        self.dispatched.lock().unwrap().push(cmd.to_string());
        Ok(())
    }

    async fn close(&self) -> Result<(), ExecError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}
