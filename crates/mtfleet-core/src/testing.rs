//! Test doubles and log capture shared by the unit tests

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mtfleet_device::{CommandTable, DeviceInspector, ParserLayout};
use mtfleet_exec::{CommandResult, ConnectionError, Connector, DeviceTarget, ExecError, RemoteSession};
use tracing::subscriber::DefaultGuard;

use crate::timer::Timer;

/// Formatted log output of the current thread
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    pub(crate) fn lines_containing(&self, needle: &str) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

/// Route events of the current thread into a buffer until the guard drops.
///
/// `#[tokio::test]` runs on a single thread, so async code under test logs
/// into the same buffer.
pub(crate) fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    (buffer, tracing::subscriber::set_default(subscriber))
}

/// Connector with queued open results and fixed command output
#[derive(Default)]
pub(crate) struct StubConnector {
    opens: Mutex<VecDeque<Result<(), ConnectionError>>>,
    output: HashMap<String, String>,
}

impl StubConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue results for successive opens; `Ok` once drained
    pub(crate) fn opens(self, results: Vec<Result<(), ConnectionError>>) -> Self {
        *self.opens.lock().unwrap() = results.into();
        self
    }

    pub(crate) fn respond(mut self, cmd: &str, stdout: impl Into<String>) -> Self {
        self.output.insert(cmd.to_string(), stdout.into());
        self
    }
}

#[async_trait]
impl Connector for StubConnector {
    async fn open(&self, target: &DeviceTarget) -> Result<Box<dyn RemoteSession>, ConnectionError> {
        if let Some(Err(e)) = self.opens.lock().unwrap().pop_front() {
            return Err(e);
        }
        Ok(Box::new(StubSession {
            address: target.address.clone(),
            output: self.output.clone(),
            closed: AtomicBool::new(false),
        }))
    }

    fn connector_type(&self) -> &'static str {
        "stub"
    }
}

struct StubSession {
    address: String,
    output: HashMap<String, String>,
    closed: AtomicBool,
}

#[async_trait]
impl RemoteSession for StubSession {
    fn address(&self) -> &str {
        &self.address
    }

    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        let stdout = self.output.get(cmd).cloned().unwrap_or_default();
        Ok(CommandResult::from_stdout(stdout))
    }

    async fn run_with_timeout(&self, cmd: &str, _timeout: Duration) -> Result<CommandResult, ExecError> {
        self.run(cmd).await
    }

    async fn dispatch(&self, _cmd: &str) -> Result<(), ExecError> {
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

/// Timer that returns immediately
pub(crate) struct NoWait;

#[async_trait]
impl Timer for NoWait {
    async fn sleep(&self, _duration: Duration) {}
}

pub(crate) fn inspector() -> DeviceInspector {
    DeviceInspector::new(
        Arc::new(CommandTable::routeros()),
        ParserLayout::default(),
        Duration::from_secs(5),
    )
}

pub(crate) fn package_print(version: &str) -> String {
    format!("          channel: stable\r\n  installed-version: {version}\r\n")
}

pub(crate) fn routerboard_print(current: &str, stored: &str) -> String {
    format!(
        "       routerboard: yes\n        board-name: hAP\n             model: RB951Ui-2nD\n          revision: r2\n     serial-number: D6F00C2A1B2C\n     firmware-type: qca9531L\n  factory-firmware: 6.45.9\n  current-firmware: {current}\n  upgrade-firmware: {stored}\n"
    )
}
