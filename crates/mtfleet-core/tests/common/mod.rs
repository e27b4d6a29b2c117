#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mtfleet_core::{DeviceWorkflow, FleetConfig, Timer};
use mtfleet_device::{CommandTable, DeviceInspector, ParserLayout, UpdateActuator};
use mtfleet_exec::{CommandResult, ConnectionError, Connector, DeviceTarget, ExecError, RemoteSession};

pub const VERSION_CHECK: &str = "system package update print";
pub const FIRMWARE_CHECK: &str = "system routerboard print";
pub const FIRMWARE_UPGRADE: &str = "system routerboard upgrade";
pub const UPDATE_CHECK: &str = "system package update check-for-updates";
pub const UPDATE_DOWNLOAD: &str = "system package update download";
pub const REBOOT: &str = "system reboot";

pub fn package_print(version: &str) -> String {
    format!("          channel: stable\r\n  installed-version: {version}\r\n")
}

pub fn routerboard_print(current: &str, stored: &str) -> String {
    format!(
        "       routerboard: yes\n        board-name: hAP\n             model: RB951Ui-2nD\n          revision: r2\n     serial-number: D6F00C2A1B2C\n     firmware-type: qca9531L\n  factory-firmware: 6.45.9\n  current-firmware: {current}\n  upgrade-firmware: {stored}\n"
    )
}

pub fn target(address: &str) -> DeviceTarget {
    DeviceTarget::new(address, "admin", "secret")
}

/// Simulated router: scripted answers before and after a reboot
#[derive(Default)]
pub struct MockDevice {
    responses: HashMap<String, String>,
    after_reboot: HashMap<String, String>,
    open_results: Mutex<VecDeque<Result<(), ConnectionError>>>,
    panic_on: Option<String>,
    failing: Option<String>,
    refuse_dispatch: bool,
    rebooted: AtomicBool,
    executed: Mutex<Vec<String>>,
    dispatched: Mutex<Vec<String>>,
    opens: AtomicUsize,
    sessions: AtomicUsize,
    closes: AtomicUsize,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, cmd: &str, stdout: impl Into<String>) -> Self {
        self.responses.insert(cmd.to_string(), stdout.into());
        self
    }

    pub fn after_reboot(mut self, cmd: &str, stdout: impl Into<String>) -> Self {
        self.after_reboot.insert(cmd.to_string(), stdout.into());
        self
    }

    /// Queue results for successive session opens; `Ok` once drained
    pub fn open_results(self, results: Vec<Result<(), ConnectionError>>) -> Self {
        *self.open_results.lock().unwrap() = results.into();
        self
    }

    pub fn unreachable(self, err: ConnectionError) -> Self {
        self.open_results(vec![Err(err.clone()), Err(err.clone()), Err(err.clone()), Err(err)])
    }

    pub fn panic_on(mut self, cmd: &str) -> Self {
        self.panic_on = Some(cmd.to_string());
        self
    }

    /// Break the channel whenever `cmd` is run
    pub fn fail_on(mut self, cmd: &str) -> Self {
        self.failing = Some(cmd.to_string());
        self
    }

    /// Refuse every fire-and-forget command
    pub fn refuse_dispatch(mut self) -> Self {
        self.refuse_dispatch = true;
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn count_executed(&self, cmd: &str) -> usize {
        self.executed().iter().filter(|c| c.as_str() == cmd).count()
    }

    pub fn dispatched(&self) -> Vec<String> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct MockSession {
    address: String,
    device: Arc<MockDevice>,
    closed: AtomicBool,
}

#[async_trait]
impl RemoteSession for MockSession {
    fn address(&self) -> &str {
        &self.address
    }

    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ExecError::NotConnected);
        }
        self.device.executed.lock().unwrap().push(cmd.to_string());

        if self.device.panic_on.as_deref() == Some(cmd) {
            panic!("device firmware crashed on {cmd}");
        }
        if self.device.failing.as_deref() == Some(cmd) {
            return Err(ExecError::ChannelError("channel closed by peer".to_string()));
        }

        let rebooted = self.device.rebooted.load(Ordering::SeqCst);
        let stdout = rebooted
            .then(|| self.device.after_reboot.get(cmd))
            .flatten()
            .or_else(|| self.device.responses.get(cmd))
            .cloned()
            .unwrap_or_default();

        Ok(CommandResult::from_stdout(stdout))
    }

    async fn run_with_timeout(
        &self,
        cmd: &str,
        _timeout: Duration,
    ) -> Result<CommandResult, ExecError> {
        self.run(cmd).await
    }

    async fn dispatch(&self, cmd: &str) -> Result<(), ExecError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ExecError::NotConnected);
        }
        if self.device.refuse_dispatch {
            return Err(ExecError::ChannelError(format!("device refused to execute '{cmd}'")));
        }
        self.device.dispatched.lock().unwrap().push(cmd.to_string());
        if cmd == REBOOT {
            self.device.rebooted.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), ExecError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.device.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}

/// Connector over a set of simulated routers
#[derive(Default)]
pub struct MockConnector {
    devices: HashMap<String, Arc<MockDevice>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, address: &str, device: MockDevice) -> Self {
        self.devices.insert(address.to_string(), Arc::new(device));
        self
    }

    pub fn device(&self, address: &str) -> Arc<MockDevice> {
        Arc::clone(&self.devices[address])
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, target: &DeviceTarget) -> Result<Box<dyn RemoteSession>, ConnectionError> {
        let device = self
            .devices
            .get(&target.address)
            .ok_or_else(|| ConnectionError::Unknown("no route to host".to_string()))?;

        device.opens.fetch_add(1, Ordering::SeqCst);
        let next = device.open_results.lock().unwrap().pop_front();
        if let Some(Err(e)) = next {
            return Err(e);
        }

        device.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            address: target.address.clone(),
            device: Arc::clone(device),
            closed: AtomicBool::new(false),
        }))
    }

    fn connector_type(&self) -> &'static str {
        "mock"
    }
}

/// Timer that records requested delays and returns immediately
#[derive(Default)]
pub struct RecordingTimer {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingTimer {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait]
impl Timer for RecordingTimer {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

pub fn inspector() -> DeviceInspector {
    DeviceInspector::new(
        Arc::new(CommandTable::routeros()),
        ParserLayout::default(),
        Duration::from_secs(5),
    )
}

pub fn workflow(
    connector: Arc<MockConnector>,
    timer: Arc<RecordingTimer>,
    config: &FleetConfig,
) -> Arc<DeviceWorkflow> {
    let commands = Arc::new(CommandTable::routeros());
    let actuator = UpdateActuator::new(Arc::clone(&commands), Duration::from_secs(5));

    Arc::new(DeviceWorkflow::new(
        connector,
        inspector(),
        actuator,
        timer,
        config,
    ))
}
