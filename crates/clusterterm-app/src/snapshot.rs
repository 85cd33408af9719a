//! Headless sessions: run a remote shell into an in-memory screen and report
//! what it shows.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use clusterterm_terminal::types::{Dimensions, SessionError, Target};
use clusterterm_terminal::{
    ConnectionState, HostSurface, ResizeSignal, ScreenEmulator, SessionBridge,
    SignalRegistration, TerminalEmulator, TerminalEndpoint,
};

use crate::local::NoopRegistration;
use crate::transport::{LoopEvent, WsConnector};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    /// Typed once the session is open
    pub send: Option<String>,
    /// How long to collect output after open
    pub wait: Duration,
    pub size: Dimensions,
    pub connect_timeout: Duration,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            send: None,
            wait: Duration::from_millis(1000),
            size: Dimensions::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Final screen and connection outcome of a headless session
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotReport {
    pub screen: String,
    pub state: ConnectionState,
    pub error: Option<String>,
    pub remote_error: Option<String>,
}

impl SnapshotReport {
    pub fn succeeded(&self) -> bool {
        self.state != ConnectionState::Failed && self.error.is_none()
    }
}

/// Screen shared between the bridge and the caller reading it back
#[derive(Clone)]
struct SharedScreen(Rc<RefCell<ScreenEmulator>>);

impl TerminalEmulator for SharedScreen {
    fn write(&mut self, data: &str) {
        self.0.borrow_mut().write(data);
    }

    fn size(&self) -> Dimensions {
        self.0.borrow().size()
    }

    fn fit(&mut self) -> Option<Dimensions> {
        self.0.borrow_mut().fit()
    }

    fn dispose(&mut self) {
        self.0.borrow_mut().dispose();
    }
}

/// A surface whose geometry never changes
struct FixedSurface;

impl HostSurface for FixedSurface {
    fn observe(
        &mut self,
        _signal: ResizeSignal,
    ) -> Result<Box<dyn SignalRegistration>, SessionError> {
        Ok(Box::new(NoopRegistration))
    }
}

pub async fn run_snapshot(
    endpoint: &TerminalEndpoint,
    target: Target,
    options: SnapshotOptions,
) -> Result<SnapshotReport> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut connector = WsConnector::new(tx);
    let screen = Rc::new(RefCell::new(ScreenEmulator::new(options.size)));

    let mut bridge = SessionBridge::open(
        target,
        endpoint.clone(),
        &mut connector,
        Box::new(SharedScreen(screen.clone())),
        &mut FixedSurface,
    )?;

    let mut deadline = Instant::now() + options.connect_timeout;
    let mut opened = false;
    let mut timed_out = false;
    while !bridge.is_finished() {
        tokio::select! {
            event = rx.recv() => match event {
                Some(LoopEvent::Transport(event)) => bridge.handle_transport(event),
                Some(other) => debug!("Ignoring {:?} in headless session", other),
                None => break,
            },
            _ = sleep_until(deadline) => {
                timed_out = !opened;
                break;
            }
        }

        if !opened && bridge.state() == ConnectionState::Open {
            opened = true;
            info!("Headless session {} open", bridge.target());
            if let Some(text) = options.send.as_deref() {
                bridge.handle_input(&format!("{}\r", text));
            }
            deadline = Instant::now() + options.wait;
        }
    }

    let error = if timed_out {
        Some(format!(
            "timed out after {:?} waiting for the session to open",
            options.connect_timeout
        ))
    } else {
        bridge.connection_error().map(|e| e.to_string())
    };
    let report = SnapshotReport {
        screen: screen.borrow().contents(),
        state: bridge.state(),
        error,
        remote_error: bridge.remote_error().map(str::to_string),
    };
    bridge.close();
    Ok(report)
}
