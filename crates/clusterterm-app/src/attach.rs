use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use log::debug;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{sleep_until, Instant};

use clusterterm_terminal::types::{ConnectionError, Target};
use clusterterm_terminal::{ConnectionState, SessionBridge};

use crate::config::Settings;
use crate::local::{ConsoleSurface, InputForwarder, LocalTerminal};
use crate::transport::{LoopEvent, WsConnector};

/// How an interactive session ended
#[derive(Debug, Clone, PartialEq)]
pub struct AttachOutcome {
    pub state: ConnectionState,
    pub error: Option<ConnectionError>,
    pub detached: bool,
}

/// Drives one bridge from loop events. Geometry changes are coalesced into
/// one resize per debounce window, measured from the first change.
pub struct SessionLoop {
    bridge: SessionBridge,
    debounce: Duration,
    flush_at: Option<Instant>,
}

impl SessionLoop {
    pub fn new(bridge: SessionBridge, debounce: Duration) -> Self {
        Self {
            bridge,
            debounce,
            flush_at: None,
        }
    }

    pub fn bridge(&self) -> &SessionBridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut SessionBridge {
        &mut self.bridge
    }

    /// Run until the session finishes or the user detaches. Returns true on
    /// detach, including when every event sender is gone.
    pub async fn run(&mut self, events: &mut UnboundedReceiver<LoopEvent>) -> bool {
        while !self.bridge.is_finished() {
            let deadline = self.flush_at.unwrap_or_else(Instant::now);
            tokio::select! {
                event = events.recv() => match event {
                    Some(LoopEvent::Detach) | None => return true,
                    Some(event) => self.dispatch(event),
                },
                _ = sleep_until(deadline), if self.flush_at.is_some() => self.flush(),
            }
        }
        false
    }

    fn dispatch(&mut self, event: LoopEvent) {
        match event {
            LoopEvent::Transport(event) => self.bridge.handle_transport(event),
            LoopEvent::Input(data) => {
                if !self.bridge.handle_input(&data) {
                    debug!("Input dropped while {:?}", self.bridge.state());
                }
            }
            LoopEvent::Geometry => {
                if self.bridge.notice_geometry_change() {
                    self.flush_at = Some(Instant::now() + self.debounce);
                }
            }
            LoopEvent::Detach => {}
        }
    }

    fn flush(&mut self) {
        self.flush_at = None;
        self.bridge.flush_resize();
    }
}

/// Run an interactive session on the local terminal until the remote side
/// closes or the user presses the detach key.
pub async fn run_attach(settings: &Settings, target: Target) -> Result<AttachOutcome> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut connector = WsConnector::new(tx.clone());
    let mut surface = ConsoleSurface::new();
    let window = surface.window_flag();

    eprintln!(
        "{}",
        format!(
            "Connecting to {} (press Ctrl-] to detach)...",
            target.label()
        )
        .bright_black()
    );

    let terminal = LocalTerminal::new().context("Failed to enable raw terminal mode")?;
    let bridge = SessionBridge::open(
        target,
        settings.endpoint.clone(),
        &mut connector,
        Box::new(terminal),
        &mut surface,
    )?;
    let input = InputForwarder::spawn(tx, settings.detach_key, window);

    let mut session = SessionLoop::new(bridge, settings.debounce);
    let detached = session.run(&mut rx).await;

    let bridge = session.bridge_mut();
    let outcome = AttachOutcome {
        state: bridge.state(),
        error: bridge.connection_error().cloned(),
        detached,
    };
    bridge.close();
    input.stop().await;
    Ok(outcome)
}
