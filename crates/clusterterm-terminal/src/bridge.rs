use log::{debug, info, warn};

use clusterterm_types::{
    ConnectionError, Dimensions, Envelope, Inbound, SessionError, Target,
};

use super::connection::{ConnectionManager, ConnectionSignal, ConnectionState};
use super::emulator::TerminalEmulator;
use super::endpoint::TerminalEndpoint;
use super::resize::{HostSurface, ResizeController};
use super::transport::{Connector, TransportEvent};

/// One live remote shell: connection, resize controller and emulator,
/// exclusively owned and released together.
pub struct SessionBridge {
    target: Target,
    connection: ConnectionManager,
    resize: Option<ResizeController>,
    emulator: Option<Box<dyn TerminalEmulator>>,
    remote_error: Option<String>,
    closed: bool,
}

impl std::fmt::Debug for SessionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBridge")
            .field("target", &self.target)
            .field("state", &self.connection.state())
            .field("remote_error", &self.remote_error)
            .field("closed", &self.closed)
            .finish()
    }
}

impl SessionBridge {
    /// Open a session for `target`.
    ///
    /// The surface is observed before the connection is attempted; if either
    /// step fails with a [`SessionError`] everything created so far is
    /// released before returning. A transport that fails to open is not an
    /// error: the session is returned in the Failed state with the reason
    /// written to the emulator.
    pub fn open(
        target: Target,
        endpoint: TerminalEndpoint,
        connector: &mut dyn Connector,
        emulator: Box<dyn TerminalEmulator>,
        surface: &mut dyn HostSurface,
    ) -> Result<Self, SessionError> {
        let mut bridge = Self {
            target,
            connection: ConnectionManager::new(endpoint),
            resize: None,
            emulator: Some(emulator),
            remote_error: None,
            closed: false,
        };

        match ResizeController::attach(surface) {
            Ok(controller) => bridge.resize = Some(controller),
            Err(e) => {
                warn!("Cannot observe surface for {}: {}", bridge.target, e);
                bridge.close();
                return Err(e);
            }
        }

        let target = bridge.target.clone();
        match bridge.connection.connect(&target, connector) {
            Ok(ConnectionState::Failed) => bridge.on_terminated(),
            Ok(_) => {}
            Err(e) => {
                bridge.close();
                return Err(e);
            }
        }

        Ok(bridge)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// True while the connecting indicator should be shown
    pub fn is_loading(&self) -> bool {
        self.connection.state() == ConnectionState::Connecting
    }

    /// Reason for the inline error surface when the connection failed
    pub fn connection_error(&self) -> Option<&ConnectionError> {
        self.connection.failure()
    }

    /// Last error reported by the remote end; the session stays open
    pub fn remote_error(&self) -> Option<&str> {
        self.remote_error.as_deref()
    }

    /// Connection reached Closed or Failed
    pub fn is_finished(&self) -> bool {
        self.connection.state().is_terminal()
    }

    /// `close()` has run
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn last_reported_size(&self) -> Option<Dimensions> {
        self.resize.as_ref().and_then(|r| r.last_reported())
    }

    pub fn emulator(&self) -> Option<&dyn TerminalEmulator> {
        self.emulator.as_deref()
    }

    /// Dispatch one transport callback
    pub fn handle_transport(&mut self, event: TransportEvent) {
        if self.closed {
            debug!("Session {} closed, dropping {:?}", self.target, event);
            return;
        }
        let Some(signal) = self.connection.handle_event(event) else {
            return;
        };

        match signal {
            ConnectionSignal::Opened => {
                info!("Session {} open", self.target);
                self.send_initial_resize();
            }
            ConnectionSignal::Inbound(Inbound::Output(data))
            | ConnectionSignal::Inbound(Inbound::Raw(data)) => self.write(&data),
            ConnectionSignal::Inbound(Inbound::RemoteError(message)) => {
                warn!("Remote error on {}: {}", self.target, message);
                self.write(&status_line(&format!("remote error: {}", message)));
                self.remote_error = Some(message);
            }
            ConnectionSignal::Inbound(Inbound::Ignored(kind)) => {
                debug!("Ignoring inbound {:?} envelope", kind);
            }
            ConnectionSignal::Closed { .. } | ConnectionSignal::Failed(_) => self.on_terminated(),
        }
    }

    /// Forward one chunk of typed input. Returns whether it was transmitted;
    /// input while the connection is not Open is discarded.
    pub fn handle_input(&mut self, data: &str) -> bool {
        if self.closed {
            return false;
        }
        self.connection.send(&Envelope::input(data))
    }

    /// A window or container geometry signal fired. Returns true when the
    /// host must schedule `flush_resize` at the end of the observation tick.
    pub fn notice_geometry_change(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.resize.as_mut().map_or(false, |r| r.notice())
    }

    /// End of an observation tick: refit and send one resize if it changed
    pub fn flush_resize(&mut self) -> Option<Dimensions> {
        let resize = self.resize.as_mut()?;
        if !self.connection.is_open() {
            resize.discard_pending();
            return None;
        }
        let emulator = self.emulator.as_mut()?;
        let dimensions = resize.flush(emulator.fit())?;
        debug!("Resizing {} to {}", self.target, dimensions);
        self.connection.send(&Envelope::resize(dimensions));
        Some(dimensions)
    }

    /// Release connection, resize listeners and emulator in that order.
    /// Safe to call any number of times, from any state.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        info!("Closing session {}", self.target);

        self.connection.close();
        if let Some(mut resize) = self.resize.take() {
            resize.detach();
        }
        if let Some(mut emulator) = self.emulator.take() {
            emulator.dispose();
        }
    }

    fn send_initial_resize(&mut self) {
        let (Some(resize), Some(emulator)) = (self.resize.as_mut(), self.emulator.as_mut()) else {
            return;
        };
        let fitted = emulator.fit().unwrap_or_else(|| emulator.size());
        if let Some(dimensions) = resize.force(Some(fitted)) {
            debug!("Initial size for {} is {}", self.target, dimensions);
            self.connection.send(&Envelope::resize(dimensions));
        }
    }

    // The emulator stays alive so the status line remains visible until the
    // UI closes the session; geometry listeners are no longer needed.
    fn on_terminated(&mut self) {
        if let Some(mut resize) = self.resize.take() {
            resize.detach();
        }
        let line = match self.connection.failure() {
            Some(ConnectionError::AbnormalClose { code, reason }) if reason.is_empty() => {
                format!("connection lost: code {}", code)
            }
            Some(ConnectionError::AbnormalClose { code, reason }) => {
                format!("connection lost: code {}: {}", code, reason)
            }
            Some(ConnectionError::Transport(message)) => format!("connection failed: {}", message),
            None => "session closed".to_string(),
        };
        self.write(&status_line(&line));
    }

    fn write(&mut self, data: &str) {
        if let Some(emulator) = self.emulator.as_mut() {
            emulator.write(data);
        }
    }
}

impl Drop for SessionBridge {
    fn drop(&mut self) {
        self.close();
    }
}

fn status_line(text: &str) -> String {
    format!("\r\n[{}]\r\n", text)
}

