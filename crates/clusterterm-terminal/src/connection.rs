use log::{debug, info, warn};

use clusterterm_types::{
    ConnectionError, Envelope, Inbound, SessionError, Target, NORMAL_CLOSURE,
};

use super::endpoint::TerminalEndpoint;
use super::transport::{Connector, Transport, TransportEvent};

/// Connection lifecycle. Closed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
    Failed,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Failed)
    }
}

/// Outcome of a transport event that the session has to act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSignal {
    Opened,
    Inbound(Inbound),
    Closed { code: u16, reason: String },
    Failed(ConnectionError),
}

/// Owns the single transport of one session and its state machine
pub struct ConnectionManager {
    endpoint: TerminalEndpoint,
    state: ConnectionState,
    transport: Option<Box<dyn Transport>>,
    target: Option<Target>,
    failure: Option<ConnectionError>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .field("target", &self.target)
            .field("failure", &self.failure)
            .finish()
    }
}

impl ConnectionManager {
    pub fn new(endpoint: TerminalEndpoint) -> Self {
        Self {
            endpoint,
            state: ConnectionState::Idle,
            transport: None,
            target: None,
            failure: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Reason retained when the connection entered Failed
    pub fn failure(&self) -> Option<&ConnectionError> {
        self.failure.as_ref()
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Start connecting to the target's terminal endpoint.
    ///
    /// Only legal from Idle. A transport that cannot be opened is not an
    /// error here: the manager moves to Failed and retains the reason.
    pub fn connect(
        &mut self,
        target: &Target,
        connector: &mut dyn Connector,
    ) -> Result<ConnectionState, SessionError> {
        match self.state {
            ConnectionState::Idle => {}
            ConnectionState::Connecting => return Err(SessionError::AlreadyConnecting),
            ConnectionState::Open => return Err(SessionError::AlreadyOpen),
            ConnectionState::Closed | ConnectionState::Failed => {
                return Err(SessionError::Terminated)
            }
        }

        let url = self.endpoint.url_for(target);
        info!("Connecting terminal for {} at {}", target, url);
        self.target = Some(target.clone());
        self.state = ConnectionState::Connecting;

        match connector.open(&url) {
            Ok(transport) => self.transport = Some(transport),
            Err(e) => {
                self.fail(e);
            }
        }
        Ok(self.state)
    }

    /// Send one envelope. Silently dropped unless the connection is Open.
    pub fn send(&mut self, envelope: &Envelope) -> bool {
        if self.state != ConnectionState::Open {
            debug!("Dropping {:?} envelope while {:?}", envelope.kind(), self.state);
            return false;
        }
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };
        let frame = match envelope.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode {:?} envelope: {}", envelope.kind(), e);
                return false;
            }
        };
        match transport.send_text(&frame) {
            Ok(()) => true,
            Err(e) => {
                // The transport reports its own error/close event afterwards
                warn!("Failed to send frame: {}", e);
                false
            }
        }
    }

    /// Classify one inbound frame
    pub fn on_message(&self, frame: &str) -> Inbound {
        let inbound = Inbound::parse(frame);
        if let Inbound::Raw(_) = inbound {
            debug!("Frame is not an envelope, rendering as raw output ({} bytes)", frame.len());
        }
        inbound
    }

    /// Advance the state machine. Events outside the table are ignored.
    pub fn handle_event(&mut self, event: TransportEvent) -> Option<ConnectionSignal> {
        match (self.state, event) {
            (ConnectionState::Connecting, TransportEvent::Opened) => {
                info!("Terminal connection open");
                self.state = ConnectionState::Open;
                Some(ConnectionSignal::Opened)
            }
            (ConnectionState::Open, TransportEvent::Message(frame)) => {
                Some(ConnectionSignal::Inbound(self.on_message(&frame)))
            }
            (ConnectionState::Connecting | ConnectionState::Open, TransportEvent::Error(message)) => {
                Some(ConnectionSignal::Failed(self.fail(ConnectionError::Transport(message))))
            }
            (ConnectionState::Open, TransportEvent::Closed { code, reason })
                if code == NORMAL_CLOSURE =>
            {
                info!("Terminal connection closed normally");
                self.state = ConnectionState::Closed;
                self.release_transport(code, "");
                Some(ConnectionSignal::Closed { code, reason })
            }
            (ConnectionState::Connecting | ConnectionState::Open, TransportEvent::Closed { code, reason }) => {
                Some(ConnectionSignal::Failed(
                    self.fail(ConnectionError::AbnormalClose { code, reason }),
                ))
            }
            (state, event) => {
                debug!("Ignoring {:?} while {:?}", event, state);
                None
            }
        }
    }

    /// Close from any state. Safe to call repeatedly.
    pub fn close(&mut self) {
        if !self.state.is_terminal() {
            info!("Closing terminal connection from {:?}", self.state);
            self.state = ConnectionState::Closed;
        }
        self.release_transport(NORMAL_CLOSURE, "session closed");
    }

    fn fail(&mut self, error: ConnectionError) -> ConnectionError {
        warn!("Terminal connection failed: {}", error);
        self.state = ConnectionState::Failed;
        self.failure = Some(error.clone());
        self.release_transport(NORMAL_CLOSURE, "");
        error
    }

    // Taking the handle makes release happen at most once
    fn release_transport(&mut self, code: u16, reason: &str) {
        if let Some(mut transport) = self.transport.take() {
            transport.close(code, reason);
        }
    }
}
