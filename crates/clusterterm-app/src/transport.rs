//! WebSocket transport for the native console.
//!
//! Each socket runs in its own tokio task. The session side only ever talks
//! to it through channels, so `Transport::send_text` never blocks and every
//! socket callback arrives as one [`LoopEvent`] on the session's loop.

use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use clusterterm_terminal::types::ConnectionError;
use clusterterm_terminal::{Connector, Transport, TransportEvent};

/// Close code reported when the peer vanished without a close frame
const ABNORMAL_CLOSURE: u16 = 1006;
/// Close code reported for a close frame without a status
const NO_STATUS_RECEIVED: u16 = 1005;

/// Everything a session loop reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    Transport(TransportEvent),
    Input(String),
    Geometry,
    Detach,
}

enum Outbound {
    Text(String),
    Close(u16, String),
}

/// Opens tokio-tungstenite sockets that report into a session loop
pub struct WsConnector {
    events: UnboundedSender<LoopEvent>,
}

impl WsConnector {
    pub fn new(events: UnboundedSender<LoopEvent>) -> Self {
        Self { events }
    }
}

impl Connector for WsConnector {
    fn open(&mut self, url: &str) -> Result<Box<dyn Transport>, ConnectionError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ConnectionError::Transport(
                "no async runtime available".to_string(),
            ));
        }
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(url.to_string(), outbound_rx, self.events.clone()));
        Ok(Box::new(WsTransport {
            outbound: outbound_tx,
        }))
    }
}

struct WsTransport {
    outbound: UnboundedSender<Outbound>,
}

impl Transport for WsTransport {
    fn send_text(&mut self, frame: &str) -> Result<(), ConnectionError> {
        self.outbound
            .send(Outbound::Text(frame.to_string()))
            .map_err(|_| ConnectionError::Transport("socket task has stopped".to_string()))
    }

    fn close(&mut self, code: u16, reason: &str) {
        // The socket task may already be gone; nothing left to close then
        let _ = self.outbound.send(Outbound::Close(code, reason.to_string()));
    }
}

async fn run_socket(
    url: String,
    mut outbound: UnboundedReceiver<Outbound>,
    events: UnboundedSender<LoopEvent>,
) {
    let report = |event: TransportEvent| {
        let _ = events.send(LoopEvent::Transport(event));
    };

    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            warn!("Failed to connect to {}: {}", url, e);
            report(TransportEvent::Error(e.to_string()));
            return;
        }
    };
    report(TransportEvent::Opened);

    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => report(TransportEvent::Message(text)),
                Some(Ok(Message::Binary(bytes))) => {
                    report(TransportEvent::Message(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.into_owned()))
                        .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                    report(TransportEvent::Closed { code, reason });
                    // Completes the handshake with the queued close reply
                    if let Err(e) = sink.close().await {
                        debug!("Close reply not delivered: {}", e);
                    }
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    report(stream_failure(&e));
                    break;
                }
                None => {
                    report(TransportEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: String::new(),
                    });
                    break;
                }
            },
            message = outbound.recv() => match message {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        report(stream_failure(&e));
                        break;
                    }
                }
                Some(Outbound::Close(code, reason)) => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        debug!("Close frame not delivered: {}", e);
                    }
                    break;
                }
                None => {
                    let _ = sink.close().await;
                    break;
                }
            },
        }
    }
    debug!("Socket task for {} finished", url);
}

/// An established socket that breaks without a close frame is an abnormal
/// closure; anything else is a transport error.
fn stream_failure(e: &WsError) -> TransportEvent {
    match e {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Io(_)
        | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => TransportEvent::Closed {
            code: ABNORMAL_CLOSURE,
            reason: e.to_string(),
        },
        _ => TransportEvent::Error(e.to_string()),
    }
}
