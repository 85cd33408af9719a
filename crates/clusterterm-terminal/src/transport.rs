/// Transport abstraction for browser and native socket implementations
use clusterterm_types::ConnectionError;

/// The live socket of one session.
///
/// Implementations report open/message/error/close back to the owner as
/// [`TransportEvent`]s; none of these methods block.
pub trait Transport {
    /// Queue one text frame for sending
    fn send_text(&mut self, frame: &str) -> Result<(), ConnectionError>;

    /// Start closing the socket. Completion may be asynchronous.
    fn close(&mut self, code: u16, reason: &str);
}

/// Opens transports for a fully composed terminal URL
pub trait Connector {
    fn open(&mut self, url: &str) -> Result<Box<dyn Transport>, ConnectionError>;
}

/// Reactive callbacks of a transport, delivered one at a time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Error(String),
    Closed { code: u16, reason: String },
}
