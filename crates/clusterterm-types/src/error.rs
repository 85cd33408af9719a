use thiserror::Error;

/// Errors returned synchronously to the caller of a session operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("connection attempt already in progress")]
    AlreadyConnecting,

    #[error("connection is already open")]
    AlreadyOpen,

    #[error("connection has terminated; open a new session")]
    Terminated,

    #[error("a session for {0} is already open")]
    TargetBusy(String),

    #[error("session limit of {0} reached; close a session before opening another")]
    TooManySessions(usize),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("invalid terminal dimensions {rows}x{cols}")]
    InvalidDimensions { rows: u16, cols: u16 },

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("hosting surface unavailable: {0}")]
    Surface(String),
}

/// Why a connection ended up in the Failed state.
///
/// Retained by the connection manager and surfaced to the UI; never retried
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("{}", close_summary(.code, .reason))]
    AbnormalClose { code: u16, reason: String },
}

fn close_summary(code: &u16, reason: &str) -> String {
    if reason.is_empty() {
        format!("connection closed abnormally (code {})", code)
    } else {
        format!("connection closed abnormally (code {}): {}", code, reason)
    }
}

/// A frame that could not be decoded as an envelope.
///
/// Recovered locally by rendering the frame as raw output.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is not a terminal envelope: {0}")]
    NotAnEnvelope(String),
}
