use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::target::Dimensions;

/// One text frame on the terminal socket.
///
/// Client to server: `input`, `resize`. Server to client: `output`, `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    Input { data: String },
    Output { data: String },
    Resize(Dimensions),
    Error { data: String },
}

/// Tag of an envelope, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Input,
    Output,
    Resize,
    Error,
}

impl Envelope {
    pub fn input(data: impl Into<String>) -> Self {
        Envelope::Input { data: data.into() }
    }

    pub fn resize(dimensions: Dimensions) -> Self {
        Envelope::Resize(dimensions)
    }

    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Envelope::Input { .. } => EnvelopeKind::Input,
            Envelope::Output { .. } => EnvelopeKind::Output,
            Envelope::Resize(_) => EnvelopeKind::Resize,
            Envelope::Error { .. } => EnvelopeKind::Error,
        }
    }

    /// Serialize to a single JSON text frame
    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a text frame, distinguishing non-JSON from foreign JSON
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(frame)?;
        serde_json::from_value(value).map_err(|e| ProtocolError::NotAnEnvelope(e.to_string()))
    }
}

/// What an inbound server frame means to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Terminal output to render unmodified
    Output(String),
    /// Message reported by the remote end; the session stays open
    RemoteError(String),
    /// Frame that is not an envelope; rendered verbatim
    Raw(String),
    /// Well-formed envelope that only flows client to server
    Ignored(EnvelopeKind),
}

impl Inbound {
    /// Classify a server frame. Never fails: anything unrecognized is raw output.
    pub fn parse(frame: &str) -> Self {
        match Envelope::decode(frame) {
            Ok(Envelope::Output { data }) => Inbound::Output(data),
            Ok(Envelope::Error { data }) => Inbound::RemoteError(data),
            Ok(other) => Inbound::Ignored(other.kind()),
            Err(_) => Inbound::Raw(frame.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_client_frames_match_wire_format() {
        let frame = Envelope::input("ls -la\r").to_frame().unwrap();
        assert_eq!(frame, r#"{"type":"input","data":"ls -la\r"}"#);

        let frame = Envelope::resize(Dimensions::new(24, 80).unwrap())
            .to_frame()
            .unwrap();
        assert_eq!(frame, r#"{"type":"resize","rows":24,"cols":80}"#);
    }

    #[test]
    fn test_output_payload_is_unmodified() {
        assert_eq!(
            Inbound::parse(r#"{"type":"output","data":"hello\r\n"}"#),
            Inbound::Output("hello\r\n".to_string())
        );
        assert_eq!(
            Inbound::parse(r#"{"type":"output","data":"\u001b[1;32m$ \u001b[0m"}"#),
            Inbound::Output("\u{1b}[1;32m$ \u{1b}[0m".to_string())
        );
    }

    #[test]
    fn test_remote_error_frame() {
        assert_eq!(
            Inbound::parse(r#"{"type":"error","data":"container is not running"}"#),
            Inbound::RemoteError("container is not running".to_string())
        );
    }

    #[test]
    fn test_unrecognized_frames_fall_back_to_raw() {
        for frame in [
            "not-json",
            "",
            r#"{"type":"bell"}"#,
            r#"{"type":"output","data":7}"#,
            r#"{"data":"no tag"}"#,
            r#""just a string""#,
            r#"{"type":"resize","rows":0,"cols":80}"#,
        ] {
            assert_eq!(Inbound::parse(frame), Inbound::Raw(frame.to_string()), "frame {:?}", frame);
        }
    }

    #[test]
    fn test_client_direction_envelopes_are_ignored() {
        assert_eq!(
            Inbound::parse(r#"{"type":"input","data":"x"}"#),
            Inbound::Ignored(EnvelopeKind::Input)
        );
        assert_eq!(
            Inbound::parse(r#"{"type":"resize","rows":30,"cols":100}"#),
            Inbound::Ignored(EnvelopeKind::Resize)
        );
    }

    #[test]
    fn test_decode_distinguishes_failure_kinds() {
        assert!(matches!(Envelope::decode("{"), Err(ProtocolError::Json(_))));
        assert!(matches!(
            Envelope::decode(r#"{"type":"bell"}"#),
            Err(ProtocolError::NotAnEnvelope(_))
        ));
    }
}
