//! Core types for clusterterm
//!
//! This crate provides the wire schema and the value types shared by the
//! session core, the native console and the browser binding.

pub mod error;
pub mod protocol;
pub mod target;

pub use error::{ConnectionError, ProtocolError, SessionError};
pub use protocol::{Envelope, EnvelopeKind, Inbound};
pub use target::{Dimensions, Target, TargetKind};

// ============================================================================
// Constants
// ============================================================================

/// WebSocket close code for a normal, expected closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Final path segment of every terminal endpoint.
pub const TERMINAL_PATH_SUFFIX: &str = "terminal";

/// API prefix used when none is configured.
pub const DEFAULT_API_PREFIX: &str = "api/v1";
