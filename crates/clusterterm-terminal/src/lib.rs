// Interactive terminal session bridge
//
// This crate connects a terminal emulator on the console side to a remote
// shell in a task, container or VM. It owns the connection state machine,
// keeps the remote pty geometry in step with the hosting surface, and
// guarantees teardown. Everything here is event driven and single threaded:
// hosts feed transport, input and resize events in one at a time.

mod bridge;
mod connection;
mod emulator;
mod endpoint;
mod registry;
mod resize;
pub mod transport;

// Re-export public API
pub use bridge::SessionBridge;
pub use connection::{ConnectionManager, ConnectionSignal, ConnectionState};
pub use emulator::{ScreenEmulator, TerminalEmulator};
pub use endpoint::{Scheme, TerminalEndpoint};
pub use registry::SessionRegistry;
pub use resize::{
    fit_to_surface, CellMetrics, HostSurface, PixelSize, ResizeController, ResizeSignal,
    SignalRegistration,
};
pub use transport::{Connector, Transport, TransportEvent};

pub use clusterterm_types as types;

// Constants
pub const MAX_CONCURRENT_SESSIONS: usize = 15;
pub const DEFAULT_SCROLLBACK_LINES: usize = 1000;
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 50;
