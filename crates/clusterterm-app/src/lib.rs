//! clusterterm: interactive shells into cluster workloads from a terminal.

pub mod attach;
pub mod cli;
pub mod config;
pub mod local;
pub mod logging;
pub mod snapshot;
pub mod targets;
pub mod transport;

pub use attach::{run_attach, AttachOutcome};
pub use cli::{Cli, Commands};
pub use config::{Config, Settings};
pub use snapshot::{run_snapshot, SnapshotOptions, SnapshotReport};
pub use targets::{TargetSummary, TargetsClient};
