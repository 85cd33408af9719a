use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use clusterterm_types::TargetKind;

/// CLI arguments for clusterterm
#[derive(Parser, Debug)]
#[command(name = "clusterterm")]
#[command(about = "Interactive shells into cluster tasks, containers and VMs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Cluster API base URL (e.g. https://cluster.example.com/api/v1)
    #[arg(long, global = true, value_name = "URL", env = "CLUSTERTERM_SERVER")]
    pub server: Option<String>,

    /// Override the API prefix of the server URL
    #[arg(long, global = true, value_name = "PREFIX", env = "CLUSTERTERM_API_PREFIX")]
    pub api_prefix: Option<String>,

    /// Path to config file (default: ~/.clusterterm/config.toml)
    #[arg(long, global = true, value_name = "PATH", env = "CLUSTERTERM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open an interactive shell (Ctrl-] detaches)
    Attach {
        /// Target kind: task, container or vm
        kind: TargetKind,
        /// Target identifier
        target: String,
        /// Look the target up by name through the REST API
        #[arg(long)]
        by_name: bool,
    },

    /// Run a headless session and print the final screen
    Snapshot {
        /// Target kind: task, container or vm
        kind: TargetKind,
        /// Target identifier
        target: String,
        /// Line to type once the session is open (a carriage return is appended)
        #[arg(long, value_name = "TEXT")]
        send: Option<String>,
        /// How long to collect output after the session opens
        #[arg(long, default_value_t = 1000, value_name = "MS")]
        wait_ms: u64,
        /// Screen rows
        #[arg(long, default_value_t = 24)]
        rows: u16,
        /// Screen columns
        #[arg(long, default_value_t = 80)]
        cols: u16,
        /// Look the target up by name through the REST API
        #[arg(long)]
        by_name: bool,
    },

    /// List targets of one kind
    List {
        /// Target kind: task, container or vm
        kind: TargetKind,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
