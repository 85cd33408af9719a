use env_logger::{Builder, Env, Target};

/// Initialize logging to stderr, leaving stdout to the remote terminal.
/// `RUST_LOG` wins over the verbosity flag.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.target(Target::Stderr).format_timestamp_millis();
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}
