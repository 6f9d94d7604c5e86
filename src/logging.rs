//! Diagnostic logging setup.

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Install a `tracing` subscriber that writes to stderr.
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at `info`, or `debug` when
/// `verbose` is set.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose {
        "ondemand_chat=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| Error::configuration(format!("could not install logger: {e}")))
}
