//! Tracing subscriber setup.

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install the global subscriber once per process.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let default = if verbose {
            "ffigen=debug,ffigen_core=debug,ffigen_emit=debug"
        } else {
            "ffigen=info,ffigen_core=info,ffigen_emit=info"
        };
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init();
    });
}
