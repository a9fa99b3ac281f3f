use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter directive when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "churn_report=debug"
    } else {
        "churn_report=info"
    }
}

/// Initializes console logging. `RUST_LOG` takes precedence over the default level.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // A second init (tests, repeated calls) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
