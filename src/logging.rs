use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `log` records from the overlay library are
/// bridged into it.
///
/// Without debug logging the level is pinned to `info` so a stray `RUST_LOG`
/// in the environment does not flood the console. With it, `RUST_LOG` may
/// override the `debug` default.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
