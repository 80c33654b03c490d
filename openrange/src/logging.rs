use tracing::Level;
use tracing_subscriber::EnvFilter;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .try_init();
}

/// Installs a subscriber filtered by `directives` (e.g. `"openrange=debug"`),
/// falling back to `RUST_LOG` and then to `info`.
pub fn init_logging_with(directives: &str) {
    let filter = EnvFilter::try_new(directives)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
