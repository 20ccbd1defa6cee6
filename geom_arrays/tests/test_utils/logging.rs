use tracing_subscriber::EnvFilter;

/// Install a test writer subscriber once per test binary, `RUST_LOG` overrides the filter.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geom_arrays=debug")),
        )
        .with_test_writer()
        .try_init();
}
