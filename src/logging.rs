// src/logging.rs
// =============================================================================
// Log setup.
//
// Logs go to stderr through tracing-subscriber so they never mix with the
// answers and summaries printed on stdout. RUST_LOG wins when set; otherwise
// the level is "info", or "debug" for this crate with --verbose.
// =============================================================================

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let default_directive = if verbose {
        "info,faq_harvester=debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()?;

    Ok(())
}
