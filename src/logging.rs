//! Log subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "tradewatch=info";

/// Install a fmt subscriber writing to stderr, filtered by `RUST_LOG`
/// (falling back to [`DEFAULT_DIRECTIVE`]). Stdout stays free for output.
pub fn init_logging() -> color_eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVE))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| color_eyre::eyre::eyre!("failed to install log subscriber: {}", e))?;

    Ok(())
}
