//! Tracing initialization.
//!
//! Sets up `tracing-subscriber` with an [`EnvFilter`] and a console `fmt` layer. Verbosity is
//! controlled with the standard `RUST_LOG` variable:
//!
//! ```bash
//! # Default when RUST_LOG is unset
//! export RUST_LOG="info"
//!
//! # Trace the repository layer, including the generated SQL spans
//! export RUST_LOG="info,hrctl::db=trace,sqlx=debug"
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "info";

/// Initialize the global subscriber. Fails if one is already installed.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
