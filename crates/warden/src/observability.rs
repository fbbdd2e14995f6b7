//! Log output initialisation.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use warden_bot::{LogFormat, LoggingSection};
use warden_error::{ConfigError, WardenResult};

/// Filter directive for the configured level, raised to `debug` when verbose.
pub fn filter_directive(logging: &LoggingSection, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        logging.level().clone()
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_logging(logging: &LoggingSection, verbose: bool) -> WardenResult<()> {
    let directive = filter_directive(logging, verbose);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directive))
        .map_err(|e| ConfigError::new(format!("Invalid log level '{}': {}", directive, e)))?;

    let fmt_layer = match logging.format() {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_level(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Logging already initialised: {}", e)))?;
    Ok(())
}
