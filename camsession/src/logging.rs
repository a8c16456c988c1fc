//! Logging bootstrap

use crate::config::GlobalConfig;
use camsession_core::{CoreError, CoreResult};
use tracing_subscriber::EnvFilter;

const DEBUG_FILTER: &str = "camsession=debug,camsession_media=debug,camsession_core=debug";

/// Filter directive derived from `config`, ignoring `RUST_LOG`
pub fn default_directive(config: &GlobalConfig) -> &str {
    if config.debug_logging {
        DEBUG_FILTER
    } else {
        &config.log_filter
    }
}

/// Install a formatted `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Returns `false`
/// if a global subscriber was already installed, which leaves it in place.
pub fn init_logging(config: &GlobalConfig) -> CoreResult<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive(config)).map_err(|err| {
            CoreError::InvalidConfiguration {
                field: "global.log_filter".to_string(),
                reason: err.to_string(),
            }
        })?,
    };

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .is_ok())
}
