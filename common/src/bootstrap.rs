// Bootstrap utilities for binary initialization
// Purpose: eliminate duplicated tracing setup across the worker and api main.rs files

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for JSON logging.
/// Used by: worker (scheduled/unattended runs, where logs are shipped to a
/// log aggregator rather than read by a human at a terminal).
pub fn init_json_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

/// Initialize tracing for human-readable logging.
/// Used by: api (development, local `worker` invocations at a terminal).
pub fn init_human_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_tracing_does_not_panic_on_init() {
        // Installing the global subscriber twice in one process panics, so
        // this only asserts construction of the filter succeeds.
        let _ = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    }
}
