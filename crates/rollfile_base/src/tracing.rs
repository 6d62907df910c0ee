use crate::error::RollfileResult;
pub use tracing::instrument;
pub use tracing::{debug, error, info, trace, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global tracing subscriber.
///
/// The filter is read from `RUST_LOG` and defaults to `info`. The `ErrorLayer`
/// lets [`crate::RollfileError`] capture span traces. Calling this more than once is
/// harmless: once a subscriber is installed further calls return `Ok(())`.
pub fn init_tracing() -> RollfileResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .try_init();
    if let Err(error) = result {
        // try_init only fails when a global subscriber is already in place
        debug!(%error, "tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::init_tracing;

    #[test]
    fn init_tracing_is_idempotent() {
        assert!(init_tracing().is_ok());
        assert!(init_tracing().is_ok());
    }
}
