//! Structured logging.
//!
//! The server never installs a process-wide subscriber. The binary builds a
//! [`Dispatch`] here and hands it to [`Server::bind`](crate::net::server::Server::bind),
//! which runs the accept loop and every connection task under it.

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// Builds a formatted, filtered log dispatcher.
///
/// `RUST_LOG` wins over `level` when it is set and valid.
pub fn build(level: &str) -> Dispatch {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    Dispatch::new(subscriber)
}
