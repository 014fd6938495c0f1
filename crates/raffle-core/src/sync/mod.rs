// Cross-process sync transport: hub election and client connection.

pub mod client;
pub mod hub;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::notifier::{Notifier, NullNotifier};
use client::WsNotifier;
use hub::TcpHubListener;

/// Result of joining the sync network.
pub struct SyncLink {
    pub notifier: Arc<dyn Notifier>,
    /// Whether this process hosts the hub.
    pub hosting: bool,
}

/// Join the sync network on `port`.
///
/// The first context to bind the port hosts the hub in a background task.
/// Every context, host included, then connects as a client. If that fails
/// the returned notifier is a [`NullNotifier`] and polling is the only
/// propagation path.
pub async fn start(port: u16) -> SyncLink {
    let hosting = match TcpHubListener::bind(port).await {
        Ok(listener) => {
            info!("Hosting sync hub on port {port}");
            tokio::spawn(async move {
                if let Err(e) = hub::run(listener).await {
                    warn!("Sync hub stopped: {e}");
                }
            });
            true
        }
        Err(e) => {
            debug!("Sync hub port {port} unavailable ({e}); joining existing hub");
            false
        }
    };

    let notifier: Arc<dyn Notifier> = match WsNotifier::connect(port).await {
        Ok(n) => Arc::new(n),
        Err(e) => {
            warn!("Sync disabled, falling back to polling: {e:#}");
            Arc::new(NullNotifier)
        }
    };

    SyncLink { notifier, hosting }
}

/// A link with no transport, for when sync is turned off.
pub fn disabled() -> SyncLink {
    SyncLink {
        notifier: Arc::new(NullNotifier),
        hosting: false,
    }
}
