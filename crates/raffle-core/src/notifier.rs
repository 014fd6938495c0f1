// Cross-context "state changed" signalling.
//
// A notifier is best-effort: publishing may reach nobody, and subscribers
// may miss signals. Contexts always poll the store as well.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::model::generate_id;

/// Capacity of in-process broadcast channels. Slow receivers that fall this
/// far behind see a lag error and simply reload once.
pub const SIGNAL_CAPACITY: usize = 64;

/// A message exchanged between contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncSignal {
    /// The durable snapshot was rewritten by context `origin`.
    #[serde(rename = "SYNC_DATA")]
    StateChanged { origin: String },
}

impl SyncSignal {
    pub fn state_changed(origin: &str) -> Self {
        SyncSignal::StateChanged {
            origin: origin.to_string(),
        }
    }

    /// The context that emitted this signal.
    pub fn origin(&self) -> &str {
        match self {
            SyncSignal::StateChanged { origin } => origin,
        }
    }
}

/// Identifier that distinguishes one context from its siblings.
pub fn new_context_id() -> String {
    format!("ctx-{}", generate_id())
}

/// Publish/subscribe capability for sync signals.
pub trait Notifier: Send + Sync {
    /// Send `signal` to sibling contexts. Never fails; delivery is not
    /// guaranteed.
    fn publish(&self, signal: SyncSignal);

    /// Receive signals from siblings, or `None` if this notifier cannot
    /// deliver anything (polling is then the only way to converge).
    fn subscribe(&self) -> Option<broadcast::Receiver<SyncSignal>>;
}

/// In-process notifier. Clones share one channel, so several contexts in
/// the same process can signal each other.
#[derive(Debug, Clone)]
pub struct LocalNotifier {
    tx: broadcast::Sender<SyncSignal>,
}

impl LocalNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_CAPACITY);
        LocalNotifier { tx }
    }
}

impl Default for LocalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for LocalNotifier {
    fn publish(&self, signal: SyncSignal) {
        if self.tx.send(signal).is_err() {
            debug!("No local subscribers for sync signal");
        }
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<SyncSignal>> {
        Some(self.tx.subscribe())
    }
}

/// A notifier for when no broadcast transport is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn publish(&self, _signal: SyncSignal) {}

    fn subscribe(&self) -> Option<broadcast::Receiver<SyncSignal>> {
        None
    }
}
