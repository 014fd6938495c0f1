// Notifier that talks to the sync hub over a WebSocket connection.

use anyhow::Context;
use futures_util::stream::Stream;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::notifier::{Notifier, SyncSignal, SIGNAL_CAPACITY};

/// Hub client. Publishing queues the signal for a background writer task;
/// a background reader fans incoming signals out to subscribers.
pub struct WsNotifier {
    outbox: mpsc::Sender<SyncSignal>,
    inbox: broadcast::Sender<SyncSignal>,
}

impl WsNotifier {
    /// Connect to the hub on `127.0.0.1:{port}` and start the I/O tasks.
    pub async fn connect(port: u16) -> anyhow::Result<Self> {
        let url = format!("ws://127.0.0.1:{port}");
        let (ws, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .with_context(|| format!("failed to connect to sync hub at {url}"))?;
        info!("Connected to sync hub at {url}");

        let (mut write, read) = ws.split();
        let (outbox, mut out_rx) = mpsc::channel::<SyncSignal>(SIGNAL_CAPACITY);
        let (inbox, _) = broadcast::channel(SIGNAL_CAPACITY);

        tokio::spawn(async move {
            while let Some(signal) = out_rx.recv().await {
                let text = match serde_json::to_string(&signal) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!("Failed to encode sync signal: {e}");
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    warn!("Sync hub write failed: {e}");
                    break;
                }
            }
        });

        let reader_tx = inbox.clone();
        tokio::spawn(async move {
            forward_incoming(read, &reader_tx).await;
            warn!("Lost connection to sync hub; relying on polling");
        });

        Ok(WsNotifier { outbox, inbox })
    }
}

impl Notifier for WsNotifier {
    fn publish(&self, signal: SyncSignal) {
        if let Err(e) = self.outbox.try_send(signal) {
            debug!("Sync signal dropped: {e}");
        }
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<SyncSignal>> {
        Some(self.inbox.subscribe())
    }
}

/// Decode signals arriving from the hub and hand them to local
/// subscribers. Unknown messages are skipped.
pub async fn forward_incoming<St>(mut stream: St, tx: &broadcast::Sender<SyncSignal>)
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match serde_json::from_str::<SyncSignal>(text.as_str()) {
                Ok(signal) => {
                    let _ = tx.send(signal);
                }
                Err(e) => debug!("Ignoring malformed hub message: {e}"),
            },
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!("Sync hub read failed: {e}");
                break;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::hub::{self, TcpHubListener};
    use futures_util::stream;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Error as WsError;

    #[tokio::test]
    async fn forwards_decoded_signals() {
        let (tx, mut rx) = broadcast::channel(8);
        let good = serde_json::to_string(&SyncSignal::state_changed("ctx-b")).unwrap();
        let messages: Vec<Result<Message, WsError>> = vec![
            Ok(Message::Text("not json".into())),
            Ok(Message::Text(good.into())),
        ];

        forward_incoming(stream::iter(messages), &tx).await;

        assert_eq!(rx.recv().await.unwrap().origin(), "ctx-b");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn connect_fails_without_hub() {
        let listener = TcpHubListener::bind(0).await.unwrap();
        let port = listener.local_port().unwrap();
        drop(listener);
        assert!(WsNotifier::connect(port).await.is_err());
    }

    #[tokio::test]
    async fn signals_reach_siblings_but_not_sender() {
        let listener = TcpHubListener::bind(0).await.unwrap();
        let port = listener.local_port().unwrap();
        tokio::spawn(hub::run(listener));

        let a = WsNotifier::connect(port).await.unwrap();
        let b = WsNotifier::connect(port).await.unwrap();
        let mut rx_a = a.subscribe().unwrap();
        let mut rx_b = b.subscribe().unwrap();

        // The hub registers connections asynchronously; retry until b hears.
        let received = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                a.publish(SyncSignal::state_changed("ctx-a"));
                if let Ok(Ok(sig)) =
                    tokio::time::timeout(Duration::from_millis(100), rx_b.recv()).await
                {
                    return sig;
                }
            }
        })
        .await
        .expect("b should hear a's signal");

        assert_eq!(received.origin(), "ctx-a");
        assert!(rx_a.try_recv().is_err());
    }
}
