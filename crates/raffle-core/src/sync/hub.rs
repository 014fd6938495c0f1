// Localhost WebSocket relay that fans sync signals out between contexts.

use async_trait::async_trait;
use futures_util::stream::Stream;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::notifier::{SyncSignal, SIGNAL_CAPACITY};

/// Source of incoming hub connections.
#[async_trait]
pub trait HubListener: Send {
    type Conn: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Wait for the next connection, returning it with a printable peer
    /// address.
    async fn accept(&mut self) -> std::io::Result<(Self::Conn, String)>;
}

/// Hub listener bound to `127.0.0.1`.
pub struct TcpHubListener {
    inner: TcpListener,
}

impl TcpHubListener {
    /// Bind the hub port. Fails if another context is already hosting.
    pub async fn bind(port: u16) -> std::io::Result<Self> {
        let inner = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
        Ok(TcpHubListener { inner })
    }

    pub fn local_port(&self) -> std::io::Result<u16> {
        Ok(self.inner.local_addr()?.port())
    }
}

#[async_trait]
impl HubListener for TcpHubListener {
    type Conn = TcpStream;

    async fn accept(&mut self) -> std::io::Result<(TcpStream, String)> {
        let (stream, addr) = self.inner.accept().await?;
        Ok((stream, addr.to_string()))
    }
}

/// A signal in flight through the hub, tagged with the connection it came
/// from so it is not echoed back.
#[derive(Debug, Clone, PartialEq)]
pub struct Relayed {
    pub from: u64,
    pub text: String,
}

/// Accept connections forever, relaying every valid signal from one client
/// to all the others.
pub async fn run<L: HubListener>(mut listener: L) -> anyhow::Result<()> {
    let (relay_tx, _) = broadcast::channel::<Relayed>(SIGNAL_CAPACITY);
    let mut next_id: u64 = 0;

    loop {
        let (conn, addr) = listener.accept().await?;
        next_id += 1;
        let conn_id = next_id;
        let relay_tx = relay_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = serve_connection(conn, conn_id, relay_tx, &addr).await {
                warn!("Sync hub connection {addr} failed: {e}");
            }
        });
    }
}

async fn serve_connection<S>(
    conn: S,
    conn_id: u64,
    relay_tx: broadcast::Sender<Relayed>,
    addr: &str,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let ws = tokio_tungstenite::accept_async(conn).await?;
    info!("Context at {addr} joined sync hub as #{conn_id}");

    let (mut write, read) = ws.split();
    let mut relay_rx = relay_tx.subscribe();

    let writer = tokio::spawn(async move {
        loop {
            match relay_rx.recv().await {
                Ok(msg) if msg.from == conn_id => {}
                Ok(msg) => {
                    if write.send(Message::Text(msg.text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    debug!("Hub writer #{conn_id} skipped {n} signals");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    relay_incoming(read, conn_id, &relay_tx, addr).await;
    writer.abort();
    info!("Context #{conn_id} left sync hub");
    Ok(())
}

/// Read messages from one client and put every well-formed signal on the
/// relay channel. Stops at a close frame or transport error.
pub async fn relay_incoming<St>(
    mut stream: St,
    conn_id: u64,
    relay_tx: &broadcast::Sender<Relayed>,
    addr: &str,
) where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                if serde_json::from_str::<SyncSignal>(text.as_str()).is_err() {
                    debug!("Dropping unrecognized message from {addr}");
                    continue;
                }
                // No other clients connected is fine.
                let _ = relay_tx.send(Relayed {
                    from: conn_id,
                    text: text.to_string(),
                });
            }
            Ok(Message::Close(_)) => {
                debug!("Client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            _ => {}
        }
    }
}
