use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Duration, sleep};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::error::Result;
use crate::relay::sender::{ContentRelay, RuntimeChannel};
use crate::relay::{TIMER_WINDOW, WindowId, WindowMessage};

pub const DEFAULT_WS_ADDR: &str = "127.0.0.1:8765";

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

static NEXT_WINDOW: AtomicU64 = AtomicU64::new(TIMER_WINDOW.0 + 1);

pub async fn start_websocket_server<C>(addr: SocketAddr, channel: C) -> Result<()>
where
    C: RuntimeChannel + Clone,
{
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("WebSocket server listening on: {}", listener.local_addr()?);
    serve(listener, channel).await
}

/// Every connection is treated as its own page window with its own relay.
pub async fn serve<C>(listener: TcpListener, channel: C) -> Result<()>
where
    C: RuntimeChannel + Clone,
{
    let listener = &listener;
    loop {
        let (stream, peer_addr) = next_connection(move || listener.accept()).await;
        let window = WindowId(NEXT_WINDOW.fetch_add(1, Ordering::Relaxed));
        tracing::info!(%window, "New WebSocket connection from: {}", peer_addr);
        let relay = ContentRelay::new(window, channel.clone());
        tokio::spawn(handle_connection(stream, peer_addr, window, relay));
    }
}

/// Accept errors are per connection; the bridge itself stays up.
async fn next_connection<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                tracing::warn!("Failed to accept WebSocket connection: {}", e);
                sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}

async fn handle_connection<C: RuntimeChannel>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    window: WindowId,
    relay: ContentRelay<C>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!("WebSocket handshake failed with {}: {}", peer_addr, e);
            return;
        }
    };

    tracing::debug!("WebSocket handshake completed with {}", peer_addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let data = match serde_json::from_str::<Value>(&text) {
                    Ok(data) => data,
                    Err(e) => {
                        tracing::debug!("Dropping unparsable message from {}: {}", peer_addr, e);
                        continue;
                    }
                };

                let message = WindowMessage {
                    source: window,
                    data,
                };
                match relay.handle(&message).await {
                    Some(Ok(ack)) => {
                        if let Ok(ack_json) = serde_json::to_string(&ack) {
                            if let Err(e) = ws_sender.send(Message::Text(ack_json)).await {
                                tracing::warn!("Failed to send WebSocket response: {}", e);
                                break;
                            }
                        }
                    }
                    Some(Err(e)) => tracing::warn!("Failed to relay notification: {}", e),
                    None => {}
                }
            }
            Ok(Message::Close(_)) => {
                tracing::debug!("WebSocket connection closed by {}", peer_addr);
                break;
            }
            Ok(Message::Ping(data)) => {
                if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                    tracing::warn!("Failed to send pong: {}", e);
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("WebSocket error from {}: {}", peer_addr, e);
                break;
            }
        }
    }

    tracing::info!(%window, "WebSocket connection with {} terminated", peer_addr);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::Ack;
    use crate::relay::receiver::BackgroundRelay;
    use crate::relay::receiver::testing::RecordingNotifications;
    use crate::relay::sender::create_runtime_channel;
    use tokio::time::timeout;
    use tokio_tungstenite::connect_async;

    #[tokio::test(start_paused = true)]
    async fn test_accept_errors_do_not_stop_listening() {
        let mut attempts = 0;
        let accepted = next_connection(|| {
            attempts += 1;
            let result = if attempts < 3 {
                Err(io::Error::other("too many open files"))
            } else {
                Ok(attempts)
            };
            async move { result }
        })
        .await;
        assert_eq!(accepted, 3);
    }

    #[tokio::test]
    async fn test_page_connection_relays_and_acks() {
        let platform = RecordingNotifications::default();
        let (channel, envelopes) = create_runtime_channel();
        tokio::spawn(BackgroundRelay::new(platform.clone()).serve(envelopes));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, channel));

        let (mut client, _) = connect_async(format!("ws://{addr}")).await.unwrap();

        // Ignored: not JSON, then an unrelated message type.
        client.send(Message::Text("hello".into())).await.unwrap();
        client
            .send(Message::Text(r#"{"type":"TAB_UPDATE","url":"https://docs.rs"}"#.into()))
            .await
            .unwrap();
        client
            .send(Message::Text(
                r#"{"type":"TIMER_COMPLETE","title":"focus session ended","message":"time for a break"}"#
                    .into(),
            ))
            .await
            .unwrap();

        let reply = loop {
            match client.next().await.unwrap().unwrap() {
                Message::Text(text) => break text,
                _ => continue,
            }
        };
        let ack: Ack = serde_json::from_str(&reply).unwrap();
        assert_eq!(ack, Ack::received());

        let created = timeout(Duration::from_secs(5), platform.wait_created(1))
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].title, "focus session ended");
        assert_eq!(created[0].message, "time for a break");
    }
}
