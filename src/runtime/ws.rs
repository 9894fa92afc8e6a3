//! WebSocket transport

use super::traits::{Transport, TransportError, TransportHandle};
use crate::state_machine::Event;
use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Opens one WebSocket per session
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

/// Handle to a live WebSocket connection
struct WsHandle {
    client_id: String,
    sink: WsSink,
    /// Task that reads from the socket and forwards events
    reader: JoinHandle<()>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(
        &self,
        url: &str,
        client_id: &str,
        events: mpsc::Sender<Event>,
    ) -> Result<Box<dyn TransportHandle>, TransportError> {
        tracing::debug!(client_id = %client_id, url = %url, "Opening WebSocket");
        let (ws_stream, _response) = connect_async(url).await?;
        let (sink, read) = ws_stream.split();

        let reader = tokio::spawn(read_frames(client_id.to_string(), read, events));

        Ok(Box::new(WsHandle {
            client_id: client_id.to_string(),
            sink,
            reader,
        }))
    }
}

/// Forward socket frames until the peer closes or the stream fails
async fn read_frames(
    client_id: String,
    mut read: futures::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    events: mpsc::Sender<Event>,
) {
    let reason = loop {
        let frame = match read.next().await {
            Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
            Some(Ok(Message::Binary(bytes))) => String::from_utf8_lossy(&bytes).into_owned(),
            Some(Ok(Message::Close(close))) => {
                break close.map(|c| c.reason.as_str().to_owned()).unwrap_or_default();
            }
            // ping/pong are answered by tungstenite
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::warn!(client_id = %client_id, error = %e, "WebSocket read failed");
                let _ = events
                    .send(Event::TransportError {
                        client_id: client_id.clone(),
                        message: e.to_string(),
                    })
                    .await;
                break String::new();
            }
            None => break String::new(),
        };

        let event = Event::FrameReceived {
            client_id: client_id.clone(),
            frame,
        };
        if events.send(event).await.is_err() {
            // Runtime is gone
            return;
        }
    };

    tracing::info!(client_id = %client_id, reason = %reason, "WebSocket closed by peer");
    let _ = events.send(Event::Closed { client_id, reason }).await;
}

#[async_trait]
impl TransportHandle for WsHandle {
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.sink.send(Message::text(text.to_owned())).await?;
        Ok(())
    }

    async fn close(&mut self) {
        // Stop reading first so nothing more is delivered for this session
        self.reader.abort();
        if let Err(e) = self.sink.send(Message::Close(None)).await {
            tracing::debug!(client_id = %self.client_id, error = %e, "Close frame not sent");
        }
        let _ = self.sink.close().await;
        tracing::info!(client_id = %self.client_id, "WebSocket closed");
    }
}

impl Drop for WsHandle {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
