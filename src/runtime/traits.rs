//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::state_machine::Event;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Transport failure, surfaced to the user as a system notice
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("{0}")]
    Other(String),
}

/// Opens connections for new sessions
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a connection to `url` for the session `client_id`.
    ///
    /// Inbound frames, the close and any read error are delivered on `events`
    /// tagged with `client_id`. The returned handle is exclusively owned by the
    /// runtime.
    async fn open(
        &self,
        url: &str,
        client_id: &str,
        events: mpsc::Sender<Event>,
    ) -> Result<Box<dyn TransportHandle>, TransportError>;
}

/// A live connection
#[async_trait]
pub trait TransportHandle: Send {
    /// Send one raw text frame
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Close the connection. No further events are delivered for it.
    async fn close(&mut self);
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn open(
        &self,
        url: &str,
        client_id: &str,
        events: mpsc::Sender<Event>,
    ) -> Result<Box<dyn TransportHandle>, TransportError> {
        (**self).open(url, client_id, events).await
    }
}
