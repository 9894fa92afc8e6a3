//! Runtime for the chat connection
//!
//! Owns the transport handle and the transcript, feeds transport and user
//! events through the state machine and executes the resulting effects.

mod executor;
pub mod traits;
mod ws;

#[cfg(test)]
pub mod testing;

pub use executor::ChatRuntime;
pub use traits::*;
pub use ws::WsTransport;

use crate::state_machine::{ConnContext, ConnState, Event, Status};
use crate::transcript::{ChatEntry, Transcript};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};

const CLIENT_ID_LEN: usize = 8;
const CLIENT_ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Updates sent to the presentation layer
#[derive(Debug, Clone)]
pub enum ClientUpdate {
    /// A new transcript entry
    Entry(ChatEntry),
    /// Connection status, client id or composing indicator changed
    Session(SessionSnapshot),
    /// A message was sent; the input box should be emptied
    ClearInput,
    Error {
        message: String,
    },
}

/// What the presentation layer shows about the connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub client_id: Option<String>,
    pub status: Status,
    /// Agent is composing a reply
    pub composing: bool,
}

impl SessionSnapshot {
    pub fn from_state(state: &ConnState) -> Self {
        Self {
            client_id: state.client_id().map(str::to_string),
            status: state.status(),
            composing: state.is_composing(),
        }
    }
}

/// State readable by any client handle; written only by the runtime
#[derive(Debug, Default)]
pub struct SharedView {
    pub transcript: Transcript,
    pub session: SessionSnapshot,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Chat runtime has stopped")]
    RuntimeStopped,
}

/// Fresh 8-character lowercase alphanumeric session id
pub fn generate_client_id() -> String {
    let mut rng = rand::thread_rng();
    (0..CLIENT_ID_LEN)
        .map(|_| char::from(CLIENT_ID_CHARSET[rng.gen_range(0..CLIENT_ID_CHARSET.len())]))
        .collect()
}

/// Handle to interact with a running chat runtime
#[derive(Clone)]
pub struct ClientHandle {
    event_tx: mpsc::Sender<Event>,
    updates_tx: broadcast::Sender<ClientUpdate>,
    shared: Arc<RwLock<SharedView>>,
}

impl ClientHandle {
    async fn dispatch(&self, event: Event) -> Result<(), ClientError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| ClientError::RuntimeStopped)
    }

    /// Start a new session, replacing any live one. Returns the new client id.
    pub async fn connect(&self) -> Result<String, ClientError> {
        let client_id = generate_client_id();
        self.dispatch(Event::Connect {
            client_id: client_id.clone(),
        })
        .await?;
        Ok(client_id)
    }

    /// Send a message. Ignored unless connected and non-blank.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), ClientError> {
        self.dispatch(Event::Send { text: text.into() }).await
    }

    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.dispatch(Event::Disconnect).await
    }

    /// Subscribe to updates from this point on
    pub fn subscribe(&self) -> broadcast::Receiver<ClientUpdate> {
        self.updates_tx.subscribe()
    }

    /// Copy of the transcript so far
    pub async fn transcript(&self) -> Vec<ChatEntry> {
        self.shared.read().await.transcript.entries().to_vec()
    }

    pub async fn session(&self) -> SessionSnapshot {
        self.shared.read().await.session.clone()
    }
}

/// Start a runtime in the background and return a handle to it
pub fn spawn_client<T>(context: ConnContext, transport: T) -> ClientHandle
where
    T: Transport + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(32);
    let (updates_tx, _) = broadcast::channel(128);
    let shared = Arc::new(RwLock::new(SharedView::default()));

    let runtime = ChatRuntime::new(
        context,
        transport,
        shared.clone(),
        event_rx,
        event_tx.downgrade(),
        updates_tx.clone(),
    );
    tokio::spawn(runtime.run());

    ClientHandle {
        event_tx,
        updates_tx,
        shared,
    }
}
