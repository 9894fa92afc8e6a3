//! Connection state types
//!
//! The composing indicator lives on `Connected` only. It is cleared by the
//! next inbound frame, and also when the session ends in an error or a close.

use serde::{Deserialize, Serialize};

/// Connection status shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Connection state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnState {
    /// No session; initial state and the state after a clean close
    #[default]
    Disconnected,

    /// Transport open requested, waiting for the open event
    Connecting { client_id: String },

    /// Session is live
    Connected {
        client_id: String,
        /// Agent is composing a reply (set on send, cleared on the next frame)
        composing: bool,
    },

    /// Transport reported an error; stays here until the next connect
    Error {
        client_id: String,
        message: String,
        /// Whether the handle is still open and a close event will follow
        handle_open: bool,
    },
}

impl ConnState {
    pub fn status(&self) -> Status {
        match self {
            ConnState::Disconnected => Status::Disconnected,
            ConnState::Connecting { .. } => Status::Connecting,
            ConnState::Connected { .. } => Status::Connected,
            ConnState::Error { .. } => Status::Error,
        }
    }

    /// Client id of the current session, if one exists
    pub fn client_id(&self) -> Option<&str> {
        match self {
            ConnState::Disconnected => None,
            ConnState::Connecting { client_id }
            | ConnState::Connected { client_id, .. }
            | ConnState::Error { client_id, .. } => Some(client_id),
        }
    }

    /// Whether a transport handle is (or is about to be) held
    pub fn has_live_handle(&self) -> bool {
        match self {
            ConnState::Disconnected => false,
            ConnState::Connecting { .. } | ConnState::Connected { .. } => true,
            ConnState::Error { handle_open, .. } => *handle_open,
        }
    }

    pub fn is_composing(&self) -> bool {
        matches!(self, ConnState::Connected { composing: true, .. })
    }

    /// True when `client_id` names the current session
    pub fn is_current(&self, client_id: &str) -> bool {
        self.client_id() == Some(client_id)
    }

    /// True when events from `client_id`'s transport should still be handled:
    /// it is the current session and its handle has not been released
    pub fn owns_transport(&self, client_id: &str) -> bool {
        self.is_current(client_id) && self.has_live_handle()
    }
}

/// Fixed configuration for the connection (immutable for the client's lifetime)
#[derive(Debug, Clone)]
pub struct ConnContext {
    /// Base endpoint; the client id is appended as the last path segment
    pub endpoint: String,
}

impl ConnContext {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn session_url(&self, client_id: &str) -> String {
        session_url(&self.endpoint, client_id)
    }
}

/// Join a base endpoint and a client id: `ws://host/ws` + `abc` -> `ws://host/ws/abc`
pub fn session_url(base: &str, client_id: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), client_id)
}
