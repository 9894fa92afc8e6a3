//! Events that drive the connection

/// Events that trigger state transitions
///
/// Transport events carry the client id of the session that produced them so
/// that late events from a replaced or released handle can be recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    Connect {
        /// Freshly generated id for the new session
        client_id: String,
    },
    Send {
        text: String,
    },
    Disconnect,

    // Transport events
    Opened {
        client_id: String,
    },
    FrameReceived {
        client_id: String,
        frame: String,
    },
    Closed {
        client_id: String,
        reason: String,
    },
    TransportError {
        client_id: String,
        message: String,
    },
}

impl Event {
    /// Session the event belongs to, for transport events
    pub fn transport_client_id(&self) -> Option<&str> {
        match self {
            Event::Opened { client_id }
            | Event::FrameReceived { client_id, .. }
            | Event::Closed { client_id, .. }
            | Event::TransportError { client_id, .. } => Some(client_id),
            Event::Connect { .. } | Event::Send { .. } | Event::Disconnect => None,
        }
    }
}
