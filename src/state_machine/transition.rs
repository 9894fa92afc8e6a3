//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same new
//! state and effects. Sockets, clocks and id generation live in the runtime.

use super::{ConnContext, ConnState, Effect, Event};
use crate::contact::extract_contacts;
use crate::frame::decode_frame;
use crate::transcript::EntryKind;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    /// State unchanged, nothing to do
    pub fn unchanged(state: &ConnState) -> Self {
        Self::new(state.clone())
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(
    state: &ConnState,
    context: &ConnContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    // Late events from a handle that has been replaced or released
    if let Some(id) = event.transport_client_id() {
        if !state.owns_transport(id) {
            tracing::debug!(client_id = %id, "Ignoring event from a released session");
            return Ok(TransitionResult::unchanged(state));
        }
    }

    match (state, event) {
        // ============================================================
        // User requests
        // ============================================================

        // Connect from any state; a live handle is closed first
        (_, Event::Connect { client_id }) => {
            let url = context.session_url(&client_id);
            let close_first = state
                .has_live_handle()
                .then_some(Effect::CloseTransport);
            Ok(TransitionResult::new(ConnState::Connecting {
                client_id: client_id.clone(),
            })
            .with_effects(close_first)
            .with_effect(Effect::OpenTransport { client_id, url }))
        }

        // Connected + non-blank text -> transmit, composing
        (ConnState::Connected { client_id, .. }, Event::Send { text })
            if !text.trim().is_empty() =>
        {
            Ok(TransitionResult::new(ConnState::Connected {
                client_id: client_id.clone(),
                composing: true,
            })
            .with_effect(Effect::append(EntryKind::user(text.clone())))
            .with_effect(Effect::Transmit { text })
            .with_effect(Effect::ClearInput))
        }

        // Blank text, or not connected -> silently ignored
        (_, Event::Send { .. }) => Ok(TransitionResult::unchanged(state)),

        // Close drives the status change once the handle reports it
        (_, Event::Disconnect) if state.has_live_handle() => {
            Ok(TransitionResult::unchanged(state).with_effect(Effect::CloseTransport))
        }

        (_, Event::Disconnect) => Ok(TransitionResult::unchanged(state)),

        // ============================================================
        // Transport lifecycle
        // ============================================================
        (ConnState::Connecting { client_id }, Event::Opened { .. }) => {
            let notice = format!("Connected to server as client {client_id}");
            Ok(TransitionResult::new(ConnState::Connected {
                client_id: client_id.clone(),
                composing: false,
            })
            .with_effect(Effect::system_notice(notice)))
        }

        (ConnState::Connecting { .. } | ConnState::Connected { .. }, Event::Closed { reason, .. }) => {
            Ok(TransitionResult::new(ConnState::Disconnected)
                .with_effect(Effect::system_notice(close_notice(&reason)))
                .with_effect(Effect::ReleaseTransport))
        }

        // Error is kept until the next connect; the close only releases the handle
        (ConnState::Error { client_id, message, .. }, Event::Closed { reason, .. }) => {
            Ok(TransitionResult::new(ConnState::Error {
                client_id: client_id.clone(),
                message: message.clone(),
                handle_open: false,
            })
            .with_effect(Effect::system_notice(close_notice(&reason)))
            .with_effect(Effect::ReleaseTransport))
        }

        // Failed to open: no handle was established
        (ConnState::Connecting { client_id }, Event::TransportError { message, .. }) => {
            Ok(TransitionResult::new(ConnState::Error {
                client_id: client_id.clone(),
                message: message.clone(),
                handle_open: false,
            })
            .with_effect(Effect::system_notice(error_notice(&message)))
            .with_effect(Effect::ReleaseTransport))
        }

        // Error on a live connection: the handle stays until close fires
        (ConnState::Connected { client_id, .. }, Event::TransportError { message, .. }) => {
            Ok(TransitionResult::new(ConnState::Error {
                client_id: client_id.clone(),
                message: message.clone(),
                handle_open: true,
            })
            .with_effect(Effect::system_notice(error_notice(&message))))
        }

        (
            ConnState::Error {
                client_id,
                handle_open,
                ..
            },
            Event::TransportError { message, .. },
        ) => Ok(TransitionResult::new(ConnState::Error {
            client_id: client_id.clone(),
            message: message.clone(),
            handle_open: *handle_open,
        })
        .with_effect(Effect::system_notice(error_notice(&message)))),

        // ============================================================
        // Inbound frames
        // ============================================================
        (ConnState::Connected { client_id, .. }, Event::FrameReceived { frame, .. }) => {
            Ok(TransitionResult::new(ConnState::Connected {
                client_id: client_id.clone(),
                composing: false,
            })
            .with_effects(frame_effects(&frame)))
        }

        // Frames still arriving on an errored but open handle
        (ConnState::Error { handle_open: true, .. }, Event::FrameReceived { frame, .. }) => {
            Ok(TransitionResult::unchanged(state).with_effects(frame_effects(&frame)))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in state {state:?}"
        ))),
    }
}

/// Entries produced by one inbound frame.
///
/// Echoes of the user's own message produce nothing. Otherwise each contact
/// block becomes a contact card, and text without contact blocks becomes a
/// single bot message.
pub fn frame_effects(frame: &str) -> Vec<Effect> {
    let decoded = decode_frame(frame);
    if decoded.is_echo() {
        return vec![];
    }

    let contacts = extract_contacts(&decoded.text);
    if contacts.is_empty() {
        vec![Effect::bot_message(decoded.text)]
    } else {
        contacts.into_iter().map(Effect::contact_card).collect()
    }
}

fn close_notice(reason: &str) -> String {
    if reason.is_empty() {
        "Disconnected from server".to_string()
    } else {
        format!("Disconnected from server ({reason})")
    }
}

fn error_notice(message: &str) -> String {
    format!("Connection error: {message}")
}
