//! Chat runtime executor

use super::traits::{Transport, TransportHandle};
use super::{ClientUpdate, SessionSnapshot, SharedView};
use crate::state_machine::{transition, ConnContext, ConnState, Effect, Event, TransitionError};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};

/// The single live transport handle and the session it belongs to
struct LiveHandle {
    client_id: String,
    inner: Box<dyn TransportHandle>,
}

/// Owns the connection state, the transport handle and the transcript.
///
/// Events are processed one at a time, so this is the only writer of the
/// transcript and entries are appended in arrival order.
pub struct ChatRuntime<T>
where
    T: Transport + 'static,
{
    context: ConnContext,
    state: ConnState,
    transport: T,
    handle: Option<LiveHandle>,
    shared: Arc<RwLock<SharedView>>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so that the runtime stops once every client handle is dropped
    event_tx: mpsc::WeakSender<Event>,
    updates_tx: broadcast::Sender<ClientUpdate>,
}

impl<T> ChatRuntime<T>
where
    T: Transport + 'static,
{
    pub fn new(
        context: ConnContext,
        transport: T,
        shared: Arc<RwLock<SharedView>>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        updates_tx: broadcast::Sender<ClientUpdate>,
    ) -> Self {
        Self {
            context,
            state: ConnState::Disconnected,
            transport,
            handle: None,
            shared,
            event_rx,
            event_tx,
            updates_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(endpoint = %self.context.endpoint, "Starting chat runtime");

        while let Some(event) = self.event_rx.recv().await {
            if let Err(e) = self.process_event(event).await {
                tracing::error!(error = %e, "Error handling event");
                let _ = self.updates_tx.send(ClientUpdate::Error {
                    message: e.to_string(),
                });
            }
        }

        if let Some(mut live) = self.handle.take() {
            live.inner.close().await;
        }
        tracing::info!("Chat runtime stopped");
    }

    async fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        // Events generated by effects run before the next queued event
        let mut events_to_process = VecDeque::from([event]);

        while let Some(current_event) = events_to_process.pop_front() {
            // Pure state transition
            let result = transition(&self.state, &self.context, current_event)?;
            let old_state = std::mem::replace(&mut self.state, result.new_state);

            if old_state != self.state {
                self.publish_session().await;
            }

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await {
                    events_to_process.push_back(generated_event);
                }
            }
        }

        Ok(())
    }

    async fn publish_session(&mut self) {
        let snapshot = SessionSnapshot::from_state(&self.state);
        self.shared.write().await.session = snapshot.clone();
        let _ = self.updates_tx.send(ClientUpdate::Session(snapshot));
    }

    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::OpenTransport { client_id, url } => {
                if let Some(mut previous) = self.handle.take() {
                    tracing::warn!(client_id = %previous.client_id, "Closing leftover handle before open");
                    previous.inner.close().await;
                }

                let events = self.event_tx.upgrade()?;
                tracing::info!(client_id = %client_id, url = %url, "Connecting");
                match self.transport.open(&url, &client_id, events).await {
                    Ok(inner) => {
                        self.handle = Some(LiveHandle {
                            client_id: client_id.clone(),
                            inner,
                        });
                        Some(Event::Opened { client_id })
                    }
                    Err(e) => {
                        tracing::warn!(client_id = %client_id, error = %e, "Connect failed");
                        Some(Event::TransportError {
                            client_id,
                            message: e.to_string(),
                        })
                    }
                }
            }

            Effect::CloseTransport => {
                let mut live = self.handle.take()?;
                live.inner.close().await;
                Some(Event::Closed {
                    client_id: live.client_id,
                    reason: "closed by client".to_string(),
                })
            }

            Effect::ReleaseTransport => {
                if let Some(live) = self.handle.take() {
                    tracing::debug!(client_id = %live.client_id, "Releasing transport handle");
                }
                None
            }

            Effect::Transmit { text } => {
                let Some(live) = self.handle.as_mut() else {
                    tracing::warn!("Transmit with no live handle");
                    return None;
                };
                match live.inner.send_text(&text).await {
                    Ok(()) => None,
                    Err(e) => {
                        tracing::warn!(client_id = %live.client_id, error = %e, "Send failed");
                        Some(Event::TransportError {
                            client_id: live.client_id.clone(),
                            message: e.to_string(),
                        })
                    }
                }
            }

            Effect::Append { entry } => {
                let stored = self
                    .shared
                    .write()
                    .await
                    .transcript
                    .append(entry, Utc::now())
                    .clone();
                let _ = self.updates_tx.send(ClientUpdate::Entry(stored));
                None
            }

            Effect::ClearInput => {
                let _ = self.updates_tx.send(ClientUpdate::ClearInput);
                None
            }
        }
    }
}
