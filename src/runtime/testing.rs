//! Mock implementations for testing
//!
//! These mocks enable runtime testing without real sockets.

use super::traits::*;
use crate::state_machine::Event;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// ============================================================================
// Mock Transport
// ============================================================================

#[derive(Default)]
struct MockState {
    /// URLs passed to `open`, in order
    opened: Vec<String>,
    /// Event senders per opened session
    sessions: Vec<(String, mpsc::Sender<Event>)>,
    /// Frames transmitted by the client
    sent: Vec<String>,
    closes: usize,
    fail_next_open: Option<String>,
    fail_sends: bool,
}

/// Mock transport that records traffic and lets a test play the server
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockState>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `open` fail with `message`
    pub fn fail_next_open(&self, message: impl Into<String>) {
        self.inner.lock().unwrap().fail_next_open = Some(message.into());
    }

    /// Make every send fail
    pub fn fail_sends(&self) {
        self.inner.lock().unwrap().fail_sends = true;
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.inner.lock().unwrap().opened.clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn close_count(&self) -> usize {
        self.inner.lock().unwrap().closes
    }

    fn sender_for(&self, client_id: &str) -> mpsc::Sender<Event> {
        let state = self.inner.lock().unwrap();
        state
            .sessions
            .iter()
            .rev()
            .find(|(id, _)| id == client_id)
            .map(|(_, tx)| tx.clone())
            .expect("no session opened for client id")
    }

    /// Deliver a frame as the server of session `client_id`
    pub async fn push_frame(&self, client_id: &str, frame: impl Into<String>) {
        let tx = self.sender_for(client_id);
        tx.send(Event::FrameReceived {
            client_id: client_id.to_string(),
            frame: frame.into(),
        })
        .await
        .unwrap();
    }

    /// Close session `client_id` from the server side
    pub async fn server_close(&self, client_id: &str, reason: &str) {
        let tx = self.sender_for(client_id);
        tx.send(Event::Closed {
            client_id: client_id.to_string(),
            reason: reason.to_string(),
        })
        .await
        .unwrap();
    }

    /// Report a read error on session `client_id`
    pub async fn server_error(&self, client_id: &str, message: &str) {
        let tx = self.sender_for(client_id);
        tx.send(Event::TransportError {
            client_id: client_id.to_string(),
            message: message.to_string(),
        })
        .await
        .unwrap();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(
        &self,
        url: &str,
        client_id: &str,
        events: mpsc::Sender<Event>,
    ) -> Result<Box<dyn TransportHandle>, TransportError> {
        let mut state = self.inner.lock().unwrap();
        state.opened.push(url.to_string());
        if let Some(message) = state.fail_next_open.take() {
            return Err(TransportError::Other(message));
        }
        state.sessions.push((client_id.to_string(), events));
        Ok(Box::new(MockHandle {
            inner: self.inner.clone(),
        }))
    }
}

struct MockHandle {
    inner: Arc<Mutex<MockState>>,
}

#[async_trait]
impl TransportHandle for MockHandle {
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_sends {
            return Err(TransportError::Other("broken pipe".to_string()));
        }
        state.sent.push(text.to_string());
        Ok(())
    }

    async fn close(&mut self) {
        self.inner.lock().unwrap().closes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::ContactRecord;
    use crate::runtime::{spawn_client, ClientHandle, ClientUpdate};
    use crate::state_machine::{ConnContext, Status};
    use crate::transcript::{ChatEntry, EntryKind};
    use std::time::Duration;
    use tokio::sync::broadcast;
    use tokio::time::timeout;

    fn setup() -> (MockTransport, ClientHandle, broadcast::Receiver<ClientUpdate>) {
        let transport = MockTransport::new();
        let client = spawn_client(
            ConnContext::new("ws://localhost:8000/ws"),
            transport.clone(),
        );
        let updates = client.subscribe();
        (transport, client, updates)
    }

    async fn next_entry(updates: &mut broadcast::Receiver<ClientUpdate>) -> ChatEntry {
        timeout(Duration::from_secs(2), async {
            loop {
                if let ClientUpdate::Entry(entry) = updates.recv().await.unwrap() {
                    return entry;
                }
            }
        })
        .await
        .expect("timed out waiting for an entry")
    }

    /// Wait until the runtime has finished handling a send
    async fn wait_clear_input(updates: &mut broadcast::Receiver<ClientUpdate>) {
        timeout(Duration::from_secs(2), async {
            loop {
                if let ClientUpdate::ClearInput = updates.recv().await.unwrap() {
                    return;
                }
            }
        })
        .await
        .expect("timed out waiting for input to clear");
    }

    /// Connect and consume the connected notice
    async fn connect(
        client: &ClientHandle,
        updates: &mut broadcast::Receiver<ClientUpdate>,
    ) -> String {
        let client_id = client.connect().await.unwrap();
        let entry = next_entry(updates).await;
        assert!(matches!(entry.kind, EntryKind::System { .. }));
        client_id
    }

    #[tokio::test]
    async fn test_connect_announces_client_id() {
        let (transport, client, mut updates) = setup();

        let client_id = client.connect().await.unwrap();
        let entry = next_entry(&mut updates).await;

        let EntryKind::System { text } = entry.kind else {
            panic!("expected a system notice");
        };
        assert!(text.contains(&client_id));
        assert_eq!(
            transport.opened_urls(),
            vec![format!("ws://localhost:8000/ws/{client_id}")]
        );

        let session = client.session().await;
        assert_eq!(session.status, Status::Connected);
        assert_eq!(session.client_id.as_deref(), Some(client_id.as_str()));
    }

    #[tokio::test]
    async fn test_plain_frame_appends_bot_entry() {
        let (transport, client, mut updates) = setup();
        let client_id = connect(&client, &mut updates).await;

        transport.push_frame(&client_id, "Hello").await;

        assert_eq!(next_entry(&mut updates).await.kind, EntryKind::bot("Hello"));
    }

    #[tokio::test]
    async fn test_echo_frame_is_not_displayed() {
        let (transport, client, mut updates) = setup();
        let client_id = connect(&client, &mut updates).await;

        transport
            .push_frame(&client_id, r#"{"type":"user","message":"echo"}"#)
            .await;
        transport.push_frame(&client_id, "after").await;

        // The next entry is the frame after the echo
        assert_eq!(next_entry(&mut updates).await.kind, EntryKind::bot("after"));
        assert_eq!(client.transcript().await.len(), 2);
    }

    #[tokio::test]
    async fn test_contact_blocks_become_cards_in_order() {
        let (transport, client, mut updates) = setup();
        let client_id = connect(&client, &mut updates).await;

        let frame = serde_json::json!({
            "type": "bot",
            "content": "Here you go:\
                <contact><fullName>Jane Doe</fullName><jobTitle>CTO</jobTitle></contact>\
                <contact></contact>\
                <contact><full_name>John Roe</full_name><company_name>Acme</company_name></contact>"
        })
        .to_string();
        transport.push_frame(&client_id, frame).await;
        transport.push_frame(&client_id, "done").await;

        assert_eq!(
            next_entry(&mut updates).await.kind,
            EntryKind::contact(ContactRecord {
                full_name: "Jane Doe".to_string(),
                job_title: "CTO".to_string(),
                ..Default::default()
            })
        );
        assert_eq!(
            next_entry(&mut updates).await.kind,
            EntryKind::contact(ContactRecord {
                full_name: "John Roe".to_string(),
                company_name: "Acme".to_string(),
                ..Default::default()
            })
        );
        // No bot entry for the reply that carried the cards
        assert_eq!(next_entry(&mut updates).await.kind, EntryKind::bot("done"));
    }

    #[tokio::test]
    async fn test_send_transmits_raw_text_and_sets_indicator() {
        let (transport, client, mut updates) = setup();
        let client_id = connect(&client, &mut updates).await;

        client.send("  who is the CTO? ").await.unwrap();
        assert_eq!(
            next_entry(&mut updates).await.kind,
            EntryKind::user("  who is the CTO? ")
        );
        wait_clear_input(&mut updates).await;
        assert_eq!(transport.sent(), vec!["  who is the CTO? ".to_string()]);
        assert!(client.session().await.composing);

        transport.push_frame(&client_id, "Jane").await;
        next_entry(&mut updates).await;
        assert!(!client.session().await.composing);
    }

    #[tokio::test]
    async fn test_blank_send_is_silent() {
        let (transport, client, mut updates) = setup();
        let client_id = connect(&client, &mut updates).await;

        client.send("").await.unwrap();
        client.send("   ").await.unwrap();
        transport.push_frame(&client_id, "barrier").await;

        assert_eq!(next_entry(&mut updates).await.kind, EntryKind::bot("barrier"));
        assert!(transport.sent().is_empty());
        assert!(!client.session().await.composing);
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_silent() {
        let (transport, client, mut updates) = setup();

        client.send("anyone there?").await.unwrap();
        client.connect().await.unwrap();

        // First entry is the connect notice, not the message
        let entry = next_entry(&mut updates).await;
        assert!(matches!(entry.kind, EntryKind::System { .. }));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_closes_and_keeps_transcript() {
        let (transport, client, mut updates) = setup();
        let client_id = connect(&client, &mut updates).await;
        transport.push_frame(&client_id, "Hello").await;
        next_entry(&mut updates).await;

        client.disconnect().await.unwrap();
        let EntryKind::System { text } = next_entry(&mut updates).await.kind else {
            panic!("expected a close notice");
        };
        assert!(text.starts_with("Disconnected"));
        assert_eq!(transport.close_count(), 1);
        assert_eq!(client.session().await.status, Status::Disconnected);
        assert_eq!(client.transcript().await.len(), 3);

        // A second disconnect has nothing to close
        client.disconnect().await.unwrap();
        client.send("still there?").await.unwrap();
        client.connect().await.unwrap();
        assert!(matches!(
            next_entry(&mut updates).await.kind,
            EntryKind::System { .. }
        ));
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_then_retry() {
        let (transport, client, mut updates) = setup();
        transport.fail_next_open("connection refused");

        let first_id = client.connect().await.unwrap();
        let EntryKind::System { text } = next_entry(&mut updates).await.kind else {
            panic!("expected an error notice");
        };
        assert!(text.contains("connection refused"));
        assert_eq!(client.session().await.status, Status::Error);

        let second_id = client.connect().await.unwrap();
        let EntryKind::System { text } = next_entry(&mut updates).await.kind else {
            panic!("expected a connect notice");
        };
        assert!(text.contains(&second_id));
        assert_ne!(first_id, second_id);
        assert_eq!(client.session().await.status, Status::Connected);
        assert_eq!(transport.opened_urls().len(), 2);
    }

    #[tokio::test]
    async fn test_reconnect_closes_previous_handle_and_ignores_its_frames() {
        let (transport, client, mut updates) = setup();
        let old_id = connect(&client, &mut updates).await;
        let new_id = connect(&client, &mut updates).await;

        assert_eq!(transport.close_count(), 1);

        transport.push_frame(&old_id, "late").await;
        transport.push_frame(&new_id, "fresh").await;
        assert_eq!(next_entry(&mut updates).await.kind, EntryKind::bot("fresh"));
        assert_eq!(
            client.session().await.client_id.as_deref(),
            Some(new_id.as_str())
        );
    }

    #[tokio::test]
    async fn test_error_then_close_stays_in_error() {
        let (transport, client, mut updates) = setup();
        let client_id = connect(&client, &mut updates).await;

        transport.server_error(&client_id, "connection reset").await;
        let EntryKind::System { text } = next_entry(&mut updates).await.kind else {
            panic!("expected an error notice");
        };
        assert!(text.contains("connection reset"));

        transport.server_close(&client_id, "abnormal").await;
        next_entry(&mut updates).await;
        assert_eq!(client.session().await.status, Status::Error);
    }

    #[tokio::test]
    async fn test_released_session_in_error_ignores_late_events() {
        let (transport, client, mut updates) = setup();
        let client_id = connect(&client, &mut updates).await;

        transport.server_error(&client_id, "reset").await;
        next_entry(&mut updates).await;
        client.disconnect().await.unwrap();
        let EntryKind::System { text } = next_entry(&mut updates).await.kind else {
            panic!("expected a close notice");
        };
        assert!(text.starts_with("Disconnected from server"));
        let before = client.transcript().await.len();

        // The released handle still had these queued
        transport.push_frame(&client_id, "late").await;
        transport.server_close(&client_id, "").await;
        transport.server_error(&client_id, "reset again").await;

        // A new session is processed after them and acts as a barrier
        let new_id = client.connect().await.unwrap();
        timeout(Duration::from_secs(2), async {
            loop {
                match updates.recv().await.unwrap() {
                    ClientUpdate::Error { message } => panic!("runtime error: {message}"),
                    ClientUpdate::Entry(entry) => {
                        assert_eq!(
                            entry.kind,
                            EntryKind::system(format!("Connected to server as client {new_id}"))
                        );
                        return;
                    }
                    _ => {}
                }
            }
        })
        .await
        .expect("timed out waiting for the new session");

        assert_eq!(client.transcript().await.len(), before + 1);
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_send_surfaces_error() {
        let (transport, client, mut updates) = setup();
        connect(&client, &mut updates).await;
        transport.fail_sends();

        client.send("hello").await.unwrap();
        assert_eq!(next_entry(&mut updates).await.kind, EntryKind::user("hello"));
        let EntryKind::System { text } = next_entry(&mut updates).await.kind else {
            panic!("expected an error notice");
        };
        assert!(text.contains("broken pipe"));
        assert_eq!(client.session().await.status, Status::Error);
    }
}
