//! Contact Chat - terminal chat client for a remote agent
//!
//! Keeps one WebSocket session to the agent, classifies every inbound frame
//! and turns `<contact>` markup in agent replies into contact cards.

pub mod config;
pub mod contact;
pub mod frame;
pub mod render;
pub mod runtime;
pub mod state_machine;
pub mod transcript;

pub use config::ClientConfig;
pub use contact::{extract_contacts, ContactRecord};
pub use frame::{decode_frame, DecodedFrame, Role};
pub use runtime::{spawn_client, ClientHandle, ClientUpdate, SessionSnapshot, WsTransport};
pub use transcript::{ChatEntry, EntryKind, Transcript};
