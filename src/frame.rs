//! Inbound frame classification
//!
//! A frame is either a JSON envelope (`{"type": ..., "message"|"content": ...}`),
//! a bare JSON string, or plain text. Decoding never fails; anything that does
//! not parse is shown as-is.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sender role declared by an envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Echo of the local user's own message
    User,
    #[default]
    Bot,
    /// Any other declared role, kept verbatim
    Other(String),
}

impl Role {
    fn from_declared(declared: &str) -> Self {
        match declared {
            "user" => Role::User,
            "bot" => Role::Bot,
            other => Role::Other(other.to_string()),
        }
    }
}

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub text: String,
    pub role: Role,
}

impl DecodedFrame {
    fn plain(raw: &str) -> Self {
        Self {
            text: raw.to_string(),
            role: Role::Bot,
        }
    }

    /// Whether this frame echoes the local user and must not be displayed
    pub fn is_echo(&self) -> bool {
        self.role == Role::User
    }
}

/// Non-empty string value of `key`, if any
fn string_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Classify one raw inbound frame.
///
/// The role comes from a non-empty string `type` field and defaults to
/// [`Role::Bot`]. Text is taken from `message`, then `content`, then the value
/// itself when it is a JSON string, and otherwise falls back to the raw frame.
pub fn decode_frame(raw: &str) -> DecodedFrame {
    let Ok(parsed) = serde_json::from_str::<Value>(raw) else {
        return DecodedFrame::plain(raw);
    };

    let role = string_field(&parsed, "type").map_or(Role::Bot, Role::from_declared);

    let text = string_field(&parsed, "message")
        .or_else(|| string_field(&parsed, "content"))
        .or_else(|| parsed.as_str())
        .unwrap_or(raw)
        .to_string();

    DecodedFrame { text, role }
}
