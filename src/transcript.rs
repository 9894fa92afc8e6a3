//! Append-only chat transcript

use crate::contact::ContactRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a transcript entry carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    User { text: String },
    Bot { text: String },
    /// Connection lifecycle notice
    System { text: String },
    Contact { record: ContactRecord },
}

impl EntryKind {
    pub fn user(text: impl Into<String>) -> Self {
        EntryKind::User { text: text.into() }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        EntryKind::Bot { text: text.into() }
    }

    pub fn system(text: impl Into<String>) -> Self {
        EntryKind::System { text: text.into() }
    }

    pub fn contact(record: ContactRecord) -> Self {
        EntryKind::Contact { record }
    }
}

/// One displayed entry, stamped when it was appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    #[serde(flatten)]
    pub kind: EntryKind,
    pub at: DateTime<Utc>,
}

/// Ordered log of chat entries. Entries are never edited or removed.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp and append an entry, returning the stored copy
    pub fn append(&mut self, kind: EntryKind, at: DateTime<Utc>) -> &ChatEntry {
        self.entries.push(ChatEntry { kind, at });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter()
    }
}
