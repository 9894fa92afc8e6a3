//! Effects produced by state transitions

use crate::contact::ContactRecord;
use crate::transcript::EntryKind;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a transport for a new session
    OpenTransport { client_id: String, url: String },

    /// Close the live handle; the executor then feeds back `Closed`
    CloseTransport,

    /// Drop the handle without sending anything (peer already gone)
    ReleaseTransport,

    /// Send raw text over the live handle
    Transmit { text: String },

    /// Append an entry to the transcript
    Append { entry: EntryKind },

    /// Tell the presentation layer to clear its input buffer
    ClearInput,
}

impl Effect {
    pub fn append(entry: EntryKind) -> Self {
        Effect::Append { entry }
    }

    pub fn system_notice(text: impl Into<String>) -> Self {
        Effect::append(EntryKind::system(text))
    }

    pub fn contact_card(record: ContactRecord) -> Self {
        Effect::append(EntryKind::contact(record))
    }

    pub fn bot_message(text: impl Into<String>) -> Self {
        Effect::append(EntryKind::bot(text))
    }
}
