//! Plain-text rendering of transcript entries for the terminal front-end

use crate::contact::ContactRecord;
use crate::runtime::SessionSnapshot;
use crate::state_machine::Status;
use crate::transcript::{ChatEntry, EntryKind};
use chrono::Local;

pub fn render_entry(entry: &ChatEntry) -> String {
    let time = entry.at.with_timezone(&Local).format("%H:%M:%S");
    match &entry.kind {
        EntryKind::User { text } => format!("[{time}] you: {text}"),
        EntryKind::Bot { text } => format!("[{time}] agent: {text}"),
        EntryKind::System { text } => format!("[{time}] * {text}"),
        EntryKind::Contact { record } => format!("[{time}] contact: {}", render_contact(record)),
    }
}

/// `name, title @ company <link>`, leaving out whatever is empty
pub fn render_contact(record: &ContactRecord) -> String {
    let mut out = String::new();
    if !record.full_name.is_empty() {
        out.push_str(&record.full_name);
    }

    let role = match (record.job_title.is_empty(), record.company_name.is_empty()) {
        (false, false) => format!("{} @ {}", record.job_title, record.company_name),
        (false, true) => record.job_title.clone(),
        (true, false) => record.company_name.clone(),
        (true, true) => String::new(),
    };
    if !role.is_empty() {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(&role);
    }

    if !record.linked_in_url.is_empty() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push('<');
        out.push_str(&record.linked_in_url);
        out.push('>');
    }
    out
}

pub fn render_session(session: &SessionSnapshot) -> String {
    let status = match session.status {
        Status::Disconnected => "disconnected",
        Status::Connecting => "connecting",
        Status::Connected => "connected",
        Status::Error => "error",
    };
    match &session.client_id {
        Some(id) => format!("-- {status} (client {id})"),
        None => format!("-- {status}"),
    }
}
