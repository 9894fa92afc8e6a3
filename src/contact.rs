//! Contact extraction from agent replies
//!
//! Agent replies may embed `<contact>...</contact>` blocks carrying tagged
//! fields. Extraction is total: malformed markup yields fewer records, never
//! an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A contact card pulled out of a `<contact>` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub full_name: String,
    pub company_name: String,
    pub job_title: String,
    pub linked_in_url: String,
}

impl ContactRecord {
    /// True when no field carries any text
    pub fn is_empty(&self) -> bool {
        self.full_name.is_empty()
            && self.company_name.is_empty()
            && self.job_title.is_empty()
            && self.linked_in_url.is_empty()
    }
}

/// Lazy so that a block ends at the first closing tag after its opener.
static CONTACT_BLOCK: LazyLock<Regex> = LazyLock::new(|| field_regex("contact"));

/// Tag-name variants per field, in priority order
const FULL_NAME_TAGS: &[&str] = &["fullName", "full_name"];
const COMPANY_NAME_TAGS: &[&str] = &["companyName", "company_name"];
const JOB_TITLE_TAGS: &[&str] = &["jobTitle", "job_title"];
const LINKED_IN_URL_TAGS: &[&str] = &["linkedInURL", "linkedin_url"];

struct FieldMatchers {
    full_name: Vec<Regex>,
    company_name: Vec<Regex>,
    job_title: Vec<Regex>,
    linked_in_url: Vec<Regex>,
}

static FIELDS: LazyLock<FieldMatchers> = LazyLock::new(|| FieldMatchers {
    full_name: FULL_NAME_TAGS.iter().map(|t| field_regex(t)).collect(),
    company_name: COMPANY_NAME_TAGS.iter().map(|t| field_regex(t)).collect(),
    job_title: JOB_TITLE_TAGS.iter().map(|t| field_regex(t)).collect(),
    linked_in_url: LINKED_IN_URL_TAGS.iter().map(|t| field_regex(t)).collect(),
});

/// Case-insensitive `<tag>(inner)</tag>`, `.` spanning newlines, shortest body.
fn field_regex(tag: &str) -> Regex {
    let tag = regex::escape(tag);
    // Tag names are escaped constants, so the pattern always compiles.
    Regex::new(&format!(r"(?is)<{tag}>(.*?)</{tag}>")).expect("static tag pattern compiles")
}

/// First variant that matches wins; the captured text is trimmed.
fn first_field(block: &str, variants: &[Regex]) -> String {
    variants
        .iter()
        .find_map(|re| re.captures(block))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn parse_block(block: &str) -> ContactRecord {
    let fields = &*FIELDS;
    ContactRecord {
        full_name: first_field(block, &fields.full_name),
        company_name: first_field(block, &fields.company_name),
        job_title: first_field(block, &fields.job_title),
        linked_in_url: first_field(block, &fields.linked_in_url),
    }
}

/// Extract every non-empty contact record from `text`, in source order.
///
/// Blocks are matched non-overlapping from left to right. An opening tag
/// with no closer contributes nothing. With nested openers the block runs
/// from the outer opener to the first closer, so the inner fields are read
/// as part of the outer block.
pub fn extract_contacts(text: &str) -> Vec<ContactRecord> {
    CONTACT_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|body| parse_block(body.as_str()))
        .filter(|record| !record.is_empty())
        .collect()
}
