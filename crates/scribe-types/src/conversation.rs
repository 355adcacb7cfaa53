use serde::{Deserialize, Serialize};
use crate::message::Message;
use crate::reference::ReferenceSelection;

/// Number of characters of the first message kept in a title
pub const TITLE_PREFIX_CHARS: usize = 30;
const UNTITLED: &str = "New conversation";

/// A persisted conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub selected_files: ReferenceSelection,
    /// Creation time, RFC 3339
    #[serde(rename = "timestamp", alias = "createdAt")]
    pub created_at: String,
    /// RFC 3339; history is ordered on this field
    pub last_updated: String,
}

impl Conversation {
    pub fn new(id: i64, messages: Vec<Message>, selected_files: ReferenceSelection) -> Self {
        let now = now_timestamp();
        Self {
            id,
            title: title_for(&messages),
            messages,
            selected_files,
            created_at: now.clone(),
            last_updated: now,
        }
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at.clone(),
            last_updated: self.last_updated.clone(),
            message_count: self.messages.len(),
        }
    }
}

/// Current UTC time in the `YYYY-MM-DDTHH:MM:SS.mmmZ` form. Stored
/// timestamps are compared as strings, so every writer must use this shape.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Title derived from the first message: its first 30 characters followed by
/// an ellipsis, appended even when nothing was cut.
pub fn title_for(messages: &[Message]) -> String {
    let head: String = match messages.first() {
        Some(first) => first.content.chars().take(TITLE_PREFIX_CHARS).collect(),
        None => UNTITLED.to_string(),
    };
    format!("{}...", head)
}

/// Summary of a conversation for listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: i64,
    pub title: String,
    pub created_at: String,
    pub last_updated: String,
    pub message_count: usize,
}
