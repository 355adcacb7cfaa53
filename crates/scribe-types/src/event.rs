use serde::{Deserialize, Serialize};

/// Events emitted by the conversation manager.
/// The view drains these to re-render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// A send was accepted and the request is being prepared
    ExchangeStart { exchange_id: u64 },

    /// The user's message was appended to the visible conversation
    UserMessage { text: String },

    /// The backend replied
    ReplyReceived { text: String },

    /// The exchange failed; an error message was appended instead of a reply
    ExchangeFailed { message: String },

    /// The conversation was written to the settings store
    ConversationSaved { conversation_id: i64 },

    /// The exchange is over and sending is enabled again
    ExchangeEnd { exchange_id: u64 },
}
