use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScribeError {
    #[error("Please enter a message first.")]
    EmptyInput,

    #[error("Please configure an API key for preset \"{preset}\" first.")]
    MissingApiKey { preset: String },

    #[error("A request is already in progress.")]
    Busy,

    #[error("At least one preset is required.")]
    LastPreset,

    #[error("API error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Document error: {path}: {message}")]
    Document { path: String, message: String },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JS interop error: {0}")]
    JsInterop(String),
}

impl ScribeError {
    /// Rejections raised before anything is sent. These leave all state untouched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ScribeError::EmptyInput
                | ScribeError::MissingApiKey { .. }
                | ScribeError::Busy
                | ScribeError::LastPreset
        )
    }
}

impl From<serde_json::Error> for ScribeError {
    fn from(e: serde_json::Error) -> Self {
        ScribeError::Serialization(e.to_string())
    }
}
