pub mod message;
pub mod event;
pub mod preset;
pub mod prompts;
pub mod reference;
pub mod conversation;
pub mod settings;
pub mod error;

#[cfg(test)]
mod tests;

pub use error::ScribeError;
pub type Result<T> = std::result::Result<T, ScribeError>;
