//! Browser adapters for the scribe-core ports: `fetch` transport,
//! key-value storage, the persisted settings blob, and a document vault.

pub mod http;
pub mod storage;
pub mod settings;
pub mod vault;

#[cfg(test)]
mod tests;
