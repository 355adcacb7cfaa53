//! Settings blob kept as JSON under a single storage key.

use std::rc::Rc;
use async_trait::async_trait;
use serde_json::Value;

use scribe_core::ports::{SettingsPort, StoragePort};
use scribe_types::Result;

pub const SETTINGS_KEY: &str = "scribe:settings";

pub struct StoredSettings {
    storage: Rc<dyn StoragePort>,
    key: String,
}

impl StoredSettings {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self::with_key(storage, SETTINGS_KEY)
    }

    pub fn with_key(storage: Rc<dyn StoragePort>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait(?Send)]
impl SettingsPort for StoredSettings {
    /// A blob that is not valid JSON loads as `None`, so the store starts
    /// from defaults instead of refusing to open.
    async fn load(&self) -> Result<Option<Value>> {
        let Some(bytes) = self.storage.get(&self.key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) => {
                log::warn!(
                    "Stored settings under `{}` are unreadable ({}), using defaults",
                    self.key,
                    e
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, blob: &Value) -> Result<()> {
        let bytes = serde_json::to_vec(blob)?;
        self.storage.set(&self.key, &bytes).await?;
        log::debug!(
            "Settings saved to {} ({} bytes)",
            self.storage.backend_name(),
            bytes.len()
        );
        Ok(())
    }
}
