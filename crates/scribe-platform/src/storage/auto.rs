//! Pick the storage backend for settings and vault documents.
//!
//! Priority: IndexedDB → Memory (fallback, not persisted)

use std::rc::Rc;
use scribe_core::ports::StoragePort;
use super::{IndexedDbStorage, MemoryStorage};

/// Open the best available backend. Never fails: without IndexedDB the
/// assistant still runs, it just forgets everything on reload.
pub async fn auto_detect_storage() -> Rc<dyn StoragePort> {
    match IndexedDbStorage::open().await {
        Ok(idb) => {
            log::info!("Storage backend: IndexedDB");
            Rc::new(idb)
        }
        Err(e) => {
            log::warn!("IndexedDB unavailable ({}), settings will not persist", e);
            Rc::new(MemoryStorage::new())
        }
    }
}
