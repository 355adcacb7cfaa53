#[cfg(test)]
mod tests {
    use crate::settings::{StoredSettings, SETTINGS_KEY};
    use crate::storage::MemoryStorage;
    use crate::vault::StorageVault;
    use scribe_core::ports::*;
    use scribe_core::reference::build_bundle;
    use scribe_core::store::SettingsStore;
    use scribe_types::reference::ReferenceSelection;
    use scribe_types::ScribeError;
    use serde_json::json;
    use std::rc::Rc;

    fn block_on<F: std::future::Future<Output = T>, T>(f: F) -> T {
        use std::task::{Context, Poll, Wake, Waker};
        use std::sync::Arc;

        struct NoopWaker;
        impl Wake for NoopWaker {
            fn wake(self: Arc<Self>) {}
        }

        let waker = Waker::from(Arc::new(NoopWaker));
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(val) => return val,
                Poll::Pending => std::thread::yield_now(),
            }
        }
    }

    // ─── MemoryStorage Tests ─────────────────────────────────

    #[test]
    fn test_memory_storage_set_get_delete() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.backend_name(), "memory");
        assert!(block_on(storage.get("k")).unwrap().is_none());

        block_on(storage.set("k", b"v1")).unwrap();
        block_on(storage.set("k", b"v2")).unwrap();
        assert_eq!(block_on(storage.get("k")).unwrap(), Some(b"v2".to_vec()));
        assert!(block_on(storage.exists("k")).unwrap());

        block_on(storage.delete("k")).unwrap();
        assert!(!block_on(storage.exists("k")).unwrap());
        block_on(storage.delete("never-set")).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_storage_list_keys_sorted() {
        let storage = MemoryStorage::new();
        block_on(storage.set("p:b", b"2")).unwrap();
        block_on(storage.set("p:a", b"1")).unwrap();
        block_on(storage.set("other", b"3")).unwrap();
        assert_eq!(block_on(storage.list_keys("p:")).unwrap(), vec!["p:a", "p:b"]);
        assert_eq!(block_on(storage.list_keys("")).unwrap().len(), 3);
    }

    // ─── StoredSettings Tests ────────────────────────────────

    #[test]
    fn test_stored_settings_first_run_is_none() {
        let settings = StoredSettings::new(Rc::new(MemoryStorage::new()));
        assert_eq!(settings.key(), SETTINGS_KEY);
        assert!(block_on(settings.load()).unwrap().is_none());
    }

    #[test]
    fn test_stored_settings_round_trip() {
        let storage = Rc::new(MemoryStorage::new());
        let settings = StoredSettings::new(storage.clone());
        let blob = json!({"activePresetId": 2, "prompts": {"instruction": "x"}});
        block_on(settings.save(&blob)).unwrap();

        let reopened = StoredSettings::new(storage);
        assert_eq!(block_on(reopened.load()).unwrap(), Some(blob));
    }

    #[test]
    fn test_stored_settings_corrupt_blob_loads_as_none() {
        let storage = Rc::new(MemoryStorage::new());
        block_on(storage.set(SETTINGS_KEY, b"{not json")).unwrap();
        let settings = StoredSettings::new(storage);
        assert!(block_on(settings.load()).unwrap().is_none());
    }

    #[test]
    fn test_settings_store_over_storage() {
        let storage: Rc<dyn StoragePort> = Rc::new(MemoryStorage::new());
        let port = Rc::new(StoredSettings::new(storage.clone()));
        let mut store = block_on(SettingsStore::load(port)).unwrap();
        store.active_preset_mut().api_key = "k".to_string();
        block_on(store.commit()).unwrap();

        let port = Rc::new(StoredSettings::new(storage));
        let reloaded = block_on(SettingsStore::load(port)).unwrap();
        assert_eq!(reloaded.active_preset().api_key, "k");
    }

    // ─── StorageVault Tests ──────────────────────────────────

    fn make_vault() -> StorageVault {
        StorageVault::new(Rc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_vault_write_and_read() {
        let vault = make_vault();
        block_on(vault.write_document("drafts/ch1.md", "It was a dark night.")).unwrap();
        assert_eq!(
            block_on(vault.read_document("drafts/ch1.md")).unwrap(),
            "It was a dark night."
        );
        // Leading slash names the same document
        assert_eq!(
            block_on(vault.read_document("/drafts/ch1.md")).unwrap(),
            "It was a dark night."
        );
    }

    #[test]
    fn test_vault_missing_document() {
        let vault = make_vault();
        let err = block_on(vault.read_document("nope.md")).unwrap_err();
        assert!(matches!(err, ScribeError::Document { ref path, .. } if path == "nope.md"));
    }

    #[test]
    fn test_vault_folder_is_not_a_document() {
        let vault = make_vault();
        block_on(vault.write_document("cast/hero.md", "Hero")).unwrap();
        assert!(block_on(vault.read_document("cast")).is_err());
    }

    #[test]
    fn test_vault_rejects_empty_path() {
        let vault = make_vault();
        assert!(block_on(vault.write_document(" / ", "x")).is_err());
    }

    #[test]
    fn test_vault_unicode_content() {
        let vault = make_vault();
        let text = "주인공은 밤길을 걸었다 🌙";
        block_on(vault.write_document("노트.md", text)).unwrap();
        assert_eq!(block_on(vault.read_document("노트.md")).unwrap(), text);
    }

    #[test]
    fn test_vault_markdown_under_folder() {
        let vault = make_vault();
        block_on(vault.write_document("cast/villain.md", "V")).unwrap();
        block_on(vault.write_document("cast/hero.md", "H")).unwrap();
        block_on(vault.write_document("cast/portrait.png", "P")).unwrap();
        block_on(vault.write_document("cast/minor/cook.md", "C")).unwrap();
        block_on(vault.write_document("castle.md", "not inside")).unwrap();

        assert_eq!(
            block_on(vault.markdown_under("cast/")).unwrap(),
            vec!["cast/hero.md", "cast/minor/cook.md", "cast/villain.md"]
        );
        assert_eq!(block_on(vault.markdown_under("")).unwrap().len(), 4);
        assert_eq!(block_on(vault.list_documents()).unwrap().len(), 5);
    }

    #[test]
    fn test_vault_delete() {
        let vault = make_vault();
        block_on(vault.write_document("a.md", "A")).unwrap();
        block_on(vault.delete_document("a.md")).unwrap();
        assert!(block_on(vault.read_document("a.md")).is_err());
    }

    #[test]
    fn test_vault_feeds_reference_bundle() {
        let vault = make_vault();
        block_on(vault.write_document("a.md", "alpha")).unwrap();
        let selection: ReferenceSelection = ["a.md", "b.md"].into_iter().collect();
        let bundle = block_on(build_bundle(&selection, &vault));
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle[0].name, "a.md");
        assert_eq!(bundle[0].content, "alpha");
    }
}
