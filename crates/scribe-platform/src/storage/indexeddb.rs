//! IndexedDB storage backend.
//! Persistent across page reloads. Works in all modern browsers.
//! Uses web-sys bindings with wasm-bindgen-futures for async operations.

use async_trait::async_trait;
use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{IdbDatabase, IdbObjectStore, IdbRequest, IdbTransactionMode};

use scribe_core::ports::StoragePort;
use scribe_types::{Result, ScribeError};

const DB_NAME: &str = "scribe_storage";
const STORE_NAME: &str = "kv";
const DB_VERSION: u32 = 1;

pub struct IndexedDbStorage {
    db: IdbDatabase,
}

impl IndexedDbStorage {
    /// Open (or create) the IndexedDB database.
    pub async fn open() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| ScribeError::Storage("No window object".to_string()))?;

        let idb_factory = window
            .indexed_db()
            .map_err(storage_err)?
            .ok_or_else(|| ScribeError::Storage("IndexedDB not available".to_string()))?;

        let open_req = idb_factory
            .open_with_u32(DB_NAME, DB_VERSION)
            .map_err(storage_err)?;

        // First open creates the object store
        let open_req_clone = open_req.clone();
        let onupgrade = Closure::once(move |_event: web_sys::Event| {
            let db = open_req_clone
                .result()
                .ok()
                .and_then(|r| r.dyn_into::<IdbDatabase>().ok());
            match db {
                Some(db) => {
                    if let Err(e) = db.create_object_store(STORE_NAME) {
                        log::warn!("Could not create object store: {:?}", e);
                    }
                }
                None => log::warn!("IndexedDB upgrade without a database"),
            }
        });
        open_req.set_onupgradeneeded(Some(onupgrade.as_ref().unchecked_ref()));
        onupgrade.forget();

        let db: IdbDatabase = await_request(&open_req)
            .await?
            .dyn_into()
            .map_err(storage_err)?;

        Ok(Self { db })
    }

    fn object_store(&self, mode: IdbTransactionMode) -> Result<IdbObjectStore> {
        let tx = self
            .db
            .transaction_with_str_and_mode(STORE_NAME, mode)
            .map_err(storage_err)?;
        tx.object_store(STORE_NAME).map_err(storage_err)
    }
}

#[async_trait(?Send)]
impl StoragePort for IndexedDbStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = self.object_store(IdbTransactionMode::Readonly)?;
        let req = store.get(&JsValue::from_str(key)).map_err(storage_err)?;
        let result = await_request(&req).await?;

        if result.is_undefined() || result.is_null() {
            return Ok(None);
        }
        Ok(Some(Uint8Array::new(&result).to_vec()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let store = self.object_store(IdbTransactionMode::Readwrite)?;
        let req = store
            .put_with_key(&Uint8Array::from(value), &JsValue::from_str(key))
            .map_err(storage_err)?;
        await_request(&req).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let store = self.object_store(IdbTransactionMode::Readwrite)?;
        let req = store.delete(&JsValue::from_str(key)).map_err(storage_err)?;
        await_request(&req).await?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let store = self.object_store(IdbTransactionMode::Readonly)?;
        let req = store.get_all_keys().map_err(storage_err)?;
        let array: Array = await_request(&req).await?.dyn_into().map_err(storage_err)?;

        let mut keys = Vec::new();
        for i in 0..array.length() {
            if let Some(key) = array.get(i).as_string() {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &str {
        "indexeddb"
    }
}

fn storage_err(e: JsValue) -> ScribeError {
    ScribeError::Storage(format!("{:?}", e))
}

/// Wait for an IdbRequest to settle and return its result.
async fn await_request(req: &IdbRequest) -> Result<JsValue> {
    JsFuture::from(request_to_promise(req))
        .await
        .map_err(storage_err)
}

/// Wrap the callback-based IDB request in a Promise for use with JsFuture.
fn request_to_promise(req: &IdbRequest) -> js_sys::Promise {
    let req_for_result = req.clone();
    let req_for_callbacks = req.clone();

    js_sys::Promise::new(&mut move |resolve, reject| {
        let req_inner = req_for_result.clone();
        let onsuccess = Closure::once(move |_: web_sys::Event| {
            let _ = resolve.call1(
                &JsValue::NULL,
                &req_inner.result().unwrap_or(JsValue::UNDEFINED),
            );
        });
        let onerror = Closure::once(move |_: web_sys::Event| {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("IDB request failed"));
        });
        req_for_callbacks.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
        req_for_callbacks.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onsuccess.forget();
        onerror.forget();
    })
}
