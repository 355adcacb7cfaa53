//! The assistant as seen from JavaScript: one session, its settings store,
//! and the ports they run against.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_utils::format::JsValueSerdeExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use scribe_core::event_bus::EventBus;
use scribe_core::manager::{ConversationManager, ExchangeOutcome};
use scribe_core::ports::{DocumentReader, HttpTransport, Notifier, SettingsPort};
use scribe_core::store::SettingsStore;
use scribe_platform::http::FetchTransport;
use scribe_platform::settings::StoredSettings;
use scribe_platform::storage::auto_detect_storage;
use scribe_platform::vault::StorageVault;
use scribe_types::{
    ScribeError,
    preset::Preset,
    prompts::{PromptTemplates, QuickAction},
    reference::ReferenceSelection,
};

use crate::host::{
    self, FolderIndex, HostCallbacks, JsDocumentReader, JsFolderIndex, JsSettingsPort,
};

/// Conversations shown in the recent-history list
const RECENT_LIMIT: usize = 4;

struct Inner {
    manager: RefCell<ConversationManager>,
    store: RefCell<SettingsStore>,
    event_bus: EventBus,
    transport: Rc<dyn HttpTransport>,
    reader: Rc<dyn DocumentReader>,
    folders: Rc<dyn FolderIndex>,
    /// Present when documents live in browser storage rather than the host
    vault: Option<Rc<StorageVault>>,
    notifier: Rc<dyn Notifier>,
}

#[wasm_bindgen]
pub struct ScribeApp {
    inner: Rc<Inner>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeView {
    ok: bool,
    conversation_id: Option<i64>,
    created: bool,
    error: Option<String>,
}

impl From<ExchangeOutcome> for ExchangeView {
    fn from(outcome: ExchangeOutcome) -> Self {
        match outcome {
            ExchangeOutcome::Replied { conversation_id, created } => Self {
                ok: true,
                conversation_id: Some(conversation_id),
                created,
                error: None,
            },
            ExchangeOutcome::Failed { message } => Self {
                ok: false,
                conversation_id: None,
                created: false,
                error: Some(message),
            },
        }
    }
}

#[derive(Serialize)]
struct QuickActionView<'a> {
    key: &'a str,
    label: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppOptions {
    /// Per-request limit; 0 disables it
    timeout_ms: Option<u32>,
}

fn to_js(e: ScribeError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    JsValue::from_serde(value).map_err(|e| to_js(e.into()))
}

/// Build the assistant. Host callbacks that are missing fall back to
/// browser storage: settings under one IndexedDB key, documents in a
/// storage-backed vault.
#[wasm_bindgen]
pub async fn open_scribe(host: JsValue, options: JsValue) -> Result<ScribeApp, JsValue> {
    let callbacks = HostCallbacks::from_js(&host);
    let options: Option<AppOptions> = if options.is_undefined() || options.is_null() {
        None
    } else {
        Some(options.into_serde().map_err(|e| to_js(e.into()))?)
    };

    let needs_storage = callbacks.load_settings.is_none()
        || callbacks.save_settings.is_none()
        || callbacks.read_document.is_none();
    let storage = if needs_storage {
        Some(auto_detect_storage().await)
    } else {
        None
    };

    let settings_port: Rc<dyn SettingsPort> =
        match (&callbacks.load_settings, &callbacks.save_settings, &storage) {
            (Some(load), Some(save), _) => Rc::new(JsSettingsPort::new(load.clone(), save.clone())),
            (_, _, Some(storage)) => Rc::new(StoredSettings::new(storage.clone())),
            _ => return Err(JsValue::from_str("No settings storage available")),
        };

    let (reader, folders, vault) = match (&callbacks.read_document, &storage) {
        (Some(read), _) => {
            let reader: Rc<dyn DocumentReader> = Rc::new(JsDocumentReader::new(read.clone()));
            let folders: Rc<dyn FolderIndex> = match &callbacks.list_markdown {
                Some(list) => Rc::new(JsFolderIndex::new(list.clone())),
                None => Rc::new(NoFolders),
            };
            (reader, folders, None)
        }
        (None, Some(storage)) => {
            let vault = Rc::new(StorageVault::new(storage.clone()));
            let reader: Rc<dyn DocumentReader> = vault.clone();
            let folders: Rc<dyn FolderIndex> = vault.clone();
            (reader, folders, Some(vault))
        }
        (None, None) => return Err(JsValue::from_str("No document source available")),
    };

    let transport: Rc<dyn HttpTransport> = match options.and_then(|o| o.timeout_ms) {
        Some(0) => Rc::new(FetchTransport::with_timeout(None)),
        Some(ms) => Rc::new(FetchTransport::with_timeout(Some(ms))),
        None => Rc::new(FetchTransport::new()),
    };

    let store = SettingsStore::load(settings_port).await.map_err(to_js)?;
    let event_bus = EventBus::new();
    let manager = ConversationManager::open(&store, event_bus.clone());
    log::info!(
        "Scribe ready: preset {}, {} stored conversation(s)",
        store.active_preset().name,
        store.settings().conversations.len()
    );

    Ok(ScribeApp {
        inner: Rc::new(Inner {
            manager: RefCell::new(manager),
            store: RefCell::new(store),
            event_bus,
            transport,
            reader,
            folders,
            vault,
            notifier: host::notifier(&callbacks),
        }),
    })
}

/// Folder listing when the host reads documents but cannot enumerate them
struct NoFolders;

#[async_trait::async_trait(?Send)]
impl FolderIndex for NoFolders {
    async fn markdown_under(&self, _folder: &str) -> scribe_types::Result<Vec<String>> {
        Err(ScribeError::Config("Host cannot list folders".to_string()))
    }
}

impl Inner {
    /// Write the current settings blob. Failures are logged and shown, never
    /// thrown: the in-memory state stays authoritative.
    async fn persist(&self) {
        let (port, snapshot) = {
            let store = self.store.borrow();
            (store.port(), store.snapshot())
        };
        let result = match snapshot {
            Ok(blob) => port.save(&blob).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            log::warn!("Failed to save settings: {}", e);
            self.notifier.notify(&format!("Failed to save settings: {}", e));
        }
    }

    fn persist_later(self: &Rc<Self>) {
        let inner = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            inner.persist().await;
        });
    }
}

#[wasm_bindgen]
impl ScribeApp {
    // ─── Exchange ────────────────────────────────────────────

    /// Send `text` and resolve once the exchange settles. Rejects only when
    /// the send was refused (already sending, empty input, no API key).
    pub fn send_message(&self, text: String) -> js_sys::Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let pending = {
                let store = inner.store.borrow();
                inner
                    .manager
                    .borrow_mut()
                    .begin(&text, &store, inner.notifier.as_ref())
                    .map_err(to_js)?
            };

            // No borrow is held while the request is in flight
            let reply = pending
                .dispatch(inner.reader.as_ref(), inner.transport.as_ref())
                .await;

            let outcome = {
                let mut store = inner.store.borrow_mut();
                inner.manager.borrow_mut().finish(pending, reply, &mut store)
            };
            if let ExchangeOutcome::Replied { .. } = outcome {
                inner.persist().await;
            }
            to_js_value(&ExchangeView::from(outcome))
        })
    }

    pub fn is_sending(&self) -> bool {
        self.inner.manager.borrow().is_sending()
    }

    pub fn input(&self) -> String {
        self.inner.manager.borrow().input.clone()
    }

    pub fn set_input(&self, text: String) {
        self.inner.manager.borrow_mut().input = text;
    }

    pub fn messages(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.inner.manager.borrow().messages())
    }

    /// Events since the last call, oldest first
    pub fn drain_events(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.inner.event_bus.drain())
    }

    // ─── History ─────────────────────────────────────────────

    pub fn conversation_id(&self) -> Option<f64> {
        self.inner.manager.borrow().conversation_id().map(|id| id as f64)
    }

    /// Summaries of every stored conversation, most recent first
    pub fn history(&self) -> Result<JsValue, JsValue> {
        let store = self.inner.store.borrow();
        let summaries: Vec<_> = store.history().into_iter().map(|c| c.summary()).collect();
        to_js_value(&summaries)
    }

    pub fn recent(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.inner.store.borrow().recent(RECENT_LIMIT))
    }

    pub fn load_conversation(&self, id: f64) -> bool {
        let store = self.inner.store.borrow();
        self.inner
            .manager
            .borrow_mut()
            .load_conversation(id as i64, &store)
    }

    pub fn new_conversation(&self) -> bool {
        self.inner.manager.borrow_mut().new_conversation()
    }

    // ─── References ──────────────────────────────────────────

    pub fn reference_paths(&self) -> Vec<String> {
        self.inner.manager.borrow().selection().to_vec()
    }

    pub fn set_reference_paths(&self, paths: Vec<String>) {
        self.replace_selection(paths.into_iter().collect());
    }

    pub fn add_reference(&self, path: String) -> bool {
        let mut selection = self.inner.manager.borrow().selection().clone();
        let added = selection.insert(path);
        if added {
            self.replace_selection(selection);
        }
        added
    }

    pub fn remove_reference(&self, path: String) -> bool {
        let mut selection = self.inner.manager.borrow().selection().clone();
        let removed = selection.remove(&path);
        if removed {
            self.replace_selection(selection);
        }
        removed
    }

    pub fn clear_references(&self) {
        self.replace_selection(ReferenceSelection::new());
    }

    /// Add every markdown document under `folder`. Resolves to the number
    /// of newly selected paths.
    pub fn add_folder(&self, folder: String) -> js_sys::Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let paths = inner.folders.markdown_under(&folder).await.map_err(to_js)?;
            let mut selection = inner.manager.borrow().selection().clone();
            let added = paths.into_iter().filter(|p| selection.insert(p.clone())).count();
            if added > 0 {
                {
                    let mut store = inner.store.borrow_mut();
                    inner.manager.borrow_mut().set_selection(selection, &mut store);
                }
                inner.persist().await;
            }
            log::info!("Added {} document(s) from {}", added, folder);
            Ok(JsValue::from_f64(added as f64))
        })
    }

    /// Store a document in the browser vault. Rejects when documents come
    /// from the host instead.
    pub fn write_document(&self, path: String, text: String) -> js_sys::Promise {
        let vault = self.inner.vault.clone();
        future_to_promise(async move {
            let vault = vault
                .ok_or_else(|| to_js(ScribeError::Config("Documents are managed by the host".to_string())))?;
            vault.write_document(&path, &text).await.map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    // ─── Presets ─────────────────────────────────────────────

    pub fn presets(&self) -> Result<JsValue, JsValue> {
        let store = self.inner.store.borrow();
        let presets: Vec<&Preset> = store.presets().iter().collect();
        to_js_value(&presets)
    }

    pub fn active_preset(&self) -> Result<JsValue, JsValue> {
        to_js_value(self.inner.store.borrow().active_preset())
    }

    /// Add a preset from the default template, make it active, and return its id.
    pub fn add_preset(&self) -> u32 {
        let id = self.inner.store.borrow_mut().add_preset().id;
        self.inner.persist_later();
        id
    }

    pub fn remove_preset(&self, id: u32) -> bool {
        let removed = self
            .inner
            .store
            .borrow_mut()
            .remove_preset(id, self.inner.notifier.as_ref());
        if removed {
            self.inner.persist_later();
        }
        removed
    }

    pub fn select_preset(&self, id: u32) -> bool {
        let selected = self.inner.store.borrow_mut().select_preset(id);
        if selected {
            self.inner.persist_later();
        }
        selected
    }

    /// Overwrite fields of the active preset with those present in `patch`
    /// (stored field names). The id never changes.
    pub fn update_active_preset(&self, patch: JsValue) -> Result<(), JsValue> {
        let patch: Value = patch.into_serde().map_err(|e| to_js(e.into()))?;
        let Value::Object(patch) = patch else {
            return Err(to_js(ScribeError::Config("Preset patch must be an object".to_string())));
        };
        {
            let mut store = self.inner.store.borrow_mut();
            let preset = store.active_preset_mut();
            *preset = patched_preset(preset, patch).map_err(to_js)?;
        }
        self.inner.persist_later();
        Ok(())
    }

    // ─── Prompts ─────────────────────────────────────────────

    pub fn prompts(&self) -> Result<JsValue, JsValue> {
        to_js_value(self.inner.store.borrow().prompts())
    }

    /// Replace the prompt templates. Keys left out become empty.
    pub fn set_prompts(&self, prompts: JsValue) -> Result<(), JsValue> {
        let prompts: PromptTemplates = prompts.into_serde().map_err(|e| to_js(e.into()))?;
        *self.inner.store.borrow_mut().prompts_mut() = prompts;
        self.inner.persist_later();
        Ok(())
    }

    pub fn quick_actions(&self) -> Result<JsValue, JsValue> {
        let actions: Vec<QuickActionView> = QuickAction::all()
            .iter()
            .map(|a| QuickActionView { key: a.key(), label: a.label() })
            .collect();
        to_js_value(&actions)
    }

    /// Fill the input with a quick action's template and return the new input.
    pub fn apply_quick_action(&self, key: String) -> Result<String, JsValue> {
        let action = QuickAction::from_key(&key)
            .ok_or_else(|| to_js(ScribeError::Config(format!("Unknown quick action: {}", key))))?;
        let store = self.inner.store.borrow();
        let mut manager = self.inner.manager.borrow_mut();
        manager.apply_quick_action(action, &store);
        Ok(manager.input.clone())
    }

    // ─── Persistence ─────────────────────────────────────────

    pub fn save_settings(&self) -> js_sys::Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner.persist().await;
            Ok(JsValue::UNDEFINED)
        })
    }
}

impl ScribeApp {
    fn replace_selection(&self, selection: ReferenceSelection) {
        {
            let mut store = self.inner.store.borrow_mut();
            self.inner.manager.borrow_mut().set_selection(selection, &mut store);
        }
        self.inner.persist_later();
    }
}

/// `preset` with the fields of `patch` laid over it, keeping its id
fn patched_preset(
    preset: &Preset,
    patch: serde_json::Map<String, Value>,
) -> scribe_types::Result<Preset> {
    let mut merged = match serde_json::to_value(preset)? {
        Value::Object(map) => map,
        _ => return Err(ScribeError::Serialization("Preset is not an object".to_string())),
    };
    for (key, value) in patch {
        if key != "id" {
            merged.insert(key, value);
        }
    }
    let patched: Preset = serde_json::from_value(Value::Object(merged))?;
    if patched.max_tokens == 0 {
        return Err(ScribeError::Config("max_tokens must be positive".to_string()));
    }
    Ok(patched)
}
