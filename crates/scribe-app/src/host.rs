//! Ports backed by callbacks from the embedding page.
//!
//! A host (an editor plugin, a test page) hands in plain JS functions.
//! Each may return a value or a Promise; both are awaited the same way.

use std::rc::Rc;
use async_trait::async_trait;
use gloo_utils::format::JsValueSerdeExt;
use js_sys::{Function, Promise, Reflect};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use scribe_core::ports::{DocumentReader, Notifier, SettingsPort};
use scribe_platform::vault::StorageVault;
use scribe_types::{Result, ScribeError};

/// Callbacks read off the host object passed to `open_scribe`
#[derive(Default)]
pub struct HostCallbacks {
    pub load_settings: Option<Function>,
    pub save_settings: Option<Function>,
    pub read_document: Option<Function>,
    pub list_markdown: Option<Function>,
    pub notify: Option<Function>,
}

impl HostCallbacks {
    /// Pick up `loadSettings`, `saveSettings`, `readDocument`,
    /// `listMarkdown`, and `notify`. Missing or non-function members are
    /// left out.
    pub fn from_js(host: &JsValue) -> Self {
        if host.is_undefined() || host.is_null() {
            return Self::default();
        }
        Self {
            load_settings: function(host, "loadSettings"),
            save_settings: function(host, "saveSettings"),
            read_document: function(host, "readDocument"),
            list_markdown: function(host, "listMarkdown"),
            notify: function(host, "notify"),
        }
    }
}

fn function(host: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(host, &JsValue::from_str(name))
        .ok()
        .and_then(|v| v.dyn_into::<Function>().ok())
}

/// Call `f` and wait for its result, resolving it first if it is a Promise.
async fn call(f: &Function, args: &[JsValue]) -> std::result::Result<JsValue, JsValue> {
    let result = match args {
        [] => f.call0(&JsValue::NULL)?,
        [a] => f.call1(&JsValue::NULL, a)?,
        [a, b] => f.call2(&JsValue::NULL, a, b)?,
        _ => return Err(JsValue::from_str("Too many callback arguments")),
    };
    JsFuture::from(Promise::resolve(&result)).await
}

fn js_message(e: &JsValue) -> String {
    e.as_string()
        .or_else(|| {
            e.dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{:?}", e))
}

// ─── Settings ────────────────────────────────────────────────

pub struct JsSettingsPort {
    load: Function,
    save: Function,
}

impl JsSettingsPort {
    pub fn new(load: Function, save: Function) -> Self {
        Self { load, save }
    }
}

#[async_trait(?Send)]
impl SettingsPort for JsSettingsPort {
    async fn load(&self) -> Result<Option<Value>> {
        let value = call(&self.load, &[])
            .await
            .map_err(|e| ScribeError::JsInterop(js_message(&e)))?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        Ok(Some(value.into_serde::<Value>()?))
    }

    async fn save(&self, blob: &Value) -> Result<()> {
        let value = JsValue::from_serde(blob)?;
        call(&self.save, &[value])
            .await
            .map_err(|e| ScribeError::JsInterop(js_message(&e)))?;
        Ok(())
    }
}

// ─── Documents ───────────────────────────────────────────────

pub struct JsDocumentReader {
    read: Function,
}

impl JsDocumentReader {
    pub fn new(read: Function) -> Self {
        Self { read }
    }
}

#[async_trait(?Send)]
impl DocumentReader for JsDocumentReader {
    async fn read_document(&self, path: &str) -> Result<String> {
        let doc_err = |message: String| ScribeError::Document {
            path: path.to_string(),
            message,
        };
        let value = call(&self.read, &[JsValue::from_str(path)])
            .await
            .map_err(|e| doc_err(js_message(&e)))?;
        value
            .as_string()
            .ok_or_else(|| doc_err("Not a document".to_string()))
    }
}

/// Lists the markdown documents under a folder, for adding a whole folder
/// to the reference selection.
#[async_trait(?Send)]
pub trait FolderIndex {
    async fn markdown_under(&self, folder: &str) -> Result<Vec<String>>;
}

pub struct JsFolderIndex {
    list: Function,
}

impl JsFolderIndex {
    pub fn new(list: Function) -> Self {
        Self { list }
    }
}

#[async_trait(?Send)]
impl FolderIndex for JsFolderIndex {
    async fn markdown_under(&self, folder: &str) -> Result<Vec<String>> {
        let value = call(&self.list, &[JsValue::from_str(folder)])
            .await
            .map_err(|e| ScribeError::JsInterop(js_message(&e)))?;
        Ok(value.into_serde::<Vec<String>>()?)
    }
}

#[async_trait(?Send)]
impl FolderIndex for StorageVault {
    async fn markdown_under(&self, folder: &str) -> Result<Vec<String>> {
        StorageVault::markdown_under(self, folder).await
    }
}

// ─── Notices ─────────────────────────────────────────────────

pub struct JsNotifier {
    notify: Function,
}

impl JsNotifier {
    pub fn new(notify: Function) -> Self {
        Self { notify }
    }
}

impl Notifier for JsNotifier {
    fn notify(&self, message: &str) {
        if let Err(e) = self.notify.call1(&JsValue::NULL, &JsValue::from_str(message)) {
            log::warn!("Notice callback failed ({}): {}", js_message(&e), message);
        }
    }
}

/// Used when the host gives no `notify` callback
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::warn!("{}", message);
    }
}

pub fn notifier(callbacks: &HostCallbacks) -> Rc<dyn Notifier> {
    match &callbacks.notify {
        Some(f) => Rc::new(JsNotifier::new(f.clone())),
        None => Rc::new(LogNotifier),
    }
}
