//! Settings store: the single owner of everything persisted.
//!
//! Loaded once from the settings port, mutated in place on the main thread,
//! and written back with [`SettingsStore::commit`], which replaces the stored
//! blob as a whole.

use std::collections::HashSet;
use std::rc::Rc;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use scribe_types::{
    Result,
    conversation::{Conversation, ConversationSummary},
    preset::{Preset, PresetRegistry},
    prompts::{PromptTemplates, QuickAction},
    reference::ReferenceSelection,
    settings::Settings,
};
use crate::ports::{Notifier, SettingsPort};

pub struct SettingsStore {
    settings: Settings,
    port: Rc<dyn SettingsPort>,
}

impl SettingsStore {
    /// Load the stored blob and merge it over the defaults.
    pub async fn load(port: Rc<dyn SettingsPort>) -> Result<Self> {
        let settings = match port.load().await? {
            Some(blob) => {
                let settings = merge_blob(blob);
                log::info!(
                    "Settings loaded: {} preset(s), {} conversation(s)",
                    settings.presets.len(),
                    settings.conversations.len()
                );
                settings
            }
            None => {
                log::info!("No stored settings, using defaults");
                Settings::default()
            }
        };
        Ok(Self { settings, port })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn port(&self) -> Rc<dyn SettingsPort> {
        self.port.clone()
    }

    /// The blob `commit` would write
    pub fn snapshot(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.settings)?)
    }

    /// Persist the whole settings blob.
    pub async fn commit(&self) -> Result<()> {
        let blob = self.snapshot()?;
        self.port.save(&blob).await?;
        log::debug!("Settings committed");
        Ok(())
    }

    // ─── Presets ─────────────────────────────────────────────

    pub fn presets(&self) -> &PresetRegistry {
        &self.settings.presets
    }

    pub fn active_preset(&self) -> &Preset {
        self.settings.presets.active()
    }

    /// Edit the active preset in place
    pub fn active_preset_mut(&mut self) -> &mut Preset {
        self.settings.presets.active_mut()
    }

    /// Add a preset copied from the default template and make it active.
    pub fn add_preset(&mut self) -> &Preset {
        let preset = self.settings.presets.add(Preset::default());
        log::info!("Preset added: {} ({})", preset.name, preset.id);
        preset
    }

    /// Remove a preset. Removing the last one is refused with a notice.
    pub fn remove_preset(&mut self, id: u32, notifier: &dyn Notifier) -> bool {
        match self.settings.presets.remove(id) {
            Ok(Some(removed)) => {
                log::info!("Preset removed: {} ({})", removed.name, removed.id);
                true
            }
            Ok(None) => false,
            Err(e) => {
                notifier.notify(&e.to_string());
                false
            }
        }
    }

    pub fn select_preset(&mut self, id: u32) -> bool {
        self.settings.presets.select(id)
    }

    // ─── Prompts & references ────────────────────────────────

    pub fn prompts(&self) -> &PromptTemplates {
        &self.settings.prompts
    }

    pub fn prompts_mut(&mut self) -> &mut PromptTemplates {
        &mut self.settings.prompts
    }

    pub fn reference_selection(&self) -> &ReferenceSelection {
        &self.settings.selected_reference_paths
    }

    /// Remember `selection` as the last used reference set
    pub fn set_reference_selection(&mut self, selection: ReferenceSelection) {
        self.settings.selected_reference_paths = selection;
    }

    // ─── Conversations ───────────────────────────────────────

    pub fn conversation(&self, id: i64) -> Option<&Conversation> {
        self.settings.conversation(id)
    }

    /// Replace the conversation with the same id, or put a new one at the
    /// front. An existing record keeps its creation time. Returns true when
    /// a new record was created.
    pub fn upsert_conversation(&mut self, mut conversation: Conversation) -> bool {
        let conversations = &mut self.settings.conversations;
        match conversations.iter_mut().find(|c| c.id == conversation.id) {
            Some(existing) => {
                conversation.created_at = std::mem::take(&mut existing.created_at);
                *existing = conversation;
                false
            }
            None => {
                conversations.insert(0, conversation);
                true
            }
        }
    }

    /// Id for a new conversation: the creation time in epoch milliseconds,
    /// bumped past every stored id so two sessions never share one.
    pub fn next_conversation_id(&self, now_millis: i64) -> i64 {
        let max_id = self
            .settings
            .conversations
            .iter()
            .map(|c| c.id)
            .max()
            .unwrap_or(0);
        now_millis.max(max_id + 1)
    }

    /// All conversations, most recently updated first
    pub fn history(&self) -> Vec<&Conversation> {
        let mut history: Vec<&Conversation> = self.settings.conversations.iter().collect();
        history.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        history
    }

    pub fn recent(&self, limit: usize) -> Vec<ConversationSummary> {
        self.history()
            .into_iter()
            .take(limit)
            .map(Conversation::summary)
            .collect()
    }
}

// ─── Migration ───────────────────────────────────────────────

/// Merge a stored blob over the defaults, field by field.
///
/// A field that is missing or does not decode keeps its default; nested
/// prompt templates fall back per key, presets and conversations per entry. An empty
/// preset list is replaced by the default preset.
pub fn merge_blob(blob: Value) -> Settings {
    let Value::Object(map) = blob else {
        log::warn!("Stored settings are not an object, using defaults");
        return Settings::default();
    };

    let presets = merge_presets(map.get("presets"));
    if presets.is_empty() {
        log::info!("No stored presets, restoring the default preset");
    }
    let active_id: u32 = field(&map, "activePresetId").unwrap_or(1);

    Settings {
        presets: PresetRegistry::from_parts(presets, active_id),
        conversations: merge_conversations(map.get("conversations")),
        selected_reference_paths: field(&map, "selectedReferencePaths").unwrap_or_default(),
        prompts: merge_prompts(map.get("prompts")),
    }
}

fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    let value = map.get(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("Ignoring stored field `{}`: {}", key, e);
            None
        }
    }
}

/// Decode presets one entry at a time. Unreadable entries are dropped, a
/// missing, zero, or repeated id gets a fresh `max + 1`, and a zero token
/// limit falls back to the default.
fn merge_presets(value: Option<&Value>) -> Vec<Preset> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    let mut presets: Vec<Preset> = items
        .iter()
        .filter_map(|item| match serde_json::from_value::<Preset>(item.clone()) {
            Ok(preset) => Some(preset),
            Err(e) => {
                log::warn!("Dropping unreadable stored preset: {}", e);
                None
            }
        })
        .collect();

    // Entries stored without an id decode as the default id, so only the
    // first holder of an id keeps it
    let mut next_id = presets.iter().map(|p| p.id).max().unwrap_or(0);
    let mut seen = HashSet::new();
    for preset in presets.iter_mut() {
        if preset.id == 0 || !seen.insert(preset.id) {
            next_id += 1;
            log::warn!("Preset {} had a missing or repeated id, now {}", preset.name, next_id);
            preset.id = next_id;
            seen.insert(next_id);
        }
        if preset.max_tokens == 0 {
            preset.max_tokens = Preset::default().max_tokens;
        }
    }
    presets
}

fn merge_conversations(value: Option<&Value>) -> Vec<Conversation> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<Conversation>(item.clone()) {
            Ok(conv) => Some(conv),
            Err(e) => {
                log::warn!("Dropping unreadable stored conversation: {}", e);
                None
            }
        })
        .collect()
}

fn merge_prompts(value: Option<&Value>) -> PromptTemplates {
    let mut prompts = PromptTemplates::default();
    let Some(Value::Object(map)) = value else {
        return prompts;
    };
    if let Some(text) = map.get("instruction").and_then(Value::as_str) {
        prompts.instruction = text.to_string();
    }
    for action in QuickAction::all() {
        if let Some(text) = map.get(action.key()).and_then(Value::as_str) {
            prompts.set_quick_text(*action, text);
        }
    }
    prompts
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
