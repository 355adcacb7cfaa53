use serde::{Deserialize, Serialize};
use crate::error::ScribeError;

/// Wire family of an LLM backend. Each one has its own request and response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vendor {
    /// Messages API: dedicated `system` field.
    #[serde(rename = "anthropic")]
    Anthropic,
    /// Chat completions API: system prompt as the leading message.
    #[serde(rename = "openai")]
    OpenAi,
    /// Generative content API: system prompt merged into the first turn.
    #[serde(rename = "google")]
    Google,
}

impl Vendor {
    pub fn default_endpoint(&self) -> &str {
        match self {
            Vendor::Anthropic => "https://api.anthropic.com/v1/messages",
            Vendor::OpenAi => "https://api.openai.com/v1/chat/completions",
            Vendor::Google => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn all() -> &'static [Vendor] {
        &[Vendor::Anthropic, Vendor::OpenAi, Vendor::Google]
    }

    pub fn label(&self) -> &str {
        match self {
            Vendor::Anthropic => "Anthropic",
            Vendor::OpenAi => "OpenAI",
            Vendor::Google => "Google",
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Vendor::Anthropic => "anthropic",
            Vendor::OpenAi => "openai",
            Vendor::Google => "google",
        }
    }
}

/// A named connection profile. Fields missing from a stored preset take the
/// default preset's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preset {
    pub id: u32,
    pub name: String,
    #[serde(rename = "apiType")]
    pub vendor: Vendor,
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f64,
    #[serde(rename = "max_tokens")]
    pub max_tokens: u32,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Default".to_string(),
            vendor: Vendor::Anthropic,
            endpoint: Vendor::Anthropic.default_endpoint().to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key: String::new(),
            temperature: 1.0,
            max_tokens: 4096,
        }
    }
}

impl Preset {
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// The set of presets plus the active selection.
///
/// Always holds at least one preset: construction and deserialization both
/// fall back to the default preset when handed an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RegistryParts")]
pub struct PresetRegistry {
    presets: Vec<Preset>,
    active_preset_id: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryParts {
    #[serde(default)]
    presets: Vec<Preset>,
    #[serde(default)]
    active_preset_id: u32,
}

impl From<RegistryParts> for PresetRegistry {
    fn from(parts: RegistryParts) -> Self {
        PresetRegistry::from_parts(parts.presets, parts.active_preset_id)
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        let preset = Preset::default();
        Self {
            active_preset_id: preset.id,
            presets: vec![preset],
        }
    }
}

impl PresetRegistry {
    /// Build a registry from stored parts. An empty list is replaced by the
    /// default preset and the active id is reset to it; a dangling active id
    /// is kept and resolved lazily by [`PresetRegistry::active`].
    pub fn from_parts(presets: Vec<Preset>, active_preset_id: u32) -> Self {
        if presets.is_empty() {
            return Self::default();
        }
        Self {
            presets,
            active_preset_id,
        }
    }

    /// The preset whose id matches the active id, or the first one.
    pub fn active(&self) -> &Preset {
        let id = self.active_preset_id;
        self.presets
            .iter()
            .find(|p| p.id == id)
            .unwrap_or(&self.presets[0])
    }

    /// Mutable access to the active preset for in-place settings edits.
    pub fn active_mut(&mut self) -> &mut Preset {
        let id = self.active_preset_id;
        let index = self.presets.iter().position(|p| p.id == id).unwrap_or(0);
        &mut self.presets[index]
    }

    pub fn active_id(&self) -> u32 {
        self.active().id
    }

    pub fn get(&self, id: u32) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Always false; kept so the registry reads like a collection.
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Make `id` the active preset. Returns false when no preset has that id.
    pub fn select(&mut self, id: u32) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.active_preset_id = id;
        true
    }

    /// Add a copy of `base` under a fresh id (`max id + 1`), name it after the
    /// id, and make it active.
    pub fn add(&mut self, base: Preset) -> &Preset {
        let id = self.presets.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        self.presets.push(Preset {
            id,
            name: format!("Preset {}", id),
            ..base
        });
        self.active_preset_id = id;
        &self.presets[self.presets.len() - 1]
    }

    /// Remove the preset with `id`. Refuses to remove the last remaining one.
    /// When the removed preset was active, the new first entry becomes active.
    pub fn remove(&mut self, id: u32) -> Result<Option<Preset>, ScribeError> {
        if self.presets.len() <= 1 {
            return Err(ScribeError::LastPreset);
        }
        let Some(index) = self.presets.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let removed = self.presets.remove(index);
        if self.active_preset_id == removed.id {
            self.active_preset_id = self.presets[0].id;
        }
        Ok(Some(removed))
    }
}
