use serde::{Deserialize, Serialize};
use crate::conversation::Conversation;
use crate::preset::PresetRegistry;
use crate::prompts::PromptTemplates;
use crate::reference::ReferenceSelection;

/// Everything the assistant persists, saved and loaded as one blob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Serialized as the top-level `presets` and `activePresetId` fields
    #[serde(flatten)]
    pub presets: PresetRegistry,
    pub conversations: Vec<Conversation>,
    /// Reference selection restored when a new session opens
    pub selected_reference_paths: ReferenceSelection,
    pub prompts: PromptTemplates,
}

impl Settings {
    pub fn conversation(&self, id: i64) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }
}
