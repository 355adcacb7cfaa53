use serde::{Deserialize, Serialize};

/// Free-text prompt templates. Every field defaults to empty on its own, so a
/// stored blob that knows only some of the keys still loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromptTemplates {
    pub instruction: String,
    pub character_sheet: String,
    pub plot_analysis: String,
    pub brainstorming: String,
    pub beat_sheet: String,
}

/// One-click templates offered next to the input box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuickAction {
    CharacterSheet,
    PlotAnalysis,
    Brainstorming,
    BeatSheet,
}

impl QuickAction {
    pub fn all() -> &'static [QuickAction] {
        &[
            QuickAction::CharacterSheet,
            QuickAction::PlotAnalysis,
            QuickAction::Brainstorming,
            QuickAction::BeatSheet,
        ]
    }

    pub fn key(&self) -> &str {
        match self {
            QuickAction::CharacterSheet => "characterSheet",
            QuickAction::PlotAnalysis => "plotAnalysis",
            QuickAction::Brainstorming => "brainstorming",
            QuickAction::BeatSheet => "beatSheet",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            QuickAction::CharacterSheet => "Character sheet",
            QuickAction::PlotAnalysis => "Plot analysis",
            QuickAction::Brainstorming => "Brainstorming",
            QuickAction::BeatSheet => "Beat sheet",
        }
    }

    pub fn from_key(key: &str) -> Option<QuickAction> {
        QuickAction::all().iter().copied().find(|a| a.key() == key)
    }
}

impl PromptTemplates {
    /// Template text for a quick action, trimmed
    pub fn quick_text(&self, action: QuickAction) -> &str {
        self.slot(action).trim()
    }

    pub fn set_quick_text(&mut self, action: QuickAction, text: impl Into<String>) {
        *self.slot_mut(action) = text.into();
    }

    /// The instruction, or `None` when it is blank
    pub fn instruction(&self) -> Option<&str> {
        if self.instruction.is_empty() {
            None
        } else {
            Some(&self.instruction)
        }
    }

    fn slot(&self, action: QuickAction) -> &String {
        match action {
            QuickAction::CharacterSheet => &self.character_sheet,
            QuickAction::PlotAnalysis => &self.plot_analysis,
            QuickAction::Brainstorming => &self.brainstorming,
            QuickAction::BeatSheet => &self.beat_sheet,
        }
    }

    fn slot_mut(&mut self, action: QuickAction) -> &mut String {
        match action {
            QuickAction::CharacterSheet => &mut self.character_sheet,
            QuickAction::PlotAnalysis => &mut self.plot_analysis,
            QuickAction::Brainstorming => &mut self.brainstorming,
            QuickAction::BeatSheet => &mut self.beat_sheet,
        }
    }
}
