#[cfg(test)]
mod tests {
    use crate::message::*;
    use crate::conversation::*;
    use crate::preset::*;
    use crate::prompts::*;
    use crate::reference::*;
    use crate::settings::*;
    use crate::error::*;
    use serde_json::json;

    // ─── Message Tests ───────────────────────────────────────

    #[test]
    fn test_message_user() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.is_user());
    }

    #[test]
    fn test_message_assistant() {
        let msg = Message::assistant("I can help");
        assert_eq!(msg.role, Role::Assistant);
        assert!(!msg.is_user());
    }

    #[test]
    fn test_message_wire_shape() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    // ─── Preset Tests ────────────────────────────────────────

    #[test]
    fn test_default_preset() {
        let preset = Preset::default();
        assert_eq!(preset.id, 1);
        assert_eq!(preset.vendor, Vendor::Anthropic);
        assert_eq!(preset.endpoint, "https://api.anthropic.com/v1/messages");
        assert_eq!(preset.max_tokens, 4096);
        assert!(!preset.has_credential());
    }

    #[test]
    fn test_preset_blank_key_is_not_a_credential() {
        let preset = Preset {
            api_key: "   ".to_string(),
            ..Preset::default()
        };
        assert!(!preset.has_credential());
    }

    #[test]
    fn test_preset_stored_field_names() {
        let json = serde_json::to_value(Preset::default()).unwrap();
        assert_eq!(json["apiType"], "anthropic");
        assert_eq!(json["apiKey"], "");
        assert_eq!(json["max_tokens"], 4096);
        assert!(json.get("vendor").is_none());
    }

    #[test]
    fn test_vendor_tags() {
        for vendor in Vendor::all() {
            let json = serde_json::to_value(vendor).unwrap();
            assert_eq!(json.as_str().unwrap(), vendor.tag());
        }
        let google: Vendor = serde_json::from_str("\"google\"").unwrap();
        assert_eq!(google, Vendor::Google);
    }

    #[test]
    fn test_vendor_labels_non_empty() {
        for vendor in Vendor::all() {
            assert!(!vendor.label().is_empty());
            assert!(vendor.default_endpoint().starts_with("https://"));
        }
    }

    // ─── PresetRegistry Tests ────────────────────────────────

    #[test]
    fn test_registry_default_has_one_preset() {
        let registry = PresetRegistry::default();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.active_id(), 1);
    }

    #[test]
    fn test_registry_add_increments_ids() {
        let mut registry = PresetRegistry::default();
        let first = registry.add(Preset::default()).id;
        let second = registry.add(Preset::default()).id;
        assert_eq!(first, 2);
        assert_eq!(second, 3);
        assert_eq!(registry.active_id(), 3);
        assert_eq!(registry.active().name, "Preset 3");
    }

    #[test]
    fn test_registry_add_uses_max_id_not_len() {
        let presets = vec![
            Preset { id: 7, ..Preset::default() },
            Preset { id: 3, ..Preset::default() },
        ];
        let mut registry = PresetRegistry::from_parts(presets, 7);
        assert_eq!(registry.add(Preset::default()).id, 8);
    }

    #[test]
    fn test_registry_remove_last_is_rejected() {
        let mut registry = PresetRegistry::default();
        let result = registry.remove(1);
        assert_eq!(result, Err(ScribeError::LastPreset));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_remove_active_activates_first() {
        let mut registry = PresetRegistry::default();
        registry.add(Preset::default());
        assert_eq!(registry.active_id(), 2);

        let removed = registry.remove(2).unwrap();
        assert_eq!(removed.map(|p| p.id), Some(2));
        assert_eq!(registry.active_id(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_remove_inactive_keeps_active() {
        let mut registry = PresetRegistry::default();
        registry.add(Preset::default());
        registry.remove(1).unwrap();
        assert_eq!(registry.active_id(), 2);
    }

    #[test]
    fn test_registry_remove_unknown_id() {
        let mut registry = PresetRegistry::default();
        registry.add(Preset::default());
        assert_eq!(registry.remove(99).unwrap(), None);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_dangling_active_falls_back_to_first() {
        let presets = vec![
            Preset { id: 4, name: "four".to_string(), ..Preset::default() },
            Preset { id: 5, name: "five".to_string(), ..Preset::default() },
        ];
        let registry = PresetRegistry::from_parts(presets, 42);
        assert_eq!(registry.active().name, "four");
    }

    #[test]
    fn test_registry_empty_parts_heal() {
        let registry = PresetRegistry::from_parts(Vec::new(), 9);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.active_id(), 1);
    }

    #[test]
    fn test_registry_select() {
        let mut registry = PresetRegistry::default();
        registry.add(Preset::default());
        assert!(registry.select(1));
        assert_eq!(registry.active_id(), 1);
        assert!(!registry.select(50));
        assert_eq!(registry.active_id(), 1);
    }

    #[test]
    fn test_registry_active_mut_edits_in_place() {
        let mut registry = PresetRegistry::default();
        registry.active_mut().api_key = "sk-test".to_string();
        assert!(registry.active().has_credential());
    }

    #[test]
    fn test_registry_deserialize_empty_list_heals() {
        let registry: PresetRegistry =
            serde_json::from_value(json!({"presets": [], "activePresetId": 3})).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.active_id(), 1);
    }

    // ─── PromptTemplates Tests ───────────────────────────────

    #[test]
    fn test_prompts_partial_blob() {
        let prompts: PromptTemplates =
            serde_json::from_value(json!({"instruction": "Be terse"})).unwrap();
        assert_eq!(prompts.instruction, "Be terse");
        assert_eq!(prompts.beat_sheet, "");
    }

    #[test]
    fn test_prompts_quick_text_trimmed() {
        let mut prompts = PromptTemplates::default();
        prompts.set_quick_text(QuickAction::BeatSheet, "  write a beat sheet \n");
        assert_eq!(prompts.quick_text(QuickAction::BeatSheet), "write a beat sheet");
        assert_eq!(prompts.quick_text(QuickAction::PlotAnalysis), "");
    }

    #[test]
    fn test_prompts_instruction_blank_is_none() {
        let mut prompts = PromptTemplates::default();
        assert!(prompts.instruction().is_none());
        prompts.instruction = "Stay in character".to_string();
        assert_eq!(prompts.instruction(), Some("Stay in character"));
    }

    #[test]
    fn test_quick_action_keys_round_trip() {
        for action in QuickAction::all() {
            assert_eq!(QuickAction::from_key(action.key()), Some(*action));
        }
        assert_eq!(QuickAction::from_key("nope"), None);
    }

    // ─── ReferenceSelection Tests ────────────────────────────

    #[test]
    fn test_selection_keeps_insertion_order_and_dedups() {
        let selection: ReferenceSelection = ["b.md", "a.md", "b.md"].into_iter().collect();
        let paths: Vec<&str> = selection.iter().collect();
        assert_eq!(paths, vec!["b.md", "a.md"]);
    }

    #[test]
    fn test_selection_remove_and_clear() {
        let mut selection = ReferenceSelection::new();
        assert!(selection.insert("a.md"));
        assert!(!selection.insert("a.md"));
        assert!(selection.remove("a.md"));
        assert!(!selection.remove("a.md"));
        selection.insert("b.md");
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_selection_serializes_as_list() {
        let selection: ReferenceSelection = ["x.md"].into_iter().collect();
        assert_eq!(serde_json::to_value(&selection).unwrap(), json!(["x.md"]));
        let back: ReferenceSelection = serde_json::from_value(json!(["y.md", "y.md"])).unwrap();
        assert_eq!(back.len(), 1);
    }

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown("notes/chapter1.md"));
        assert!(!is_markdown("notes/chapter1.txt"));
        assert!(!is_markdown("notes"));
    }

    // ─── Conversation Tests ──────────────────────────────────

    #[test]
    fn test_title_short_message_still_gets_ellipsis() {
        let title = title_for(&[Message::user("hello")]);
        assert_eq!(title, "hello...");
    }

    #[test]
    fn test_title_truncates_by_characters() {
        let long = "가".repeat(40);
        let title = title_for(&[Message::user(long)]);
        assert_eq!(title.chars().count(), TITLE_PREFIX_CHARS + 3);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_title_without_messages() {
        assert_eq!(title_for(&[]), "New conversation...");
    }

    #[test]
    fn test_conversation_new() {
        let conv = Conversation::new(
            42,
            vec![Message::user("hi"), Message::assistant("hello")],
            ReferenceSelection::new(),
        );
        assert_eq!(conv.id, 42);
        assert_eq!(conv.title, "hi...");
        assert_eq!(conv.created_at, conv.last_updated);
        assert_eq!(conv.summary().message_count, 2);
    }

    #[test]
    fn test_conversation_stored_field_names() {
        let conv = Conversation::new(1, vec![Message::user("a")], ReferenceSelection::new());
        let json = serde_json::to_value(&conv).unwrap();
        assert!(json.get("timestamp").is_some());
        assert!(json.get("lastUpdated").is_some());
        assert!(json.get("selectedFiles").is_some());
    }

    #[test]
    fn test_now_timestamp_shape() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000Z".len());
    }

    // ─── Settings Tests ──────────────────────────────────────

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.presets.len(), 1);
        assert!(settings.conversations.is_empty());
        assert!(settings.selected_reference_paths.is_empty());
        assert_eq!(settings.prompts, PromptTemplates::default());
    }

    #[test]
    fn test_settings_flattened_layout() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert!(json["presets"].is_array());
        assert_eq!(json["activePresetId"], 1);
        assert!(json["selectedReferencePaths"].is_array());
        assert!(json["prompts"].is_object());
    }

    #[test]
    fn test_settings_from_stored_blob() {
        let blob = json!({
            "presets": [{
                "id": 2, "name": "mine", "apiType": "openai",
                "endpoint": "https://api.openai.com/v1/chat/completions",
                "model": "gpt-4o", "apiKey": "sk", "temperature": 0.5, "max_tokens": 100
            }],
            "activePresetId": 2,
            "prompts": {"plotAnalysis": "analyse"}
        });
        let settings: Settings = serde_json::from_value(blob).unwrap();
        assert_eq!(settings.presets.active().vendor, Vendor::OpenAi);
        assert_eq!(settings.prompts.plot_analysis, "analyse");
        assert_eq!(settings.prompts.instruction, "");
    }

    #[test]
    fn test_settings_conversation_lookup() {
        let mut settings = Settings::default();
        settings
            .conversations
            .push(Conversation::new(5, vec![Message::user("x")], ReferenceSelection::new()));
        assert!(settings.conversation(5).is_some());
        assert!(settings.conversation(6).is_none());
    }

    // ─── Error Tests ─────────────────────────────────────────

    #[test]
    fn test_error_display() {
        let err = ScribeError::Http { status: 401, body: "unauthorized".to_string() };
        assert_eq!(err.to_string(), "API error (401): unauthorized");
        assert_eq!(ScribeError::Timeout(500).to_string(), "Timeout after 500ms");
    }

    #[test]
    fn test_error_precondition_classification() {
        assert!(ScribeError::EmptyInput.is_precondition());
        assert!(ScribeError::Busy.is_precondition());
        assert!(ScribeError::MissingApiKey { preset: "p".into() }.is_precondition());
        assert!(!ScribeError::Network("down".into()).is_precondition());
    }

    #[test]
    fn test_error_from_serde() {
        let err: ScribeError = serde_json::from_str::<serde_json::Value>("{bad")
            .unwrap_err()
            .into();
        assert!(matches!(err, ScribeError::Serialization(_)));
    }
}
