//! Request adapter: builds the vendor-specific HTTP request for one exchange.
//!
//! Pure: no I/O. One match over [`Vendor`] decides the wire shape:
//! - Anthropic: system prompt in a dedicated `system` field
//! - OpenAI: system prompt as a leading `system`-role message
//! - Google: system prompt merged into the first turn's text, key in the URL

use std::collections::BTreeMap;
use serde_json::{json, Value};
use scribe_types::{
    Result,
    message::{Message, Role},
    preset::{Preset, Vendor},
    reference::ReferenceDoc,
};
use crate::ports::HttpRequest;

/// Persona used when no instruction template is configured
pub const DEFAULT_PERSONA: &str = "You are a creative writing assistant helping a novelist.";

/// Header placed between the instruction and the reference documents
pub const REFERENCE_HEADER: &str = "\n\nReference material currently in use:\n\n";

/// Value of the `anthropic-version` header
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Generation action appended to Google endpoints
pub const GENERATE_ACTION: &str = "generateContent";

/// Instruction (or the default persona) followed by every reference
/// document in bundle order.
pub fn system_prompt(instruction: Option<&str>, bundle: &[ReferenceDoc]) -> String {
    let mut prompt = instruction
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_PERSONA)
        .to_string();
    if !bundle.is_empty() {
        prompt.push_str(REFERENCE_HEADER);
        for doc in bundle {
            prompt.push_str(&format!("=== {} ===\n{}\n\n", doc.name, doc.content));
        }
    }
    prompt
}

/// The conversation to send: `prior` with `new_message` appended exactly once.
///
/// The manager pushes the user's message before building the request, so it
/// usually already sits at the end of `prior`; that trailing copy is dropped
/// instead of being sent twice. Earlier turns with the same text are kept.
pub fn conversation_messages<'a>(prior: &'a [Message], new_message: &'a Message) -> Vec<&'a Message> {
    let prior = match prior.split_last() {
        Some((last, rest)) if last == new_message => rest,
        _ => prior,
    };
    prior.iter().chain(std::iter::once(new_message)).collect()
}

/// Complete a Google endpoint with the model and generation action.
///
/// - already contains `:generateContent` → unchanged
/// - ends with `/models/` → append `{model}:generateContent`
/// - contains `/models/` elsewhere (model already named) → append `:generateContent`
/// - otherwise → append `/models/{model}:generateContent`
///
/// Applying it to its own output returns that output unchanged.
pub fn complete_google_endpoint(endpoint: &str, model: &str) -> String {
    let action = format!(":{}", GENERATE_ACTION);
    if endpoint.contains(&action) {
        return endpoint.to_string();
    }
    if endpoint.ends_with("/models/") {
        format!("{}{}{}", endpoint, model, action)
    } else if endpoint.contains("/models/") {
        format!("{}{}", endpoint, action)
    } else {
        format!("{}/models/{}{}", endpoint.trim_end_matches('/'), model, action)
    }
}

/// Build the request for one exchange.
pub fn build_request(
    preset: &Preset,
    instruction: Option<&str>,
    bundle: &[ReferenceDoc],
    prior: &[Message],
    new_message: &Message,
) -> Result<HttpRequest> {
    let system = system_prompt(instruction, bundle);
    let messages = conversation_messages(prior, new_message);

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    let (url, body) = match preset.vendor {
        Vendor::Anthropic => {
            headers.insert("x-api-key".to_string(), preset.api_key.clone());
            headers.insert("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string());
            let body = json!({
                "model": preset.model,
                "max_tokens": preset.max_tokens,
                "temperature": preset.temperature,
                "system": system,
                "messages": messages,
            });
            (preset.endpoint.clone(), body)
        }
        Vendor::OpenAi => {
            headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", preset.api_key),
            );
            let mut wire: Vec<Value> = Vec::with_capacity(messages.len() + 1);
            wire.push(json!({ "role": "system", "content": system }));
            wire.extend(messages.iter().map(|m| json!(m)));
            let body = json!({
                "model": preset.model,
                "max_tokens": preset.max_tokens,
                "temperature": preset.temperature,
                "messages": wire,
            });
            (preset.endpoint.clone(), body)
        }
        Vendor::Google => {
            let contents: Vec<Value> = messages
                .iter()
                .enumerate()
                .map(|(index, m)| {
                    let text = if index == 0 {
                        format!("{}\n\n{}", system, m.content)
                    } else {
                        m.content.clone()
                    };
                    json!({
                        "role": google_role(m.role),
                        "parts": [{ "text": text }],
                    })
                })
                .collect();
            let body = json!({
                "contents": contents,
                "generationConfig": {
                    "temperature": preset.temperature,
                    "maxOutputTokens": preset.max_tokens,
                },
            });
            let endpoint = complete_google_endpoint(&preset.endpoint, &preset.model);
            (format!("{}?key={}", endpoint, preset.api_key), body)
        }
    };

    Ok(HttpRequest {
        url,
        headers,
        body: serde_json::to_string(&body)?,
    })
}

fn google_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        Role::User => "user",
    }
}
