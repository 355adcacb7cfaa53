//! Response extractor: pulls the reply text out of a decoded vendor body.

use serde_json::Value;
use scribe_types::preset::Vendor;

/// Returned when a 2xx body does not have the vendor's expected shape
pub const FALLBACK_REPLY: &str = "Failed to parse the response.";

/// JSON pointer to the reply text for each vendor
fn reply_pointer(vendor: Vendor) -> &'static str {
    match vendor {
        Vendor::Anthropic => "/content/0/text",
        Vendor::OpenAi => "/choices/0/message/content",
        Vendor::Google => "/candidates/0/content/parts/0/text",
    }
}

/// The reply text, or [`FALLBACK_REPLY`] when any step of the path is
/// missing or not the expected type. Never fails.
pub fn extract_reply(vendor: Vendor, body: &Value) -> String {
    body.pointer(reply_pointer(vendor))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            log::warn!("Unrecognised {} response shape", vendor.label());
            FALLBACK_REPLY.to_string()
        })
}
