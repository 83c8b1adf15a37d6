//! crates/leadmaster_core/src/reply.rs
//!
//! Best-effort interpretation of the automation webhook's response body.
//! The upstream workflow is loosely specified: the human-readable text, the
//! explicit type tag, and any embedded lead records all move between
//! alternative keys across workflow revisions.

use serde_json::Value;

const OUTPUT_KEYS: &[&str] = &["output", "message", "text"];
const LEAD_ARRAY_KEYS: &[&str] = &["leads", "data", "result", "items"];

/// The interpreted shape of one webhook response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutomationReply {
    /// Explicit classifier tag (`{"type": "clarification"}`), when present.
    pub type_tag: Option<String>,
    /// Human-readable output text, from the first alternative key carrying one.
    pub output: Option<String>,
    /// Lead-like records carried directly in the response.
    pub leads: Vec<Value>,
}

impl AutomationReply {
    /// Interprets a parsed response body. An absent body (empty response or
    /// transport-level parse failure) yields the empty reply; nothing here
    /// is fatal.
    pub fn parse(body: Option<&Value>) -> Self {
        let Some(body) = body else {
            return Self::default();
        };

        let type_tag = body
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);

        let output = OUTPUT_KEYS.iter().find_map(|key| {
            body.get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });

        // A bare top-level array is itself the lead list.
        let leads = match body.as_array() {
            Some(items) => items.clone(),
            None => LEAD_ARRAY_KEYS
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_array).cloned())
                .unwrap_or_default(),
        };

        Self {
            type_tag,
            output,
            leads,
        }
    }
}
