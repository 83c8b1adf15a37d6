//! crates/leadmaster_core/src/classify.rs
//!
//! Decides whether an automation response is asking the user for more
//! input. The upstream workflow has no reliable structured signal, so the
//! default policy combines the explicit type tag with a keyword heuristic;
//! a false positive costs one harmless extra clarification turn.

use crate::reply::AutomationReply;

/// Phrases that mark a response as a clarification request. Matched
/// case-insensitively against the output text.
const TRIGGER_PHRASES: &[&str] = &[
    "country code",
    "which country",
    "please specify",
    "need more information",
    "clarify",
];

/// Strategy for classifying automation responses, kept pluggable so the
/// trigger list can be swapped without touching dispatch control flow.
pub trait ClarificationPolicy: Send + Sync {
    fn needs_clarification(&self, reply: &AutomationReply) -> bool;
}

/// The default policy: an explicit `type: "clarification"` tag, or any
/// known trigger phrase in the output text.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClarificationPolicy;

impl ClarificationPolicy for KeywordClarificationPolicy {
    fn needs_clarification(&self, reply: &AutomationReply) -> bool {
        if reply
            .type_tag
            .as_deref()
            .is_some_and(|tag| tag.eq_ignore_ascii_case("clarification"))
        {
            return true;
        }

        match &reply.output {
            Some(output) => {
                let lowered = output.to_lowercase();
                TRIGGER_PHRASES.iter().any(|phrase| lowered.contains(phrase))
            }
            None => false,
        }
    }
}
