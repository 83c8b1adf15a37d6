//! crates/leadmaster_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A normalized business contact record.
///
/// Every field is optional: the automation workflow and the realtime feed
/// both deliver loosely-shaped rows, and callers that need a display key
/// filter on `name` themselves. There is no identity field; duplicates from
/// overlapping sources are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub rating: Option<Rating>,
}

/// A rating as delivered by the source: sometimes numeric, sometimes text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    Score(f64),
    Text(String),
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rating::Score(n) => write!(f, "{}", n),
            Rating::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The author of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    Assistant,
    User,
}

/// A single turn in the clarification transcript.
///
/// Turns are append-only within a session. Assistant and user turns
/// alternate in practice, but alternation is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }
}

/// Advanced search options, forwarded verbatim to the automation workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub min_rating: Option<f64>,
    pub include_emails: Option<bool>,
    pub limit: Option<u32>,
}

/// One outbound message to the automation webhook.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub text: String,
    /// The session token the message belongs to.
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// True only for clarification follow-up turns.
    pub follow_up: bool,
    pub options: Option<SearchOptions>,
}
