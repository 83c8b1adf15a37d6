//! services/api/src/web/state.rs
//!
//! Defines the application's shared and session-specific states.

use crate::config::Config;
use chrono::{DateTime, Utc};
use leadmaster_core::classify::ClarificationPolicy;
use leadmaster_core::domain::{ChatTurn, Lead};
use leadmaster_core::ports::{AutomationService, LeadFeedService};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub automation: Arc<dyn AutomationService>,
    pub lead_feed: Arc<dyn LeadFeedService>,
    pub classifier: Arc<dyn ClarificationPolicy>,
}

//=========================================================================================
// SessionState (Specific to One WebSocket Connection)
//=========================================================================================

/// An enum representing the current mode of the user's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// No query in flight.
    Idle,
    /// A top-level query was sent; awaiting the webhook response.
    Dispatching,
    /// The query was accepted; leads arrive over the subscription.
    Streaming,
    /// The automation asked for more input before it can run the query.
    AwaitingClarification,
}

/// The state for a single, active WebSocket connection.
///
/// Exactly one session (token plus start timestamp) is current at a time;
/// submitting a new top-level query supersedes the old one.
pub struct SessionState {
    /// Opaque token binding requests and feed rows to this session.
    pub session_token: Uuid,
    pub started_at: DateTime<Utc>,
    pub mode: SessionMode,
    /// Newest-first list of leads accepted into the current session.
    pub leads: Vec<Lead>,
    pub transcript: Vec<ChatTurn>,
    pub assistant_typing: bool,
    /// A token to gracefully cancel the current ingestion task.
    pub ingest_token: CancellationToken,
}

impl SessionState {
    /// Creates the connection's initial, idle session state.
    pub fn new() -> Self {
        Self {
            session_token: Uuid::new_v4(),
            started_at: Utc::now(),
            mode: SessionMode::Idle,
            leads: Vec::new(),
            transcript: Vec::new(),
            assistant_typing: false,
            ingest_token: CancellationToken::new(),
        }
    }

    /// Opens a new session scope: fresh token and start timestamp, cleared
    /// lead list and transcript, and a fresh ingestion token.
    ///
    /// The previous ingestion token is cancelled first so the old
    /// subscription tears down before (or while) the new one is
    /// established; a channel left alive here could deliver stale-session
    /// rows into the new session's list.
    pub fn begin_session(&mut self) -> (Uuid, DateTime<Utc>, CancellationToken) {
        self.ingest_token.cancel();
        self.session_token = Uuid::new_v4();
        self.started_at = Utc::now();
        self.mode = SessionMode::Dispatching;
        self.leads.clear();
        self.transcript.clear();
        self.assistant_typing = false;
        self.ingest_token = CancellationToken::new();
        (
            self.session_token,
            self.started_at,
            self.ingest_token.clone(),
        )
    }

    /// Whether a result produced under `token` still belongs to the current
    /// session. Results from superseded sessions must be discarded.
    pub fn is_current(&self, token: Uuid) -> bool {
        self.session_token == token
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
