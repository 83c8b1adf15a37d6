//! services/api/src/web/dispatch_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! one top-level query dispatch.

use crate::web::{
    protocol::ServerMessage,
    state::{AppState, SessionMode, SessionState},
};
use chrono::Utc;
use leadmaster_core::{
    domain::{ChatTurn, OutboundMessage, SearchOptions},
    normalize::normalize_lead,
    reply::AutomationReply,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Fixed client-side deadline for a top-level dispatch. Follow-up turns are
/// not bounded by this; see `clarify_task`.
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Shown as the assistant turn when the automation asks for clarification
/// without any usable output text.
pub(crate) const DEFAULT_CLARIFICATION_PROMPT: &str =
    "I need a bit more information to run this search. Could you add some detail?";

/// Rotating progress messages shown while the dispatch is in flight.
const STATUS_STEPS: &[&str] = &[
    "Searching Google Maps…",
    "Processing results…",
    "Extracting contact information…",
    "Finalizing data…",
];
const STATUS_STEP_INTERVAL: Duration = Duration::from_millis(1200);

/// The main asynchronous task for one top-level query dispatch.
///
/// `token` is the session the query was created under. Every effect is
/// re-checked against the current session under the lock: if a newer
/// session superseded this one while the request was in flight, the result
/// is discarded entirely rather than applied to the wrong session.
pub async fn dispatch_process(
    app_state: Arc<AppState>,
    session_state_lock: Arc<Mutex<SessionState>>,
    events: UnboundedSender<ServerMessage>,
    query_text: String,
    options: Option<SearchOptions>,
    token: Uuid,
) {
    info!("Dispatch started for session {}", token);

    let message = OutboundMessage {
        text: query_text,
        session_id: token,
        timestamp: Utc::now(),
        follow_up: false,
        options,
    };

    // Progress status rotation, independent of the request itself.
    let status_cancel = CancellationToken::new();
    let status_task = tokio::spawn(status_rotation(events.clone(), status_cancel.clone()));

    let result = tokio::time::timeout(
        DISPATCH_TIMEOUT,
        app_state.automation.send_message(&message),
    )
    .await;

    status_cancel.cancel();
    let _ = status_task.await;

    let mut session = session_state_lock.lock().await;
    if !session.is_current(token) {
        info!(
            "Discarding stale dispatch result for superseded session {}",
            token
        );
        return;
    }

    match result {
        Err(_elapsed) => {
            info!("Dispatch timed out for session {}", token);
            session.mode = SessionMode::Idle;
            let _ = events.send(ServerMessage::Notice {
                title: "Request timed out".to_string(),
                message: "The automation did not answer within 60 seconds. Please try again."
                    .to_string(),
            });
        }
        Ok(Err(e)) => {
            warn!("Dispatch failed for session {}: {}", token, e);
            session.mode = SessionMode::Idle;
            let _ = events.send(ServerMessage::Notice {
                title: "Error".to_string(),
                message: e.to_string(),
            });
        }
        Ok(Ok(body)) => {
            let reply = AutomationReply::parse(body.as_ref());
            if app_state.classifier.needs_clarification(&reply) {
                let prompt = reply
                    .output
                    .unwrap_or_else(|| DEFAULT_CLARIFICATION_PROMPT.to_string());
                session.transcript.push(ChatTurn::assistant(prompt.clone()));
                session.mode = SessionMode::AwaitingClarification;
                let _ = events.send(ServerMessage::ClarificationAsked { text: prompt });
            } else {
                // Leads carried directly in the reply (the synchronous
                // response shape) join the list before streaming begins.
                // This path requires a display name.
                let direct: Vec<_> = reply
                    .leads
                    .iter()
                    .map(normalize_lead)
                    .filter(|lead| lead.name.is_some())
                    .collect();
                let count = direct.len();
                for lead in direct {
                    session.leads.insert(0, lead.clone());
                    let _ = events.send(ServerMessage::LeadAdded { lead });
                }
                session.mode = SessionMode::Streaming;
                let message = if count > 0 {
                    format!("{} results found. More leads will stream in as they arrive.", count)
                } else {
                    "Query accepted. Leads will stream in as they are found.".to_string()
                };
                let _ = events.send(ServerMessage::QueryAccepted { message });
            }
        }
    }
}

/// Emits the rotating progress status until cancelled.
async fn status_rotation(events: UnboundedSender<ServerMessage>, cancel: CancellationToken) {
    let _ = events.send(ServerMessage::StatusUpdate {
        text: STATUS_STEPS[0].to_string(),
    });
    let mut step = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(STATUS_STEP_INTERVAL) => {
                step = (step + 1) % STATUS_STEPS.len();
                let _ = events.send(ServerMessage::StatusUpdate {
                    text: STATUS_STEPS[step].to_string(),
                });
            }
        }
    }
}
