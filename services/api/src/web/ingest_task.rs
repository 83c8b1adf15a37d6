//! services/api/src/web/ingest_task.rs
//!
//! This module contains the asynchronous "worker" function for one
//! session's realtime lead ingestion.

use crate::web::{
    protocol::ServerMessage,
    state::{AppState, SessionState},
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use leadmaster_core::normalize::normalize_lead;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The main asynchronous task for one session's lead ingestion.
///
/// Opens one subscription on the shared records feed and accepts rows into
/// the session list until cancelled (session replacement or connection
/// teardown) or until the stream ends. Rows timestamped before the session
/// start are dropped: they belong to a previous query whose subscription
/// may still have been tearing down when they were committed.
pub async fn ingest_process(
    app_state: Arc<AppState>,
    session_state_lock: Arc<Mutex<SessionState>>,
    events: UnboundedSender<ServerMessage>,
    token: Uuid,
    started_at: DateTime<Utc>,
    cancellation_token: CancellationToken,
) {
    let mut rows = match app_state.lead_feed.subscribe().await {
        Ok(rows) => rows,
        Err(e) => {
            error!(
                "Failed to open lead subscription for session {}: {}",
                token, e
            );
            let _ = events.send(ServerMessage::Error {
                message: "Live lead updates are unavailable right now.".to_string(),
            });
            return;
        }
    };
    info!("Lead ingestion started for session {}", token);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Lead ingestion cancelled for session {}", token);
                return;
            }
            row = rows.next() => {
                match row {
                    None => {
                        info!("Lead feed ended for session {}", token);
                        return;
                    }
                    Some(Err(e)) => {
                        warn!("Lead feed error for session {}: {}", token, e);
                    }
                    Some(Ok(row)) => {
                        accept_row(&session_state_lock, &events, token, started_at, &row).await;
                    }
                }
            }
        }
    }
}

/// Accepts one inserted row into the session list if it belongs there.
async fn accept_row(
    session_state_lock: &Arc<Mutex<SessionState>>,
    events: &UnboundedSender<ServerMessage>,
    token: Uuid,
    started_at: DateTime<Utc>,
    row: &Value,
) {
    // A row timestamped before the session start belongs to a previous
    // query; a row without a usable timestamp is accepted unconditionally.
    if let Some(created_at) = row_created_at(row) {
        if created_at < started_at {
            return;
        }
    }

    let lead = normalize_lead(row);

    let mut session = session_state_lock.lock().await;
    if !session.is_current(token) {
        return;
    }
    session.leads.insert(0, lead.clone());
    let _ = events.send(ServerMessage::LeadAdded { lead });
}

fn row_created_at(row: &Value) -> Option<DateTime<Utc>> {
    let raw = row.get("created_at")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
