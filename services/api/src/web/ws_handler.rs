//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! It manages the session's state machine and delegates tasks.

use crate::web::{
    clarify_task::follow_up_process,
    dispatch_task::dispatch_process,
    ingest_task::ingest_process,
    protocol::{ClientMessage, ServerMessage},
    state::{AppState, SessionState},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use leadmaster_core::export::{leads_to_csv, leads_to_tsv, CSV_FILENAME, SHEET_URL};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();

    // All workers emit ServerMessages through one channel; a single writer
    // task owns the socket sink so outbound frames stay ordered.
    let (events, mut event_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let writer_task = tokio::spawn(async move {
        while let Some(msg) = event_rx.recv().await {
            let json = serde_json::to_string(&msg).unwrap();
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let session_state_lock = Arc::new(Mutex::new(SessionState::new()));
    let mut ingest_task_handle: Option<JoinHandle<()>> = None;
    let mut dispatch_task_handle: Option<JoinHandle<()>> = None;
    let mut clarify_task_handle: Option<JoinHandle<()>> = None;

    // --- Main Message Loop ---
    loop {
        if let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_text_message(
                        text.to_string(),
                        &app_state,
                        &session_state_lock,
                        &events,
                        &mut ingest_task_handle,
                        &mut dispatch_task_handle,
                        &mut clarify_task_handle,
                    )
                    .await;
                }
                Message::Close(_) => {
                    info!("Client sent close message.");
                    break;
                }
                _ => {}
            }
        } else {
            info!("Client disconnected.");
            break;
        }
    }

    // --- Cleanup ---
    // Release the subscription and stop outstanding workers.
    session_state_lock.lock().await.ingest_token.cancel();
    if let Some(handle) = ingest_task_handle {
        handle.abort();
    }
    if let Some(handle) = dispatch_task_handle {
        handle.abort();
    }
    if let Some(handle) = clarify_task_handle {
        handle.abort();
    }
    writer_task.abort();
    info!("WebSocket connection closed.");
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(
    text: String,
    app_state: &Arc<AppState>,
    session_state_lock: &Arc<Mutex<SessionState>>,
    events: &mpsc::UnboundedSender<ServerMessage>,
    ingest_task_handle: &mut Option<JoinHandle<()>>,
    dispatch_task_handle: &mut Option<JoinHandle<()>>,
    clarify_task_handle: &mut Option<JoinHandle<()>>,
) {
    match serde_json::from_str::<ClientMessage>(&text) {
        Ok(client_msg) => match client_msg {
            ClientMessage::SubmitQuery { text, options } => {
                if text.trim().is_empty() {
                    let _ = events.send(ServerMessage::Notice {
                        title: "Missing info".to_string(),
                        message: "Please enter a search query.".to_string(),
                    });
                    return;
                }

                let (token, started_at, ingest_cancel) =
                    session_state_lock.lock().await.begin_session();
                info!("New session {} started", token);
                let _ = events.send(ServerMessage::SessionStarted { session_id: token });

                // The previous subscription was cancelled inside
                // begin_session; the replaced handle winds down on its own.
                let ingest_task = {
                    let app_state = app_state.clone();
                    let session_state_lock = session_state_lock.clone();
                    let events = events.clone();
                    tokio::spawn(async move {
                        ingest_process(
                            app_state,
                            session_state_lock,
                            events,
                            token,
                            started_at,
                            ingest_cancel,
                        )
                        .await;
                    })
                };
                *ingest_task_handle = Some(ingest_task);

                // An in-flight dispatch for the old session is not aborted;
                // its result is discarded by the stale-token guard.
                let dispatch_task = {
                    let app_state = app_state.clone();
                    let session_state_lock = session_state_lock.clone();
                    let events = events.clone();
                    tokio::spawn(async move {
                        dispatch_process(
                            app_state,
                            session_state_lock,
                            events,
                            text.trim().to_string(),
                            options,
                            token,
                        )
                        .await;
                    })
                };
                *dispatch_task_handle = Some(dispatch_task);
            }
            ClientMessage::FollowUp { text } => {
                let task = {
                    let app_state = app_state.clone();
                    let session_state_lock = session_state_lock.clone();
                    let events = events.clone();
                    tokio::spawn(async move {
                        follow_up_process(app_state, session_state_lock, events, text).await;
                    })
                };
                *clarify_task_handle = Some(task);
            }
            ClientMessage::ExportCsv => {
                let session = session_state_lock.lock().await;
                let content = leads_to_csv(&session.leads);
                let _ = events.send(ServerMessage::CsvExport {
                    filename: CSV_FILENAME.to_string(),
                    content,
                });
            }
            ClientMessage::ExportSheets => {
                let session = session_state_lock.lock().await;
                let tsv = leads_to_tsv(&session.leads);
                let _ = events.send(ServerMessage::SheetsExport {
                    tsv,
                    open_url: SHEET_URL.to_string(),
                });
            }
        },
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
        }
    }
}
