//! services/api/src/web/clarify_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! one clarification follow-up turn.

use crate::web::{
    dispatch_task::DEFAULT_CLARIFICATION_PROMPT,
    protocol::ServerMessage,
    state::{AppState, SessionMode, SessionState},
};
use chrono::Utc;
use leadmaster_core::{
    domain::{ChatTurn, OutboundMessage},
    reply::AutomationReply,
};
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use tracing::{info, warn};

/// Appended to the transcript when a follow-up request fails.
const APOLOGY_TURN: &str =
    "Sorry, something went wrong while sending your answer. Please try again.";

/// The main asynchronous task for one clarification follow-up turn.
///
/// The user turn is appended optimistically, before the network round trip.
/// The typing indicator is cleared on every exit path; a failed request
/// leaves the dialogue open with an apology turn instead of changing state.
pub async fn follow_up_process(
    app_state: Arc<AppState>,
    session_state_lock: Arc<Mutex<SessionState>>,
    events: UnboundedSender<ServerMessage>,
    text: String,
) {
    let (token, message) = {
        let mut session = session_state_lock.lock().await;
        if session.mode != SessionMode::AwaitingClarification {
            warn!("Ignoring follow-up outside an open clarification dialogue");
            return;
        }
        session.transcript.push(ChatTurn::user(text.clone()));
        session.assistant_typing = true;
        let _ = events.send(ServerMessage::AssistantTyping { active: true });
        let message = OutboundMessage {
            text,
            session_id: session.session_token,
            timestamp: Utc::now(),
            follow_up: true,
            options: None,
        };
        (session.session_token, message)
    };

    // No deadline here: follow-up turns wait as long as the workflow needs.
    let result = app_state.automation.send_message(&message).await;

    let mut session = session_state_lock.lock().await;
    if !session.is_current(token) {
        info!(
            "Discarding stale follow-up result for superseded session {}",
            token
        );
        return;
    }

    match result {
        Ok(body) => {
            let reply = AutomationReply::parse(body.as_ref());
            if app_state.classifier.needs_clarification(&reply) {
                let prompt = reply
                    .output
                    .unwrap_or_else(|| DEFAULT_CLARIFICATION_PROMPT.to_string());
                session.transcript.push(ChatTurn::assistant(prompt.clone()));
                let _ = events.send(ServerMessage::ClarificationAsked { text: prompt });
            } else {
                session.mode = SessionMode::Streaming;
                if let Some(final_text) = reply.output.clone() {
                    session.transcript.push(ChatTurn::assistant(final_text));
                }
                let _ = events.send(ServerMessage::ClarificationClosed { text: reply.output });
            }
        }
        Err(e) => {
            warn!("Follow-up failed for session {}: {}", token, e);
            session.transcript.push(ChatTurn::assistant(APOLOGY_TURN));
            let _ = events.send(ServerMessage::ClarificationAsked {
                text: APOLOGY_TURN.to_string(),
            });
        }
    }

    session.assistant_typing = false;
    let _ = events.send(ServerMessage::AssistantTyping { active: false });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testing::{drain_events, mock_app_state, MockAutomation, MockLeadFeed};
    use leadmaster_core::domain::ChatRole;
    use leadmaster_core::ports::PortError;
    use serde_json::json;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn awaiting_session() -> (Arc<Mutex<SessionState>>, Uuid) {
        let mut state = SessionState::new();
        let (token, _, _) = state.begin_session();
        state.mode = SessionMode::AwaitingClarification;
        state
            .transcript
            .push(ChatTurn::assistant("Which country?"));
        (Arc::new(Mutex::new(state)), token)
    }

    #[tokio::test]
    async fn test_non_clarification_reply_closes_dialogue() {
        let automation =
            MockAutomation::with_replies(vec![Ok(Some(json!({ "output": "Searching now" })))]);
        let (feed, _senders) = MockLeadFeed::with_subscriptions(0);
        let app_state = mock_app_state(automation, feed);
        let (session, _token) = awaiting_session();
        let (events, mut rx) = mpsc::unbounded_channel();

        follow_up_process(app_state, session.clone(), events, "USA".into()).await;

        let session = session.lock().await;
        assert_eq!(session.mode, SessionMode::Streaming);
        assert!(!session.assistant_typing);
        // assistant question, user answer, final assistant turn
        assert_eq!(session.transcript.len(), 3);
        assert_eq!(session.transcript[1].role, ChatRole::User);
        assert_eq!(session.transcript[2].text, "Searching now");

        let events = drain_events(&mut rx);
        assert!(events.contains(&ServerMessage::AssistantTyping { active: true }));
        assert!(events.contains(&ServerMessage::ClarificationClosed {
            text: Some("Searching now".to_string())
        }));
        assert!(events.contains(&ServerMessage::AssistantTyping { active: false }));
    }

    #[tokio::test]
    async fn test_still_clarification_keeps_dialogue_open() {
        let automation = MockAutomation::with_replies(vec![Ok(Some(
            json!({ "output": "Please specify a state as well" }),
        ))]);
        let (feed, _senders) = MockLeadFeed::with_subscriptions(0);
        let app_state = mock_app_state(automation, feed);
        let (session, _token) = awaiting_session();
        let (events, mut rx) = mpsc::unbounded_channel();

        follow_up_process(app_state, session.clone(), events, "USA".into()).await;

        let session = session.lock().await;
        assert_eq!(session.mode, SessionMode::AwaitingClarification);
        assert!(!session.assistant_typing);
        assert_eq!(session.transcript.len(), 3);
        let events = drain_events(&mut rx);
        assert!(events.contains(&ServerMessage::ClarificationAsked {
            text: "Please specify a state as well".to_string()
        }));
    }

    #[tokio::test]
    async fn test_failure_appends_apology_and_clears_typing() {
        let automation = MockAutomation::with_replies(vec![Err(PortError::Transport(
            "connection reset".to_string(),
        ))]);
        let (feed, _senders) = MockLeadFeed::with_subscriptions(0);
        let app_state = mock_app_state(automation, feed);
        let (session, _token) = awaiting_session();
        let (events, mut rx) = mpsc::unbounded_channel();

        follow_up_process(app_state, session.clone(), events, "USA".into()).await;

        let session = session.lock().await;
        assert_eq!(session.mode, SessionMode::AwaitingClarification);
        assert!(!session.assistant_typing);
        assert_eq!(session.transcript.last().unwrap().text, APOLOGY_TURN);
        let events = drain_events(&mut rx);
        assert!(events.contains(&ServerMessage::AssistantTyping { active: false }));
    }

    #[tokio::test]
    async fn test_follow_up_outside_dialogue_is_ignored() {
        let automation = MockAutomation::with_replies(vec![]);
        let (feed, _senders) = MockLeadFeed::with_subscriptions(0);
        let app_state = mock_app_state(automation, feed);
        let session = Arc::new(Mutex::new(SessionState::new()));
        let (events, mut rx) = mpsc::unbounded_channel();

        follow_up_process(app_state, session.clone(), events, "hello".into()).await;

        let session = session.lock().await;
        assert_eq!(session.mode, SessionMode::Idle);
        assert!(session.transcript.is_empty());
        assert!(drain_events(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_tagged_reply_uses_default_prompt_when_silent() {
        let automation =
            MockAutomation::with_replies(vec![Ok(Some(json!({ "type": "clarification" })))]);
        let (feed, _senders) = MockLeadFeed::with_subscriptions(0);
        let app_state = mock_app_state(automation, feed);
        let (session, _token) = awaiting_session();
        let (events, _rx) = mpsc::unbounded_channel();

        follow_up_process(app_state, session.clone(), events, "USA".into()).await;

        let session = session.lock().await;
        assert_eq!(
            session.transcript.last().unwrap().text,
            DEFAULT_CLARIFICATION_PROMPT
        );
    }
}
