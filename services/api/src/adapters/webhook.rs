//! services/api/src/adapters/webhook.rs
//!
//! This module contains the adapter for the external automation workflow.
//! It implements the `AutomationService` port from the `core` crate.

use async_trait::async_trait;
use leadmaster_core::domain::OutboundMessage;
use leadmaster_core::ports::{AutomationService, PortError, PortResult};
use serde_json::{json, Value};
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AutomationService` against the workflow
/// automation's chat webhook.
#[derive(Clone)]
pub struct WebhookAutomationAdapter {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookAutomationAdapter {
    /// Creates a new `WebhookAutomationAdapter`.
    pub fn new(client: reqwest::Client, webhook_url: String) -> Self {
        Self {
            client,
            webhook_url,
        }
    }

    /// Builds the request body.
    ///
    /// The receiving workflow has been migrated between two field-naming
    /// conventions; the text and the session token are sent under both the
    /// legacy and the current key so either revision can consume the message.
    fn request_body(message: &OutboundMessage) -> Value {
        let mut body = json!({
            "chatInput": message.text,
            "message": message.text,
            "action": "sendMessage",
            "sessionId": message.session_id.to_string(),
            "session_id": message.session_id.to_string(),
            "timestamp": message.timestamp.to_rfc3339(),
        });
        if message.follow_up {
            body["is_follow_up"] = json!(true);
        }
        if let Some(options) = &message.options {
            body["options"] = json!(options);
        }
        body
    }
}

//=========================================================================================
// `AutomationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AutomationService for WebhookAutomationAdapter {
    /// Posts one message to the webhook and parses the response body
    /// best-effort. A non-JSON body is treated as absent, not as an error.
    async fn send_message(&self, message: &OutboundMessage) -> PortResult<Option<Value>> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&Self::request_body(message))
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "Request failed: {}",
                status.as_u16()
            )));
        }

        match response.json::<Value>().await {
            Ok(body) => Ok(Some(body)),
            Err(e) => {
                warn!("Failed to parse webhook response body: {}", e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leadmaster_core::domain::SearchOptions;
    use uuid::Uuid;

    fn message(follow_up: bool) -> OutboundMessage {
        OutboundMessage {
            text: "coffee shops in Austin".to_string(),
            session_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            follow_up,
            options: None,
        }
    }

    #[test]
    fn test_body_carries_both_naming_conventions() {
        let message = message(false);
        let body = WebhookAutomationAdapter::request_body(&message);
        assert_eq!(body["chatInput"], body["message"]);
        assert_eq!(body["sessionId"], body["session_id"]);
        assert_eq!(body["sessionId"], message.session_id.to_string().as_str());
        assert_eq!(body["action"], "sendMessage");
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn test_follow_up_flag_only_on_follow_ups() {
        let top_level = WebhookAutomationAdapter::request_body(&message(false));
        assert!(top_level.get("is_follow_up").is_none());

        let follow_up = WebhookAutomationAdapter::request_body(&message(true));
        assert_eq!(follow_up["is_follow_up"], true);
    }

    #[test]
    fn test_options_forwarded_when_present() {
        let mut message = message(false);
        message.options = Some(SearchOptions {
            min_rating: Some(4.0),
            include_emails: Some(true),
            limit: Some(50),
        });
        let body = WebhookAutomationAdapter::request_body(&message);
        assert_eq!(body["options"]["min_rating"], 4.0);
        assert_eq!(body["options"]["limit"], 50);
    }
}
