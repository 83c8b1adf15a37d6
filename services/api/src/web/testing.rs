//! services/api/src/web/testing.rs
//!
//! Shared mock ports and fixtures for the session state-machine tests.

use crate::config::Config;
use crate::web::protocol::ServerMessage;
use crate::web::state::AppState;
use async_trait::async_trait;
use leadmaster_core::classify::KeywordClarificationPolicy;
use leadmaster_core::domain::OutboundMessage;
use leadmaster_core::ports::{
    AutomationService, LeadFeedService, LeadRowStream, PortError, PortResult,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

type ScriptedReply = (Option<Duration>, PortResult<Option<Value>>);

/// An `AutomationService` mock answering from a scripted reply queue.
/// Records every outbound message it was asked to send.
pub struct MockAutomation {
    replies: Mutex<VecDeque<ScriptedReply>>,
    pub sent: Mutex<Vec<OutboundMessage>>,
}

impl MockAutomation {
    /// Replies served immediately, in order. An exhausted queue answers
    /// with an empty body.
    pub fn with_replies(replies: Vec<PortResult<Option<Value>>>) -> Arc<Self> {
        Self::scripted(replies.into_iter().map(|reply| (None, reply)).collect())
    }

    /// Replies with an optional hold-back delay before each one resolves.
    pub fn scripted(replies: Vec<ScriptedReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AutomationService for MockAutomation {
    async fn send_message(&self, message: &OutboundMessage) -> PortResult<Option<Value>> {
        self.sent.lock().await.push(message.clone());
        let next = self.replies.lock().await.pop_front();
        match next {
            Some((Some(delay), reply)) => {
                tokio::time::sleep(delay).await;
                reply
            }
            Some((None, reply)) => reply,
            None => Ok(None),
        }
    }
}

/// A `LeadFeedService` mock backed by in-memory channels, one per expected
/// subscription, claimed in order.
pub struct MockLeadFeed {
    feeds: Mutex<VecDeque<mpsc::UnboundedReceiver<PortResult<Value>>>>,
}

impl MockLeadFeed {
    /// Creates a feed expecting `subscriptions` subscribe calls; returns
    /// the row senders in subscription order.
    pub fn with_subscriptions(
        subscriptions: usize,
    ) -> (Arc<Self>, Vec<mpsc::UnboundedSender<PortResult<Value>>>) {
        let mut senders = Vec::new();
        let mut receivers = VecDeque::new();
        for _ in 0..subscriptions {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.push(tx);
            receivers.push_back(rx);
        }
        (
            Arc::new(Self {
                feeds: Mutex::new(receivers),
            }),
            senders,
        )
    }

    /// How many scripted subscriptions have not been claimed yet.
    pub async fn remaining(&self) -> usize {
        self.feeds.lock().await.len()
    }
}

#[async_trait]
impl LeadFeedService for MockLeadFeed {
    async fn subscribe(&self) -> PortResult<LeadRowStream> {
        let mut rx = self
            .feeds
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| PortError::Unexpected("no scripted subscription left".to_string()))?;
        Ok(Box::pin(async_stream::stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        }))
    }
}

/// Builds an `AppState` over the given mocks and the default classifier.
pub fn mock_app_state(
    automation: Arc<dyn AutomationService>,
    lead_feed: Arc<dyn LeadFeedService>,
) -> Arc<AppState> {
    Arc::new(AppState {
        config: Arc::new(test_config()),
        automation,
        lead_feed,
        classifier: Arc::new(KeywordClarificationPolicy),
    })
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        webhook_url: "http://localhost/webhook".to_string(),
        database_url: "postgres://localhost/leadmaster_test".to_string(),
        leads_channel: "leads_inserts".to_string(),
        log_level: tracing::Level::INFO,
    }
}

/// Drains every event currently queued on the receiver.
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
