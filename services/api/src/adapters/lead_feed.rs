//! services/api/src/adapters/lead_feed.rs
//!
//! This module contains the realtime lead feed adapter, the concrete
//! implementation of the `LeadFeedService` port. It subscribes to insert
//! events on the shared `leads` table through Postgres LISTEN/NOTIFY: a
//! database trigger (see `migrations/`) notifies the configured channel
//! with each inserted row serialized as JSON.

use async_stream::stream;
use async_trait::async_trait;
use leadmaster_core::ports::{LeadFeedService, LeadRowStream, PortError, PortResult};
use serde_json::Value;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A lead feed adapter that implements the `LeadFeedService` port.
#[derive(Clone)]
pub struct PgLeadFeedAdapter {
    pool: PgPool,
    channel: String,
}

impl PgLeadFeedAdapter {
    /// Creates a new `PgLeadFeedAdapter`.
    pub fn new(pool: PgPool, channel: String) -> Self {
        Self { pool, channel }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// `LeadFeedService` Trait Implementation
//=========================================================================================

#[async_trait]
impl LeadFeedService for PgLeadFeedAdapter {
    /// Opens one LISTEN subscription on the configured channel. Dropping
    /// the returned stream closes the listener connection and with it the
    /// subscription.
    async fn subscribe(&self) -> PortResult<LeadRowStream> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        listener
            .listen(&self.channel)
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        let channel = self.channel.clone();
        let rows = stream! {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<Value>(notification.payload()) {
                            Ok(row) => yield Ok(row),
                            Err(e) => {
                                warn!("Discarding malformed notification on '{}': {}", channel, e);
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(PortError::Transport(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(rows))
    }
}
