//! crates/leadmaster_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete webhook and database implementations.

use crate::domain::OutboundMessage;
use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The remote side answered with a non-success status or the connection failed.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The operation did not complete within its deadline.
    #[error("The request timed out")]
    Timeout,
    /// A catch-all for anything else.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A live stream of rows inserted into the shared records collection.
pub type LeadRowStream = Pin<Box<dyn Stream<Item = PortResult<Value>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AutomationService: Send + Sync {
    /// Sends one message to the automation workflow and returns its response
    /// body parsed best-effort. An empty or unparseable body is `None`,
    /// never an error; the upstream contract is too loose to be strict about.
    async fn send_message(&self, message: &OutboundMessage) -> PortResult<Option<Value>>;
}

#[async_trait]
pub trait LeadFeedService: Send + Sync {
    /// Opens one live subscription to insert events on the shared records
    /// collection. The subscription is released when the stream is dropped.
    async fn subscribe(&self) -> PortResult<LeadRowStream>;
}
