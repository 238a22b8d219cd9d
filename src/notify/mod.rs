//! Notification dispatch
//!
//! Reconciliation outcomes that warrant an alert (new listing, tracked-field
//! change) are queued here and delivered to an outbound sink at a bounded
//! rate. Delivery is at-least-once: a failed send is requeued at the head of
//! the queue and retried on a later drain, never silently dropped.

mod dispatcher;
mod payload;
mod webhook;

pub use dispatcher::{Dispatcher, DrainStatus};
pub use payload::{new_listing_payload, updated_listing_payload};
pub use webhook::WebhookSink;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// What kind of event a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    New,
    Updated,
}

/// One queued outbound alert
#[derive(Debug, Clone)]
pub struct NotificationItem {
    pub kind: NotificationKind,
    pub listing_reference: String,
    /// The JSON document delivered to the sink verbatim
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}

impl NotificationItem {
    pub fn new(kind: NotificationKind, listing_reference: &str, payload: serde_json::Value) -> Self {
        Self {
            kind,
            listing_reference: listing_reference.to_string(),
            payload,
            enqueued_at: Utc::now(),
        }
    }
}

/// Errors from the notification sink
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Sink returned HTTP {status}")]
    Status { status: u16 },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// One outbound delivery call
///
/// The dispatcher owns queueing, ordering, and rate limiting; a sink only
/// performs a single send. Tests substitute a recording stub.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, payload: &serde_json::Value) -> Result<(), NotifyError>;
}
