//! Rate-limited notification queue
//!
//! The dispatcher holds a FIFO queue of outbound items and sends at most one
//! item per drain call, honoring a minimum inter-send interval. The interval
//! gate is global: every producer shares the one timer, matching the shared
//! rate limit of the external sink.

use crate::notify::{NotificationItem, NotificationSink};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Outcome of one drain call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Queue was empty
    Idle,
    /// Interval not yet elapsed; head left in place
    RateLimited,
    /// Head item delivered
    Sent,
    /// Delivery failed; item requeued at the head
    Failed,
    /// Delivery failed and the item exhausted its retry ceiling
    Dropped,
}

struct QueuedItem {
    item: NotificationItem,
    attempts: u32,
}

/// FIFO dispatcher with a global inter-send interval
///
/// Constructed without a sink, the dispatcher is disabled: `enqueue` drops
/// items outright instead of queueing them. This is deliberate and
/// documented behavior, not data loss by accident.
pub struct Dispatcher<S: NotificationSink> {
    sink: Option<S>,
    queue: VecDeque<QueuedItem>,
    min_interval: Duration,
    /// 0 means no ceiling: retry until the sink recovers
    max_attempts: u32,
    last_sent_at: Option<Instant>,
}

impl<S: NotificationSink> Dispatcher<S> {
    pub fn new(sink: Option<S>, min_interval: Duration, max_attempts: u32) -> Self {
        Self {
            sink,
            queue: VecDeque::new(),
            min_interval,
            max_attempts,
            last_sent_at: None,
        }
    }

    /// True when no sink is configured
    pub fn is_disabled(&self) -> bool {
        self.sink.is_none()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Adds an item to the back of the queue
    ///
    /// When dispatch is disabled the item is dropped here, not queued.
    pub fn enqueue(&mut self, item: NotificationItem) {
        if self.sink.is_none() {
            tracing::debug!(
                reference = %item.listing_reference,
                "dispatch disabled, dropping notification"
            );
            return;
        }

        self.queue.push_back(QueuedItem { item, attempts: 0 });
    }

    /// Enqueues and immediately attempts one drain
    pub async fn notify(&mut self, item: NotificationItem) -> DrainStatus {
        self.enqueue(item);
        self.drain().await
    }

    /// Attempts to send the head of the queue
    ///
    /// Sends at most one item. If the inter-send interval has not elapsed
    /// the head stays queued for a later drain. A failed send is requeued
    /// at the head so ordering is preserved; `last_sent_at` only moves on
    /// success.
    pub async fn drain(&mut self) -> DrainStatus {
        let Some(sink) = &self.sink else {
            return DrainStatus::Idle;
        };

        if self.queue.is_empty() {
            return DrainStatus::Idle;
        }

        if let Some(last) = self.last_sent_at {
            if last.elapsed() < self.min_interval {
                return DrainStatus::RateLimited;
            }
        }

        let Some(mut queued) = self.queue.pop_front() else {
            return DrainStatus::Idle;
        };
        queued.attempts += 1;

        match sink.deliver(&queued.item.payload).await {
            Ok(()) => {
                self.last_sent_at = Some(Instant::now());
                tracing::debug!(
                    reference = %queued.item.listing_reference,
                    queued = self.queue.len(),
                    "notification sent"
                );
                DrainStatus::Sent
            }
            Err(e) => {
                if self.max_attempts > 0 && queued.attempts >= self.max_attempts {
                    tracing::warn!(
                        reference = %queued.item.listing_reference,
                        attempts = queued.attempts,
                        error = %e,
                        "notification dropped after exhausting retries"
                    );
                    return DrainStatus::Dropped;
                }

                tracing::warn!(
                    reference = %queued.item.listing_reference,
                    error = %e,
                    "notification send failed, requeued"
                );
                self.queue.push_front(queued);
                DrainStatus::Failed
            }
        }
    }

    /// Drains until the queue is empty, sleeping through the interval gate
    ///
    /// With no retry ceiling and a dead sink this loops until the sink
    /// recovers, pacing attempts at the inter-send interval.
    pub async fn flush(&mut self) {
        while !self.queue.is_empty() {
            match self.drain().await {
                DrainStatus::Idle => break,
                DrainStatus::RateLimited | DrainStatus::Failed => {
                    tokio::time::sleep(self.remaining_interval()).await;
                }
                DrainStatus::Sent | DrainStatus::Dropped => {}
            }
        }
    }

    fn remaining_interval(&self) -> Duration {
        match self.last_sent_at {
            Some(last) => self.min_interval.saturating_sub(last.elapsed()),
            None => self.min_interval,
        }
    }
}
