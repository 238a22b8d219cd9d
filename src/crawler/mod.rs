//! Crawl control and orchestration
//!
//! This module contains the pagination/detail-fetch control loop and the
//! coordinator that wires each configured source to the shared listing
//! store and notification dispatcher.

mod controller;
mod coordinator;

pub use controller::{CrawlController, CrawlReport};
pub use coordinator::Coordinator;

use crate::config::Config;
use crate::Result;

/// Runs one complete watch pass
///
/// This is the main entry point: it crawls every configured source in
/// order, reconciles the results, and flushes pending notifications.
pub async fn watch(config: Config) -> Result<()> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
