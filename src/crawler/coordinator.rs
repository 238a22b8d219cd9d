//! Watch coordinator: wires sources to the store and dispatcher
//!
//! One crawl controller runs per configured source, sequentially. Every
//! candidate a controller yields is reconciled against the shared listing
//! store; creations and tracked-field changes are handed to the shared
//! dispatcher. A source that fails outright is logged and skipped; it never
//! takes the run down with it.

use crate::config::{Config, SourceEntry};
use crate::crawler::controller::CrawlController;
use crate::extract::ExtractorRegistry;
use crate::notify::{
    new_listing_payload, updated_listing_payload, Dispatcher, NotificationItem, NotificationKind,
    WebhookSink,
};
use crate::store::{ListingStore, SqliteStore};
use crate::{Result, WatchError};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Orchestrates one watch pass over all configured sources
pub struct Coordinator {
    config: Config,
    store: SqliteStore,
    dispatcher: Dispatcher<WebhookSink>,
    registry: ExtractorRegistry,
    client: Client,
}

impl Coordinator {
    /// Creates a coordinator: opens the store, builds the HTTP client and
    /// the dispatcher, and loads the built-in extractor registry
    pub fn new(config: Config) -> Result<Self> {
        let store = SqliteStore::new(Path::new(&config.store.database_path))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.watcher.request_timeout_secs))
            .build()?;

        let sink = config
            .notify
            .webhook_url
            .clone()
            .map(|url| WebhookSink::new(client.clone(), url));
        if sink.is_none() {
            tracing::info!("no webhook-url configured, notifications are disabled");
        }

        let dispatcher = Dispatcher::new(
            sink,
            Duration::from_millis(config.notify.min_send_interval_ms),
            config.notify.max_send_attempts,
        );

        Ok(Self {
            config,
            store,
            dispatcher,
            registry: ExtractorRegistry::with_builtins(),
            client,
        })
    }

    /// Runs every configured source to completion, then flushes the
    /// notification queue
    pub async fn run(&mut self) -> Result<()> {
        let sources = self.config.sources.clone();
        tracing::info!(sources = sources.len(), "starting watch run");

        for source in &sources {
            if let Err(e) = self.run_source(source).await {
                tracing::error!(source = %source.name, error = %e, "source run aborted");
            }
        }

        self.dispatcher.flush().await;
        tracing::info!("watch run complete");
        Ok(())
    }

    /// Crawls one source and feeds its candidates through reconciliation
    async fn run_source(&mut self, source: &SourceEntry) -> Result<()> {
        tracing::info!(source = %source.name, "crawling source");

        let extractor = self.registry.build(source, &self.client)?;
        let controller = CrawlController::new(extractor, self.config.watcher.page_cap);

        let report = controller
            .crawl(&self.config.search)
            .await
            .map_err(|e| WatchError::Extract {
                source_name: source.name.clone(),
                source: e,
            })?;

        tracing::info!(
            source = %source.name,
            pages = report.pages_visited,
            candidates = report.candidates.len(),
            discarded = report.discarded,
            detail_failures = report.detail_failures.len(),
            "crawl finished"
        );

        // A failed detail fetch still proves a known listing exists
        for reference in &report.detail_failures {
            match self.store.contains(reference) {
                Ok(true) => {
                    if let Err(e) = self.store.touch_last_checked(reference) {
                        tracing::warn!(reference = %reference, error = %e, "failed to touch last_checked");
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(reference = %reference, error = %e, "store lookup failed");
                }
            }
        }

        for candidate in &report.candidates {
            let result = match self
                .store
                .reconcile(candidate, &self.config.notify.tracked_fields)
            {
                Ok(result) => result,
                Err(e) => {
                    // The source will re-report this listing next cycle
                    tracing::error!(
                        reference = %candidate.reference,
                        error = %e,
                        "store write failed, candidate lost for this cycle"
                    );
                    continue;
                }
            };

            if result.created {
                tracing::info!(reference = %candidate.reference, "new listing");
                self.dispatcher
                    .notify(NotificationItem::new(
                        NotificationKind::New,
                        &candidate.reference,
                        new_listing_payload(candidate),
                    ))
                    .await;
            } else if let Some(payload) = updated_listing_payload(candidate, &result.changes) {
                tracing::info!(
                    reference = %candidate.reference,
                    changes = result.changes.len(),
                    "listing updated"
                );
                self.dispatcher
                    .notify(NotificationItem::new(
                        NotificationKind::Updated,
                        &candidate.reference,
                        payload,
                    ))
                    .await;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NotifyConfig, SearchCriteria, StoreConfig, WatcherConfig};
    use tempfile::TempDir;

    fn config_with_source(dir: &TempDir, kind: &str) -> Config {
        Config {
            watcher: WatcherConfig {
                page_cap: 2,
                request_timeout_secs: 5,
            },
            store: StoreConfig {
                database_path: dir
                    .path()
                    .join("listings.db")
                    .to_string_lossy()
                    .into_owned(),
            },
            notify: NotifyConfig::default(),
            search: SearchCriteria::default(),
            sources: vec![SourceEntry {
                name: "Broken".to_string(),
                kind: kind.to_string(),
                list_url: None,
                selectors: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_unknown_source_kind_does_not_fail_the_run() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = Coordinator::new(config_with_source(&dir, "telepathy")).unwrap();

        // The source errors out, the run itself completes
        assert!(coordinator.run().await.is_ok());
        assert_eq!(coordinator.store.count_total().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_disabled_dispatch_without_webhook() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(config_with_source(&dir, "selector")).unwrap();
        assert!(coordinator.dispatcher.is_disabled());
    }
}
