use serde::Deserialize;

/// Main configuration structure for homewatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub watcher: WatcherConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub search: SearchCriteria,
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceEntry>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// Maximum number of listing pages to visit per source
    #[serde(rename = "page-cap")]
    pub page_cap: u32,

    /// HTTP request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

/// Persistent store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Notification dispatch configuration
///
/// A missing `webhook-url` disables dispatch entirely: items handed to the
/// dispatcher are dropped, not queued.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Webhook endpoint for outbound notifications (None disables dispatch)
    #[serde(rename = "webhook-url")]
    pub webhook_url: Option<String>,

    /// Minimum interval between sends, in milliseconds
    #[serde(rename = "min-send-interval-ms", default = "default_min_send_interval_ms")]
    pub min_send_interval_ms: u64,

    /// Maximum delivery attempts per item; 0 means retry forever
    #[serde(rename = "max-send-attempts", default)]
    pub max_send_attempts: u32,

    /// Dedicated fields monitored for change notifications, in report order
    #[serde(rename = "tracked-fields", default = "default_tracked_fields")]
    pub tracked_fields: Vec<String>,
}

fn default_min_send_interval_ms() -> u64 {
    1000
}

fn default_tracked_fields() -> Vec<String> {
    vec![
        "price".to_string(),
        "description".to_string(),
        "image_count".to_string(),
    ]
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            min_send_interval_ms: default_min_send_interval_ms(),
            max_send_attempts: 0,
            tracked_fields: default_tracked_fields(),
        }
    }
}

/// Search criteria forwarded to every source's extractor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchCriteria {
    pub location: Option<String>,

    #[serde(rename = "property-type")]
    pub property_type: Option<String>,

    #[serde(rename = "min-rooms")]
    pub min_rooms: Option<u32>,

    #[serde(rename = "max-price")]
    pub max_price: Option<u64>,

    #[serde(rename = "min-area")]
    pub min_area: Option<u64>,
}

/// One listing source to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Human-readable source name, stamped onto every listing
    pub name: String,

    /// Extractor kind, resolved through the registry (e.g. "selector")
    pub kind: String,

    /// Listing index URL template; `{page}` is replaced with the page number
    #[serde(rename = "list-url", default)]
    pub list_url: Option<String>,

    /// CSS selectors for the selector-driven extractor
    #[serde(default)]
    pub selectors: Option<SelectorSet>,
}

/// CSS selectors used by the generic selector extractor
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorSet {
    /// Selects one listing item on the index page
    pub item: String,

    /// Selects the listing link inside an item (href becomes the reference)
    pub link: String,

    /// Selects the title inside an item
    #[serde(default)]
    pub title: Option<String>,

    /// Selects the price inside an item
    #[serde(default)]
    pub price: Option<String>,

    /// Selects the next-page control on the index page
    #[serde(rename = "next-page", default)]
    pub next_page: Option<String>,

    /// Selects the title on a detail page
    #[serde(rename = "detail-title", default)]
    pub detail_title: Option<String>,

    /// Selects the price on a detail page
    #[serde(rename = "detail-price", default)]
    pub detail_price: Option<String>,

    /// Selects the description on a detail page
    #[serde(rename = "detail-description", default)]
    pub detail_description: Option<String>,

    /// Selects gallery images on a detail page (count + first URL)
    #[serde(rename = "detail-images", default)]
    pub detail_images: Option<String>,
}
