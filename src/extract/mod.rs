//! Extractor capability consumed by the crawl controller
//!
//! An extractor knows how to pull listing summaries off one source's
//! paginated index and how to pull the fuller detail record for a single
//! listing. Everything source-specific (markup, field heuristics) lives
//! behind this trait; the pipeline itself only sees opaque field maps.

mod registry;
mod selector;

pub use registry::ExtractorRegistry;
pub use selector::SelectorExtractor;

pub use crate::config::SearchCriteria;

use async_trait::async_trait;
use thiserror::Error;

/// An opaque scraped field map; keys and values carry no semantics here
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// One page of listing summaries
#[derive(Debug, Default, Clone)]
pub struct SummaryPage {
    /// Summaries in source order; each should contain at least "reference"
    pub summaries: Vec<FieldMap>,

    /// Whether the source reports a further page
    pub has_next_page: bool,
}

/// Errors produced at the extractor boundary
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("Empty or unparseable page at {url}")]
    EmptyPage { url: String },

    #[error("Invalid CSS selector: {0}")]
    Selector(String),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Per-source extraction capability
///
/// Implementations must be cheap to call repeatedly; the controller fetches
/// one detail record per summary, in page order.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Human-readable source name, stamped onto every candidate
    fn source_name(&self) -> &str;

    /// Fetches one page of listing summaries
    ///
    /// A hard failure here (network, empty parse) on page 1 aborts the
    /// source's run; on later pages it merely stops pagination.
    async fn fetch_summaries(
        &self,
        criteria: &SearchCriteria,
        page: u32,
    ) -> Result<SummaryPage, ExtractError>;

    /// Fetches the detail record for one listing reference
    ///
    /// Failures are recoverable: the controller skips the item and the
    /// crawl continues.
    async fn fetch_detail(&self, reference: &str) -> Result<FieldMap, ExtractError>;
}
