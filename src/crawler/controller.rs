//! Crawl controller: pagination and detail-fetch control loop
//!
//! Drives one source's paginated index, fetches the detail record for every
//! summary, and merges the two into candidate records for reconciliation.
//! Per-item failures never stop the batch; only a dead first page aborts the
//! source's run.

use crate::extract::{ExtractError, Extractor, FieldMap, SearchCriteria};
use crate::store::Candidate;
use serde_json::Value;

/// Everything one source's crawl produced
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Merged candidates, in page and summary order
    pub candidates: Vec<Candidate>,

    /// References whose detail fetch or parse failed; the caller touches
    /// `last_checked` for the ones already in the store
    pub detail_failures: Vec<String>,

    /// Index pages actually visited
    pub pages_visited: u32,

    /// Summaries discarded for lacking a reference
    pub discarded: u32,
}

/// Drives pagination and detail fetching for one source
pub struct CrawlController {
    extractor: Box<dyn Extractor>,
    page_cap: u32,
}

impl CrawlController {
    pub fn new(extractor: Box<dyn Extractor>, page_cap: u32) -> Self {
        Self { extractor, page_cap }
    }

    pub fn source_name(&self) -> &str {
        self.extractor.source_name()
    }

    /// Crawls the source's index page by page
    ///
    /// Stops when the source reports no further page, when the page cap is
    /// reached, or when a later page fails. A failure on page 1 is a hard
    /// failure: the whole source run aborts with the error.
    pub async fn crawl(&self, criteria: &SearchCriteria) -> Result<CrawlReport, ExtractError> {
        let source_name = self.extractor.source_name();
        let mut report = CrawlReport::default();
        let mut page = 1;

        loop {
            let summary_page = match self.extractor.fetch_summaries(criteria, page).await {
                Ok(p) => p,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        source = %source_name,
                        page,
                        error = %e,
                        "page fetch failed, stopping pagination"
                    );
                    break;
                }
            };

            report.pages_visited += 1;
            tracing::debug!(
                source = %source_name,
                page,
                summaries = summary_page.summaries.len(),
                "fetched index page"
            );

            for summary in summary_page.summaries {
                let Some(reference) = summary
                    .get("reference")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                else {
                    report.discarded += 1;
                    continue;
                };

                match self.extractor.fetch_detail(&reference).await {
                    Ok(detail) if detail.is_empty() => {
                        // An empty parse result gets the same treatment as
                        // a failed fetch
                        report.detail_failures.push(reference);
                    }
                    Ok(detail) => {
                        report.candidates.push(merge_candidate(
                            summary,
                            detail,
                            source_name,
                            &reference,
                        ));
                    }
                    Err(e) => {
                        tracing::debug!(
                            source = %source_name,
                            reference = %reference,
                            error = %e,
                            "detail fetch failed, skipping item"
                        );
                        report.detail_failures.push(reference);
                    }
                }
            }

            if !summary_page.has_next_page {
                break;
            }

            if page >= self.page_cap {
                tracing::debug!(source = %source_name, page_cap = self.page_cap, "page cap reached");
                break;
            }

            page += 1;
        }

        Ok(report)
    }
}

/// Merges summary and detail maps; detail fields win on key collision
fn merge_candidate(
    summary: FieldMap,
    detail: FieldMap,
    source_name: &str,
    reference: &str,
) -> Candidate {
    let mut fields = summary;
    for (key, value) in detail {
        fields.insert(key, value);
    }

    // Identity keys are stamped last so no scraped field can shadow them
    fields.insert(
        "reference".to_string(),
        Value::String(reference.to_string()),
    );
    fields.insert(
        "source_name".to_string(),
        Value::String(source_name.to_string()),
    );

    Candidate {
        reference: reference.to_string(),
        source_name: source_name.to_string(),
        fields,
    }
}
