//! Generic CSS-selector-driven extractor
//!
//! This is the built-in extractor kind: a source config supplies a
//! page-templated index URL plus CSS selectors for the summary items and
//! detail fields, and this extractor does the fetching and field scraping.
//! All per-source markup knowledge stays in the config; nothing here is
//! specific to one site.

use crate::config::{SearchCriteria, SelectorSet, SourceEntry};
use crate::extract::{ExtractError, Extractor, FieldMap, SummaryPage};
use crate::{ConfigError, WatchError};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

/// Selector-driven extractor for one configured source
pub struct SelectorExtractor {
    source_name: String,
    client: Client,
    list_url: String,
    selectors: CompiledSelectors,
}

/// Selectors compiled once at construction
struct CompiledSelectors {
    item: Selector,
    link: Selector,
    title: Option<Selector>,
    price: Option<Selector>,
    next_page: Option<Selector>,
    detail_title: Option<Selector>,
    detail_price: Option<Selector>,
    detail_description: Option<Selector>,
    detail_images: Option<Selector>,
}

impl CompiledSelectors {
    fn compile(set: &SelectorSet) -> Result<Self, ExtractError> {
        Ok(Self {
            item: compile(&set.item)?,
            link: compile(&set.link)?,
            title: compile_opt(set.title.as_deref())?,
            price: compile_opt(set.price.as_deref())?,
            next_page: compile_opt(set.next_page.as_deref())?,
            detail_title: compile_opt(set.detail_title.as_deref())?,
            detail_price: compile_opt(set.detail_price.as_deref())?,
            detail_description: compile_opt(set.detail_description.as_deref())?,
            detail_images: compile_opt(set.detail_images.as_deref())?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::Selector(selector.to_string()))
}

fn compile_opt(selector: Option<&str>) -> Result<Option<Selector>, ExtractError> {
    selector.map(compile).transpose()
}

impl SelectorExtractor {
    /// Builds an extractor from a source config entry
    pub fn from_source(source: &SourceEntry, client: Client) -> Result<Self, WatchError> {
        let list_url = source.list_url.clone().ok_or_else(|| {
            WatchError::Config(ConfigError::Validation(format!(
                "source '{}' is missing list-url",
                source.name
            )))
        })?;

        let selector_set = source.selectors.as_ref().ok_or_else(|| {
            WatchError::Config(ConfigError::Validation(format!(
                "source '{}' is missing a [source.selectors] table",
                source.name
            )))
        })?;

        let selectors = CompiledSelectors::compile(selector_set).map_err(|e| {
            WatchError::Extract {
                source_name: source.name.clone(),
                source: e,
            }
        })?;

        Ok(Self {
            source_name: source.name.clone(),
            client,
            list_url,
            selectors,
        })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ExtractError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExtractError::Fetch {
                url: url.to_string(),
                source: e,
            })?;

        response.text().await.map_err(|e| ExtractError::Fetch {
            url: url.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl Extractor for SelectorExtractor {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    async fn fetch_summaries(
        &self,
        criteria: &SearchCriteria,
        page: u32,
    ) -> Result<SummaryPage, ExtractError> {
        let url = expand_list_url(&self.list_url, criteria, page);
        let body = self.fetch_text(&url).await?;
        parse_summary_page(&body, &url, &self.selectors)
    }

    async fn fetch_detail(&self, reference: &str) -> Result<FieldMap, ExtractError> {
        let body = self.fetch_text(reference).await?;
        parse_detail_page(&body, reference, &self.selectors)
    }
}

/// Substitutes `{page}` and search-criteria placeholders into the URL template
fn expand_list_url(template: &str, criteria: &SearchCriteria, page: u32) -> String {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    let num = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_default();

    template
        .replace("{page}", &page.to_string())
        .replace("{location}", &opt(&criteria.location))
        .replace("{property-type}", &opt(&criteria.property_type))
        .replace(
            "{min-rooms}",
            &criteria
                .min_rooms
                .map(|n| n.to_string())
                .unwrap_or_default(),
        )
        .replace("{max-price}", &num(criteria.max_price))
        .replace("{min-area}", &num(criteria.min_area))
}

fn parse_summary_page(
    body: &str,
    page_url: &str,
    selectors: &CompiledSelectors,
) -> Result<SummaryPage, ExtractError> {
    let document = Html::parse_document(body);
    let base = Url::parse(page_url)?;

    let mut summaries = Vec::new();
    for item in document.select(&selectors.item) {
        let mut summary = FieldMap::new();

        // The link href becomes the reference; items without one still
        // surface so the controller can count the discard
        if let Some(href) = item
            .select(&selectors.link)
            .next()
            .and_then(|link| link.value().attr("href"))
        {
            if let Ok(absolute) = base.join(href) {
                summary.insert(
                    "reference".to_string(),
                    Value::String(absolute.to_string()),
                );
            }
        }

        if let Some(sel) = &selectors.title {
            if let Some(text) = element_text(&item, sel) {
                summary.insert("title".to_string(), Value::String(text));
            }
        }

        if let Some(sel) = &selectors.price {
            if let Some(text) = element_text(&item, sel) {
                summary.insert("price".to_string(), Value::String(text));
            }
        }

        summaries.push(summary);
    }

    if summaries.is_empty() {
        return Err(ExtractError::EmptyPage {
            url: page_url.to_string(),
        });
    }

    let has_next_page = selectors
        .next_page
        .as_ref()
        .map(|sel| document.select(sel).next().is_some())
        .unwrap_or(false);

    Ok(SummaryPage {
        summaries,
        has_next_page,
    })
}

fn parse_detail_page(
    body: &str,
    reference: &str,
    selectors: &CompiledSelectors,
) -> Result<FieldMap, ExtractError> {
    let document = Html::parse_document(body);
    let mut detail = FieldMap::new();

    if let Some(sel) = &selectors.detail_title {
        if let Some(text) = document_text(&document, sel) {
            detail.insert("title".to_string(), Value::String(text));
        }
    }

    if let Some(sel) = &selectors.detail_price {
        if let Some(text) = document_text(&document, sel) {
            detail.insert("price".to_string(), Value::String(text));
        }
    }

    if let Some(sel) = &selectors.detail_description {
        if let Some(text) = document_text(&document, sel) {
            detail.insert("description".to_string(), Value::String(text));
        }
    }

    if let Some(sel) = &selectors.detail_images {
        let mut count = 0u64;
        let mut first_url: Option<String> = None;
        for image in document.select(sel) {
            count += 1;
            if first_url.is_none() {
                first_url = image.value().attr("src").map(str::to_string);
            }
        }
        if count > 0 {
            detail.insert("image_count".to_string(), Value::from(count));
            if let Some(src) = first_url {
                detail.insert("primary_image_url".to_string(), Value::String(src));
            }
        }
    }

    if detail.is_empty() {
        return Err(ExtractError::EmptyPage {
            url: reference.to_string(),
        });
    }

    Ok(detail)
}

fn element_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(collect_text)
        .filter(|t| !t.is_empty())
}

fn document_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(collect_text)
        .filter(|t| !t.is_empty())
}

fn collect_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
