//! Extractor registry
//!
//! Maps a source `kind` string to an extractor constructor. The registry is
//! built once at startup from a static list of built-ins; callers may
//! register additional kinds (tests register stubs this way). Resolution is
//! explicit: an unknown kind is a configuration-time error, not a silent
//! skip.

use crate::config::SourceEntry;
use crate::extract::{Extractor, SelectorExtractor};
use crate::{Result, WatchError};
use reqwest::Client;
use std::collections::HashMap;

/// Constructs an extractor for one configured source
pub type ExtractorFactory =
    Box<dyn Fn(&SourceEntry, &Client) -> Result<Box<dyn Extractor>> + Send + Sync>;

/// Registry of available extractor kinds
pub struct ExtractorRegistry {
    factories: HashMap<String, ExtractorFactory>,
}

impl ExtractorRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in kinds
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("selector", |source, client| {
            Ok(Box::new(SelectorExtractor::from_source(source, client.clone())?))
        });
        registry
    }

    /// Registers a factory for a kind, replacing any existing one
    pub fn register<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn(&SourceEntry, &Client) -> Result<Box<dyn Extractor>> + Send + Sync + 'static,
    {
        self.factories.insert(kind.to_string(), Box::new(factory));
    }

    /// Builds an extractor for the given source entry
    pub fn build(&self, source: &SourceEntry, client: &Client) -> Result<Box<dyn Extractor>> {
        let factory = self
            .factories
            .get(&source.kind)
            .ok_or_else(|| WatchError::UnknownSourceKind(source.kind.clone()))?;
        factory(source, client)
    }

    /// Registered kinds, sorted for stable display
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(kind: &str) -> SourceEntry {
        SourceEntry {
            name: "Example".to_string(),
            kind: kind.to_string(),
            list_url: Some("https://example.com/listings?page={page}".to_string()),
            selectors: Some(crate::config::SelectorSet {
                item: "div.listing".to_string(),
                link: "a".to_string(),
                title: None,
                price: None,
                next_page: None,
                detail_title: None,
                detail_price: None,
                detail_description: None,
                detail_images: None,
            }),
        }
    }

    #[test]
    fn test_builtin_selector_kind_resolves() {
        let registry = ExtractorRegistry::with_builtins();
        let client = Client::new();
        let extractor = registry.build(&source("selector"), &client).unwrap();
        assert_eq!(extractor.source_name(), "Example");
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let registry = ExtractorRegistry::with_builtins();
        let client = Client::new();
        let result = registry.build(&source("telepathy"), &client);
        assert!(matches!(result, Err(WatchError::UnknownSourceKind(_))));
    }

    #[test]
    fn test_kinds_are_sorted() {
        let mut registry = ExtractorRegistry::with_builtins();
        registry.register("api", |_, _| unreachable!());
        assert_eq!(registry.kinds(), vec!["api", "selector"]);
    }
}
