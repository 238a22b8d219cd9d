use crate::config::types::{Config, NotifyConfig, SourceEntry, StoreConfig, WatcherConfig};
use crate::store::diff::DEDICATED_FIELDS;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_watcher_config(&config.watcher)?;
    validate_store_config(&config.store)?;
    validate_notify_config(&config.notify)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates crawl behavior configuration
fn validate_watcher_config(config: &WatcherConfig) -> Result<(), ConfigError> {
    if config.page_cap < 1 {
        return Err(ConfigError::Validation(format!(
            "page-cap must be >= 1, got {}",
            config.page_cap
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates store configuration
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates notification configuration
fn validate_notify_config(config: &NotifyConfig) -> Result<(), ConfigError> {
    if let Some(url) = &config.webhook_url {
        let parsed = Url::parse(url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid webhook-url: {}", e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "webhook-url must be http(s), got scheme '{}'",
                parsed.scheme()
            )));
        }

        if config.min_send_interval_ms < 100 {
            return Err(ConfigError::Validation(format!(
                "min-send-interval-ms must be >= 100ms, got {}ms",
                config.min_send_interval_ms
            )));
        }
    }

    for field in &config.tracked_fields {
        if !DEDICATED_FIELDS.contains(&field.as_str()) {
            return Err(ConfigError::Validation(format!(
                "tracked field '{}' is not a dedicated field (expected one of: {})",
                field,
                DEDICATED_FIELDS.join(", ")
            )));
        }
    }

    Ok(())
}

/// Validates the source list
fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] must be configured".to_string(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for source in sources {
        if source.name.is_empty() {
            return Err(ConfigError::Validation(
                "source name cannot be empty".to_string(),
            ));
        }

        if !seen.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name '{}'",
                source.name
            )));
        }

        if source.kind.is_empty() {
            return Err(ConfigError::Validation(format!(
                "source '{}' has an empty kind",
                source.name
            )));
        }

        // The built-in selector extractor needs a page-templated list URL
        // and an item/link selector pair; other kinds are checked by the
        // registry at build time.
        if source.kind == "selector" {
            let list_url = source.list_url.as_deref().ok_or_else(|| {
                ConfigError::Validation(format!("source '{}' is missing list-url", source.name))
            })?;

            if !list_url.contains("{page}") {
                return Err(ConfigError::Validation(format!(
                    "source '{}' list-url must contain a {{page}} placeholder",
                    source.name
                )));
            }

            Url::parse(&list_url.replace("{page}", "1")).map_err(|e| {
                ConfigError::InvalidUrl(format!("source '{}' list-url: {}", source.name, e))
            })?;

            if source.selectors.is_none() {
                return Err(ConfigError::Validation(format!(
                    "source '{}' is missing a [source.selectors] table",
                    source.name
                )));
            }
        }
    }

    Ok(())
}
