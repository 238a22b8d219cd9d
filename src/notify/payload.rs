//! Outbound payload shapes
//!
//! Two embed shapes go over the wire: "new listing" carries the summary
//! fields, "updated listing" carries only the tracked-field changes. The
//! document layout follows the Discord webhook embed contract.

use crate::store::diff::{display_value, stringify};
use crate::store::{Candidate, ChangeEntry};
use chrono::Utc;
use serde_json::{json, Value};

const COLOR_NEW: u32 = 0x00FF00;
const COLOR_UPDATED: u32 = 0xFFA500;

const DESCRIPTION_PREVIEW_LEN: usize = 200;

/// Builds the "new listing" embed from a freshly created candidate
pub fn new_listing_payload(candidate: &Candidate) -> Value {
    let field = |name: &str| {
        candidate
            .field(name)
            .map(|v| display_value(&stringify(v)))
            .unwrap_or_else(|| "N/A".to_string())
    };

    json!({
        "embeds": [{
            "title": format!(":sparkles: New listing: {}", field("title")),
            "url": candidate.reference,
            "color": COLOR_NEW,
            "fields": [
                { "name": "Price", "value": field("price"), "inline": true },
                { "name": "Source", "value": candidate.source_name, "inline": true },
                { "name": "Images", "value": field("image_count"), "inline": true },
                { "name": "Description", "value": preview(&field("description")), "inline": false },
            ],
            "timestamp": Utc::now().to_rfc3339(),
        }]
    })
}

/// Builds the "updated listing" embed from tracked-field changes
///
/// Returns None when there are no changes to report; callers send nothing
/// in that case.
pub fn updated_listing_payload(candidate: &Candidate, changes: &[ChangeEntry]) -> Option<Value> {
    if changes.is_empty() {
        return None;
    }

    let title = candidate
        .field("title")
        .map(|v| display_value(&stringify(v)))
        .unwrap_or_else(|| "N/A".to_string());

    let change_lines: Vec<String> = changes
        .iter()
        .map(|change| {
            format!(
                "**{}**: `{}` → `{}`",
                field_label(&change.field),
                change.old_value,
                change.new_value
            )
        })
        .collect();

    Some(json!({
        "embeds": [{
            "title": format!(":arrows_counterclockwise: Updated listing: {}", title),
            "url": candidate.reference,
            "color": COLOR_UPDATED,
            "description": change_lines.join("\n"),
            "fields": [
                { "name": "Source", "value": candidate.source_name, "inline": true },
                { "name": "Link", "value": format!("[View listing]({})", candidate.reference), "inline": false },
            ],
            "timestamp": Utc::now().to_rfc3339(),
        }]
    }))
}

/// "image_count" renders as "Image Count"
fn field_label(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn preview(text: &str) -> String {
    if text.chars().count() > DESCRIPTION_PREVIEW_LEN {
        let truncated: String = text.chars().take(DESCRIPTION_PREVIEW_LEN).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
