//! Search Summary Shaping
//!
//! Turns a raw segmentation payload into the short summary item search returns.

use serde_json::Value;

use crate::cache::Fingerprint;
use crate::models::{SearchItem, SearchPreview};

/// Upper bound on group names shown in a summary.
pub const MAX_SUMMARY_GROUPS: usize = 5;

/// Summary text used when the payload has no groups.
pub const NO_DATA: &str = "no data";

/// Number of group names to show for a requested `top_k`.
pub fn summary_limit(top_k: i64) -> usize {
    top_k.clamp(1, MAX_SUMMARY_GROUPS as i64) as usize
}

/// Group names of a payload, in upstream order.
pub fn group_names(payload: &Value) -> Vec<String> {
    payload
        .get("data")
        .and_then(Value::as_object)
        .map(|groups| groups.keys().cloned().collect())
        .unwrap_or_default()
}

/// Breakdown expression with the `properties[...]` wrapper removed.
pub fn dimension_label(breakdown: &str) -> String {
    breakdown.replace("properties[", "").replace(']', "")
}

pub fn title(event: &str, from_date: &str, to_date: &str, breakdown: &str) -> String {
    format!(
        "{} · {}→{} · by {}",
        event,
        from_date,
        to_date,
        dimension_label(breakdown)
    )
}

/// Builds the single search item for a payload.
pub fn summarize(
    id: &Fingerprint,
    title: String,
    payload: &Value,
    top_k: i64,
) -> SearchItem {
    let top: Vec<String> = group_names(payload)
        .into_iter()
        .take(summary_limit(top_k))
        .collect();
    let text = if top.is_empty() {
        NO_DATA.to_string()
    } else {
        top.join(", ")
    };

    SearchItem {
        id: id.to_string(),
        title,
        text,
        preview: Some(SearchPreview {
            top,
            series: payload.get("series").cloned().unwrap_or(Value::Null),
        }),
    }
}
