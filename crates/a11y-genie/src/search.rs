use serde_json::Value;
use tracing::warn;

use genie_common::algolia::Hit;

use crate::fields::{bool_field, first_string, score_field, string_list};
use crate::model::{resolve_compliance, ContentRecord, RecordSource};

const DEFAULT_HIT_TYPE: &str = "Article";
const UNTITLED: &str = "Untitled";

/// Map a loosely-typed index hit onto a [`ContentRecord`].
///
/// Index schemas drift, so every field has a list of accepted names. Hits
/// without any usable identifier are skipped.
pub fn record_from_hit(hit: &Hit) -> Option<ContentRecord> {
    let Some(id) = hit_id(hit) else {
        warn!("search hit has no objectID or id, skipping");
        return None;
    };

    let (accessibility_score, wcag_compliant) = resolve_compliance(
        score_field(
            hit,
            &["accessibility_score", "accessibilityScore", "readabilityScore"],
        ),
        bool_field(hit, &["wcag_compliant", "wcagCompliant"]),
    );

    Some(ContentRecord {
        id,
        title: first_string(hit, &["title", "name"]).unwrap_or_else(|| UNTITLED.to_string()),
        description: first_string(hit, &["description", "content"]).unwrap_or_default(),
        kind: first_string(hit, &["type", "category"])
            .unwrap_or_else(|| DEFAULT_HIT_TYPE.to_string()),
        tags: string_list(hit, "tags"),
        accessibility_score,
        wcag_compliant,
        url: first_string(hit, &["url"]),
        alt_text: first_string(hit, &["alt_text", "altText"]),
        ai_enhanced: false,
        ai_summary: None,
        source: RecordSource::SearchIndex,
    })
}

pub fn records_from_hits(hits: &[Hit]) -> Vec<ContentRecord> {
    hits.iter().filter_map(record_from_hit).collect()
}

fn hit_id(hit: &Hit) -> Option<String> {
    ["objectID", "id"].iter().find_map(|key| match hit.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
