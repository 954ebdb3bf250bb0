use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::ContentRecord;

/// Filter criteria for a search. Every active filter must pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct SearchFilters {
    /// Case-insensitive substring matched against title, description and tags.
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub only_compliant: bool,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SearchFilters {
    pub fn trimmed_query(&self) -> &str {
        self.query.trim()
    }
}

/// Records gathered from each source for one search, kept in source order.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub demo: Vec<ContentRecord>,
    pub index: Vec<ContentRecord>,
    pub cms: Vec<ContentRecord>,
}

impl SourceSet {
    /// Concatenation of demo, index and CMS records. Duplicates are kept.
    pub fn candidates(&self) -> impl Iterator<Item = &ContentRecord> {
        self.demo.iter().chain(&self.index).chain(&self.cms)
    }

    pub fn len(&self) -> usize {
        self.demo.len() + self.index.len() + self.cms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Distinct filter values available in a candidate set, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Facets {
    pub types: Vec<String>,
    pub tags: Vec<String>,
}

/// Merge all sources and apply the filters, preserving merge order.
pub fn derive_results(sources: &SourceSet, filters: &SearchFilters) -> Vec<ContentRecord> {
    filter_records(sources.candidates(), filters)
}

pub fn filter_records<'a>(
    records: impl IntoIterator<Item = &'a ContentRecord>,
    filters: &SearchFilters,
) -> Vec<ContentRecord> {
    let needle = filters.trimmed_query().to_lowercase();
    records
        .into_iter()
        .filter(|r| needle.is_empty() || matches_text(r, &needle))
        .filter(|r| !filters.only_compliant || r.wcag_compliant)
        .filter(|r| filters.types.is_empty() || filters.types.contains(&r.kind))
        .filter(|r| filters.tags.is_empty() || r.has_any_tag(&filters.tags))
        .cloned()
        .collect()
}

pub fn facets<'a>(records: impl IntoIterator<Item = &'a ContentRecord>) -> Facets {
    let mut out = Facets::default();
    for record in records {
        if !out.types.contains(&record.kind) {
            out.types.push(record.kind.clone());
        }
        for tag in &record.tags {
            if !out.tags.contains(tag) {
                out.tags.push(tag.clone());
            }
        }
    }
    out
}

fn matches_text(record: &ContentRecord, needle: &str) -> bool {
    record.title.to_lowercase().contains(needle)
        || record.description.to_lowercase().contains(needle)
        || record.tags.iter().any(|t| t.to_lowercase().contains(needle))
}
