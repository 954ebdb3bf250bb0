use schemars::JsonSchema;
use serde::Serialize;

/// Score reported when the model's answer carries none.
pub const DEFAULT_ANALYSIS_SCORE: i64 = 75;
/// Accessibility score assumed for content records that do not carry one.
pub const DEFAULT_RECORD_SCORE: u32 = 85;
/// Records at or above this score count as WCAG compliant unless flagged otherwise.
pub const COMPLIANCE_THRESHOLD: u32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Error,
    Warning,
    Info,
}

impl IssueKind {
    /// Case-insensitive match against `error`, `warning` or `info`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Structured accessibility critique extracted from a model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Conventionally 0-100, not enforced.
    pub score: i64,
    pub issues: Vec<Issue>,
    pub suggestions: Vec<String>,
    /// Only present when an image was part of the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

/// Where a [`ContentRecord`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Demo,
    SearchIndex,
    Cms,
}

/// One searchable piece of content, normalized from any source.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Free-form category label such as "Tutorial" or "Story".
    #[serde(rename = "type")]
    pub kind: String,
    pub tags: Vec<String>,
    pub accessibility_score: u32,
    pub wcag_compliant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    pub ai_enhanced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    pub source: RecordSource,
}

impl ContentRecord {
    pub fn has_any_tag(&self, selected: &[String]) -> bool {
        self.tags.iter().any(|t| selected.contains(t))
    }
}

/// Resolve the score and compliance flag of a record.
///
/// An explicit flag always wins; otherwise compliance follows the resolved score.
pub fn resolve_compliance(score: Option<u32>, explicit: Option<bool>) -> (u32, bool) {
    let score = score.unwrap_or(DEFAULT_RECORD_SCORE);
    let compliant = explicit.unwrap_or(score >= COMPLIANCE_THRESHOLD);
    (score, compliant)
}
