/// Extraction of [`AnalysisResult`]s from model answers.
///
/// Both extractors are lenient: the upstream text is free-form and not guaranteed
/// to follow the requested template, so missing or malformed sections degrade to
/// defaults instead of failing.
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::fields::{first_string, string_field, Object};
use crate::model::{AnalysisResult, Issue, IssueKind, DEFAULT_ANALYSIS_SCORE};

const SCORE_MARKER: &str = "SCORE:";
const ISSUES_MARKER: &str = "ISSUES:";
const SUGGESTIONS_MARKER: &str = "SUGGESTIONS:";
const ALT_TEXT_MARKER: &str = "ALT_TEXT:";
const MARKERS: [&str; 4] = [SCORE_MARKER, ISSUES_MARKER, SUGGESTIONS_MARKER, ALT_TEXT_MARKER];

/// Message of the single issue reported when a JSON answer cannot be parsed.
pub const FALLBACK_ISSUE_MESSAGE: &str = "Analysis completed";

static SCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SCORE:\s*(\d+)").expect("valid regex"));
static ISSUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^-\s+(error|warning|info):\s*(.*)$").expect("valid regex")
});

/// Parse the `SCORE:` / `ISSUES:` / `SUGGESTIONS:` / `ALT_TEXT:` template.
pub fn parse_text_response(text: &str) -> AnalysisResult {
    let score = SCORE_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .unwrap_or(DEFAULT_ANALYSIS_SCORE);

    let issues = section(text, ISSUES_MARKER)
        .map(|body| dash_lines(body).filter_map(parse_issue_line).collect())
        .unwrap_or_default();

    let suggestions = section(text, SUGGESTIONS_MARKER)
        .map(|body| {
            dash_lines(body)
                .map(|line| line.trim_start_matches('-').trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let alt_text = text.find(ALT_TEXT_MARKER).map(|idx| {
        let rest = &text[idx + ALT_TEXT_MARKER.len()..];
        rest.lines().next().unwrap_or_default().trim().to_string()
    });

    AnalysisResult {
        score,
        issues,
        suggestions,
        alt_text,
    }
}

/// Parse the first `{` .. last `}` span as an [`AnalysisResult`], falling back
/// to a generic record that carries the raw text as its only suggestion.
///
/// Only a span that is not a JSON object triggers the fallback. Fields of the
/// wrong type take their defaults without rejecting the rest of the answer.
pub fn parse_json_response(text: &str) -> AnalysisResult {
    let span = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            debug!("model answer contains no JSON object, using fallback");
            return fallback_result(text);
        }
    };

    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => analysis_from_object(&map),
        Ok(_) => fallback_result(text),
        Err(e) => {
            debug!(error = %e, "model answer is not valid JSON, using fallback");
            fallback_result(text)
        }
    }
}

fn analysis_from_object(map: &Object) -> AnalysisResult {
    AnalysisResult {
        score: map
            .get("score")
            .and_then(json_score)
            .unwrap_or(DEFAULT_ANALYSIS_SCORE),
        issues: json_items(map, "issues").filter_map(json_issue).collect(),
        suggestions: json_items(map, "suggestions")
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        alt_text: first_string(map, &["altText", "alt_text"]),
    }
}

/// Integers as-is, fractions and numeric strings rounded.
fn json_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

/// Elements of the array under `key`; anything else (including `null`) is empty.
fn json_items<'a>(map: &'a Object, key: &str) -> impl Iterator<Item = &'a Value> {
    map.get(key).and_then(Value::as_array).into_iter().flatten()
}

/// Unknown or missing kinds become `info`. Issues without a message are dropped.
fn json_issue(value: &Value) -> Option<Issue> {
    match value {
        Value::String(message) if !message.trim().is_empty() => {
            Some(Issue::new(IssueKind::Info, message.trim()))
        }
        Value::Object(obj) => {
            let message = string_field(obj, "message")?;
            let kind = obj
                .get("type")
                .and_then(Value::as_str)
                .and_then(IssueKind::parse)
                .unwrap_or(IssueKind::Info);
            Some(Issue::new(kind, message))
        }
        _ => None,
    }
}

pub fn fallback_result(raw: &str) -> AnalysisResult {
    AnalysisResult {
        score: DEFAULT_ANALYSIS_SCORE,
        issues: vec![Issue::new(IssueKind::Info, FALLBACK_ISSUE_MESSAGE)],
        suggestions: vec![raw.to_string()],
        alt_text: None,
    }
}

/// Text following `marker` up to the next known marker or the end of input.
fn section<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = MARKERS
        .iter()
        .filter(|m| **m != marker)
        .filter_map(|m| rest.find(m))
        .min()
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn dash_lines(body: &str) -> impl Iterator<Item = &str> {
    body.lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-'))
}

fn parse_issue_line(line: &str) -> Option<Issue> {
    let caps = ISSUE_RE.captures(line)?;
    let kind = IssueKind::parse(&caps[1])?;
    let message = caps[2].trim();
    if message.is_empty() {
        return None;
    }
    Some(Issue::new(kind, message))
}
