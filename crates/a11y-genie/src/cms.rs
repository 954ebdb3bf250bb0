/// Mapping of CMS stories onto [`ContentRecord`]s.
///
/// Story bodies come in several shapes depending on the component schema of the
/// space. They are first classified into [`BodyContent`] and then flattened to
/// plain text.
use serde_json::{Map, Value};
use tracing::warn;

use genie_common::storyblok::Story;

use crate::fields::{bool_field, score_field, string_field, string_list};
use crate::model::{resolve_compliance, ContentRecord, RecordSource};

/// Derived descriptions from block lists are cut to this many characters.
pub const MAX_BLOCK_TEXT_CHARS: usize = 200;
const NO_DESCRIPTION: &str = "No description";
const DEFAULT_STORY_TYPE: &str = "Story";

#[derive(Debug, Clone, PartialEq)]
pub enum BodyContent {
    Text(String),
    Blocks(Vec<Block>),
    TextObject {
        text: Option<String>,
        headline: Option<String>,
    },
    /// Anything else: numbers, booleans, null, objects without text fields.
    Unsupported(&'static str),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub text: Option<String>,
    pub headline: Option<String>,
    pub content: Option<Box<BodyContent>>,
}

impl BodyContent {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::Blocks(items.iter().map(Block::from_value).collect()),
            Value::Object(map) => {
                let text = string_field(map, "text");
                let headline = string_field(map, "headline");
                if text.is_none() && headline.is_none() {
                    Self::Unsupported("object without text or headline")
                } else {
                    Self::TextObject { text, headline }
                }
            }
            Value::Null => Self::Unsupported("null"),
            Value::Bool(_) => Self::Unsupported("boolean"),
            Value::Number(_) => Self::Unsupported("number"),
        }
    }
}

impl Block {
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        Self {
            text: string_field(map, "text"),
            headline: string_field(map, "headline"),
            content: map
                .get("content")
                .map(|c| Box::new(BodyContent::from_value(c))),
        }
    }

    fn to_text(&self) -> String {
        if let Some(text) = &self.text {
            return text.clone();
        }
        if let Some(headline) = &self.headline {
            return headline.clone();
        }
        self.content
            .as_deref()
            .map(extract_text_from_body)
            .unwrap_or_default()
    }
}

/// Flatten a story body to plain text.
pub fn extract_text_from_body(body: &BodyContent) -> String {
    match body {
        BodyContent::Text(s) => s.clone(),
        BodyContent::Blocks(blocks) => {
            let joined = blocks
                .iter()
                .map(Block::to_text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            truncate_chars(&joined, MAX_BLOCK_TEXT_CHARS)
        }
        BodyContent::TextObject { text, headline } => text
            .clone()
            .or_else(|| headline.clone())
            .unwrap_or_default(),
        BodyContent::Unsupported(kind) => {
            warn!(kind, "unsupported story body shape, no text derived");
            String::new()
        }
    }
}

pub fn record_from_story(story: &Story) -> ContentRecord {
    let empty = Map::new();
    let content = story.content.as_object().unwrap_or(&empty);

    let description = string_field(content, "description")
        .or_else(|| {
            content
                .get("body")
                .map(|body| extract_text_from_body(&BodyContent::from_value(body)))
                .filter(|text| !text.trim().is_empty())
        })
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    let kind = string_field(content, "type")
        .or_else(|| string_field(content, "category"))
        .unwrap_or_else(|| DEFAULT_STORY_TYPE.to_string());

    let (accessibility_score, wcag_compliant) = resolve_compliance(
        score_field(content, &["accessibility_score"]),
        bool_field(content, &["wcag_compliant"]),
    );

    let url = string_field(content, "url")
        .unwrap_or_else(|| format!("/{}", story.full_slug.trim_start_matches('/')));

    ContentRecord {
        id: story.uuid.clone(),
        title: string_field(content, "title").unwrap_or_else(|| story.name.clone()),
        description,
        kind,
        tags: string_list(content, "tags"),
        accessibility_score,
        wcag_compliant,
        url: Some(url),
        alt_text: string_field(content, "alt_text"),
        ai_enhanced: false,
        ai_summary: None,
        source: RecordSource::Cms,
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
