use std::sync::Arc;

use tracing::{error, info};

use genie_common::gemini::{GeminiClient, ResponseFormat};

use crate::error::AppError;
use crate::model::AnalysisResult;
use crate::parser;

/// Asks the generative text service for an accessibility critique of user content.
pub struct ContentAnalyzer {
    client: Arc<GeminiClient>,
}

impl ContentAnalyzer {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }

    pub async fn analyze(
        &self,
        content: &str,
        image_url: Option<&str>,
        format: ResponseFormat,
    ) -> Result<AnalysisResult, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::InvalidInput(
                "please enter some content to analyze".to_string(),
            ));
        }
        let image_url = image_url.map(str::trim).filter(|u| !u.is_empty());

        let prompt = match format {
            ResponseFormat::Text => text_prompt(content, image_url),
            ResponseFormat::Json => json_prompt(content, image_url),
        };

        let answer = self
            .client
            .generate_text(&prompt, format)
            .await
            .inspect_err(|e| error!(error = %e, "analysis request failed"))?;

        let mut result = match format {
            ResponseFormat::Text => parser::parse_text_response(&answer),
            ResponseFormat::Json => parser::parse_json_response(&answer),
        };
        if image_url.is_none() {
            result.alt_text = None;
        }

        info!(
            score = result.score,
            issues = result.issues.len(),
            suggestions = result.suggestions.len(),
            "analysis complete"
        );
        Ok(result)
    }
}

fn text_prompt(content: &str, image_url: Option<&str>) -> String {
    let image_line = image_url
        .map(|url| format!("Image URL: {url}\n"))
        .unwrap_or_default();
    let alt_text_line = if image_url.is_some() {
        "ALT_TEXT: [generated alt text]\n"
    } else {
        ""
    };
    format!(
        "Analyze the following content for accessibility issues and provide a score (0-100), \
specific issues (categorize as error, warning, or info), and suggestions for improvement. \
Also, if there's an image URL provided, generate appropriate alt text.\n\n\
Content: {content}\n{image_line}\n\
Return your analysis in this format:\n\
SCORE: [number]\n\
ISSUES:\n\
- [type]: [message]\n\
SUGGESTIONS:\n\
- [suggestion]\n\
{alt_text_line}"
    )
}

fn json_prompt(content: &str, image_url: Option<&str>) -> String {
    match image_url {
        Some(url) => format!(
            "Analyze this content and image for accessibility issues. Content: \"{content}\". \
Image URL: {url}.\n\
Provide: 1) accessibility score (0-100), 2) list of issues (type: error/warning/info, message), \
3) suggestions for improvement, 4) generate descriptive alt text for the image.\n\
Return as JSON: {{ \"score\": number, \"issues\": [{{\"type\": string, \"message\": string}}], \
\"suggestions\": [string], \"altText\": string }}"
        ),
        None => format!(
            "Analyze this content for accessibility issues: \"{content}\".\n\
Provide: 1) accessibility score (0-100), 2) list of issues (type: error/warning/info, message), \
3) suggestions for improvement.\n\
Return as JSON: {{ \"score\": number, \"issues\": [{{\"type\": string, \"message\": string}}], \
\"suggestions\": [string] }}"
        ),
    }
}
