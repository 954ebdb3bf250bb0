use std::sync::Arc;

use tracing::{debug, info, warn};

use genie_common::gemini::{GeminiClient, ResponseFormat};

use crate::model::ContentRecord;

/// Number of leading results described to the model.
const SUMMARY_CONTEXT_RESULTS: usize = 3;

/// Best-effort annotation of the top result with a model-written summary.
pub struct Reranker {
    client: Arc<GeminiClient>,
}

impl Reranker {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }

    /// Attach a summary to the first record when enabled, the query is non-empty
    /// and there is at least one record. Any failure returns `results` untouched.
    pub async fn rerank(
        &self,
        query: &str,
        mut results: Vec<ContentRecord>,
        enabled: bool,
    ) -> Vec<ContentRecord> {
        let query = query.trim();
        if !enabled || query.is_empty() || results.is_empty() {
            return results;
        }

        let prompt = summary_prompt(query, &results);
        match self.client.generate_text(&prompt, ResponseFormat::Text).await {
            Ok(summary) => {
                info!(query, results = results.len(), "attached ai summary to top result");
                if let Some(top) = results.first_mut() {
                    top.ai_enhanced = true;
                    top.ai_summary = Some(summary.trim().to_string());
                }
                results
            }
            Err(e) => {
                warn!(error = %e, query, "ai summary failed, returning unranked results");
                results
            }
        }
    }
}

pub fn summary_prompt(query: &str, results: &[ContentRecord]) -> String {
    let listing = results
        .iter()
        .take(SUMMARY_CONTEXT_RESULTS)
        .map(|r| {
            format!(
                "- {}: {} (Score: {})",
                r.title, r.description, r.accessibility_score
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    debug!(query, "built summary prompt");
    format!(
        "You are an accessibility expert. Analyze these search results for \"{query}\" and \
provide a brief summary (2-3 sentences) highlighting the most accessible and relevant content.\n\n\
Results:\n{listing}\n\nProvide only the summary text, no formatting."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use genie_common::gemini::GeminiClientConfig;
    use serde_json::{json, Value};

    use crate::demo::demo_corpus;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn reranker_for(base_url: String) -> Reranker {
        let lookup = move |name: &str| match name {
            "GEMINI_API_KEY" => Some("test-key".to_string()),
            "GEMINI_BASE_URL" => Some(base_url.clone()),
            _ => None,
        };
        let config = GeminiClientConfig::from_lookup(&lookup).unwrap();
        Reranker::new(Arc::new(GeminiClient::new(config).unwrap()))
    }

    fn summary_router(calls: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/models/{action}",
            post(move |Json(body): Json<Value>| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let prompt = body["contents"][0]["parts"][0]["text"]
                        .as_str()
                        .unwrap_or_default();
                    assert!(prompt.contains("\"screen\""));
                    Json(json!({
                        "candidates": [{"content": {"parts": [{"text": "  Start with the testing guide.  "}]}}]
                    }))
                }
            }),
        )
    }

    #[test]
    fn prompt_lists_top_three_results() {
        let prompt = summary_prompt("forms", &demo_corpus());
        assert!(prompt.contains("\"forms\""));
        assert!(prompt.contains("- Getting Started with Web Accessibility: "));
        assert!(prompt.contains("(Score: 95)"));
        assert!(prompt.contains("- Storyblok Integration Guide: "));
        assert!(!prompt.contains("Color Contrast Checker Tool"));
    }

    #[tokio::test]
    async fn summary_attaches_to_first_result_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let reranker = reranker_for(serve(summary_router(Arc::clone(&calls))).await);

        let results = reranker.rerank("screen", demo_corpus(), true).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(results.len(), 8);
        assert!(results[0].ai_enhanced);
        assert_eq!(
            results[0].ai_summary.as_deref(),
            Some("Start with the testing guide.")
        );
        assert!(results[1..]
            .iter()
            .all(|r| !r.ai_enhanced && r.ai_summary.is_none()));
        assert_eq!(results[1..], demo_corpus()[1..]);
    }

    #[tokio::test]
    async fn skipped_when_disabled_empty_query_or_no_results() {
        let calls = Arc::new(AtomicUsize::new(0));
        let reranker = reranker_for(serve(summary_router(Arc::clone(&calls))).await);

        assert_eq!(reranker.rerank("screen", demo_corpus(), false).await, demo_corpus());
        assert_eq!(reranker.rerank("   ", demo_corpus(), true).await, demo_corpus());
        assert!(reranker.rerank("screen", Vec::new(), true).await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upstream_failure_returns_results_unchanged() {
        let router = Router::new().route(
            "/models/{action}",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let reranker = reranker_for(serve(router).await);

        let results = reranker.rerank("screen", demo_corpus(), true).await;
        assert_eq!(results, demo_corpus());
    }

    #[tokio::test]
    async fn unreachable_service_returns_results_unchanged() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let reranker = reranker_for(format!("http://{addr}"));

        let results = reranker.rerank("screen", demo_corpus(), true).await;
        assert_eq!(results, demo_corpus());
    }
}
