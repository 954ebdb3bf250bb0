/// MCP server for content accessibility analysis and search.
///
/// Exposes five tools:
/// - `analyze_content`: AI accessibility critique of pasted content
/// - `search_content`: filtered search across demo, index and CMS records
/// - `list_filters`: available type and tag filter values
/// - `get_story`: one CMS story by slug
/// - `latest_results`: the most recently published search and analysis
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use genie_common::gemini::ResponseFormat;

use crate::aggregate::{derive_results, facets, Facets, SearchFilters};
use crate::analyze::ContentAnalyzer;
use crate::cms::record_from_story;
use crate::error::AppError;
use crate::model::{AnalysisResult, ContentRecord};
use crate::rerank::Reranker;
use crate::session::LatestSlot;
use crate::sources::{SourceLoader, SourceReport};

const DEFAULT_RESULT_LIMIT: u32 = 20;
const MAX_RESULT_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct GenieServer {
    analyzer: Arc<ContentAnalyzer>,
    sources: Arc<SourceLoader>,
    reranker: Arc<Reranker>,
    analyses: Arc<LatestSlot<AnalysisResult>>,
    searches: Arc<LatestSlot<Vec<ContentRecord>>>,
    tool_router: ToolRouter<GenieServer>,
}

impl GenieServer {
    pub fn new(
        analyzer: Arc<ContentAnalyzer>,
        sources: Arc<SourceLoader>,
        reranker: Arc<Reranker>,
    ) -> Self {
        Self {
            analyzer,
            sources,
            reranker,
            analyses: Arc::new(LatestSlot::new("analysis")),
            searches: Arc::new(LatestSlot::new("search")),
            tool_router: Self::tool_router(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
enum AnswerFormat {
    /// SCORE/ISSUES/SUGGESTIONS/ALT_TEXT template.
    #[default]
    Text,
    /// A single JSON object.
    Json,
}

impl From<AnswerFormat> for ResponseFormat {
    fn from(value: AnswerFormat) -> Self {
        match value {
            AnswerFormat::Text => ResponseFormat::Text,
            AnswerFormat::Json => ResponseFormat::Json,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AnalyzeContentParams {
    /// Content (text or markup) to review for accessibility issues.
    content: String,
    /// Optional image to review; enables alt text generation.
    image_url: Option<String>,
    /// Answer shape requested from the model (default: text).
    format: Option<AnswerFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchContentParams {
    #[serde(flatten)]
    filters: SearchFilters,
    /// Attach an AI summary to the top result (requires a non-empty query).
    #[serde(default)]
    ai_enhance: bool,
    /// Maximum number of results to return (default: 20, max: 50).
    limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetStoryParams {
    /// Full slug of the story, e.g. "blog/accessible-forms".
    slug: String,
}

#[derive(Debug, Serialize, JsonSchema)]
struct AnalyzeContentResponse {
    result: AnalysisResult,
    /// A newer analysis was started before this one finished.
    superseded: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
struct SearchContentResponse {
    results: Vec<ContentRecord>,
    total_matches: usize,
    sources: SourceReport,
    /// A newer search was started before this one finished.
    superseded: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
struct ListFiltersResponse {
    #[serde(flatten)]
    facets: Facets,
    sources: SourceReport,
}

#[derive(Debug, Serialize, JsonSchema)]
struct StoryResponse {
    record: ContentRecord,
}

#[derive(Debug, Serialize, JsonSchema)]
struct LatestResultsResponse {
    search: Option<Vec<ContentRecord>>,
    analysis: Option<AnalysisResult>,
}

#[tool_router]
impl GenieServer {
    #[tool(description = "Analyze content (and optionally an image) for accessibility issues. Returns a score, typed issues, suggestions and, when an image URL is given, generated alt text.")]
    async fn analyze_content(
        &self,
        Parameters(params): Parameters<AnalyzeContentParams>,
    ) -> Result<Json<AnalyzeContentResponse>, String> {
        if params.content.trim().is_empty() {
            return Err("content must not be empty".to_string());
        }

        let ticket = self.analyses.issue();
        self.analyses.clear(ticket).await;

        let result = self
            .analyzer
            .analyze(
                &params.content,
                params.image_url.as_deref(),
                params.format.unwrap_or_default().into(),
            )
            .await
            .map_err(|e| match e {
                AppError::InvalidInput(message) => message,
                _ => "analysis failed, please try again".to_string(),
            })?;

        let superseded = !self.analyses.publish(ticket, result.clone()).await;
        Ok(Json(AnalyzeContentResponse { result, superseded }))
    }

    #[tool(description = "Search accessibility content across the demo catalog, the search index and the CMS. Supports free-text query, WCAG-compliant-only, type and tag filters, and an optional AI summary of the top result.")]
    async fn search_content(
        &self,
        Parameters(params): Parameters<SearchContentParams>,
    ) -> Result<Json<SearchContentResponse>, String> {
        let ticket = self.searches.issue();
        let limit = params
            .limit
            .unwrap_or(DEFAULT_RESULT_LIMIT)
            .clamp(1, MAX_RESULT_LIMIT) as usize;

        let (sources, report) = self.sources.load(params.filters.trimmed_query()).await;
        let mut results = derive_results(&sources, &params.filters);
        let total_matches = results.len();
        results.truncate(limit);

        let results = self
            .reranker
            .rerank(params.filters.trimmed_query(), results, params.ai_enhance)
            .await;

        info!(
            seq = ticket.seq(),
            candidates = sources.len(),
            total_matches,
            returned = results.len(),
            "search complete"
        );
        let superseded = !self.searches.publish(ticket, results.clone()).await;
        Ok(Json(SearchContentResponse {
            results,
            total_matches,
            sources: report,
            superseded,
        }))
    }

    #[tool(description = "List the content types and tags available as search filters.")]
    async fn list_filters(&self) -> Result<Json<ListFiltersResponse>, String> {
        let (sources, report) = self.sources.load("").await;
        Ok(Json(ListFiltersResponse {
            facets: facets(sources.candidates()),
            sources: report,
        }))
    }

    #[tool(description = "Fetch a single CMS story by its full slug and return it as a content record.")]
    async fn get_story(
        &self,
        Parameters(params): Parameters<GetStoryParams>,
    ) -> Result<Json<StoryResponse>, String> {
        let slug = params.slug.trim().to_string();
        if slug.is_empty() {
            return Err("slug must not be empty".to_string());
        }
        let cms = self
            .sources
            .cms()
            .ok_or_else(|| "cms is not configured (set STORYBLOK_TOKEN)".to_string())?;

        let story = cms
            .fetch_story(&slug)
            .await
            .map_err(|e| format!("story lookup failed: {e}"))?
            .ok_or_else(|| AppError::NotFound(format!("story '{slug}'")).to_string())?;

        Ok(Json(StoryResponse {
            record: record_from_story(&story),
        }))
    }

    #[tool(description = "Return the most recently published search results and analysis, if any.")]
    async fn latest_results(&self) -> Result<Json<LatestResultsResponse>, String> {
        Ok(Json(LatestResultsResponse {
            search: self.searches.snapshot().await,
            analysis: self.analyses.snapshot().await,
        }))
    }
}

#[tool_handler]
impl ServerHandler for GenieServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "a11y-genie".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Content accessibility assistant. Use analyze_content to get a score, issues, \
suggestions and alt text for pasted content; search_content to find accessibility content with \
optional compliance/type/tag filters and an AI summary; list_filters to discover filter values; \
get_story to fetch a CMS story by slug; latest_results to read back the newest results."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Router;
    use genie_common::gemini::{GeminiClient, GeminiClientConfig};
    use genie_common::storyblok::{StoryblokClient, StoryblokConfig};
    use serde_json::json;

    use crate::config::DemoMode;
    use crate::model::RecordSource;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn demo_server() -> GenieServer {
        server_with(SourceLoader::new(None, None, DemoMode::Auto)).await
    }

    async fn server_with(sources: SourceLoader) -> GenieServer {
        let router = Router::new().route(
            "/models/{action}",
            post(|| async {
                axum::Json(json!({"candidates": [{"content": {"parts": [{"text": "SCORE: 91\nISSUES:\n- info: fine\nSUGGESTIONS:\n- keep it up"}]}}]}))
            }),
        );
        let base_url = serve(router).await;
        let lookup = move |name: &str| match name {
            "GEMINI_API_KEY" => Some("test-key".to_string()),
            "GEMINI_BASE_URL" => Some(base_url.clone()),
            "GEMINI_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        };
        let config = GeminiClientConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.default_timeout, Duration::from_secs(5));
        let gemini = Arc::new(GeminiClient::new(config).unwrap());
        GenieServer::new(
            Arc::new(ContentAnalyzer::new(Arc::clone(&gemini))),
            Arc::new(sources),
            Arc::new(Reranker::new(gemini)),
        )
    }

    fn story_params(slug: &str) -> Parameters<GetStoryParams> {
        Parameters(GetStoryParams {
            slug: slug.to_string(),
        })
    }

    fn search_params(value: serde_json::Value) -> Parameters<SearchContentParams> {
        Parameters(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn tools_publish_output_schemas() {
        let tools = GenieServer::tool_router().list_all();
        for name in [
            "analyze_content",
            "search_content",
            "list_filters",
            "get_story",
            "latest_results",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[test]
    fn search_params_accept_flat_filters() {
        let Parameters(params) = search_params(json!({
            "query": "forms",
            "only_compliant": true,
            "tags": ["design"],
            "ai_enhance": true
        }));
        assert_eq!(params.filters.query, "forms");
        assert!(params.filters.only_compliant);
        assert!(params.filters.types.is_empty());
        assert_eq!(params.filters.tags, ["design"]);
        assert!(params.ai_enhance);
        assert!(params.limit.is_none());
    }

    #[tokio::test]
    async fn search_publishes_latest_results() {
        let server = demo_server().await;

        let Json(response) = server
            .search_content(search_params(json!({"query": "accessible", "limit": 1})))
            .await
            .unwrap();
        assert!(!response.superseded);
        assert_eq!(response.sources.demo, 8);
        assert_eq!(response.total_matches, 2);
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].title, "Accessible Form Design Patterns");
        assert!(response.results.iter().all(|r| r.source == RecordSource::Demo));
        assert!(response.results.iter().all(|r| !r.ai_enhanced));

        let Json(latest) = server.latest_results().await.unwrap();
        assert_eq!(latest.search, Some(response.results));
        assert!(latest.analysis.is_none());
    }

    #[tokio::test]
    async fn search_with_ai_enhance_marks_top_result() {
        let server = demo_server().await;

        let Json(response) = server
            .search_content(search_params(json!({"query": "screen", "ai_enhance": true})))
            .await
            .unwrap();
        assert_eq!(response.total_matches, 2);
        assert!(response.results[0].ai_enhanced);
        assert!(response.results[0].ai_summary.is_some());
        assert!(response.results[1].ai_summary.is_none());
    }

    #[tokio::test]
    async fn analyze_content_round_trip() {
        let server = demo_server().await;

        let Json(response) = server
            .analyze_content(Parameters(AnalyzeContentParams {
                content: "<h1>Hello</h1>".to_string(),
                image_url: None,
                format: None,
            }))
            .await
            .unwrap();
        assert_eq!(response.result.score, 91);
        assert_eq!(response.result.suggestions, vec!["keep it up"]);
        assert!(!response.superseded);

        let Err(err) = server
            .analyze_content(Parameters(AnalyzeContentParams {
                content: "   ".to_string(),
                image_url: None,
                format: Some(AnswerFormat::Json),
            }))
            .await
        else {
            panic!("blank content should be rejected");
        };
        assert!(err.contains("must not be empty"));
    }

    #[tokio::test]
    async fn list_filters_reflects_demo_corpus() {
        let server = demo_server().await;
        let Json(response) = server.list_filters().await.unwrap();
        assert_eq!(
            response.facets.types,
            ["Tutorial", "Feature", "Documentation", "Tool"]
        );
        assert!(response.facets.tags.contains(&"WCAG".to_string()));
    }

    #[tokio::test]
    async fn get_story_requires_cms() {
        let server = demo_server().await;
        let Err(err) = server
            .get_story(Parameters(GetStoryParams {
                slug: "blog/forms".to_string(),
            }))
            .await
        else {
            panic!("get_story should fail without a cms");
        };
        assert!(err.contains("not configured"));
    }

    #[tokio::test]
    async fn get_story_maps_found_missing_and_unsafe_slugs() {
        let router = Router::new().route(
            "/stories/{*slug}",
            get(|Path(slug): Path<String>| async move {
                if slug != "guides/contrast" {
                    return Err(StatusCode::NOT_FOUND);
                }
                Ok(axum::Json(json!({"story": {
                    "uuid": "story-1",
                    "name": "Contrast",
                    "full_slug": "guides/contrast",
                    "content": {"description": "Check your colors"}
                }})))
            }),
        );
        let base_url = serve(router).await;
        let cms = StoryblokClient::new(StoryblokConfig {
            base_url,
            token: "tok".to_string(),
            version: "published".to_string(),
            per_page: 100,
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let server = server_with(SourceLoader::new(None, Some(cms), DemoMode::Auto)).await;
        let Ok(Json(found)) = server.get_story(story_params(" guides/contrast ")).await else {
            panic!("story should be found");
        };
        assert_eq!(found.record.id, "story-1");
        assert_eq!(found.record.url.as_deref(), Some("/guides/contrast"));
        assert_eq!(found.record.source, RecordSource::Cms);

        let Err(missing) = server.get_story(story_params("guides/unknown")).await else {
            panic!("unknown slug should be an error");
        };
        assert!(missing.contains("not found"));

        let Err(unsafe_slug) = server.get_story(story_params("../../admin/spaces")).await else {
            panic!("dot segments should be rejected");
        };
        assert!(unsafe_slug.contains("invalid story slug"));
    }
}
