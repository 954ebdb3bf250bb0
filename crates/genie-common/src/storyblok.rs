/// Storyblok Content Delivery API client (read-only).
use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::env::{self, Lookup};
use crate::error::{decode_json, CommonError};

const SERVICE: &str = "storyblok";
const DEFAULT_BASE_URL: &str = "https://api.storyblok.com/v2/cdn";

#[derive(Clone)]
pub struct StoryblokConfig {
    pub base_url: String,
    pub token: String,
    /// "published" or "draft".
    pub version: String,
    pub per_page: u32,
    pub timeout: Duration,
}

impl std::fmt::Debug for StoryblokConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryblokConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("version", &self.version)
            .field("per_page", &self.per_page)
            .finish()
    }
}

impl StoryblokConfig {
    /// Returns `None` when `STORYBLOK_TOKEN` is unset.
    ///
    /// Optional:
    /// - `STORYBLOK_BASE_URL` (default: "https://api.storyblok.com/v2/cdn")
    /// - `STORYBLOK_VERSION` (default: "published")
    /// - `STORYBLOK_PER_PAGE` (default: 100)
    /// - `STORYBLOK_TIMEOUT_SECS` (default: 10)
    pub fn from_lookup(lookup: Lookup<'_>) -> Option<Self> {
        let token = env::non_empty_var(lookup, "STORYBLOK_TOKEN")?;
        let base_url = env::non_empty_var(lookup, "STORYBLOK_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            version: env::non_empty_var(lookup, "STORYBLOK_VERSION")
                .unwrap_or_else(|| "published".to_string()),
            per_page: env::parse_var(lookup, "STORYBLOK_PER_PAGE", 100),
            timeout: Duration::from_secs(env::parse_var(lookup, "STORYBLOK_TIMEOUT_SECS", 10)),
        })
    }
}

/// A story as delivered by the CDN API. `content` is left untyped: its shape
/// depends on the space's component schema.
#[derive(Debug, Clone, Deserialize)]
pub struct Story {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub full_slug: String,
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Deserialize)]
struct StoriesResponse {
    #[serde(default)]
    stories: Vec<Story>,
}

#[derive(Debug, Deserialize)]
struct StoryResponse {
    story: Story,
}

#[derive(Clone)]
pub struct StoryblokClient {
    config: StoryblokConfig,
    http: reqwest::Client,
}

impl StoryblokClient {
    pub fn new(config: StoryblokConfig) -> Result<Self, CommonError> {
        let http = reqwest::Client::builder()
            .user_agent("a11y-genie")
            .build()
            .map_err(CommonError::request(SERVICE))?;
        Ok(Self { config, http })
    }

    /// Fetch the first page of published stories.
    pub async fn fetch_stories(&self) -> Result<Vec<Story>, CommonError> {
        let url = format!("{}/stories", self.config.base_url);
        let per_page = self.config.per_page.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("token", self.config.token.as_str()),
                ("version", self.config.version.as_str()),
                ("per_page", per_page.as_str()),
            ])
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(CommonError::request(SERVICE))?;

        let parsed: StoriesResponse = decode_json(SERVICE, resp, 8 * 1024).await?;
        info!(stories = parsed.stories.len(), "fetched stories from cms");
        Ok(parsed.stories)
    }

    /// Fetch one story by its full slug. A 404 is reported as `Ok(None)`.
    pub async fn fetch_story(&self, slug: &str) -> Result<Option<Story>, CommonError> {
        let slug = slug.trim().trim_matches('/');
        let url = self.story_url(slug)?;
        let resp = self
            .http
            .get(url)
            .query(&[
                ("token", self.config.token.as_str()),
                ("version", self.config.version.as_str()),
            ])
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(CommonError::request(SERVICE))?;

        if resp.status() == StatusCode::NOT_FOUND {
            debug!(slug, "story not found");
            return Ok(None);
        }
        let parsed: StoryResponse = decode_json(SERVICE, resp, 8 * 1024).await?;
        Ok(Some(parsed.story))
    }

    /// `{base}/stories/{slug}` with every slug segment percent-encoded.
    /// Empty, `.` and `..` segments are rejected.
    fn story_url(&self, slug: &str) -> Result<Url, CommonError> {
        let segments: Vec<&str> = slug.split('/').collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == "..")
        {
            return Err(CommonError::InvalidRequest {
                service: SERVICE,
                message: format!("invalid story slug '{slug}'"),
            });
        }

        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| CommonError::Config(format!("invalid STORYBLOK_BASE_URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| CommonError::Config("STORYBLOK_BASE_URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("stories")
            .extend(segments);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use axum::extract::{Path, Query, RawQuery};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: String) -> StoryblokClient {
        let lookup = move |name: &str| match name {
            "STORYBLOK_TOKEN" => Some("tok".to_string()),
            "STORYBLOK_BASE_URL" => Some(base_url.clone()),
            _ => None,
        };
        StoryblokClient::new(StoryblokConfig::from_lookup(&lookup).unwrap()).unwrap()
    }

    fn story_json(slug: &str) -> Value {
        json!({
            "id": 1,
            "uuid": format!("uuid-{slug}"),
            "name": "Guide",
            "slug": slug,
            "full_slug": format!("docs/{slug}"),
            "content": {"description": "A guide", "component": "page"}
        })
    }

    #[test]
    fn token_is_required_for_config() {
        let lookup = |_: &str| -> Option<String> { None };
        assert!(StoryblokConfig::from_lookup(&lookup).is_none());
    }

    #[tokio::test]
    async fn fetch_stories_passes_token_and_paging() {
        let router = Router::new().route(
            "/stories",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("token").map(String::as_str), Some("tok"));
                assert_eq!(params.get("version").map(String::as_str), Some("published"));
                assert_eq!(params.get("per_page").map(String::as_str), Some("100"));
                Json(json!({"stories": [story_json("a"), story_json("b")]}))
            }),
        );
        let client = client_for(serve(router).await);

        let stories = client.fetch_stories().await.unwrap();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[1].full_slug, "docs/b");
        assert_eq!(stories[0].content["description"], "A guide");
    }

    #[tokio::test]
    async fn fetch_story_maps_not_found_to_none() {
        let router = Router::new().route(
            "/stories/{*slug}",
            get(|Path(slug): Path<String>| async move {
                if slug == "docs/present" {
                    Ok(Json(json!({"story": story_json("present")})))
                } else {
                    Err(axum::http::StatusCode::NOT_FOUND)
                }
            }),
        );
        let client = client_for(serve(router).await);

        let found = client.fetch_story("/docs/present").await.unwrap();
        assert_eq!(found.map(|s| s.uuid), Some("uuid-present".to_string()));
        assert!(client.fetch_story("docs/missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_story_keeps_slug_inside_stories_path() {
        let router = Router::new().route(
            "/stories/{*slug}",
            get(|Path(slug): Path<String>, RawQuery(query): RawQuery| async move {
                Json(json!({"story": {
                    "uuid": slug,
                    "name": query.unwrap_or_default(),
                    "full_slug": "docs/a"
                }}))
            }),
        );
        let client = client_for(serve(router).await);

        let story = client
            .fetch_story("docs/a?version=draft#x")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(story.uuid, "docs/a?version=draft#x");
        assert_eq!(story.name, "token=tok&version=published");
    }

    #[tokio::test]
    async fn fetch_story_rejects_dot_and_empty_segments() {
        let client = client_for("http://127.0.0.1:9".to_string());
        for slug in ["../../admin/spaces", "docs/./a", "docs/..", "docs//a", "", "/"] {
            let err = client.fetch_story(slug).await.unwrap_err();
            assert!(
                matches!(err, CommonError::InvalidRequest { .. }),
                "slug {slug:?}: {err}"
            );
        }
    }
}
