/// Search-only client for an Algolia index.
///
/// Hits are returned as loose JSON objects; mapping them onto domain records is
/// the caller's concern because index schemas drift between deployments.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::env::{self, Lookup};
use crate::error::{decode_json, CommonError};

const SERVICE: &str = "algolia";

pub type Hit = Map<String, Value>;

#[derive(Clone)]
pub struct AlgoliaConfig {
    pub base_url: String,
    pub app_id: String,
    pub search_key: String,
    pub index_name: String,
    pub hits_per_page: u32,
    pub timeout: Duration,
}

impl std::fmt::Debug for AlgoliaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgoliaConfig")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("search_key", &"<redacted>")
            .field("index_name", &self.index_name)
            .field("hits_per_page", &self.hits_per_page)
            .finish()
    }
}

impl AlgoliaConfig {
    /// `ALGOLIA_APP_ID`, `ALGOLIA_SEARCH_KEY` and `ALGOLIA_INDEX` must be set together.
    /// Returns `Ok(None)` when none of them is set.
    ///
    /// Optional:
    /// - `ALGOLIA_BASE_URL` (default: `https://{app_id}-dsn.algolia.net`)
    /// - `ALGOLIA_HITS_PER_PAGE` (default: 10)
    /// - `ALGOLIA_TIMEOUT_SECS` (default: 10)
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Option<Self>, CommonError> {
        let app_id = env::non_empty_var(lookup, "ALGOLIA_APP_ID");
        let search_key = env::non_empty_var(lookup, "ALGOLIA_SEARCH_KEY");
        let index_name = env::non_empty_var(lookup, "ALGOLIA_INDEX");

        let (app_id, search_key, index_name) = match (app_id, search_key, index_name) {
            (None, None, None) => return Ok(None),
            (Some(a), Some(k), Some(i)) => (a, k, i),
            (a, k, i) => {
                let missing: Vec<&str> = [
                    ("ALGOLIA_APP_ID", a.is_none()),
                    ("ALGOLIA_SEARCH_KEY", k.is_none()),
                    ("ALGOLIA_INDEX", i.is_none()),
                ]
                .into_iter()
                .filter(|(_, missing)| *missing)
                .map(|(name, _)| name)
                .collect();
                return Err(CommonError::Config(format!(
                    "incomplete search index configuration, missing: {}",
                    missing.join(", ")
                )));
            }
        };

        let base_url = env::non_empty_var(lookup, "ALGOLIA_BASE_URL")
            .unwrap_or_else(|| format!("https://{}-dsn.algolia.net", app_id.to_lowercase()));

        Ok(Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id,
            search_key,
            index_name,
            hits_per_page: env::parse_var(lookup, "ALGOLIA_HITS_PER_PAGE", 10),
            timeout: Duration::from_secs(env::parse_var(lookup, "ALGOLIA_TIMEOUT_SECS", 10)),
        }))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    hits_per_page: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    hits: Vec<Hit>,
    nb_hits: Option<u64>,
}

#[derive(Clone)]
pub struct AlgoliaClient {
    config: AlgoliaConfig,
    http: reqwest::Client,
}

impl AlgoliaClient {
    pub fn new(config: AlgoliaConfig) -> Result<Self, CommonError> {
        let http = reqwest::Client::builder()
            .user_agent("a11y-genie")
            .build()
            .map_err(CommonError::request(SERVICE))?;
        Ok(Self { config, http })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Hit>, CommonError> {
        let url = format!(
            "{}/1/indexes/{}/query",
            self.config.base_url, self.config.index_name
        );
        let resp = self
            .http
            .post(&url)
            .header("X-Algolia-Application-Id", &self.config.app_id)
            .header("X-Algolia-API-Key", &self.config.search_key)
            .timeout(self.config.timeout)
            .json(&QueryRequest {
                query,
                hits_per_page: self.config.hits_per_page,
            })
            .send()
            .await
            .map_err(CommonError::request(SERVICE))?;

        let parsed: QueryResponse = decode_json(SERVICE, resp, 8 * 1024).await?;
        debug!(
            index = %self.config.index_name,
            hits = parsed.hits.len(),
            nb_hits = parsed.nb_hits,
            "search index query complete"
        );
        Ok(parsed.hits)
    }
}
