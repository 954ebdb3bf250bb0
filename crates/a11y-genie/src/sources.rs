use schemars::JsonSchema;
use serde::Serialize;
use tracing::{info, warn};

use genie_common::algolia::AlgoliaClient;
use genie_common::storyblok::StoryblokClient;

use crate::aggregate::SourceSet;
use crate::cms::record_from_story;
use crate::config::DemoMode;
use crate::demo::demo_corpus;
use crate::search::records_from_hits;

/// Outcome of one source for one load. `None` means the source is not configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SourceReport {
    pub demo: usize,
    pub index: Option<SourceStatus>,
    pub cms: Option<SourceStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Loaded { records: usize },
    Failed,
}

/// Gathers candidate records from the demo corpus, the search index and the CMS.
pub struct SourceLoader {
    index: Option<AlgoliaClient>,
    cms: Option<StoryblokClient>,
    demo_mode: DemoMode,
}

impl SourceLoader {
    pub fn new(
        index: Option<AlgoliaClient>,
        cms: Option<StoryblokClient>,
        demo_mode: DemoMode,
    ) -> Self {
        Self {
            index,
            cms,
            demo_mode,
        }
    }

    pub fn cms(&self) -> Option<&StoryblokClient> {
        self.cms.as_ref()
    }

    /// Fetch the index and CMS concurrently. A failing source contributes no records.
    pub async fn load(&self, query: &str) -> (SourceSet, SourceReport) {
        let index_fut = async {
            match &self.index {
                Some(client) => Some(
                    client
                        .search(query.trim())
                        .await
                        .inspect_err(|e| warn!(error = %e, "search index unavailable"))
                        .map(|hits| records_from_hits(&hits))
                        .ok(),
                ),
                None => None,
            }
        };
        let cms_fut = async {
            match &self.cms {
                Some(client) => Some(
                    client
                        .fetch_stories()
                        .await
                        .inspect_err(|e| warn!(error = %e, "cms unavailable"))
                        .map(|stories| stories.iter().map(record_from_story).collect::<Vec<_>>())
                        .ok(),
                ),
                None => None,
            }
        };
        let (index, cms) = futures::future::join(index_fut, cms_fut).await;

        let configured = index.is_some() as usize + cms.is_some() as usize;
        let failed = matches!(index, Some(None)) as usize + matches!(cms, Some(None)) as usize;
        let include_demo = match self.demo_mode {
            DemoMode::Always => true,
            DemoMode::Never => false,
            DemoMode::Auto => configured == 0 || failed == configured,
        };
        if include_demo && configured > 0 && failed == configured {
            info!("all external sources failed, falling back to demo corpus");
        }

        let mut report = SourceReport {
            demo: 0,
            index: index.as_ref().map(status),
            cms: cms.as_ref().map(status),
        };
        let set = SourceSet {
            demo: if include_demo { demo_corpus() } else { Vec::new() },
            index: index.flatten().unwrap_or_default(),
            cms: cms.flatten().unwrap_or_default(),
        };
        report.demo = set.demo.len();
        if set.is_empty() {
            warn!(demo_mode = ?self.demo_mode, "no candidate records from any source");
        }
        (set, report)
    }
}

fn status<T>(outcome: &Option<Vec<T>>) -> SourceStatus {
    match outcome {
        Some(records) => SourceStatus::Loaded {
            records: records.len(),
        },
        None => SourceStatus::Failed,
    }
}
