use std::str::FromStr;

use genie_common::algolia::AlgoliaConfig;
use genie_common::env::{self, Lookup};
use genie_common::error::CommonError;
use genie_common::gemini::GeminiClientConfig;
use genie_common::storyblok::StoryblokConfig;

use crate::error::AppError;

/// When the built-in demo corpus joins the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemoMode {
    /// Only when no external source is configured, or every configured one failed.
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for DemoMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" | "true" | "1" => Ok(Self::Always),
            "never" | "false" | "0" => Ok(Self::Never),
            other => Err(AppError::Config(format!(
                "A11Y_DEMO_CORPUS must be auto, always or never (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiClientConfig,
    /// `None` disables the search index source.
    pub algolia: Option<AlgoliaConfig>,
    /// `None` disables the CMS source and `get_story`.
    pub storyblok: Option<StoryblokConfig>,
    pub demo_mode: DemoMode,
}

impl Config {
    /// Required:
    /// - `GEMINI_API_KEY`
    ///
    /// Optional:
    /// - `ALGOLIA_APP_ID`, `ALGOLIA_SEARCH_KEY`, `ALGOLIA_INDEX` (all or none)
    /// - `STORYBLOK_TOKEN`
    /// - `A11Y_DEMO_CORPUS` (default: "auto")
    ///
    /// See the client config types for the remaining tunables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(&env::process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, AppError> {
        let gemini = GeminiClientConfig::from_lookup(lookup).map_err(config_error)?;
        let algolia = AlgoliaConfig::from_lookup(lookup).map_err(config_error)?;
        let storyblok = StoryblokConfig::from_lookup(lookup);
        let demo_mode = match env::non_empty_var(lookup, "A11Y_DEMO_CORPUS") {
            Some(raw) => raw.parse()?,
            None => DemoMode::default(),
        };

        Ok(Self {
            gemini,
            algolia,
            storyblok,
            demo_mode,
        })
    }

    pub fn has_external_sources(&self) -> bool {
        self.algolia.is_some() || self.storyblok.is_some()
    }
}

fn config_error(err: CommonError) -> AppError {
    match err {
        CommonError::Config(message) => AppError::Config(message),
        other => AppError::Common(other),
    }
}
