use genie_common::error::CommonError;
use genie_common::gemini::GeminiClientError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("text generation failed: {0}")]
    Generation(#[from] GeminiClientError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Common(#[from] CommonError),
}
