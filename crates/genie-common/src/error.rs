/// Error types shared by the upstream service clients.
///
/// These cover transport and decoding failures against the search index and the
/// headless CMS. The generative text client has its own richer error type in
/// [`crate::gemini`]. Application-specific errors should be defined in each server
/// crate and wrap `CommonError` via `#[from]`.
use reqwest::StatusCode;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("config error: {0}")]
    Config(String),

    #[error("{service} request failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned invalid JSON: {source}")]
    InvalidJson {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {service} request: {message}")]
    InvalidRequest {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned error: status={status} body={body}")]
    Upstream {
        service: &'static str,
        status: StatusCode,
        body: String,
    },
}

impl CommonError {
    pub(crate) fn request(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Request { service, source }
    }

    pub(crate) async fn upstream(
        service: &'static str,
        resp: reqwest::Response,
        max_body_bytes: usize,
    ) -> Self {
        let status = resp.status();
        let body = read_limited_text(resp, max_body_bytes).await;
        Self::Upstream {
            service,
            status,
            body,
        }
    }
}

/// Decode a successful response body, or turn a non-2xx status into [`CommonError::Upstream`].
pub(crate) async fn decode_json<T: for<'de> serde::Deserialize<'de>>(
    service: &'static str,
    resp: reqwest::Response,
    max_error_body_bytes: usize,
) -> Result<T, CommonError> {
    if !resp.status().is_success() {
        return Err(CommonError::upstream(service, resp, max_error_body_bytes).await);
    }
    let bytes = resp.bytes().await.map_err(CommonError::request(service))?;
    serde_json::from_slice(&bytes).map_err(|source| CommonError::InvalidJson { service, source })
}

pub(crate) async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}
