//! GitLab API error types.

use thiserror::Error;

/// Errors from the raw GitLab client.
///
/// Non-2xx statuses are not errors here: the client hands the status
/// back alongside its (possibly empty) payload and the caller branches
/// on it.
#[derive(Debug, Error)]
pub enum GitLabError {
    #[error("HTTP request error: {0}")]
    Http(String),

    #[error("JSON deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl From<crate::http::HttpError> for GitLabError {
    fn from(err: crate::http::HttpError) -> Self {
        Self::Http(err.to_string())
    }
}
