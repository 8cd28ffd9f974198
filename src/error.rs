use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// A required field is missing or has the wrong type. `row` is the
    /// position inside the page when the failure is row-specific.
    #[error(
        "schema violation{}: {reason}",
        .row.map(|r| format!(" at row {r}")).unwrap_or_default()
    )]
    SchemaViolation { row: Option<usize>, reason: String },
    #[error("malformed timestamp in `{field}`: {value:?}")]
    MalformedTimestamp { field: &'static str, value: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend error {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0} returned no row")]
    NotFound(&'static str),
    #[error("mock gateway response queue is empty")]
    MockQueueEmpty,
}

impl FeedError {
    pub(crate) fn schema(row: Option<usize>, reason: impl Into<String>) -> Self {
        FeedError::SchemaViolation { row, reason: reason.into() }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Transport(_) | FeedError::Timeout(_) => true,
            FeedError::Backend { status, .. } => *status >= 500,
            FeedError::SchemaViolation { .. }
            | FeedError::MalformedTimestamp { .. }
            | FeedError::NotFound(_)
            | FeedError::MockQueueEmpty => false,
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Transport("request timed out".to_string())
        } else {
            FeedError::Transport(err.to_string())
        }
    }
}
