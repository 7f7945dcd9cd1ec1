//! Error types for the feed engine.
//!
//! Every async entry point resolves to `Result<T, FeedError>`; nothing in
//! the engine panics or throws past its caller.

use crate::models::Post;
use thiserror::Error;

/// Result type alias for feed-engine operations
pub type Result<T> = std::result::Result<T, FeedError>;

/// Feed engine error taxonomy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Transport failed (connection refused, DNS, 5xx, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Action needs an authenticated viewer; no network call was issued
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// Input rejected before dispatch
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced post is not known to the server or the local window
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server state disagreed with an optimistic assumption.
    ///
    /// Reserved for `FeedService` implementations; the like coordinator
    /// auto-corrects disagreements itself and reports them through
    /// `ToggleOutcome::Applied { corrected: true }` instead.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The post mutation succeeded but some attachment uploads did not.
    /// The carried post is the saved one, already reflected in the store.
    #[error("{} media upload(s) failed after the post was saved", .failed.len())]
    PartialMediaFailure { post: Box<Post>, failed: Vec<String> },
}

impl FeedError {
    /// Whether re-issuing the identical request is a reasonable recovery
    pub fn is_retryable(&self) -> bool {
        matches!(self, FeedError::Network(_) | FeedError::Timeout(_))
    }

    /// Whether the underlying mutation still took effect
    pub fn is_partial(&self) -> bool {
        matches!(self, FeedError::PartialMediaFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_covers_transport_failures_only() {
        assert!(FeedError::Network("connection reset".into()).is_retryable());
        assert!(FeedError::Timeout("deadline exceeded".into()).is_retryable());
        assert!(!FeedError::AuthRequired("sign in".into()).is_retryable());
        assert!(!FeedError::Validation("empty content".into()).is_retryable());
        assert!(!FeedError::Conflict("like state drifted".into()).is_retryable());
    }

    #[test]
    fn partial_failure_message_counts_failed_files() {
        let post = crate::models::Post::default();
        let err = FeedError::PartialMediaFailure {
            post: Box::new(post),
            failed: vec!["a.jpg".into(), "b.mp4".into()],
        };
        assert!(err.to_string().contains("2 media upload(s) failed"));
        assert!(err.is_partial());
    }
}
