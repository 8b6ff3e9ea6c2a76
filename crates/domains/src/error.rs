//! # AppError
//!
//! Centralized error handling for the board.
//! Every failure the feed can produce is one of these variants, and each
//! variant maps onto exactly one transport-level `Outcome`.

use thiserror::Error;

/// The primary error type for all feed operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Malformed or missing input, rejected before touching persistence.
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced post or user does not exist.
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// The authorization gate denied the request.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The cooldown gate denied the request. Retry after the given delay.
    #[error("{action} too frequently, try again in {retry_after_secs}s")]
    RateLimited {
        action: &'static str,
        retry_after_secs: u64,
    },

    /// No valid credentials accompanied the request.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Persistence read or write failed. Never retried here.
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Classifies the error for the routing layer.
    pub fn outcome(&self) -> Outcome {
        match self {
            AppError::Validation(_) => Outcome::BadRequest,
            AppError::NotFound { .. } => Outcome::NotFound,
            AppError::Forbidden(_) => Outcome::Forbidden,
            AppError::RateLimited { .. } => Outcome::RateLimited,
            AppError::Unauthenticated(_) => Outcome::Unauthenticated,
            AppError::Upstream(_) => Outcome::UpstreamFailure,
        }
    }

    /// Seconds the caller should wait before retrying, when meaningful.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            AppError::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

/// HTTP-status-shaped classification of a failed feed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    BadRequest,
    Unauthenticated,
    Forbidden,
    NotFound,
    RateLimited,
    UpstreamFailure,
}

impl Outcome {
    pub fn status_code(self) -> u16 {
        match self {
            Outcome::BadRequest => 400,
            Outcome::Unauthenticated => 401,
            Outcome::Forbidden => 403,
            Outcome::NotFound => 404,
            Outcome::RateLimited => 429,
            Outcome::UpstreamFailure => 502,
        }
    }

    /// Whether the same request may succeed later without changes.
    pub fn is_retryable(self) -> bool {
        matches!(self, Outcome::RateLimited | Outcome::UpstreamFailure)
    }
}

/// Failure reported by a persistence adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored row could not be mapped back to a domain model.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

/// A specialized Result type for feed logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_distinct_outcome() {
        let cases = [
            (AppError::Validation("x".into()), 400),
            (AppError::not_found("post", 3), 404),
            (AppError::Forbidden("x".into()), 403),
            (
                AppError::RateLimited {
                    action: "creating posts",
                    retry_after_secs: 4,
                },
                429,
            ),
            (AppError::Unauthenticated("x".into()), 401),
            (AppError::Upstream("x".into()), 502),
        ];
        for (err, status) in cases {
            assert_eq!(err.outcome().status_code(), status, "{err}");
        }
    }

    #[test]
    fn only_rate_limits_and_upstream_failures_are_retryable() {
        assert!(Outcome::RateLimited.is_retryable());
        assert!(Outcome::UpstreamFailure.is_retryable());
        assert!(!Outcome::Forbidden.is_retryable());
        assert!(!Outcome::BadRequest.is_retryable());
    }

    #[test]
    fn rate_limit_message_carries_the_delay() {
        let err = AppError::RateLimited {
            action: "updating posts",
            retry_after_secs: 12,
        };
        assert_eq!(err.retry_after(), Some(12));
        assert_eq!(
            err.to_string(),
            "updating posts too frequently, try again in 12s"
        );
    }

    #[test]
    fn storage_errors_surface_as_upstream() {
        let err: AppError = StorageError::Backend("connection reset".into()).into();
        assert_eq!(err.outcome(), Outcome::UpstreamFailure);
        assert!(err.outcome().is_retryable());
    }
}
