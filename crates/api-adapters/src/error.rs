use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::{AppError, Outcome};

use crate::dto::ErrorBody;

/// `AppError` on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let outcome = err.outcome();
        let status =
            StatusCode::from_u16(outcome.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match outcome {
            Outcome::UpstreamFailure => {
                tracing::error!(error = %err, "upstream failure");
                "storage is temporarily unavailable".to_string()
            }
            _ => {
                tracing::debug!(
                    status = status.as_u16(),
                    retryable = outcome.is_retryable(),
                    error = %err,
                    "request rejected"
                );
                err.to_string()
            }
        };

        let mut response = (status, Json(ErrorBody { message })).into_response();
        if let Some(secs) = err.retry_after() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_carries_retry_after() {
        let response = ApiError(AppError::RateLimited {
            action: "creating posts",
            retry_after_secs: 42,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn statuses_follow_the_outcome() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::not_found("post", 1), StatusCode::NOT_FOUND),
            (AppError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (AppError::Unauthenticated("no".into()), StatusCode::UNAUTHORIZED),
            (AppError::Upstream("db".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), status);
            assert!(response.headers().get(header::RETRY_AFTER).is_none());
        }
    }
}
