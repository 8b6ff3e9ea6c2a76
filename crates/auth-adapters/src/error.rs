use domains::{AppError, StorageError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token subject {0} does not exist")]
    UnknownSubject(i64),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Storage(e) => e.into(),
            AuthError::Hash(e) => AppError::Upstream(e),
            other => AppError::Unauthenticated(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_problems_are_unauthenticated_and_storage_is_upstream() {
        let err: AppError = AuthError::Expired.into();
        assert_eq!(err, AppError::Unauthenticated("token expired".into()));

        let err: AppError = AuthError::UnknownSubject(4).into();
        assert_eq!(err.outcome().status_code(), 401);

        let err: AppError = AuthError::Storage(StorageError::Backend("down".into())).into();
        assert_eq!(err.outcome().status_code(), 502);
    }
}
