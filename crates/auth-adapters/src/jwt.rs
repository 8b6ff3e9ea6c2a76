//! HS256 bearer tokens.
//!
//! A token carries only the user id (`sub`) and expiry (`exp`). The user
//! itself, role included, is loaded fresh on every request so role changes
//! and deletions take effect immediately.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use domains::{AppError, Authenticator, User, UserId, UserRepository};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::AuthError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    iat: i64,
    exp: i64,
}

pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
    users: Arc<dyn UserRepository>,
}

impl JwtAuthenticator {
    pub fn new(secret: &[u8], token_ttl: Duration, users: Arc<dyn UserRepository>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            token_ttl,
            users,
        }
    }

    /// Signs a token for `user` valid from `now` for the configured TTL.
    pub fn issue_token(&self, user: UserId, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.0,
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;
        Ok(UserId(data.claims.sub))
    }

    async fn resolve(&self, token: &str) -> Result<User, AuthError> {
        let id = self.verify(token)?;
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AuthError::UnknownSubject(id.0))
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, bearer_token: &str) -> Result<User, AppError> {
        self.resolve(bearer_token).await.map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            AppError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::Role;
    use storage_adapters::InMemoryStore;

    const SECRET: &[u8] = b"test-secret";

    fn setup() -> (Arc<InMemoryStore>, JwtAuthenticator, User) {
        let store = Arc::new(InMemoryStore::new());
        let user = store.add_user("ada", Role::Admin);
        let auth = JwtAuthenticator::new(SECRET, Duration::hours(1), store.clone());
        (store, auth, user)
    }

    #[tokio::test]
    async fn issued_token_authenticates_its_user() {
        let (_, auth, user) = setup();
        let token = auth.issue_token(user.id, Utc::now()).unwrap();
        let found = auth.authenticate(&token).await.unwrap();
        assert_eq!(found, user);
        assert!(found.is_admin());
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let (_, auth, user) = setup();
        let token = auth
            .issue_token(user.id, Utc::now() - Duration::hours(3))
            .unwrap();
        assert_eq!(
            auth.authenticate(&token).await,
            Err(AppError::Unauthenticated("token expired".into()))
        );
    }

    #[tokio::test]
    async fn foreign_signature_is_rejected() {
        let (store, auth, user) = setup();
        let other = JwtAuthenticator::new(b"other-secret", Duration::hours(1), store);
        let token = other.issue_token(user.id, Utc::now()).unwrap();
        let err = auth.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn token_for_missing_user_is_rejected() {
        let (_, auth, _) = setup();
        let token = auth.issue_token(UserId(404), Utc::now()).unwrap();
        assert_eq!(
            auth.authenticate(&token).await,
            Err(AppError::Unauthenticated(
                "token subject 404 does not exist".into()
            ))
        );
    }

    #[tokio::test]
    async fn garbage_is_rejected() {
        let (_, auth, _) = setup();
        let err = auth.authenticate("not.a.jwt").await.unwrap_err();
        assert_eq!(err.outcome().status_code(), 401);
    }
}
