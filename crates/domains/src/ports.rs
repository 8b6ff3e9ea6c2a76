//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, StorageError};
use crate::models::{NewPost, Post, PostFilter, PostId, PostOrdering, User, UserId};

/// Data persistence contract for posts.
///
/// `range` must apply `ordering` exactly as given (both columns
/// descending) and must accept any `offset`, returning an empty vector when
/// it lies past the end of the filtered set.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn count(&self, filter: &PostFilter) -> Result<u64, StorageError>;

    async fn range(
        &self,
        filter: &PostFilter,
        ordering: PostOrdering,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, StorageError>;

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, StorageError>;

    /// Assigns the next id and returns the stored record.
    async fn insert(&self, post: NewPost) -> Result<Post, StorageError>;

    /// Persists the mutable fields (`text`, `updated_at`) of an existing post.
    async fn update(&self, post: &Post) -> Result<(), StorageError>;

    async fn delete(&self, id: PostId) -> Result<(), StorageError>;
}

/// The slice of user persistence the feed needs.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Records the time of the user's latest successful mutation.
    async fn save_last_action_at(&self, id: UserId, at: DateTime<Utc>)
        -> Result<(), StorageError>;
}

/// Identity contract: turns request credentials into a user.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Fails with `AppError::Unauthenticated` for missing, malformed,
    /// expired or orphaned credentials.
    async fn authenticate(&self, bearer_token: &str) -> Result<User, AppError>;
}
