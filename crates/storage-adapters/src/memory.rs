//! In-process store backed by `dashmap`.
//!
//! Behaves like the relational adapter from the feed's point of view:
//! monotonically assigned ids, the same orderings (plus `id DESC` as the
//! final tie-break), and offsets past the end yield empty pages.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use domains::{
    NewPost, Post, PostFilter, PostId, PostOrdering, PostRepository, Role, SortColumn,
    StorageError, User, UserId, UserRepository,
};

#[derive(Debug)]
pub struct InMemoryStore {
    posts: DashMap<PostId, Post>,
    users: DashMap<UserId, User>,
    next_post_id: AtomicI64,
    next_user_id: AtomicI64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            posts: DashMap::new(),
            users: DashMap::new(),
            next_post_id: AtomicI64::new(1),
            next_user_id: AtomicI64::new(1),
        }
    }

    /// Registers a user and returns it with its assigned id.
    pub fn add_user(&self, username: &str, role: Role) -> User {
        let id = UserId(self.next_user_id.fetch_add(1, AtomicOrdering::SeqCst));
        let user = User {
            id,
            username: username.to_owned(),
            role,
            last_action_at: None,
        };
        self.users.insert(id, user.clone());
        user
    }

    /// Stands in for the comment subsystem, which owns these counters.
    pub fn record_comments(&self, id: PostId, comments_count: u32, commented_at: DateTime<Utc>) {
        if let Some(mut post) = self.posts.get_mut(&id) {
            post.comments_count = comments_count;
            post.commented_at = commented_at;
        }
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }
}

fn compare_column(column: SortColumn, a: &Post, b: &Post) -> Ordering {
    match column {
        SortColumn::Id => a.id.cmp(&b.id),
        SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        SortColumn::CommentedAt => a.commented_at.cmp(&b.commented_at),
        SortColumn::CommentsCount => a.comments_count.cmp(&b.comments_count),
    }
}

/// Descending on both columns of `ordering`, then on id.
fn compare_desc(ordering: PostOrdering, a: &Post, b: &Post) -> Ordering {
    let (primary, tie_break) = ordering.columns();
    compare_column(primary, b, a)
        .then_with(|| compare_column(tie_break, b, a))
        .then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn count(&self, filter: &PostFilter) -> Result<u64, StorageError> {
        let n = self.posts.iter().filter(|p| filter.matches(p.value())).count();
        Ok(n as u64)
    }

    async fn range(
        &self,
        filter: &PostFilter,
        ordering: PostOrdering,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, StorageError> {
        let mut matching: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| filter.matches(p.value()))
            .map(|p| p.value().clone())
            .collect();
        matching.sort_by(|a, b| compare_desc(ordering, a, b));

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        Ok(self.posts.get(&id).map(|p| p.value().clone()))
    }

    async fn insert(&self, post: NewPost) -> Result<Post, StorageError> {
        let id = PostId(self.next_post_id.fetch_add(1, AtomicOrdering::SeqCst));
        let post = post.into_post(id);
        self.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: &Post) -> Result<(), StorageError> {
        match self.posts.get_mut(&post.id) {
            Some(mut stored) => {
                stored.text = post.text.clone();
                stored.updated_at = post.updated_at;
                Ok(())
            }
            None => Err(StorageError::Backend(format!("post {} vanished", post.id))),
        }
    }

    async fn delete(&self, id: PostId) -> Result<(), StorageError> {
        self.posts.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn save_last_action_at(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StorageError> {
        match self.users.get_mut(&id) {
            Some(mut user) => {
                user.last_action_at = Some(at);
                Ok(())
            }
            None => Err(StorageError::Backend(format!("user {id} does not exist"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_post(user: &User, tag: &str, created_at: DateTime<Utc>) -> NewPost {
        NewPost {
            title: "title".into(),
            tag: tag.into(),
            text: "text".into(),
            author: user.username.clone(),
            user_id: user.id,
            created_at,
        }
    }

    async fn seeded() -> (InMemoryStore, User, User) {
        let store = InMemoryStore::new();
        let ada = store.add_user("ada", Role::Member);
        let bob = store.add_user("bob", Role::Admin);
        let t0 = Utc::now() - Duration::hours(1);
        for i in 0..6 {
            let owner = if i % 2 == 0 { &ada } else { &bob };
            let tag = if i < 3 { "general" } else { "events" };
            store
                .insert(new_post(owner, tag, t0 + Duration::minutes(i)))
                .await
                .unwrap();
        }
        (store, ada, bob)
    }

    fn ids(posts: &[Post]) -> Vec<i64> {
        posts.iter().map(|p| p.id.0).collect()
    }

    #[tokio::test]
    async fn ids_are_monotonic_and_never_reused() {
        let (store, ada, _) = seeded().await;
        store.delete(PostId(6)).await.unwrap();
        let post = store
            .insert(new_post(&ada, "general", Utc::now()))
            .await
            .unwrap();
        assert_eq!(post.id, PostId(7));
    }

    #[tokio::test]
    async fn count_and_range_honour_the_filter() {
        let (store, ada, _) = seeded().await;
        let filter = PostFilter {
            tag: Some("general".into()),
            user_id: Some(ada.id),
        };
        assert_eq!(store.count(&filter).await.unwrap(), 2);
        let page = store
            .range(&filter, PostOrdering::Created, 10, 0)
            .await
            .unwrap();
        assert_eq!(ids(&page), [3, 1]);
    }

    #[tokio::test]
    async fn range_windows_the_descending_ordering() {
        let (store, _, _) = seeded().await;
        let all = PostFilter::default();
        let page = store.range(&all, PostOrdering::Created, 2, 1).await.unwrap();
        assert_eq!(ids(&page), [5, 4]);
        let page = store.range(&all, PostOrdering::Created, 10, 6).await.unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn hot_and_recent_follow_the_comment_counters() {
        let (store, _, _) = seeded().await;
        let t = Utc::now();
        store.record_comments(PostId(2), 9, t - Duration::minutes(5));
        store.record_comments(PostId(4), 9, t - Duration::minutes(1));
        store.record_comments(PostId(5), 3, t);

        let all = PostFilter::default();
        let hot = store.range(&all, PostOrdering::Hot, 3, 0).await.unwrap();
        assert_eq!(ids(&hot), [4, 2, 5]);

        let recent = store.range(&all, PostOrdering::Recent, 4, 0).await.unwrap();
        // Uncommented posts share the epoch and fall back to id order.
        assert_eq!(ids(&recent), [5, 4, 2, 6]);
    }

    #[tokio::test]
    async fn update_touches_only_text_and_timestamp() {
        let (store, _, _) = seeded().await;
        let mut post = PostRepository::find_by_id(&store, PostId(1)).await.unwrap().unwrap();
        post.text = "edited".into();
        post.title = "ignored".into();
        post.updated_at = Utc::now();
        store.update(&post).await.unwrap();

        let stored = PostRepository::find_by_id(&store, PostId(1)).await.unwrap().unwrap();
        assert_eq!(stored.text, "edited");
        assert_eq!(stored.title, "title");
        assert_eq!(stored.updated_at, post.updated_at);
    }

    #[tokio::test]
    async fn last_action_is_recorded_per_user() {
        let (store, ada, bob) = seeded().await;
        let at = Utc::now();
        store.save_last_action_at(ada.id, at).await.unwrap();
        let ada = UserRepository::find_by_id(&store, ada.id).await.unwrap().unwrap();
        let bob = UserRepository::find_by_id(&store, bob.id).await.unwrap().unwrap();
        assert_eq!(ada.last_action_at, Some(at));
        assert_eq!(bob.last_action_at, None);
        assert!(store.save_last_action_at(UserId(77), at).await.is_err());
    }
}
