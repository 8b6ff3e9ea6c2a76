//! Fixtures shared by the integration suites: a feed wired to the
//! in-memory store and a JWT authenticator over the same users.

use std::sync::Arc;

use auth_adapters::JwtAuthenticator;
use chrono::{DateTime, Duration, TimeZone, Utc};
use domains::{NewPost, Post, PostRepository, Role, User, UserRepository};
use services::{FeedConfig, FeedService};
use storage_adapters::InMemoryStore;

pub const SECRET: &[u8] = b"integration-secret";

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub feed: Arc<FeedService>,
    pub auth: Arc<JwtAuthenticator>,
}

impl Harness {
    /// Default feed settings with the cooldown disabled.
    pub fn new() -> Self {
        Self::with_config(FeedConfig {
            post_cooldown: Duration::zero(),
            ..FeedConfig::default()
        })
    }

    pub fn with_config(config: FeedConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let feed = Arc::new(FeedService::new(store.clone(), store.clone(), &config));
        let auth = Arc::new(JwtAuthenticator::new(
            SECRET,
            Duration::hours(1),
            store.clone(),
        ));
        Self { store, feed, auth }
    }

    pub fn user(&self, username: &str, role: Role) -> User {
        self.store.add_user(username, role)
    }

    /// The stored copy of `user`, including its latest action time.
    pub async fn reload(&self, user: &User) -> User {
        UserRepository::find_by_id(self.store.as_ref(), user.id)
            .await
            .unwrap()
            .unwrap()
    }

    pub fn token(&self, user: &User) -> String {
        self.auth.issue_token(user.id, Utc::now()).unwrap()
    }

    /// Inserts `count` posts by `author` directly, one minute apart, so the
    /// creation order is also the id order.
    pub async fn seed_posts(&self, author: &User, tag: &str, count: usize) -> Vec<Post> {
        let mut posts = Vec::with_capacity(count);
        for _ in 0..count {
            let n = self.store.post_count() as i64;
            let post = self
                .store
                .insert(NewPost {
                    title: format!("post {}", n + 1),
                    tag: tag.to_owned(),
                    text: "body".to_owned(),
                    author: author.username.clone(),
                    user_id: author.id,
                    created_at: base_time() + Duration::minutes(n),
                })
                .await
                .unwrap();
            posts.push(post);
        }
        posts
    }

    #[cfg(feature = "web-axum")]
    pub fn state(&self) -> api_adapters::AppState {
        api_adapters::AppState {
            feed: self.feed.clone(),
            auth: self.auth.clone(),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn ids(posts: &[Post]) -> Vec<i64> {
    posts.iter().map(|p| p.id.0).collect()
}
