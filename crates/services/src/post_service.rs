//! # FeedService
//!
//! Coordinates listing and mutation of posts. Listing composes the tag
//! filter, the sort policy and the pagination planner; every mutation runs
//! through the cooldown gate (create/edit) and the authorization gate
//! (edit/delete) before anything is written.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{
    AppError, NewPost, PageDirection, Post, PostFilter, PostId, PostPage, PostRepository, Result,
    User, UserId, UserRepository,
};
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::content::ContentLimits;
use crate::feed::{sort, PageRequest, PaginationPlanner, TagFilter};
use crate::gates::{authorization, CooldownDecision, CooldownGate};

/// Parameters of a listing request, as bound by the routing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPostsQuery {
    pub page_size: u32,
    pub page_number: u32,
    /// Sort token; see [`sort::resolve`].
    pub sort: String,
    pub direction: PageDirection,
    pub tag: Option<String>,
    /// Restrict the listing to one author.
    pub user_id: Option<UserId>,
}

impl Default for ListPostsQuery {
    fn default() -> Self {
        Self {
            page_size: 10,
            page_number: 1,
            sort: String::new(),
            direction: PageDirection::Forward,
            tag: None,
            user_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePostInput {
    pub title: String,
    pub tag: String,
    pub text: String,
}

pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    tags: TagFilter,
    planner: PaginationPlanner,
    cooldown: CooldownGate,
    limits: ContentLimits,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        config: &FeedConfig,
    ) -> Self {
        Self {
            posts,
            users,
            tags: TagFilter::new(config.valid_tags.iter().cloned()),
            planner: PaginationPlanner::new(config.max_page_size),
            cooldown: CooldownGate::new(config.post_cooldown),
            limits: ContentLimits {
                max_title_chars: config.max_title_chars,
                max_text_chars: config.max_text_chars,
            },
        }
    }

    pub fn tags(&self) -> &TagFilter {
        &self.tags
    }

    /// One page of posts plus the size of the filtered set.
    ///
    /// A page past the end comes back empty with the real total, so callers
    /// can tell "no more results" from a failure.
    pub async fn list_posts(&self, query: ListPostsQuery) -> Result<PostPage> {
        let request = PageRequest::new(query.page_size, query.page_number, query.direction)?;

        if let Some(user_id) = query.user_id {
            self.find_user(user_id).await?;
        }

        let filter = PostFilter {
            tag: self.tags.apply(query.tag.as_deref()),
            user_id: query.user_id,
        };
        let ordering = sort::resolve(&query.sort);
        let total_count = self.posts.count(&filter).await?;

        let window = match self.planner.plan(&request, total_count) {
            Some(window) if window.limit > 0 && window.offset < total_count => window,
            _ => {
                debug!(
                    page = request.page_number(),
                    total_count, "no rows to fetch for requested page"
                );
                return Ok(PostPage {
                    posts: Vec::new(),
                    total_count,
                });
            }
        };

        let rows = self
            .posts
            .range(&filter, ordering, window.limit, window.offset)
            .await?;
        let expected = window.limit.min(total_count - window.offset);
        if rows.len() as u64 != expected {
            debug!(
                expected,
                fetched = rows.len(),
                "feed changed between count and fetch"
            );
        }

        Ok(PostPage {
            posts: window.arrange(rows),
            total_count,
        })
    }

    pub async fn get_post(&self, id: PostId) -> Result<Post> {
        self.find_post(id).await
    }

    pub async fn create_post(&self, requester: &User, input: CreatePostInput) -> Result<Post> {
        let now = Utc::now();
        self.ensure_cooled_down(requester, now, "creating posts")?;

        let title = self.limits.title(&input.title)?;
        let text = self.limits.text(&input.text)?;
        if !self.tags.is_valid(&input.tag) {
            return Err(AppError::Validation(format!(
                "unknown tag `{}` for post",
                input.tag
            )));
        }

        let post = self
            .posts
            .insert(NewPost {
                title,
                tag: input.tag,
                text,
                author: requester.username.clone(),
                user_id: requester.id,
                created_at: now,
            })
            .await?;

        self.record_action(requester.id, now).await;
        info!(user_id = %requester.id, post_id = %post.id, tag = %post.tag, "post created");
        Ok(post)
    }

    /// Replaces the text of a post owned by `requester`.
    pub async fn edit_post(&self, requester: &User, id: PostId, text: &str) -> Result<Post> {
        let now = Utc::now();
        self.ensure_cooled_down(requester, now, "updating posts")?;
        let text = self.limits.text(text)?;

        let mut post = self.find_post(id).await?;
        authorization::authorize_edit(requester, &post).inspect_err(|_| {
            debug!(user_id = %requester.id, post_id = %id, "edit denied");
        })?;

        post.text = text;
        post.updated_at = now;
        self.posts.update(&post).await?;

        self.record_action(requester.id, now).await;
        info!(user_id = %requester.id, post_id = %post.id, "post text updated");
        Ok(post)
    }

    /// Deletes a post owned by `requester`, or any post when `requester`
    /// is an admin. Returns the deleted record. Not cooldown-gated.
    pub async fn delete_post(&self, requester: &User, id: PostId) -> Result<Post> {
        let post = self.find_post(id).await?;
        authorization::authorize_delete(requester, &post).inspect_err(|_| {
            debug!(user_id = %requester.id, post_id = %id, "delete denied");
        })?;

        self.posts.delete(id).await?;
        info!(
            user_id = %requester.id,
            post_id = %id,
            as_admin = requester.id != post.user_id,
            "post deleted"
        );
        Ok(post)
    }

    fn ensure_cooled_down(
        &self,
        requester: &User,
        now: DateTime<Utc>,
        action: &'static str,
    ) -> Result<()> {
        match self.cooldown.check_user(requester, now) {
            CooldownDecision::Allowed => Ok(()),
            CooldownDecision::Wait { seconds_remaining } => {
                debug!(user_id = %requester.id, seconds_remaining, action, "cooldown active");
                Err(AppError::RateLimited {
                    action,
                    retry_after_secs: seconds_remaining,
                })
            }
        }
    }

    /// The write it follows has already committed, so a failure here is
    /// logged rather than reported; the user merely skips one cooldown.
    async fn record_action(&self, user_id: UserId, at: DateTime<Utc>) {
        if let Err(e) = self.users.save_last_action_at(user_id, at).await {
            warn!(user_id = %user_id, error = %e, "failed to record last action time");
        }
    }

    async fn find_post(&self, id: PostId) -> Result<Post> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("post", id))
    }

    async fn find_user(&self, id: UserId) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("user", id))
    }
}
