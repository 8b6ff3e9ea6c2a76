//! JSON request and response bodies. Field names are camelCase and
//! timestamps are unix seconds.

use chrono::{DateTime, Utc};
use domains::{PageDirection, Post, PostPage, UserId};
use serde::{Deserialize, Serialize};
use services::{CreatePostInput, ListPostsQuery};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub tag: String,
    pub text: String,
    pub author: String,
    pub user_id: i64,
    pub comments_count: u32,
    /// Zero while the post has no comments.
    pub commented_at: i64,
    pub stars_count: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

fn unix(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.0,
            title: post.title,
            tag: post.tag,
            text: post.text,
            author: post.author,
            user_id: post.user_id.0,
            comments_count: post.comments_count,
            commented_at: unix(post.commented_at),
            stars_count: post.stars_count,
            created_at: unix(post.created_at),
            updated_at: unix(post.updated_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub posts_count: u64,
}

impl From<PostPage> for PostListResponse {
    fn from(page: PostPage) -> Self {
        Self {
            posts: page.posts.into_iter().map(PostResponse::from).collect(),
            posts_count: page.total_count,
        }
    }
}

/// Query string of `GET /posts`. Every parameter is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
    pub sort: Option<String>,
    /// `ascending` requests the reversed page.
    pub order: Option<String>,
    /// `0` means no author filter.
    pub user_id: Option<i64>,
    pub tag: Option<String>,
}

impl From<ListParams> for ListPostsQuery {
    fn from(params: ListParams) -> Self {
        let defaults = ListPostsQuery::default();
        Self {
            page_size: params.per_page.unwrap_or(defaults.page_size),
            page_number: params.page.unwrap_or(defaults.page_number),
            sort: params.sort.unwrap_or_default(),
            direction: params
                .order
                .as_deref()
                .map(PageDirection::from_token)
                .unwrap_or_default(),
            tag: params.tag,
            user_id: params.user_id.filter(|id| *id != 0).map(UserId),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub tag: String,
    pub text: String,
}

impl From<CreatePostRequest> for CreatePostInput {
    fn from(req: CreatePostRequest) -> Self {
        Self {
            title: req.title,
            tag: req.tag,
            text: req.text,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EditTextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}
