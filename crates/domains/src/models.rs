//! # Domain Models
//!
//! These structs represent the core entities of the board: posts, the users
//! that write them, and the listing parameters the feed understands.
//! Identities are database-assigned 64-bit integers; they only ever grow.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a post. Assigned by the store on insert, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub i64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single post on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    /// Always a member of the configured tag set.
    pub tag: String,
    pub text: String,
    /// Username of the owner at creation time.
    pub author: String,
    pub user_id: UserId,
    /// Maintained by the comment subsystem, read-only here.
    pub comments_count: u32,
    /// Unix epoch when the post has never been commented on.
    pub commented_at: DateTime<Utc>,
    pub stars_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post that has passed validation but has no identity yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub tag: String,
    pub text: String,
    pub author: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    /// Materializes the stored record once the store has assigned an id.
    /// Counters start at zero and `commented_at` at the epoch.
    pub fn into_post(self, id: PostId) -> Post {
        Post {
            id,
            title: self.title,
            tag: self.tag,
            text: self.text,
            author: self.author,
            user_id: self.user_id,
            comments_count: 0,
            commented_at: DateTime::<Utc>::default(),
            stars_count: 0,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Closed set of account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

/// A user as seen by the feed: who they are and when they last mutated
/// anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    /// `None` until the first successful create or edit.
    pub last_action_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Predicate applied to both the count and the range query of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub tag: Option<String>,
    pub user_id: Option<UserId>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        self.tag.as_deref().map_or(true, |tag| post.tag == tag)
            && self.user_id.map_or(true, |id| post.user_id == id)
    }
}

/// Columns a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    CreatedAt,
    CommentedAt,
    CommentsCount,
}

/// A concrete ordering: a primary column and a tie-breaker, both
/// descending. Oldest-first listings go through `PageDirection::Reversed`
/// instead of an ascending variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrdering {
    /// Newest first.
    #[default]
    Created,
    /// Most recently commented first.
    Recent,
    /// Most commented first.
    Hot,
}

impl PostOrdering {
    /// `(primary, tie_break)`, both descending.
    pub fn columns(self) -> (SortColumn, SortColumn) {
        match self {
            PostOrdering::Created => (SortColumn::CreatedAt, SortColumn::Id),
            PostOrdering::Recent => (SortColumn::CommentedAt, SortColumn::Id),
            PostOrdering::Hot => (SortColumn::CommentsCount, SortColumn::CommentedAt),
        }
    }
}

/// Which end of the ordering the page numbers count from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageDirection {
    /// Page 1 holds the first items of the descending ordering.
    #[default]
    Forward,
    /// Page 1 holds the last items of the descending ordering, oldest first.
    Reversed,
}

impl PageDirection {
    /// `"ascending"` selects `Reversed`; every other token is `Forward`.
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("ascending") {
            PageDirection::Reversed
        } else {
            PageDirection::Forward
        }
    }
}

/// One page of a listing plus the size of the filtered set it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(tag: &str, user: i64) -> Post {
        NewPost {
            title: "t".into(),
            tag: tag.into(),
            text: "x".into(),
            author: "a".into(),
            user_id: UserId(user),
            created_at: Utc::now(),
        }
        .into_post(PostId(1))
    }

    #[test]
    fn new_post_starts_with_zeroed_counters() {
        let p = post("general", 3);
        assert_eq!(p.comments_count, 0);
        assert_eq!(p.stars_count, 0);
        assert_eq!(p.commented_at.timestamp(), 0);
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn filter_combines_tag_and_author() {
        let p = post("events", 7);
        assert!(PostFilter::default().matches(&p));
        assert!(PostFilter { tag: Some("events".into()), user_id: Some(UserId(7)) }.matches(&p));
        assert!(!PostFilter { tag: Some("general".into()), user_id: None }.matches(&p));
        assert!(!PostFilter { tag: None, user_id: Some(UserId(8)) }.matches(&p));
    }

    #[test]
    fn direction_token_is_permissive() {
        assert_eq!(PageDirection::from_token("ascending"), PageDirection::Reversed);
        assert_eq!(PageDirection::from_token("ASCENDING"), PageDirection::Reversed);
        assert_eq!(PageDirection::from_token("descending"), PageDirection::Forward);
        assert_eq!(PageDirection::from_token(""), PageDirection::Forward);
    }

    #[test]
    fn role_round_trips_through_its_storage_name() {
        for role in [Role::Member, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("moderator".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
