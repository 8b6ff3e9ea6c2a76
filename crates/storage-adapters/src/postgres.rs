//! # PostgreSQL adapter
//!
//! Maps the `posts` and `users` tables onto the domain models. Queries are
//! built at runtime (no `query!` macros) so the crate compiles without a
//! live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    NewPost, Post, PostFilter, PostId, PostOrdering, PostRepository, Role, StorageError, User,
    UserId, UserRepository,
};
use sqlx::postgres::{PgPool, PgPoolOptions};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const POST_COLUMNS: &str = "id, title, tag, text, author, user_id, comments_count, \
                            commented_at, stars_count, created_at, updated_at";

// Both nullable binds are checked for NULL first, so an unset filter field
// matches every row.
const FILTER: &str =
    "($1::TEXT IS NULL OR tag = $1) AND ($2::BIGINT IS NULL OR user_id = $2)";

/// Opens a pool against `url`.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, StorageError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(backend)
}

/// Applies the embedded schema migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), StorageError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;
    tracing::info!(count = MIGRATOR.iter().count(), "database migrations applied");
    Ok(())
}

fn backend(err: sqlx::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// Single-row updates must hit exactly one row; `missing` names what was not found.
fn one_row(rows_affected: u64, missing: impl FnOnce() -> String) -> Result<(), StorageError> {
    if rows_affected == 0 {
        return Err(StorageError::Backend(missing()));
    }
    Ok(())
}

fn order_by(ordering: PostOrdering) -> &'static str {
    match ordering {
        PostOrdering::Created => "created_at DESC, id DESC",
        PostOrdering::Recent => "commented_at DESC, id DESC",
        PostOrdering::Hot => "comments_count DESC, commented_at DESC, id DESC",
    }
}

fn count_to_u32(column: &str, value: i32) -> Result<u32, StorageError> {
    u32::try_from(value)
        .map_err(|_| StorageError::Corrupt(format!("negative {column}: {value}")))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    tag: String,
    text: String,
    author: String,
    user_id: i64,
    comments_count: i32,
    commented_at: DateTime<Utc>,
    stars_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = StorageError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: PostId(row.id),
            title: row.title,
            tag: row.tag,
            text: row.text,
            author: row.author,
            user_id: UserId(row.user_id),
            comments_count: count_to_u32("comments_count", row.comments_count)?,
            commented_at: row.commented_at,
            stars_count: count_to_u32("stars_count", row.stars_count)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    role: String,
    last_action_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(StorageError::Corrupt)?;
        Ok(User {
            id: UserId(row.id),
            username: row.username,
            role,
            last_action_at: row.last_action_at,
        })
    }
}

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn count(&self, filter: &PostFilter) -> Result<u64, StorageError> {
        let sql = format!("SELECT COUNT(*) FROM posts WHERE {FILTER}");
        let n: i64 = sqlx::query_scalar(&sql)
            .bind(filter.tag.as_deref())
            .bind(filter.user_id.map(|u| u.0))
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn range(
        &self,
        filter: &PostFilter,
        ordering: PostOrdering,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, StorageError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE {FILTER} ORDER BY {} LIMIT $3 OFFSET $4",
            order_by(ordering)
        );
        let rows: Vec<PostRow> = sqlx::query_as(&sql)
            .bind(filter.tag.as_deref())
            .bind(filter.user_id.map(|u| u.0))
            .bind(to_i64(limit))
            .bind(to_i64(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.into_iter().map(Post::try_from).collect()
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(Post::try_from).transpose()
    }

    async fn insert(&self, post: NewPost) -> Result<Post, StorageError> {
        let sql = format!(
            "INSERT INTO posts (title, tag, text, author, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING {POST_COLUMNS}"
        );
        let row: PostRow = sqlx::query_as(&sql)
            .bind(&post.title)
            .bind(&post.tag)
            .bind(&post.text)
            .bind(&post.author)
            .bind(post.user_id.0)
            .bind(post.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Post::try_from(row)
    }

    async fn update(&self, post: &Post) -> Result<(), StorageError> {
        let done = sqlx::query("UPDATE posts SET text = $1, updated_at = $2 WHERE id = $3")
            .bind(&post.text)
            .bind(post.updated_at)
            .bind(post.id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        one_row(done.rows_affected(), || format!("post {} vanished", post.id))
    }

    async fn delete(&self, id: PostId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, role, last_action_at FROM users WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(User::try_from).transpose()
    }

    async fn save_last_action_at(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StorageError> {
        let done = sqlx::query("UPDATE users SET last_action_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        one_row(done.rows_affected(), || format!("user {id} does not exist"))
    }
}
