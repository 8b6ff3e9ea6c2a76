//! # seed
//!
//! Populates (`seed`) or empties (`reset`) the PostgreSQL database named by
//! `POSTBOARD__DATABASE__URL`.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use auth_adapters::{password, JwtAuthenticator};
use chrono::{DateTime, Duration, Utc};
use configs::Settings;
use domains::{Role, UserId};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use storage_adapters::postgres::{self, PgUserRepository};
use tracing::info;

const USERS: &[(&str, &str, Role)] = &[
    ("admin", "admin-password", Role::Admin),
    ("ada", "ada-password", Role::Member),
    ("grace", "grace-password", Role::Member),
];

// (title, tag, text, comments)
const POSTS: &[(&str, &str, &str, i32)] = &[
    ("Welcome to the board", "general", "Read the rules before posting.", 4),
    ("Study group for algorithms", "academic", "Meeting Thursdays in room 204.", 7),
    ("Summer internship leads", "career", "Share what you have heard about.", 2),
    ("Room available near campus", "housing", "Two bedroom, available in June.", 0),
    ("Board game night", "events", "Friday at 7pm in the common room.", 9),
    ("Favourite late night snacks", "offtopic", "Asking for research purposes.", 1),
    ("Lost umbrella", "general", "Blue, left in the library lobby.", 0),
    ("Linear algebra notes", "academic", "Typed notes for weeks 1 to 5.", 3),
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let command = std::env::args().nth(1).unwrap_or_default();
    if !matches!(command.as_str(), "seed" | "reset") {
        bail!("unknown command `{command}`; expected `seed` or `reset`");
    }
    let settings = Settings::load().context("failed to load configuration")?;
    let Some(url) = &settings.database.url else {
        bail!("POSTBOARD__DATABASE__URL must be set");
    };
    let pool = postgres::connect(url.expose_secret(), settings.database.max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    postgres::migrate(&pool).await.context("failed to run migrations")?;

    match command.as_str() {
        "seed" => seed(&pool, &settings).await,
        _ => reset(&pool).await,
    }
}

async fn reset(pool: &PgPool) -> Result<()> {
    sqlx::query("TRUNCATE posts, users RESTART IDENTITY CASCADE")
        .execute(pool)
        .await
        .context("failed to truncate tables")?;
    info!("all posts and users deleted");
    Ok(())
}

async fn seed(pool: &PgPool, settings: &Settings) -> Result<()> {
    let mut tx = pool.begin().await?;
    let mut user_ids = Vec::with_capacity(USERS.len());

    for (username, plain, role) in USERS {
        let hash = password::hash_password(plain).context("failed to hash password")?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) \
             ON CONFLICT (username) DO UPDATE SET password_hash = EXCLUDED.password_hash \
             RETURNING id",
        )
        .bind(*username)
        .bind(&hash)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("failed to insert user {username}"))?;
        user_ids.push((id, *username));
    }

    let now = Utc::now();
    for (i, (title, tag, text, comments)) in POSTS.iter().enumerate() {
        let (user_id, author) = user_ids[i % user_ids.len()];
        let created_at = now - Duration::hours((POSTS.len() - i) as i64);
        let commented_at = if *comments > 0 {
            created_at + Duration::minutes(i64::from(*comments) * 5)
        } else {
            DateTime::<Utc>::UNIX_EPOCH
        };
        sqlx::query(
            "INSERT INTO posts (title, tag, text, author, user_id, comments_count, commented_at, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
        )
        .bind(*title)
        .bind(*tag)
        .bind(*text)
        .bind(author)
        .bind(user_id)
        .bind(*comments)
        .bind(commented_at)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert post `{title}`"))?;
    }
    tx.commit().await?;
    info!(users = user_ids.len(), posts = POSTS.len(), "database seeded");

    let ttl = i64::try_from(settings.auth.token_ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::days(1));
    let auth = JwtAuthenticator::new(
        settings.auth.jwt_secret.expose_secret().as_bytes(),
        ttl,
        Arc::new(PgUserRepository::new(pool.clone())),
    );
    for (id, username) in &user_ids {
        let token = auth.issue_token(UserId(*id), now)?;
        println!("{username:<8} {token}");
    }
    Ok(())
}
