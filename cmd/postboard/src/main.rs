//! # postboard
//!
//! Assembles the feed from the adapters selected at compile time and serves
//! it over HTTP.

#[cfg(not(all(feature = "web-axum", feature = "auth-jwt")))]
compile_error!("the postboard server needs both `web-axum` and `auth-jwt`");

use std::sync::Arc;

use anyhow::{Context, Result};
use api_adapters::AppState;
use auth_adapters::JwtAuthenticator;
use chrono::{Duration, Utc};
use configs::{DatabaseSettings, FeedSettings, LogFormat, LogSettings, Settings};
use domains::{PostRepository, Role, UserRepository};
use secrecy::ExposeSecret;
use services::{FeedConfig, FeedService};
use storage_adapters::InMemoryStore;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(feature = "db-postgres")]
use storage_adapters::postgres::{self, PgPostRepository, PgUserRepository};

struct Backend {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    /// Set when running without a database.
    memory: Option<Arc<InMemoryStore>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(&settings.log);

    info!(addr = %settings.server.bind_addr(), "starting postboard");

    let backend = backend(&settings.database).await?;
    let feed_config = feed_config(&settings.feed)?;
    let token_ttl = seconds("auth.token_ttl_secs", settings.auth.token_ttl_secs)?;

    let auth = Arc::new(JwtAuthenticator::new(
        settings.auth.jwt_secret.expose_secret().as_bytes(),
        token_ttl,
        backend.users.clone(),
    ));

    if let Some(store) = &backend.memory {
        let admin = store.add_user("demo", Role::Admin);
        let token = auth
            .issue_token(admin.id, Utc::now())
            .context("failed to issue demo token")?;
        info!(user_id = %admin.id, %token, "in-memory demo admin registered");
    }

    let feed = Arc::new(FeedService::new(
        backend.posts,
        backend.users,
        &feed_config,
    ));
    info!(
        max_page_size = feed_config.max_page_size,
        cooldown_secs = feed_config.post_cooldown.num_seconds(),
        tags = feed.tags().tags().count(),
        "feed configured"
    );

    let app = api_adapters::router(AppState { feed, auth }, &settings.server.allowed_origins);

    let listener = tokio::net::TcpListener::bind(settings.server.bind_addr())
        .await
        .context("failed to bind to address")?;
    info!(addr = %settings.server.bind_addr(), "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("postboard stopped");
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn backend(database: &DatabaseSettings) -> Result<Backend> {
    #[cfg(feature = "db-postgres")]
    if let Some(url) = &database.url {
        let pool = postgres::connect(url.expose_secret(), database.max_connections)
            .await
            .context("failed to connect to PostgreSQL")?;
        postgres::migrate(&pool)
            .await
            .context("failed to run migrations")?;
        info!(max_connections = database.max_connections, "using PostgreSQL storage");
        return Ok(Backend {
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool)),
            memory: None,
        });
    }

    #[cfg(not(feature = "db-postgres"))]
    if database.url.is_some() {
        warn!("database.url is ignored: built without `db-postgres`");
    }

    warn!("no database configured, posts are kept in memory only");
    let store = Arc::new(InMemoryStore::new());
    Ok(Backend {
        posts: store.clone(),
        users: store.clone(),
        memory: Some(store),
    })
}

fn seconds(key: &str, secs: u64) -> Result<Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .with_context(|| format!("{key} is out of range: {secs}"))
}

fn feed_config(feed: &FeedSettings) -> Result<FeedConfig> {
    let defaults = FeedConfig::default();
    let valid_tags = if feed.valid_tags.is_empty() {
        defaults.valid_tags
    } else {
        feed.valid_tags.iter().map(|t| t.trim().to_owned()).collect()
    };
    Ok(FeedConfig {
        max_page_size: feed.max_page_size,
        post_cooldown: seconds("feed.post_cooldown_secs", feed.post_cooldown_secs)?,
        valid_tags,
        max_title_chars: feed.max_title_chars,
        max_text_chars: feed.max_text_chars,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_settings_map_onto_feed_config() {
        let config = feed_config(&FeedSettings::default()).unwrap();
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.post_cooldown, Duration::seconds(60));
        assert_eq!(config.max_title_chars, 100);
        assert_eq!(config.max_text_chars, 2000);
        assert_eq!(config.valid_tags, FeedConfig::default().valid_tags);
    }

    #[test]
    fn configured_tags_replace_the_defaults() {
        let settings = FeedSettings {
            valid_tags: vec![" news ".into(), "sports".into()],
            ..FeedSettings::default()
        };
        let config = feed_config(&settings).unwrap();
        assert_eq!(config.valid_tags, ["news", "sports"]);
    }

    #[test]
    fn absurd_durations_are_rejected() {
        assert!(seconds("x", u64::MAX).is_err());
        assert!(seconds("x", i64::MAX as u64).is_err());
        assert_eq!(seconds("x", 90).unwrap(), Duration::seconds(90));
    }
}
