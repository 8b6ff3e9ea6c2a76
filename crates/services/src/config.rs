use chrono::Duration;

/// Tags accepted when no tag set is configured.
pub const DEFAULT_TAGS: &[&str] = &["general", "academic", "career", "housing", "events", "offtopic"];

/// Tunables of the feed, resolved once at startup and passed to
/// [`FeedService::new`](crate::FeedService::new).
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Upper bound applied to every requested page size.
    pub max_page_size: u32,
    /// Minimum gap between two creates/edits by the same user.
    pub post_cooldown: Duration,
    pub valid_tags: Vec<String>,
    pub max_title_chars: usize,
    pub max_text_chars: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_page_size: 50,
            post_cooldown: Duration::seconds(60),
            valid_tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            max_title_chars: 100,
            max_text_chars: 2000,
        }
    }
}
