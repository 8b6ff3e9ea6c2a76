//! # services
//!
//! Business logic of the board. Everything here is written against the
//! ports in `domains`; adapters are injected by the binary.
//!
//! - [`feed`]: sort policy, tag filter and the pagination planner.
//! - [`gates`]: cooldown and ownership/role checks guarding mutations.
//! - [`content`]: title/text normalization.
//! - [`post_service`]: the orchestrator the routing layer calls.

pub mod config;
pub mod content;
pub mod feed;
pub mod gates;
pub mod post_service;

pub use config::FeedConfig;
pub use post_service::{CreatePostInput, FeedService, ListPostsQuery};
