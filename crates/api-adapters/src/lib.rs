//! # api-adapters
//!
//! The HTTP face of the feed. [`dto`] holds the wire shapes and is always
//! compiled; the axum router, extractors and error mapping sit behind the
//! `web-axum` feature.

pub mod dto;

#[cfg(feature = "web-axum")]
mod error;
#[cfg(feature = "web-axum")]
mod extract;
#[cfg(feature = "web-axum")]
mod handlers;
#[cfg(feature = "web-axum")]
mod router;

#[cfg(feature = "web-axum")]
pub use error::ApiError;
#[cfg(feature = "web-axum")]
pub use extract::CurrentUser;
#[cfg(feature = "web-axum")]
pub use router::{router, AppState};
