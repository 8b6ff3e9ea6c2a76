//! postboard/crates/domains/src/lib.rs
//!
//! Domain models, port traits and the error taxonomy shared by every other
//! crate. Nothing in here performs I/O.

pub mod error;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
