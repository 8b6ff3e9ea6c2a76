//! # storage-adapters
//!
//! Implementations of the `PostRepository` and `UserRepository` ports.
//!
//! - [`memory::InMemoryStore`] is always compiled; tests and database-less
//!   development runs use it.
//! - `postgres` (feature `db-postgres`) talks to PostgreSQL through `sqlx`.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::InMemoryStore;
