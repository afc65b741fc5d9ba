//! SQLite backend for the MemoPal store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every memory operation is one closure
//! on that thread and one transaction, which makes the ownership check and
//! the write atomic with respect to other requests.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
