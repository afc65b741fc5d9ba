//! Core types and trait definitions for MemoPal.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store backend, the inference client and the HTTP surface all depend
//! on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod gateway;
pub mod identity;
pub mod inference;
pub mod memory;
pub mod store;
pub mod user;

pub use error::{Error, Result};
pub use identity::{Identity, authorize_owner};
