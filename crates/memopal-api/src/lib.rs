//! JSON REST API for MemoPal.
//!
//! Exposes an axum [`Router`] backed by any [`MemoPalStore`] and
//! [`InferenceService`]. Every route lives under `/api` and answers with the
//! `{success, …}` envelope from [`reply`].

pub mod ai;
pub mod auth;
pub mod error;
pub mod extract;
pub mod media;
pub mod memories;
pub mod reply;
pub mod session;
pub mod users;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use memopal_core::{inference::InferenceService, store::MemoPalStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
use media::MediaStore;
use session::TokenSigner;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MEMOPAL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  pub store_path:             PathBuf,
  pub upload_dir:             PathBuf,
  pub token_secret:           String,
  #[serde(default = "default_token_ttl_secs")]
  pub token_ttl_secs:         u64,
  pub inference_url:          String,
  #[serde(default = "default_inference_timeout_secs")]
  pub inference_timeout_secs: u64,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes:       usize,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 3000 }
fn default_token_ttl_secs() -> u64 { 30 * 24 * 60 * 60 }
fn default_inference_timeout_secs() -> u64 { 30 }
fn default_max_upload_bytes() -> usize { 50 * 1024 * 1024 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, I> {
  pub store:            Arc<S>,
  pub inference:        Arc<I>,
  pub media:            Arc<MediaStore>,
  pub tokens:           Arc<TokenSigner>,
  pub max_upload_bytes: usize,
}

// Manual impl: cloning only bumps the `Arc`s, so `S` and `I` need not be
// `Clone`.
impl<S, I> Clone for AppState<S, I> {
  fn clone(&self) -> Self {
    Self {
      store:            Arc::clone(&self.store),
      inference:        Arc::clone(&self.inference),
      media:            Arc::clone(&self.media),
      tokens:           Arc::clone(&self.tokens),
      max_upload_bytes: self.max_upload_bytes,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the MemoPal router, with every route nested under `/api`.
pub fn router<S, I>(state: AppState<S, I>) -> Router
where
  S: MemoPalStore + 'static,
  I: InferenceService + 'static,
{
  let body_limit = state.max_upload_bytes;

  let api = Router::new()
    // Users
    .route("/users",            post(users::register::<S, I>))
    .route("/users/login",      post(users::login::<S, I>))
    .route("/users/me",         get(users::me::<S, I>))
    .route("/users/face-auth",  post(users::face_auth::<S, I>))
    .route("/users/face-login", post(users::face_login::<S, I>))
    // Memories
    .route("/memories", get(memories::list::<S, I>).post(memories::create::<S, I>))
    .route(
      "/memories/{id}",
      get(memories::get_one::<S, I>)
        .put(memories::update::<S, I>)
        .delete(memories::delete_one::<S, I>),
    )
    .route("/memories/{id}/images",        post(memories::add_image::<S, I>))
    .route("/memories/{id}/videos",        post(memories::add_video::<S, I>))
    .route("/memories/{id}/conversations", post(memories::add_conversation::<S, I>))
    // AI
    .route("/ai/generate-cues",    post(ai::generate_cues::<S, I>))
    .route("/ai/recognize-person", post(ai::recognize_person::<S, I>));

  Router::new()
    .nest("/api", api)
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
