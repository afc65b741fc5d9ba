//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users` | Body: `{name, email, password}`; 201 `{token}` |
//! | `POST` | `/users/login` | Body: `{email, password}`; `{token}` |
//! | `GET`  | `/users/me` | Bearer |
//! | `POST` | `/users/face-auth` | Bearer; multipart `image` |
//! | `POST` | `/users/face-login` | Multipart `image`; `{token}` |

use axum::{Json, extract::State, http::StatusCode};
use memopal_core::{
  Error,
  error::from_store,
  gateway,
  inference::InferenceService,
  store::MemoPalStore,
  user::{NewUser, User, normalize_email, validate_registration},
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{Authenticated, hash_password, verify_decoy, verify_password},
  error::ApiError,
  extract::{JsonBody, UploadForm},
  media::{MediaKind, read_upload},
  reply::{self, DataReply, TokenReply},
};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  #[serde(default)]
  pub name:     String,
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

/// `POST /users`
pub async fn register<S, I>(
  State(state): State<AppState<S, I>>,
  JsonBody(body): JsonBody<RegisterBody>,
) -> Result<(StatusCode, Json<TokenReply>), ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  validate_registration(&body.name, &body.email, &body.password)?;

  let user = state
    .store
    .create_user(NewUser {
      name:          body.name.trim().to_string(),
      email:         normalize_email(&body.email),
      password_hash: hash_password(&body.password)?,
    })
    .await
    .map_err(from_store)?;

  tracing::info!(user_id = %user.id, "user registered");
  let token = state.tokens.issue(user.id)?;
  Ok((StatusCode::CREATED, reply::token(token)))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

/// `POST /users/login`
///
/// An unknown email and a wrong password fail the same way, and both run
/// one argon2 verification.
pub async fn login<S, I>(
  State(state): State<AppState<S, I>>,
  JsonBody(body): JsonBody<LoginBody>,
) -> Result<Json<TokenReply>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  if body.email.trim().is_empty() || body.password.is_empty() {
    return Err(Error::validation("Please provide an email and password").into());
  }

  let Some(creds) = state
    .store
    .find_user_by_email(normalize_email(&body.email))
    .await
    .map_err(from_store)?
  else {
    verify_decoy(&body.password);
    return Err(Error::InvalidCredentials.into());
  };

  if !verify_password(&body.password, &creds.password_hash) {
    tracing::debug!(user_id = %creds.user.id, "password mismatch");
    return Err(Error::InvalidCredentials.into());
  }

  tracing::info!(user_id = %creds.user.id, "user logged in");
  Ok(reply::token(state.tokens.issue(creds.user.id)?))
}

// ─── Me ───────────────────────────────────────────────────────────────────────

/// `GET /users/me`
pub async fn me<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<DataReply<User>>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let user = state
    .store
    .get_user(caller.user_id())
    .await
    .map_err(from_store)?
    .ok_or(Error::UserNotFound)?;
  Ok(reply::data(user))
}

// ─── Face ─────────────────────────────────────────────────────────────────────

/// `POST /users/face-auth`: enrol the caller's face.
pub async fn face_auth<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
  UploadForm(form): UploadForm,
) -> Result<Json<DataReply<User>>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let upload = read_upload(form, MediaKind::Image).await?;
  let user = gateway::enroll_face(
    state.store.as_ref(),
    state.inference.as_ref(),
    caller,
    upload.into(),
  )
  .await?;
  tracing::info!(user_id = %user.id, "face data enrolled");
  Ok(reply::data(user))
}

/// `POST /users/face-login`
pub async fn face_login<S, I>(
  State(state): State<AppState<S, I>>,
  UploadForm(form): UploadForm,
) -> Result<Json<TokenReply>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let upload = read_upload(form, MediaKind::Image).await?;
  let user = gateway::identify_face(
    state.store.as_ref(),
    state.inference.as_ref(),
    upload.into(),
  )
  .await?;
  tracing::info!(user_id = %user.id, "user logged in by face");
  Ok(reply::token(state.tokens.issue(user.id)?))
}
