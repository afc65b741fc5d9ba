//! Handlers for `/memories` endpoints. All require a bearer token and only
//! ever touch the caller's own memories.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/memories` | `{count, data[]}` |
//! | `POST`   | `/memories` | Body: memory fields; any `user` is ignored |
//! | `GET`    | `/memories/{id}` | 404 if missing, 401 if not the owner |
//! | `PUT`    | `/memories/{id}` | Partial update |
//! | `DELETE` | `/memories/{id}` | `{data: {}}` |
//! | `POST`   | `/memories/{id}/images` | Multipart `image` |
//! | `POST`   | `/memories/{id}/videos` | Multipart `video` |
//! | `POST`   | `/memories/{id}/conversations` | Body: `{content}` |

use axum::{Json, extract::State, http::StatusCode};
use memopal_core::{
  Error, Identity,
  error::from_store,
  inference::InferenceService,
  memory::{Memory, MemoryPatch, NewMemory},
  store::MemoPalStore,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  extract::{JsonBody, MemoryId, UploadForm},
  media::{MediaKind, read_upload},
  reply::{self, DataReply, Empty, ListReply},
};

// ─── List / create ────────────────────────────────────────────────────────────

/// `GET /memories`
pub async fn list<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<ListReply<Memory>>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let memories = state.store.list_memories(caller).await.map_err(from_store)?;
  Ok(reply::list(memories))
}

/// `POST /memories`
pub async fn create<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
  JsonBody(body): JsonBody<NewMemory>,
) -> Result<(StatusCode, Json<DataReply<Memory>>), ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let memory = state
    .store
    .create_memory(caller, body)
    .await
    .map_err(from_store)?;
  tracing::debug!(memory_id = %memory.id, "memory created");
  Ok((StatusCode::CREATED, reply::data(memory)))
}

// ─── Single memory ────────────────────────────────────────────────────────────

/// `GET /memories/{id}`
pub async fn get_one<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
  MemoryId(id): MemoryId,
) -> Result<Json<DataReply<Memory>>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let memory = state.store.get_memory(id, caller).await.map_err(from_store)?;
  Ok(reply::data(memory))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(flatten)]
  pub patch: MemoryPatch,
  /// Accepted only when it names the current owner.
  #[serde(default)]
  pub user:  Option<Value>,
}

/// Whether a `user` value in an update body names `caller`.
fn names_caller(user: &Value, caller: Identity) -> bool {
  user
    .as_str()
    .and_then(|s| Uuid::parse_str(s).ok())
    .is_some_and(|id| id == caller.user_id())
}

/// `PUT /memories/{id}`
pub async fn update<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
  MemoryId(id): MemoryId,
  JsonBody(body): JsonBody<UpdateBody>,
) -> Result<Json<DataReply<Memory>>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  if let Some(user) = &body.user
    && !names_caller(user, caller)
  {
    // Missing and foreign memories keep their own answers. The owner never
    // changes, so this read cannot race with the check.
    state.store.get_memory(id, caller).await.map_err(from_store)?;
    return Err(Error::validation("The owner of a memory cannot be changed").into());
  }

  let memory = state
    .store
    .update_memory(id, caller, body.patch)
    .await
    .map_err(from_store)?;
  Ok(reply::data(memory))
}

/// `DELETE /memories/{id}`
pub async fn delete_one<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
  MemoryId(id): MemoryId,
) -> Result<Json<DataReply<Empty>>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  state.store.delete_memory(id, caller).await.map_err(from_store)?;
  tracing::debug!(memory_id = %id, "memory deleted");
  Ok(reply::data(Empty {}))
}

// ─── Appends ──────────────────────────────────────────────────────────────────

/// Save the uploaded file and record it on the memory. The file is removed
/// again if the memory update fails.
async fn attach<S, I>(
  state: &AppState<S, I>,
  caller: Identity,
  id: Uuid,
  form: UploadForm,
  kind: MediaKind,
) -> Result<Memory, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  // 404 and 401 take precedence over a bad upload.
  state.store.get_memory(id, caller).await.map_err(from_store)?;

  let upload = read_upload(form.0, kind).await?;
  let stored = state.media.save(kind, &upload).await?;
  let storage_ref = stored.storage_ref.clone();

  let result = match kind {
    MediaKind::Image => state.store.append_image(id, caller, storage_ref).await,
    MediaKind::Video => state.store.append_video(id, caller, storage_ref).await,
  };
  match result {
    Ok(memory) => Ok(memory),
    Err(e) => {
      state.media.discard(stored).await;
      Err(from_store(e).into())
    }
  }
}

/// `POST /memories/{id}/images`
pub async fn add_image<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
  MemoryId(id): MemoryId,
  form: UploadForm,
) -> Result<Json<DataReply<Memory>>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let memory = attach(&state, caller, id, form, MediaKind::Image).await?;
  Ok(reply::data(memory))
}

/// `POST /memories/{id}/videos`
pub async fn add_video<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
  MemoryId(id): MemoryId,
  form: UploadForm,
) -> Result<Json<DataReply<Memory>>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let memory = attach(&state, caller, id, form, MediaKind::Video).await?;
  Ok(reply::data(memory))
}

#[derive(Debug, Deserialize)]
pub struct ConversationBody {
  #[serde(default)]
  pub content: String,
}

/// `POST /memories/{id}/conversations`
pub async fn add_conversation<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
  MemoryId(id): MemoryId,
  JsonBody(body): JsonBody<ConversationBody>,
) -> Result<Json<DataReply<Memory>>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let memory = state
    .store
    .append_conversation(id, caller, body.content)
    .await
    .map_err(from_store)?;
  Ok(reply::data(memory))
}
