//! Handlers for `/ai` endpoints, backed by [`memopal_core::gateway`].
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/ai/generate-cues` | Body: `{memoryId, question}` |
//! | `POST` | `/ai/recognize-person` | Multipart `image` |

use axum::{Json, extract::State};
use memopal_core::{
  Error,
  gateway::{self, CueAnswer, Recognition},
  inference::InferenceService,
  memory::Memory,
  store::MemoPalStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  extract::{JsonBody, UploadForm},
  media::{MediaKind, read_upload},
  reply::{self, DataReply},
};

// ─── Generate cues ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCuesBody {
  #[serde(default)]
  pub memory_id: String,
  #[serde(default)]
  pub question:  String,
}

/// `POST /ai/generate-cues`
pub async fn generate_cues<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
  JsonBody(body): JsonBody<GenerateCuesBody>,
) -> Result<Json<DataReply<CueAnswer>>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  if body.memory_id.trim().is_empty() || body.question.trim().is_empty() {
    return Err(Error::validation("Please provide a memory ID and question").into());
  }
  let memory_id = Uuid::parse_str(body.memory_id.trim())
    .map_err(|_| ApiError::memory_not_found())?;

  let answer = gateway::generate_cues(
    state.store.as_ref(),
    state.inference.as_ref(),
    caller,
    memory_id,
    body.question,
  )
  .await?;
  Ok(reply::data(answer))
}

// ─── Recognize person ─────────────────────────────────────────────────────────

const NOT_RECOGNIZED: &str = "No known person recognized in the image";

#[derive(Debug, Serialize)]
pub struct RecognizedPerson {
  pub memory: Memory,
}

/// `{success, recognized: false, message}` or
/// `{success, recognized: true, data: {memory}}`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RecognitionReply {
  NotRecognized {
    success:    bool,
    recognized: bool,
    message:    &'static str,
  },
  Recognized {
    success:    bool,
    recognized: bool,
    data:       RecognizedPerson,
  },
}

impl From<Recognition> for RecognitionReply {
  fn from(r: Recognition) -> Self {
    match r {
      Recognition::NotRecognized => RecognitionReply::NotRecognized {
        success:    true,
        recognized: false,
        message:    NOT_RECOGNIZED,
      },
      Recognition::Recognized(memory) => RecognitionReply::Recognized {
        success:    true,
        recognized: true,
        data:       RecognizedPerson { memory },
      },
    }
  }
}

/// `POST /ai/recognize-person`
pub async fn recognize_person<S, I>(
  State(state): State<AppState<S, I>>,
  Authenticated(caller): Authenticated,
  UploadForm(form): UploadForm,
) -> Result<Json<RecognitionReply>, ApiError>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let upload = read_upload(form, MediaKind::Image).await?;
  let recognition = gateway::recognize_person(
    state.store.as_ref(),
    state.inference.as_ref(),
    caller,
    upload.into(),
  )
  .await?;
  Ok(Json(recognition.into()))
}
