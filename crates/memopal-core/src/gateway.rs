//! AI delegation: operations that consult the inference service and fold
//! its answer back into the store.
//!
//! Each function reads through the ownership-checked store API, so the
//! gateway never sees a memory the caller does not own. If the upstream call
//! fails nothing is written.

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  error::from_store,
  identity::Identity,
  inference::{CueContext, FaceMatch, Image, InferenceService, PersonMatch},
  memory::Memory,
  store::MemoPalStore,
  user::{User, normalize_email},
};

/// Result of [`generate_cues`]: the model's answer, the cues it suggested
/// and the memory after merging them.
#[derive(Debug, Clone, Serialize)]
pub struct CueAnswer {
  pub answer: String,
  pub cues:   Vec<String>,
  pub memory: Memory,
}

/// Result of [`recognize_person`].
#[derive(Debug, Clone)]
pub enum Recognition {
  NotRecognized,
  Recognized(Memory),
}

fn upstream<E: std::error::Error>(op: &'static str) -> impl FnOnce(E) -> Error {
  move |e| {
    tracing::warn!(error = %e, "inference {op} failed");
    Error::Upstream(e.to_string())
  }
}

/// Ask the inference service about the person behind `memory_id` and merge
/// the suggested cues into it.
pub async fn generate_cues<S, I>(
  store: &S,
  inference: &I,
  caller: Identity,
  memory_id: Uuid,
  question: String,
) -> Result<CueAnswer>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let memory = store.get_memory(memory_id, caller).await.map_err(from_store)?;

  let suggestion = inference
    .generate_cues(CueContext::from_memory(&memory), question)
    .await
    .map_err(upstream("generate-cues"))?;

  let memory = if suggestion.cues.is_empty() {
    memory
  } else {
    store
      .merge_cues(memory_id, caller, suggestion.cues.clone())
      .await
      .map_err(from_store)?
  };

  Ok(CueAnswer {
    answer: suggestion.answer,
    cues: suggestion.cues,
    memory,
  })
}

/// Find which of the caller's memories the face in `image` belongs to.
///
/// The matched memory is loaded with the caller's identity, so an upstream
/// answer pointing at somebody else's memory fails with
/// [`Error::Forbidden`] instead of leaking it.
pub async fn recognize_person<S, I>(
  store: &S,
  inference: &I,
  caller: Identity,
  image: Image,
) -> Result<Recognition>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let matched = inference
    .recognize_person(image, caller.user_id())
    .await
    .map_err(upstream("recognize-person"))?;

  match matched {
    PersonMatch::NotRecognized => Ok(Recognition::NotRecognized),
    PersonMatch::Recognized { memory_id } => {
      let memory =
        store.get_memory(memory_id, caller).await.map_err(from_store)?;
      Ok(Recognition::Recognized(memory))
    }
  }
}

/// Compute the caller's face encoding and store it on their account.
pub async fn enroll_face<S, I>(
  store: &S,
  inference: &I,
  caller: Identity,
  image: Image,
) -> Result<User>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let encoding = inference
    .face_encoding(image)
    .await
    .map_err(upstream("face-encoding"))?;

  store
    .set_face_data(caller.user_id(), encoding)
    .await
    .map_err(from_store)
}

/// Identify the user whose face is in `image`.
///
/// Distinguishes a face the service does not know
/// ([`Error::FaceNotRecognized`]) from a recognised email with no local
/// account ([`Error::UserNotFound`]).
pub async fn identify_face<S, I>(
  store: &S,
  inference: &I,
  image: Image,
) -> Result<User>
where
  S: MemoPalStore,
  I: InferenceService,
{
  let matched = inference
    .recognize_face(image)
    .await
    .map_err(upstream("face-recognition"))?;

  let email = match matched {
    FaceMatch::NotRecognized => return Err(Error::FaceNotRecognized),
    FaceMatch::Recognized { email } => normalize_email(&email),
  };

  store
    .find_user_by_email(email)
    .await
    .map_err(from_store)?
    .map(|creds| creds.user)
    .ok_or(Error::UserNotFound)
}
