//! The `InferenceService` trait and the typed results it returns.
//!
//! The external service is opaque: implementations are responsible for
//! validating its replies into these types and reporting anything else as
//! an error.

use std::future::Future;

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::{memory::Memory, user::FaceEncoding};

/// An uploaded image forwarded to the inference service.
#[derive(Debug, Clone)]
pub struct Image {
  pub file_name:    String,
  pub content_type: String,
  pub data:         Bytes,
}

/// What the cue generator is told about a person.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CueContext {
  pub person_name:   String,
  pub relationship:  String,
  pub existing_cues: Vec<String>,
  /// Conversation contents only, oldest first.
  pub conversations: Vec<String>,
  pub notes:         String,
}

impl CueContext {
  pub fn from_memory(memory: &Memory) -> Self {
    Self {
      person_name:   memory.person_name.clone(),
      relationship:  memory.relationship.clone(),
      existing_cues: memory.cues.clone(),
      conversations: memory
        .conversations
        .iter()
        .map(|c| c.content.clone())
        .collect(),
      notes:         memory.notes.clone(),
    }
  }
}

/// A successful `/generate-cues` reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CueSuggestion {
  pub answer: String,
  pub cues:   Vec<String>,
}

/// A `/recognize-person` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonMatch {
  Recognized { memory_id: Uuid },
  NotRecognized,
}

/// A `/face-recognition` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaceMatch {
  Recognized { email: String },
  NotRecognized,
}

/// Abstraction over the external inference service.
pub trait InferenceService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Answer `question` about a person and suggest recall cues.
  fn generate_cues(
    &self,
    context: CueContext,
    question: String,
  ) -> impl Future<Output = Result<CueSuggestion, Self::Error>> + Send + '_;

  /// Find which of `user_id`'s memories the face in `image` belongs to.
  fn recognize_person(
    &self,
    image: Image,
    user_id: Uuid,
  ) -> impl Future<Output = Result<PersonMatch, Self::Error>> + Send + '_;

  /// Compute a face encoding for enrolment.
  fn face_encoding(
    &self,
    image: Image,
  ) -> impl Future<Output = Result<FaceEncoding, Self::Error>> + Send + '_;

  /// Identify an enrolled user by face; yields the user's email on a match.
  fn recognize_face(
    &self,
    image: Image,
  ) -> impl Future<Output = Result<FaceMatch, Self::Error>> + Send + '_;
}
