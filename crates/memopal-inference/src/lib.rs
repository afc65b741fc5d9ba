//! Async HTTP client for the MemoPal inference service.
//!
//! Implements [`InferenceService`] over four endpoints:
//!
//! | Method | Path | Body | Reply |
//! |--------|------|------|-------|
//! | `POST` | `/generate-cues` | JSON `{context, question}` | `{answer, cues[]}` |
//! | `POST` | `/recognize-person` | multipart `image`, `userId` | `{recognized, memoryId?}` |
//! | `POST` | `/face-encoding` | multipart `image` | `{encoding[]}` |
//! | `POST` | `/face-recognition` | multipart `image` | `{recognized, email?}` |
//!
//! Every call is bounded by the configured timeout and never retried.

pub mod error;
mod wire;

use std::time::Duration;

use memopal_core::{
  inference::{
    CueContext, CueSuggestion, FaceMatch, Image, InferenceService, PersonMatch,
  },
  user::FaceEncoding,
};
use reqwest::{
  Client,
  multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

pub use error::{Error, Result};
use wire::{
  CueReply, CueRequest, FaceEncodingReply, FaceRecognitionReply,
  RecognizePersonReply,
};

/// Connection settings for the inference service.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

/// HTTP client for the inference service.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpInference {
  client:   Client,
  base_url: String,
}

impl HttpInference {
  pub fn new(config: InferenceConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|source| Error::Transport { path: "/", source })?;
    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_owned(),
    })
  }

  fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

  async fn read<T: DeserializeOwned>(
    path: &'static str,
    resp: reqwest::Response,
  ) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status { path, status });
    }
    let body = resp
      .bytes()
      .await
      .map_err(|source| Error::Transport { path, source })?;
    serde_json::from_slice(&body).map_err(|e| Error::Malformed {
      path,
      reason: e.to_string(),
    })
  }

  async fn post_form<T: DeserializeOwned>(
    &self,
    path: &'static str,
    form: Form,
  ) -> Result<T> {
    tracing::debug!(path, "inference request");
    let resp = self
      .client
      .post(self.url(path))
      .multipart(form)
      .send()
      .await
      .map_err(|source| Error::Transport { path, source })?;
    Self::read(path, resp).await
  }
}

fn image_part(path: &'static str, image: Image) -> Result<Part> {
  Part::stream(image.data)
    .file_name(image.file_name)
    .mime_str(&image.content_type)
    .map_err(|source| Error::Transport { path, source })
}

fn validate<R, T>(path: &'static str, reply: R) -> Result<T>
where
  T: TryFrom<R, Error = String>,
{
  T::try_from(reply).map_err(|reason| Error::Malformed { path, reason })
}

impl InferenceService for HttpInference {
  type Error = Error;

  async fn generate_cues(
    &self,
    context: CueContext,
    question: String,
  ) -> Result<CueSuggestion> {
    const PATH: &str = "/generate-cues";
    tracing::debug!(path = PATH, "inference request");
    let resp = self
      .client
      .post(self.url(PATH))
      .json(&CueRequest { context: &context, question: &question })
      .send()
      .await
      .map_err(|source| Error::Transport { path: PATH, source })?;
    let reply: CueReply = Self::read(PATH, resp).await?;
    Ok(reply.into())
  }

  async fn recognize_person(
    &self,
    image: Image,
    user_id: Uuid,
  ) -> Result<PersonMatch> {
    const PATH: &str = "/recognize-person";
    let form = Form::new()
      .part("image", image_part(PATH, image)?)
      .text("userId", user_id.to_string());
    let reply: RecognizePersonReply = self.post_form(PATH, form).await?;
    validate(PATH, reply)
  }

  async fn face_encoding(&self, image: Image) -> Result<FaceEncoding> {
    const PATH: &str = "/face-encoding";
    let form = Form::new().part("image", image_part(PATH, image)?);
    let reply: FaceEncodingReply = self.post_form(PATH, form).await?;
    validate(PATH, reply)
  }

  async fn recognize_face(&self, image: Image) -> Result<FaceMatch> {
    const PATH: &str = "/face-recognition";
    let form = Form::new().part("image", image_part(PATH, image)?);
    let reply: FaceRecognitionReply = self.post_form(PATH, form).await?;
    validate(PATH, reply)
  }
}

#[cfg(test)]
mod tests;
