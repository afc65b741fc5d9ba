//! Extractors whose rejections use the API envelope.

use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `axum::Json` with malformed bodies rejected as 400 envelopes.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// The `{id}` segment of a memory route. Anything that is not a UUID is
/// answered with 404.
#[derive(Deserialize, FromRequestParts)]
#[serde(transparent)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct MemoryId(pub Uuid);

/// `multipart/form-data` body; a missing or wrong content type is a 400.
pub struct UploadForm(pub Multipart);

impl<S> FromRequest<S> for UploadForm
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    Multipart::from_request(req, state)
      .await
      .map(UploadForm)
      .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
  }
}
