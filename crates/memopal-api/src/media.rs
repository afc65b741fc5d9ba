//! Uploaded media: reading the file part of a multipart body and writing it
//! under the upload directory.

use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use bytes::Bytes;
use memopal_core::inference::Image;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
  Image,
  Video,
}

impl MediaKind {
  /// Multipart field name, which is also the required MIME top-level type.
  pub fn field(self) -> &'static str {
    match self {
      MediaKind::Image => "image",
      MediaKind::Video => "video",
    }
  }

  fn dir(self) -> &'static str {
    match self {
      MediaKind::Image => "images",
      MediaKind::Video => "videos",
    }
  }

  fn missing(self) -> &'static str {
    match self {
      MediaKind::Image => "Please upload an image",
      MediaKind::Video => "Please upload a video",
    }
  }
}

/// One file read from a multipart body.
#[derive(Debug, Clone)]
pub struct Upload {
  pub file_name:    String,
  pub content_type: String,
  pub data:         Bytes,
}

impl From<Upload> for Image {
  fn from(u: Upload) -> Self {
    Image { file_name: u.file_name, content_type: u.content_type, data: u.data }
  }
}

/// Pull the `kind` file out of a multipart body. Other fields are skipped.
pub async fn read_upload(
  mut multipart: Multipart,
  kind: MediaKind,
) -> Result<Upload, ApiError> {
  let bad = |e: axum::extract::multipart::MultipartError| {
    ApiError::BadRequest(e.body_text())
  };

  while let Some(field) = multipart.next_field().await.map_err(bad)? {
    if field.name() != Some(kind.field()) {
      continue;
    }
    let content_type = field.content_type().unwrap_or_default().to_owned();
    if !content_type.starts_with(&format!("{}/", kind.field())) {
      return Err(ApiError::BadRequest(format!(
        "Only {} files are allowed",
        kind.field()
      )));
    }
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let data = field.bytes().await.map_err(bad)?;
    if data.is_empty() {
      break;
    }
    return Ok(Upload { file_name, content_type, data });
  }
  Err(ApiError::BadRequest(kind.missing().to_string()))
}

/// A file written by [`MediaStore::save`].
#[derive(Debug, Clone)]
pub struct StoredFile {
  pub path:        PathBuf,
  /// What gets recorded on the memory, e.g. `uploads/images/<uuid>.jpg`.
  pub storage_ref: String,
}

/// Writes uploads to `<root>/<images|videos>/<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub struct MediaStore {
  root: PathBuf,
}

impl MediaStore {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// Create the per-kind subdirectories.
  pub async fn init(&self) -> std::io::Result<()> {
    for kind in [MediaKind::Image, MediaKind::Video] {
      tokio::fs::create_dir_all(self.root.join(kind.dir())).await?;
    }
    Ok(())
  }

  pub async fn save(
    &self,
    kind: MediaKind,
    upload: &Upload,
  ) -> std::io::Result<StoredFile> {
    let name = format!("{}.{}", Uuid::new_v4(), extension(upload));
    let dir = self.root.join(kind.dir());
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(&name);
    tokio::fs::write(&path, &upload.data).await?;
    tracing::debug!(path = %path.display(), bytes = upload.data.len(), "stored upload");
    Ok(StoredFile {
      path,
      storage_ref: format!("uploads/{}/{name}", kind.dir()),
    })
  }

  /// Best-effort removal of a file whose memory update did not happen.
  pub async fn discard(&self, file: StoredFile) {
    if let Err(e) = tokio::fs::remove_file(&file.path).await {
      tracing::warn!(path = %file.path.display(), error = %e, "could not remove orphaned upload");
    }
  }
}

/// File extension from the client's file name, falling back to the MIME
/// subtype. Only short alphanumeric extensions are kept.
fn extension(upload: &Upload) -> String {
  let clean = |s: &str| {
    let s = s.to_ascii_lowercase();
    (!s.is_empty() && s.len() <= 8 && s.chars().all(|c| c.is_ascii_alphanumeric()))
      .then_some(s)
  };
  Path::new(&upload.file_name)
    .extension()
    .and_then(|e| e.to_str())
    .and_then(clean)
    .or_else(|| {
      upload
        .content_type
        .split_once('/')
        .and_then(|(_, sub)| clean(sub.split(';').next().unwrap_or_default().trim()))
    })
    .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn upload(file_name: &str, content_type: &str) -> Upload {
    Upload {
      file_name:    file_name.into(),
      content_type: content_type.into(),
      data:         Bytes::from_static(b"payload"),
    }
  }

  #[test]
  fn extension_choice() {
    assert_eq!(extension(&upload("Face.JPG", "image/jpeg")), "jpg");
    assert_eq!(extension(&upload("blob", "image/png")), "png");
    assert_eq!(extension(&upload("../../etc/passwd", "video/mp4")), "mp4");
    assert_eq!(extension(&upload("noext", "image/svg+xml")), "bin");
  }

  #[tokio::test]
  async fn save_and_discard() {
    let dir = tempfile::tempdir().unwrap();
    let media = MediaStore::new(dir.path());
    media.init().await.unwrap();

    let stored = media.save(MediaKind::Video, &upload("clip.mp4", "video/mp4")).await.unwrap();
    assert!(stored.storage_ref.starts_with("uploads/videos/"));
    assert!(stored.storage_ref.ends_with(".mp4"));
    assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), b"payload");

    let path = stored.path.clone();
    media.discard(stored).await;
    assert!(!path.exists());
  }
}
