//! Tests for `HttpInference` against an in-process stub of the inference
//! service.

use std::time::Duration;

use axum::{
  Json, Router,
  extract::Multipart,
  http::StatusCode,
  routing::post,
};
use bytes::Bytes;
use memopal_core::inference::{
  CueContext, FaceMatch, Image, InferenceService, PersonMatch,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::{Error, HttpInference, InferenceConfig};

async fn serve(router: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
  format!("http://{addr}")
}

async fn client_for(router: Router, timeout: Duration) -> HttpInference {
  let base_url = serve(router).await;
  HttpInference::new(InferenceConfig { base_url, timeout }).unwrap()
}

fn image() -> Image {
  Image {
    file_name:    "face.jpg".into(),
    content_type: "image/jpeg".into(),
    data:         Bytes::from_static(b"\xff\xd8\xff\xe0fake-jpeg"),
  }
}

fn context() -> CueContext {
  CueContext {
    person_name:   "Jane".into(),
    relationship:  "sister".into(),
    existing_cues: vec!["tall".into()],
    conversations: vec!["talked about the garden".into()],
    notes:         String::new(),
  }
}

/// Collect the text fields and the names of file fields of a multipart body.
async fn fields(mut multipart: Multipart) -> Value {
  let mut out = serde_json::Map::new();
  while let Some(field) = multipart.next_field().await.unwrap() {
    let name = field.name().unwrap_or_default().to_owned();
    let is_file = field.file_name().is_some();
    let data = field.bytes().await.unwrap();
    let value = if is_file {
      json!({ "file_len": data.len() })
    } else {
      json!(String::from_utf8_lossy(&data))
    };
    out.insert(name, value);
  }
  Value::Object(out)
}

// ─── generate-cues ───────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_cues_sends_context_and_question() {
  let router = Router::new().route(
    "/generate-cues",
    post(|Json(body): Json<Value>| async move {
      let name = body["context"]["personName"].as_str().unwrap_or("?").to_owned();
      let question = body["question"].as_str().unwrap_or("?").to_owned();
      let convo = body["context"]["conversations"][0].as_str().unwrap_or("?").to_owned();
      Json(json!({
        "answer": format!("{name}: {question}"),
        "cues": [convo, "tall"],
      }))
    }),
  );
  let client = client_for(router, Duration::from_secs(5)).await;

  let reply = client
    .generate_cues(context(), "who is she?".into())
    .await
    .unwrap();
  assert_eq!(reply.answer, "Jane: who is she?");
  assert_eq!(reply.cues, vec!["talked about the garden", "tall"]);
}

#[tokio::test]
async fn generate_cues_malformed_reply() {
  let router = Router::new().route(
    "/generate-cues",
    post(|| async { Json(json!({ "cues": "not-a-list" })) }),
  );
  let client = client_for(router, Duration::from_secs(5)).await;

  let err = client
    .generate_cues(context(), "q".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Malformed { path: "/generate-cues", .. }));
}

#[tokio::test]
async fn generate_cues_error_status() {
  let router = Router::new().route(
    "/generate-cues",
    post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
  );
  let client = client_for(router, Duration::from_secs(5)).await;

  let err = client
    .generate_cues(context(), "q".into())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
  ));
}

#[tokio::test]
async fn slow_service_times_out() {
  let router = Router::new().route(
    "/generate-cues",
    post(|| async {
      tokio::time::sleep(Duration::from_secs(5)).await;
      Json(json!({ "answer": "late", "cues": [] }))
    }),
  );
  let client = client_for(router, Duration::from_millis(100)).await;

  let err = client
    .generate_cues(context(), "q".into())
    .await
    .unwrap_err();
  assert!(err.is_timeout(), "expected timeout, got {err}");
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
  // Bind then drop to get a port nobody is listening on.
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let client = HttpInference::new(InferenceConfig {
    base_url: format!("http://{addr}/"),
    timeout:  Duration::from_secs(2),
  })
  .unwrap();

  let err = client
    .generate_cues(context(), "q".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Transport { .. }));
}

// ─── recognize-person ────────────────────────────────────────────────────────

#[tokio::test]
async fn recognize_person_sends_image_and_user_id() {
  let memory_id = Uuid::new_v4();
  let router = Router::new().route(
    "/recognize-person",
    post(move |multipart: Multipart| async move {
      let f = fields(multipart).await;
      let has_image = f["image"]["file_len"].as_u64() == Some(image().data.len() as u64);
      let user_id = f["userId"].as_str().unwrap_or_default().to_owned();
      if has_image && !user_id.is_empty() {
        Json(json!({ "recognized": true, "memoryId": memory_id }))
      } else {
        Json(json!({ "recognized": false }))
      }
    }),
  );
  let client = client_for(router, Duration::from_secs(5)).await;

  let matched = client
    .recognize_person(image(), Uuid::new_v4())
    .await
    .unwrap();
  assert_eq!(matched, PersonMatch::Recognized { memory_id });
}

#[tokio::test]
async fn recognize_person_without_memory_id_is_malformed() {
  let router = Router::new().route(
    "/recognize-person",
    post(|| async { Json(json!({ "recognized": true })) }),
  );
  let client = client_for(router, Duration::from_secs(5)).await;

  let err = client
    .recognize_person(image(), Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Malformed { .. }));
}

// ─── face endpoints ──────────────────────────────────────────────────────────

#[tokio::test]
async fn face_encoding_returns_vector() {
  let router = Router::new().route(
    "/face-encoding",
    post(|multipart: Multipart| async move {
      let f = fields(multipart).await;
      let len = f["image"]["file_len"].as_u64().unwrap_or(0);
      Json(json!({ "encoding": [len as f64, 0.5] }))
    }),
  );
  let client = client_for(router, Duration::from_secs(5)).await;

  let encoding = client.face_encoding(image()).await.unwrap();
  assert_eq!(encoding.0, vec![image().data.len() as f64, 0.5]);
}

#[tokio::test]
async fn face_recognition_outcomes() {
  let router = Router::new().route(
    "/face-recognition",
    post(|| async { Json(json!({ "recognized": true, "email": "a@x.com" })) }),
  );
  let client = client_for(router, Duration::from_secs(5)).await;
  assert_eq!(
    client.recognize_face(image()).await.unwrap(),
    FaceMatch::Recognized { email: "a@x.com".into() }
  );

  let router = Router::new().route(
    "/face-recognition",
    post(|| async { Json(json!({ "recognized": false })) }),
  );
  let client = client_for(router, Duration::from_secs(5)).await;
  assert_eq!(
    client.recognize_face(image()).await.unwrap(),
    FaceMatch::NotRecognized
  );
}
