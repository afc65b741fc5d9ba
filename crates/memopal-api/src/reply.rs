//! The `{success, …}` envelope every response is wrapped in.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataReply<T> {
  pub success: bool,
  pub data:    T,
}

#[derive(Debug, Serialize)]
pub struct ListReply<T> {
  pub success: bool,
  pub count:   usize,
  pub data:    Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct TokenReply {
  pub success: bool,
  pub token:   String,
}

#[derive(Debug, Serialize)]
pub struct ErrorReply {
  pub success: bool,
  pub error:   String,
}

/// Serialises as `{}`.
#[derive(Debug, Serialize)]
pub struct Empty {}

pub fn data<T: Serialize>(data: T) -> Json<DataReply<T>> {
  Json(DataReply { success: true, data })
}

pub fn list<T: Serialize>(data: Vec<T>) -> Json<ListReply<T>> {
  Json(ListReply { success: true, count: data.len(), data })
}

pub fn token(token: String) -> Json<TokenReply> {
  Json(TokenReply { success: true, token })
}

impl ErrorReply {
  pub fn new(error: String) -> Self { Self { success: false, error } }
}
