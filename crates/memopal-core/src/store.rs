//! The `MemoPalStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `memopal-store-sqlite`).
//! Higher layers (`memopal-api`, the gateway) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  identity::Identity,
  memory::{Memory, MemoryPatch, NewMemory},
  user::{FaceEncoding, NewUser, User, UserCredentials},
};

/// Abstraction over a MemoPal store backend.
///
/// Every memory operation that takes a caller [`Identity`] must:
///
/// 1. fail with [`crate::Error::NotFound`] if no memory has that id,
/// 2. otherwise fail with [`crate::Error::Forbidden`] if the caller is not
///    the owner,
/// 3. otherwise apply the change,
///
/// all within one backend operation, so no other write can slip in between
/// the ownership check and the mutation.
///
/// Backend errors convert into [`crate::Error`]; domain failures raised by
/// the backend must arrive as the matching core variant.
pub trait MemoPalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails with [`crate::Error::DuplicateEmail`] if the
  /// email is taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look a user up by normalised email, including the password hash.
  fn find_user_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<UserCredentials>, Self::Error>> + Send + '_;

  /// Attach (or replace) the face encoding of a user. Fails with
  /// [`crate::Error::UserNotFound`] if the user does not exist.
  fn set_face_data(
    &self,
    id: Uuid,
    encoding: FaceEncoding,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Memories ──────────────────────────────────────────────────────────

  /// Create a memory owned by `owner`. The owner is never taken from input.
  fn create_memory(
    &self,
    owner: Identity,
    input: NewMemory,
  ) -> impl Future<Output = Result<Memory, Self::Error>> + Send + '_;

  /// All memories owned by `owner`, oldest first.
  fn list_memories(
    &self,
    owner: Identity,
  ) -> impl Future<Output = Result<Vec<Memory>, Self::Error>> + Send + '_;

  fn get_memory(
    &self,
    id: Uuid,
    caller: Identity,
  ) -> impl Future<Output = Result<Memory, Self::Error>> + Send + '_;

  fn update_memory(
    &self,
    id: Uuid,
    caller: Identity,
    patch: MemoryPatch,
  ) -> impl Future<Output = Result<Memory, Self::Error>> + Send + '_;

  /// Hard delete.
  fn delete_memory(
    &self,
    id: Uuid,
    caller: Identity,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn append_image(
    &self,
    id: Uuid,
    caller: Identity,
    storage_ref: String,
  ) -> impl Future<Output = Result<Memory, Self::Error>> + Send + '_;

  fn append_video(
    &self,
    id: Uuid,
    caller: Identity,
    storage_ref: String,
  ) -> impl Future<Output = Result<Memory, Self::Error>> + Send + '_;

  /// Append a conversation entry; its date is assigned by the store.
  fn append_conversation(
    &self,
    id: Uuid,
    caller: Identity,
    content: String,
  ) -> impl Future<Output = Result<Memory, Self::Error>> + Send + '_;

  /// Set-union `cues` into the memory's existing cues.
  fn merge_cues(
    &self,
    id: Uuid,
    caller: Identity,
    cues: Vec<String>,
  ) -> impl Future<Output = Result<Memory, Self::Error>> + Send + '_;
}
