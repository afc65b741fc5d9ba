//! [`SqliteStore`], the SQLite implementation of [`MemoPalStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use memopal_core::{
  identity::{Identity, authorize_owner},
  memory::{Memory, MemoryPatch, NewMemory},
  store::MemoPalStore,
  user::{FaceEncoding, NewUser, User, UserCredentials},
};

use crate::{
  Result,
  encode::{
    EncodedMemory, MEMORY_COLUMNS, RawMemory, RawUser, USER_COLUMNS,
    encode_dt, encode_json, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A MemoPal store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `mutate` against the caller's memory and persist the result, all
  /// inside one transaction on the connection thread.
  async fn modify<F>(&self, id: Uuid, caller: Identity, mutate: F) -> Result<Memory>
  where
    F: FnOnce(&mut Memory) -> memopal_core::Result<()> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(modify_in_tx(conn, id, caller, mutate)))
      .await?
  }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────

/// Load a memory and check that `caller` owns it. Existence is checked
/// first, so a missing id is `NotFound` for every caller.
fn load_owned(
  conn: &rusqlite::Connection,
  id: Uuid,
  caller: Identity,
) -> Result<Memory> {
  let raw = conn
    .query_row(
      &format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE memory_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawMemory::from_row,
    )
    .optional()?;

  let memory = raw
    .ok_or(memopal_core::Error::NotFound(id))?
    .into_memory()?;
  authorize_owner(caller, memory.owner_id)?;
  Ok(memory)
}

fn modify_in_tx<F>(
  conn: &mut rusqlite::Connection,
  id: Uuid,
  caller: Identity,
  mutate: F,
) -> Result<Memory>
where
  F: FnOnce(&mut Memory) -> memopal_core::Result<()>,
{
  let tx = conn.transaction()?;
  let mut memory = load_owned(&tx, id, caller)?;
  mutate(&mut memory)?;

  // owner_id and created_at are never part of an UPDATE.
  let e = EncodedMemory::new(&memory)?;
  tx.execute(
    "UPDATE memories SET
       person_name = ?2, relationship = ?3, cues = ?4, images = ?5,
       videos = ?6, conversations = ?7, notes = ?8, updated_at = ?9
     WHERE memory_id = ?1",
    rusqlite::params![
      e.memory_id,
      e.person_name,
      e.relationship,
      e.cues,
      e.images,
      e.videos,
      e.conversations,
      e.notes,
      e.updated_at,
    ],
  )?;
  tx.commit()?;
  Ok(memory)
}

fn delete_in_tx(
  conn: &mut rusqlite::Connection,
  id: Uuid,
  caller: Identity,
) -> Result<()> {
  let tx = conn.transaction()?;
  load_owned(&tx, id, caller)?;
  tx.execute(
    "DELETE FROM memories WHERE memory_id = ?1",
    rusqlite::params![encode_uuid(id)],
  )?;
  tx.commit()?;
  Ok(())
}

// ─── MemoPalStore impl ───────────────────────────────────────────────────────

impl MemoPalStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      id:         Uuid::new_v4(),
      name:       input.name,
      email:      input.email,
      face_data:  None,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(user.id);
    let name   = user.name.clone();
    let email  = user.email.clone();
    let hash   = input.password_hash;
    let at_str = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO users (user_id, name, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, email, hash, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(memopal_core::Error::DuplicateEmail.into());
    }
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email(
    &self,
    email: String,
  ) -> Result<Option<UserCredentials>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
              rusqlite::params![email],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_credentials).transpose()
  }

  async fn set_face_data(&self, id: Uuid, encoding: FaceEncoding) -> Result<User> {
    let id_str   = encode_uuid(id);
    let face_str = encode_json(&encoding)?;

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE users SET face_data = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, face_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
          rusqlite::params![id_str],
          RawUser::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw
      .ok_or(memopal_core::Error::UserNotFound)?
      .into_user()
  }

  // ── Memories ──────────────────────────────────────────────────────────────

  async fn create_memory(&self, owner: Identity, input: NewMemory) -> Result<Memory> {
    let memory = Memory::new(owner.user_id(), input)?;
    let e = EncodedMemory::new(&memory)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO memories ({MEMORY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
          ),
          rusqlite::params![
            e.memory_id,
            e.owner_id,
            e.person_name,
            e.relationship,
            e.cues,
            e.images,
            e.videos,
            e.conversations,
            e.notes,
            e.created_at,
            e.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(memory)
  }

  async fn list_memories(&self, owner: Identity) -> Result<Vec<Memory>> {
    let owner_str = encode_uuid(owner.user_id());

    let raws: Vec<RawMemory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEMORY_COLUMNS} FROM memories
           WHERE owner_id = ?1
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawMemory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMemory::into_memory).collect()
  }

  async fn get_memory(&self, id: Uuid, caller: Identity) -> Result<Memory> {
    self
      .conn
      .call(move |conn| Ok(load_owned(conn, id, caller)))
      .await?
  }

  async fn update_memory(
    &self,
    id: Uuid,
    caller: Identity,
    patch: MemoryPatch,
  ) -> Result<Memory> {
    self.modify(id, caller, move |m| m.apply(patch)).await
  }

  async fn delete_memory(&self, id: Uuid, caller: Identity) -> Result<()> {
    self
      .conn
      .call(move |conn| Ok(delete_in_tx(conn, id, caller)))
      .await?
  }

  async fn append_image(
    &self,
    id: Uuid,
    caller: Identity,
    storage_ref: String,
  ) -> Result<Memory> {
    self
      .modify(id, caller, move |m| {
        m.push_image(storage_ref);
        Ok(())
      })
      .await
  }

  async fn append_video(
    &self,
    id: Uuid,
    caller: Identity,
    storage_ref: String,
  ) -> Result<Memory> {
    self
      .modify(id, caller, move |m| {
        m.push_video(storage_ref);
        Ok(())
      })
      .await
  }

  async fn append_conversation(
    &self,
    id: Uuid,
    caller: Identity,
    content: String,
  ) -> Result<Memory> {
    self
      .modify(id, caller, move |m| m.push_conversation(content))
      .await
  }

  async fn merge_cues(
    &self,
    id: Uuid,
    caller: Identity,
    cues: Vec<String>,
  ) -> Result<Memory> {
    self
      .modify(id, caller, move |m| {
        m.merge_cues(cues);
        Ok(())
      })
      .await
  }
}
