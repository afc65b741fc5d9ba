//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings with full sub-second
//! precision. List-valued fields are stored as compact JSON arrays. UUIDs
//! are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use memopal_core::{
  memory::{Conversation, Memory},
  user::{FaceEncoding, User, UserCredentials},
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ─────────────────────────────────────────────────────────────

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str =
  "user_id, name, email, password_hash, face_data, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub face_data:     Option<String>,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      name:          row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      face_data:     row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_credentials(self) -> Result<UserCredentials> {
    let face_data = self
      .face_data
      .as_deref()
      .map(decode_json::<FaceEncoding>)
      .transpose()?;

    Ok(UserCredentials {
      user:          User {
        id: decode_uuid(&self.user_id)?,
        name: self.name,
        email: self.email,
        face_data,
        created_at: decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }

  pub fn into_user(self) -> Result<User> { Ok(self.into_credentials()?.user) }
}

/// Column list matching [`RawMemory::from_row`].
pub const MEMORY_COLUMNS: &str = "memory_id, owner_id, person_name, \
   relationship, cues, images, videos, conversations, notes, created_at, \
   updated_at";

/// Raw strings read directly from a `memories` row.
pub struct RawMemory {
  pub memory_id:     String,
  pub owner_id:      String,
  pub person_name:   String,
  pub relationship:  String,
  pub cues:          String,
  pub images:        String,
  pub videos:        String,
  pub conversations: String,
  pub notes:         String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawMemory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      memory_id:     row.get(0)?,
      owner_id:      row.get(1)?,
      person_name:   row.get(2)?,
      relationship:  row.get(3)?,
      cues:          row.get(4)?,
      images:        row.get(5)?,
      videos:        row.get(6)?,
      conversations: row.get(7)?,
      notes:         row.get(8)?,
      created_at:    row.get(9)?,
      updated_at:    row.get(10)?,
    })
  }

  pub fn into_memory(self) -> Result<Memory> {
    Ok(Memory {
      id:            decode_uuid(&self.memory_id)?,
      owner_id:      decode_uuid(&self.owner_id)?,
      person_name:   self.person_name,
      relationship:  self.relationship,
      cues:          decode_json(&self.cues)?,
      images:        decode_json(&self.images)?,
      videos:        decode_json(&self.videos)?,
      conversations: decode_json::<Vec<Conversation>>(&self.conversations)?,
      notes:         self.notes,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// A memory flattened into column values, ready for `INSERT`/`UPDATE`.
pub struct EncodedMemory {
  pub memory_id:     String,
  pub owner_id:      String,
  pub person_name:   String,
  pub relationship:  String,
  pub cues:          String,
  pub images:        String,
  pub videos:        String,
  pub conversations: String,
  pub notes:         String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl EncodedMemory {
  pub fn new(memory: &Memory) -> Result<Self> {
    Ok(Self {
      memory_id:     encode_uuid(memory.id),
      owner_id:      encode_uuid(memory.owner_id),
      person_name:   memory.person_name.clone(),
      relationship:  memory.relationship.clone(),
      cues:          encode_json(&memory.cues)?,
      images:        encode_json(&memory.images)?,
      videos:        encode_json(&memory.videos)?,
      conversations: encode_json(&memory.conversations)?,
      notes:         memory.notes.clone(),
      created_at:    encode_dt(memory.created_at),
      updated_at:    encode_dt(memory.updated_at),
    })
  }
}
