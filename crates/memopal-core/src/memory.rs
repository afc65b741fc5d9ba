//! The Memory aggregate, a user's record of one person.
//!
//! All mutation goes through methods on [`Memory`] so that validation, cue
//! deduplication and the `updated_at` bump are applied the same way by every
//! store backend. Backends load the record, check ownership, call one of
//! these methods and persist the result as a single operation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Types ───────────────────────────────────────────────────────────────────

/// One logged conversation snippet. `date` is assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
  pub date:    DateTime<Utc>,
  pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
  pub id:            Uuid,
  /// The owning user. Never changes after creation.
  #[serde(rename = "user")]
  pub owner_id:      Uuid,
  pub person_name:   String,
  pub relationship:  String,
  /// Deduplicated by exact string equality; order carries no meaning.
  pub cues:          Vec<String>,
  /// Storage references, in upload order.
  pub images:        Vec<String>,
  pub videos:        Vec<String>,
  /// Append-only.
  pub conversations: Vec<Conversation>,
  pub notes:         String,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Caller-supplied fields for a new memory. There is deliberately no owner
/// field: the owner is always the authenticated caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMemory {
  #[serde(default)]
  pub person_name:  String,
  #[serde(default)]
  pub relationship: String,
  #[serde(default)]
  pub notes:        String,
  #[serde(default)]
  pub cues:         Vec<String>,
  #[serde(default)]
  pub images:       Vec<String>,
  #[serde(default)]
  pub videos:       Vec<String>,
}

impl NewMemory {
  pub fn new(person_name: impl Into<String>) -> Self {
    Self { person_name: person_name.into(), ..Self::default() }
  }
}

/// A partial update. Absent fields are left untouched; conversations can
/// only be appended, never replaced.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPatch {
  pub person_name:  Option<String>,
  pub relationship: Option<String>,
  pub notes:        Option<String>,
  pub cues:         Option<Vec<String>>,
  pub images:       Option<Vec<String>>,
  pub videos:       Option<Vec<String>>,
}

// ─── Behaviour ───────────────────────────────────────────────────────────────

fn validate_person_name(name: &str) -> Result<()> {
  if name.trim().is_empty() {
    Err(Error::validation("Please add a name for this person"))
  } else {
    Ok(())
  }
}

/// Set union of `existing` and `incoming`, keeping first-seen order.
pub fn union_cues<I>(existing: &mut Vec<String>, incoming: I)
where
  I: IntoIterator<Item = String>,
{
  for cue in incoming {
    if !existing.contains(&cue) {
      existing.push(cue);
    }
  }
}

impl Memory {
  /// Build a fresh record for `owner_id`. Fails if `person_name` is blank.
  pub fn new(owner_id: Uuid, input: NewMemory) -> Result<Self> {
    validate_person_name(&input.person_name)?;
    let now = Utc::now();
    let mut cues = Vec::with_capacity(input.cues.len());
    union_cues(&mut cues, input.cues);
    Ok(Self {
      id: Uuid::new_v4(),
      owner_id,
      person_name: input.person_name,
      relationship: input.relationship,
      cues,
      images: input.images,
      videos: input.videos,
      conversations: Vec::new(),
      notes: input.notes,
      created_at: now,
      updated_at: now,
    })
  }

  /// Advance `updated_at`. Strictly increases even if the clock has not
  /// moved (or moved backwards) since the last write.
  pub fn touch(&mut self) {
    let floor = self.updated_at + Duration::microseconds(1);
    self.updated_at = Utc::now().max(floor);
  }

  /// Apply a partial update. Validation happens before any field changes.
  pub fn apply(&mut self, patch: MemoryPatch) -> Result<()> {
    if let Some(name) = &patch.person_name {
      validate_person_name(name)?;
    }
    if let Some(name) = patch.person_name {
      self.person_name = name;
    }
    if let Some(relationship) = patch.relationship {
      self.relationship = relationship;
    }
    if let Some(notes) = patch.notes {
      self.notes = notes;
    }
    if let Some(cues) = patch.cues {
      self.cues.clear();
      union_cues(&mut self.cues, cues);
    }
    if let Some(images) = patch.images {
      self.images = images;
    }
    if let Some(videos) = patch.videos {
      self.videos = videos;
    }
    self.touch();
    Ok(())
  }

  pub fn push_image(&mut self, storage_ref: String) {
    self.images.push(storage_ref);
    self.touch();
  }

  pub fn push_video(&mut self, storage_ref: String) {
    self.videos.push(storage_ref);
    self.touch();
  }

  pub fn push_conversation(&mut self, content: String) -> Result<()> {
    if content.trim().is_empty() {
      return Err(Error::validation("Please add conversation content"));
    }
    self.touch();
    self.conversations.push(Conversation { date: self.updated_at, content });
    Ok(())
  }

  pub fn merge_cues(&mut self, cues: Vec<String>) {
    union_cues(&mut self.cues, cues);
    self.touch();
  }
}
