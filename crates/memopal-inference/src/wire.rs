//! JSON shapes exchanged with the inference service, and their validation
//! into the typed results of [`memopal_core::inference`].

use memopal_core::{
  inference::{CueContext, CueSuggestion, FaceMatch, PersonMatch},
  user::FaceEncoding,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /generate-cues`.
#[derive(Debug, Serialize)]
pub struct CueRequest<'a> {
  pub context:  &'a CueContext,
  pub question: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CueReply {
  pub answer: String,
  #[serde(default)]
  pub cues:   Vec<String>,
}

impl From<CueReply> for CueSuggestion {
  fn from(r: CueReply) -> Self {
    CueSuggestion { answer: r.answer, cues: r.cues }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizePersonReply {
  pub recognized: bool,
  pub memory_id:  Option<String>,
}

impl TryFrom<RecognizePersonReply> for PersonMatch {
  type Error = String;

  fn try_from(r: RecognizePersonReply) -> Result<Self, Self::Error> {
    if !r.recognized {
      return Ok(PersonMatch::NotRecognized);
    }
    let raw = r
      .memory_id
      .ok_or_else(|| "recognized without a memoryId".to_string())?;
    let memory_id = Uuid::parse_str(&raw)
      .map_err(|e| format!("memoryId {raw:?} is not a UUID: {e}"))?;
    Ok(PersonMatch::Recognized { memory_id })
  }
}

#[derive(Debug, Deserialize)]
pub struct FaceEncodingReply {
  pub encoding: Vec<f64>,
}

impl TryFrom<FaceEncodingReply> for FaceEncoding {
  type Error = String;

  fn try_from(r: FaceEncodingReply) -> Result<Self, Self::Error> {
    if r.encoding.is_empty() {
      Err("empty encoding".to_string())
    } else {
      Ok(FaceEncoding(r.encoding))
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct FaceRecognitionReply {
  pub recognized: bool,
  pub email:      Option<String>,
}

impl TryFrom<FaceRecognitionReply> for FaceMatch {
  type Error = String;

  fn try_from(r: FaceRecognitionReply) -> Result<Self, Self::Error> {
    match (r.recognized, r.email) {
      (false, _) => Ok(FaceMatch::NotRecognized),
      (true, Some(email)) if !email.trim().is_empty() => {
        Ok(FaceMatch::Recognized { email })
      }
      (true, _) => Err("recognized without an email".to_string()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse<T: serde::de::DeserializeOwned>(json: &str) -> T {
    serde_json::from_str(json).unwrap()
  }

  #[test]
  fn cue_reply_without_cues_is_empty() {
    let s: CueSuggestion = parse::<CueReply>(r#"{"answer":"hi"}"#).into();
    assert!(s.cues.is_empty());
  }

  #[test]
  fn cue_reply_with_non_string_cues_fails() {
    assert!(serde_json::from_str::<CueReply>(r#"{"answer":"a","cues":[1]}"#).is_err());
    assert!(serde_json::from_str::<CueReply>(r#"{"cues":[]}"#).is_err());
  }

  #[test]
  fn person_match_requires_uuid() {
    let id = Uuid::new_v4();
    let ok = PersonMatch::try_from(parse::<RecognizePersonReply>(&format!(
      r#"{{"recognized":true,"memoryId":"{id}"}}"#
    )));
    assert_eq!(ok, Ok(PersonMatch::Recognized { memory_id: id }));

    let missing = PersonMatch::try_from(parse::<RecognizePersonReply>(
      r#"{"recognized":true}"#,
    ));
    assert!(missing.is_err());

    let garbage = PersonMatch::try_from(parse::<RecognizePersonReply>(
      r#"{"recognized":true,"memoryId":"507f1f77bcf86cd799439011"}"#,
    ));
    assert!(garbage.is_err());

    let no = PersonMatch::try_from(parse::<RecognizePersonReply>(
      r#"{"recognized":false}"#,
    ));
    assert_eq!(no, Ok(PersonMatch::NotRecognized));
  }

  #[test]
  fn face_match_requires_email() {
    let yes = FaceMatch::try_from(parse::<FaceRecognitionReply>(
      r#"{"recognized":true,"email":"a@x.com"}"#,
    ));
    assert_eq!(yes, Ok(FaceMatch::Recognized { email: "a@x.com".into() }));

    let bad = FaceMatch::try_from(parse::<FaceRecognitionReply>(
      r#"{"recognized":true,"email":""}"#,
    ));
    assert!(bad.is_err());

    let no = FaceMatch::try_from(parse::<FaceRecognitionReply>(
      r#"{"recognized":false,"email":null}"#,
    ));
    assert_eq!(no, Ok(FaceMatch::NotRecognized));
  }

  #[test]
  fn empty_encoding_is_rejected() {
    assert!(FaceEncoding::try_from(FaceEncodingReply { encoding: vec![] }).is_err());
  }
}
