//! Typed session model on top of the raw object + tag contract.
//!
//! A session is one logged prompt/response exchange. The body is written
//! once by the serving layer and never changes; review state lives entirely
//! in the tag set so it is queryable without body reads. `SessionTags`
//! owns the two monotonic transitions: `status` moves only
//! needs_review → approved|rejected, `processed` only false → true.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::object::{ObjectStore, StoreError, TagSet};

// ---------------------------------------------------------------------------
// Tag contract
// ---------------------------------------------------------------------------

/// Tag values are capped by the underlying store; longer comments are
/// truncated on a UTF-8 boundary.
pub const MAX_TAG_VALUE_BYTES: usize = 255;

pub const TAG_STATUS: &str = "status";
pub const TAG_PROCESSED: &str = "processed";
pub const TAG_FEEDBACK_TYPE: &str = "feedback_type";
pub const TAG_CONFIDENCE: &str = "confidence";
pub const TAG_DOCTOR_COMMENT: &str = "doctor_comment";

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Immutable session body, stored as JSON by the serving layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionBody {
    pub prompt: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// RFC 3339 generation timestamp.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl SessionBody {
    /// Parse the generation timestamp. `None` when missing or malformed —
    /// such sessions are never triage-eligible.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ---------------------------------------------------------------------------
// Review status & feedback
// ---------------------------------------------------------------------------

/// Review state of a session. Transitions only forward:
/// `NeedsReview → Approved | Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    NeedsReview,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeedsReview => "needs_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "needs_review" => Some(Self::NeedsReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// A decided session never moves again.
    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// End-user feedback attached by the serving layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    #[default]
    None,
    Like,
    Dislike,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    /// Unknown values read as `None` — the session simply stays out of triage.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "like" => Self::Like,
            "dislike" => Self::Dislike,
            _ => Self::None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tag set, typed
// ---------------------------------------------------------------------------

/// Typed view of a session's tag set.
///
/// Tags this subsystem does not own are carried through `extra` verbatim so
/// a read-modify-write never drops another writer's keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTags {
    pub status: Option<ReviewStatus>,
    pub processed: bool,
    pub feedback_type: FeedbackType,
    pub confidence: Option<f32>,
    pub doctor_comment: Option<String>,
    extra: TagSet,
}

impl SessionTags {
    /// Initial tag set for a freshly logged session.
    pub fn needs_review() -> Self {
        Self {
            status: Some(ReviewStatus::NeedsReview),
            ..Self::default()
        }
    }

    pub fn from_tag_set(tags: &TagSet) -> Self {
        let mut parsed = Self::default();
        for (key, value) in tags {
            match key.as_str() {
                TAG_STATUS => parsed.status = ReviewStatus::parse(value),
                TAG_PROCESSED => parsed.processed = value == "true",
                TAG_FEEDBACK_TYPE => parsed.feedback_type = FeedbackType::parse(value),
                TAG_CONFIDENCE => parsed.confidence = value.parse().ok(),
                TAG_DOCTOR_COMMENT => parsed.doctor_comment = Some(value.clone()),
                _ => {
                    parsed.extra.insert(key.clone(), value.clone());
                }
            }
        }
        parsed
    }

    pub fn to_tag_set(&self) -> TagSet {
        let mut tags = self.extra.clone();
        if let Some(status) = self.status {
            tags.insert(TAG_STATUS.into(), status.as_str().into());
        }
        if self.processed {
            tags.insert(TAG_PROCESSED.into(), "true".into());
        }
        if self.feedback_type != FeedbackType::None {
            tags.insert(TAG_FEEDBACK_TYPE.into(), self.feedback_type.as_str().into());
        }
        if let Some(confidence) = self.confidence {
            tags.insert(TAG_CONFIDENCE.into(), confidence.to_string());
        }
        if let Some(comment) = &self.doctor_comment {
            tags.insert(
                TAG_DOCTOR_COMMENT.into(),
                truncate_to_bytes(comment, MAX_TAG_VALUE_BYTES).into(),
            );
        }
        tags
    }

    /// Merge a reviewer verdict into the tag set.
    ///
    /// Monotonic: once a session is approved or rejected, later verdicts are
    /// ignored and `false` is returned. The comment is truncated to the tag
    /// value cap.
    pub fn apply_verdict(&mut self, verdict: ReviewStatus, comment: &str) -> bool {
        if self.status.is_some_and(|s| s.is_decided()) {
            return false;
        }
        self.status = Some(verdict);
        self.processed = true;
        self.doctor_comment = Some(truncate_to_bytes(comment, MAX_TAG_VALUE_BYTES).to_string());
        true
    }
}

/// Truncate to at most `max` bytes without splitting a UTF-8 code point.
pub fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ---------------------------------------------------------------------------
// Store helpers
// ---------------------------------------------------------------------------

/// Object-store key for a session id under a source prefix.
pub fn session_key(prefix: &str, session_id: &str) -> String {
    format!("{prefix}{session_id}.json")
}

/// Write a new session record: the JSON body plus its initial tag set.
///
/// Shared by the serving layer's logging path and by tests. Returns the
/// store key. The session id comes from the body, or is minted here.
pub fn put_session(
    store: &dyn ObjectStore,
    prefix: &str,
    body: &SessionBody,
    tags: &SessionTags,
) -> Result<String, StoreError> {
    let session_id = body
        .session_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let key = session_key(prefix, &session_id);

    let bytes = serde_json::to_vec(body).map_err(|e| StoreError::Malformed {
        key: key.clone(),
        detail: e.to_string(),
    })?;

    store.put(&key, &bytes, "application/json")?;
    store.put_tags(&key, &tags.to_tag_set())?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;

    fn body(ts: &str) -> SessionBody {
        SessionBody {
            prompt: "What is the dose?".into(),
            response: "Take 400mg.".into(),
            temperature: Some(0.7),
            top_p: Some(0.95),
            timestamp: ts.into(),
            session_id: Some("abc-123".into()),
        }
    }

    #[test]
    fn timestamp_parses_with_zulu_suffix() {
        let parsed = body("2025-05-10T12:00:00Z").parsed_timestamp();
        assert!(parsed.is_some());
    }

    #[test]
    fn timestamp_parses_with_offset() {
        let parsed = body("2025-05-10T12:00:00+08:00").parsed_timestamp();
        assert!(parsed.is_some());
    }

    #[test]
    fn malformed_timestamp_is_none() {
        assert!(body("yesterday").parsed_timestamp().is_none());
        assert!(body("").parsed_timestamp().is_none());
    }

    #[test]
    fn tag_round_trip_preserves_fields() {
        let mut tags = SessionTags::needs_review();
        tags.feedback_type = FeedbackType::Dislike;
        tags.confidence = Some(0.55);

        let parsed = SessionTags::from_tag_set(&tags.to_tag_set());
        assert_eq!(parsed.status, Some(ReviewStatus::NeedsReview));
        assert_eq!(parsed.feedback_type, FeedbackType::Dislike);
        assert_eq!(parsed.confidence, Some(0.55));
        assert!(!parsed.processed);
    }

    #[test]
    fn foreign_tags_survive_round_trip() {
        let mut raw = TagSet::new();
        raw.insert("status".into(), "needs_review".into());
        raw.insert("tenant".into(), "clinic-7".into());

        let mut tags = SessionTags::from_tag_set(&raw);
        tags.apply_verdict(ReviewStatus::Approved, "fine");

        let written = tags.to_tag_set();
        assert_eq!(written.get("tenant").map(String::as_str), Some("clinic-7"));
        assert_eq!(written.get("status").map(String::as_str), Some("approved"));
    }

    #[test]
    fn apply_verdict_sets_status_processed_comment() {
        let mut tags = SessionTags::needs_review();
        assert!(tags.apply_verdict(ReviewStatus::Rejected, "wrong dosage"));
        assert_eq!(tags.status, Some(ReviewStatus::Rejected));
        assert!(tags.processed);
        assert_eq!(tags.doctor_comment.as_deref(), Some("wrong dosage"));
    }

    #[test]
    fn apply_verdict_never_reverses_a_decision() {
        let mut tags = SessionTags::needs_review();
        assert!(tags.apply_verdict(ReviewStatus::Approved, ""));
        assert!(!tags.apply_verdict(ReviewStatus::Rejected, "second opinion"));
        assert_eq!(tags.status, Some(ReviewStatus::Approved));
        assert_eq!(tags.doctor_comment.as_deref(), Some(""));
    }

    #[test]
    fn comment_truncated_to_255_bytes() {
        let long = "x".repeat(300);
        let mut tags = SessionTags::needs_review();
        tags.apply_verdict(ReviewStatus::Rejected, &long);
        assert_eq!(tags.doctor_comment.as_ref().unwrap().len(), 255);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 3-byte characters; 255 is not a multiple of 3
        let long = "注".repeat(100);
        let cut = truncate_to_bytes(&long, MAX_TAG_VALUE_BYTES);
        assert!(cut.len() <= MAX_TAG_VALUE_BYTES);
        assert_eq!(cut.len() % 3, 0);
        assert!(long.starts_with(cut));
    }

    #[test]
    fn unknown_feedback_reads_as_none() {
        assert_eq!(FeedbackType::parse("meh"), FeedbackType::None);
        assert_eq!(FeedbackType::parse(""), FeedbackType::None);
    }

    #[test]
    fn put_session_writes_body_and_tags() {
        let store = MemoryObjectStore::new();
        let key = put_session(
            &store,
            "conversation_logs/",
            &body("2025-05-10T12:00:00Z"),
            &SessionTags::needs_review(),
        )
        .unwrap();

        assert_eq!(key, "conversation_logs/abc-123.json");
        let stored: SessionBody = serde_json::from_slice(&store.get(&key).unwrap()).unwrap();
        assert_eq!(stored.response, "Take 400mg.");

        let tags = SessionTags::from_tag_set(&store.get_tags(&key).unwrap());
        assert_eq!(tags.status, Some(ReviewStatus::NeedsReview));
    }

    #[test]
    fn put_session_mints_id_when_absent() {
        let store = MemoryObjectStore::new();
        let mut b = body("2025-05-10T12:00:00Z");
        b.session_id = None;
        let key = put_session(&store, "conversation_logs/", &b, &SessionTags::default()).unwrap();
        assert!(key.starts_with("conversation_logs/"));
        assert!(key.ends_with(".json"));
    }
}
