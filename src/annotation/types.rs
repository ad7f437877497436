//! Wire types for the annotation system's projects, tasks, and annotations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Task meta key back-referencing the originating session's store key.
/// The dedup anchor: at most one task per session, ever.
pub const LINK_KEY: &str = "original_key";

/// Task meta key marking a task as consumed by verdict sync.
pub const SYNCED_KEY: &str = "synced";

/// Name of the single-choice verdict field in the label schema.
pub const VERDICT_FIELD: &str = "doctor_verdict";

/// Name of the free-text comment field in the label schema.
pub const COMMENT_FIELD: &str = "comment";

/// Label schema for the review project: one verdict choice, one optional
/// comment. Field names here are what verdict extraction looks up, so the
/// schema and [`VERDICT_FIELD`]/[`COMMENT_FIELD`] move together.
pub const LABEL_CONFIG: &str = r#"
<View>
  <Text name="prompt" value="$prompt"/>
  <Text name="response" value="$response"/>
  <Choices name="doctor_verdict" toName="response" choice="single">
    <Choice value="approved">Approved</Choice>
    <Choice value="rejected">Rejected</Choice>
  </Choices>
  <TextArea name="comment" toName="response" placeholder="Optional comment"/>
</View>
"#;

/// An annotation project, looked up by title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub title: String,
}

/// Payload of one session shown to the reviewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskData {
    pub prompt: String,
    pub response: String,
}

/// A task to import: the review payload plus back-reference metadata.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub data: TaskData,
    pub meta: BTreeMap<String, String>,
}

impl NewTask {
    /// Build an import task for a session. Meta carries the store-key
    /// back-reference and the feedback kind that put it in the sample.
    pub fn for_session(key: &str, prompt: &str, response: &str, feedback: &str) -> Self {
        let mut meta = BTreeMap::new();
        meta.insert(LINK_KEY.to_string(), key.to_string());
        meta.insert("feedback".to_string(), feedback.to_string());
        Self {
            data: TaskData {
                prompt: prompt.to_string(),
                response: response.to_string(),
            },
            meta,
        }
    }
}

/// A task as returned by the annotation system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewTask {
    pub id: u64,
    #[serde(default)]
    pub data: TaskData,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    #[serde(default)]
    pub is_labeled: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl ReviewTask {
    /// The session key this task was created from, if the back-reference
    /// is present.
    pub fn linked_key(&self) -> Option<&str> {
        self.meta.get(LINK_KEY).map(String::as_str)
    }

    /// Whether verdict sync already consumed this task.
    pub fn is_synced(&self) -> bool {
        self.meta.get(SYNCED_KEY).map(String::as_str) == Some("true")
    }

    /// Extract the verdict from the FIRST annotation — by policy the first
    /// reviewer is authoritative and later annotations are ignored.
    ///
    /// Fields are looked up by name (`doctor_verdict`, `comment`), never by
    /// position, so a reordered label schema cannot swap decision and
    /// comment.
    pub fn first_verdict(&self) -> Option<Verdict> {
        let annotation = self.annotations.first()?;

        let decision = annotation
            .result
            .iter()
            .find(|r| r.from_name.as_deref() == Some(VERDICT_FIELD))
            .or_else(|| annotation.result.iter().find(|r| !r.value.choices.is_empty()))
            .and_then(|r| r.value.choices.first())?
            .clone();

        let comment = annotation
            .result
            .iter()
            .find(|r| r.from_name.as_deref() == Some(COMMENT_FIELD))
            .or_else(|| annotation.result.iter().find(|r| !r.value.text.is_empty()))
            .and_then(|r| r.value.text.first())
            .cloned()
            .unwrap_or_default();

        Some(Verdict { decision, comment })
    }
}

/// One reviewer's submission on a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub result: Vec<AnnotationResult>,
}

/// One labeled field inside an annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationResult {
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub value: ResultValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultValue {
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub text: Vec<String>,
}

/// A reviewer's decision plus optional free-text comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub decision: String,
    pub comment: String,
}
