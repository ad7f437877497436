//! Triage sampler — classify in-window sessions and bound the review sample.
//!
//! Scans every session under the source prefix, keeps those inside the time
//! window that carry explicit user feedback, and classifies them:
//! low-confidence (strictly below threshold), disliked, or other. The review
//! sample is `low_confidence ∪ disliked`, reduced to the sample size by
//! uniform random selection — a deliberately lossy reducer that bounds
//! reviewer load. The full window classification is kept so the archive
//! router can split it without re-scanning the store.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::error::PipelineError;
use crate::store::{FeedbackType, ObjectStore, SessionBody, SessionTags};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Half-open scan window `[start, end)`.
#[derive(Debug, Clone, Copy)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Trailing window ending now — used for manual invocations; periodic
    /// runs get their bounds from the scheduler instead.
    pub fn trailing(minutes: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::minutes(minutes),
            end,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// Why a session landed in (or out of) the review sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageClass {
    LowConfidence,
    Disliked,
    Other,
}

/// One classified in-window session.
#[derive(Debug, Clone, Serialize)]
pub struct TriagedSession {
    pub key: String,
    pub prompt: String,
    pub response: String,
    pub confidence: f32,
    pub feedback: FeedbackType,
    pub class: TriageClass,
}

/// Result of one triage run.
#[derive(Debug, Default)]
pub struct TriageOutcome {
    /// Every in-window session with explicit feedback, classified.
    pub all_in_window: Vec<TriagedSession>,
    /// The bounded sample flagged for human review.
    pub selected: Vec<TriagedSession>,
}

// ---------------------------------------------------------------------------
// Sampler
// ---------------------------------------------------------------------------

/// Scan, classify, and sample one time window.
///
/// Malformed or unreadable session objects are logged and skipped; only a
/// failing store listing aborts the scan.
pub fn run_triage<R: Rng>(
    store: &dyn ObjectStore,
    window: &TimeWindow,
    prefix: &str,
    sample_size: usize,
    low_confidence_threshold: f32,
    rng: &mut R,
) -> Result<TriageOutcome, PipelineError> {
    let mut low_confidence = Vec::new();
    let mut disliked = Vec::new();
    let mut others = Vec::new();

    for key in store.list(prefix)? {
        // Tags first: sessions without explicit feedback skip the body read.
        let tags = match store.get_tags(&key) {
            Ok(raw) => SessionTags::from_tag_set(&raw),
            Err(e) => {
                tracing::warn!(key, error = %e, "Skipping session with unreadable tags");
                continue;
            }
        };
        if tags.feedback_type == FeedbackType::None {
            continue;
        }

        let body: SessionBody = match store.get(&key).map_err(|e| e.to_string()).and_then(|bytes| {
            serde_json::from_slice(&bytes).map_err(|e| e.to_string())
        }) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(key, error = %e, "Skipping malformed session object");
                continue;
            }
        };

        let Some(ts) = body.parsed_timestamp() else {
            continue;
        };
        if !window.contains(ts) {
            continue;
        }

        // Missing confidence reads as fully confident — only an explicit
        // low score routes a liked answer to review.
        let confidence = tags.confidence.unwrap_or(1.0);
        let class = if confidence < low_confidence_threshold {
            TriageClass::LowConfidence
        } else if tags.feedback_type == FeedbackType::Dislike {
            TriageClass::Disliked
        } else {
            TriageClass::Other
        };

        let session = TriagedSession {
            key,
            prompt: body.prompt,
            response: body.response,
            confidence,
            feedback: tags.feedback_type,
            class,
        };

        match class {
            TriageClass::LowConfidence => low_confidence.push(session),
            TriageClass::Disliked => disliked.push(session),
            TriageClass::Other => others.push(session),
        }
    }

    let mut selected: Vec<TriagedSession> = low_confidence
        .iter()
        .chain(disliked.iter())
        .cloned()
        .collect();
    if selected.len() > sample_size {
        selected = selected
            .choose_multiple(rng, sample_size)
            .cloned()
            .collect();
    }

    tracing::info!(
        low_confidence = low_confidence.len(),
        disliked = disliked.len(),
        other = others.len(),
        selected = selected.len(),
        "Triage scan complete"
    );

    let mut all_in_window = low_confidence;
    all_in_window.extend(disliked);
    all_in_window.extend(others);

    Ok(TriageOutcome {
        all_in_window,
        selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::store::{put_session, MemoryObjectStore, SessionTags};

    const PREFIX: &str = "conversation_logs/";

    fn window() -> TimeWindow {
        TimeWindow::new(
            "2025-05-10T00:00:00Z".parse().unwrap(),
            "2025-05-11T00:00:00Z".parse().unwrap(),
        )
    }

    fn seed_session(
        store: &MemoryObjectStore,
        id: &str,
        ts: &str,
        feedback: FeedbackType,
        confidence: f32,
    ) {
        let body = SessionBody {
            prompt: format!("prompt {id}"),
            response: format!("response {id}"),
            temperature: None,
            top_p: None,
            timestamp: ts.into(),
            session_id: Some(id.into()),
        };
        let mut tags = SessionTags::needs_review();
        tags.feedback_type = feedback;
        tags.confidence = Some(confidence);
        put_session(store, PREFIX, &body, &tags).unwrap();
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn triage(store: &MemoryObjectStore, sample_size: usize) -> TriageOutcome {
        run_triage(store, &window(), PREFIX, sample_size, 0.7, &mut rng()).unwrap()
    }

    #[test]
    fn feedback_none_is_never_eligible() {
        let store = MemoryObjectStore::new();
        seed_session(&store, "a", "2025-05-10T10:00:00Z", FeedbackType::None, 0.1);
        seed_session(&store, "b", "2025-05-10T10:00:00Z", FeedbackType::Like, 0.9);

        let outcome = triage(&store, 5);
        assert_eq!(outcome.all_in_window.len(), 1);
        assert!(outcome.selected.is_empty());
        assert_eq!(outcome.all_in_window[0].key, "conversation_logs/b.json");
    }

    #[test]
    fn classification_low_confidence_wins_over_dislike() {
        let store = MemoryObjectStore::new();
        seed_session(&store, "a", "2025-05-10T10:00:00Z", FeedbackType::Dislike, 0.2);

        let outcome = triage(&store, 5);
        assert_eq!(outcome.all_in_window[0].class, TriageClass::LowConfidence);
    }

    #[test]
    fn exact_threshold_is_not_low_confidence() {
        let store = MemoryObjectStore::new();
        seed_session(&store, "a", "2025-05-10T10:00:00Z", FeedbackType::Like, 0.7);
        seed_session(&store, "b", "2025-05-10T10:00:00Z", FeedbackType::Dislike, 0.7);

        let outcome = triage(&store, 5);
        let by_key = |k: &str| {
            outcome
                .all_in_window
                .iter()
                .find(|s| s.key.contains(k))
                .unwrap()
                .class
        };
        // strict `<`: exactly 0.7 never classifies as low-confidence
        assert_eq!(by_key("a.json"), TriageClass::Other);
        assert_eq!(by_key("b.json"), TriageClass::Disliked);
        assert_eq!(outcome.selected.len(), 1);
    }

    #[test]
    fn out_of_window_sessions_are_skipped() {
        let store = MemoryObjectStore::new();
        seed_session(&store, "old", "2025-05-09T23:59:59Z", FeedbackType::Dislike, 0.2);
        seed_session(&store, "edge", "2025-05-11T00:00:00Z", FeedbackType::Dislike, 0.2);
        seed_session(&store, "in", "2025-05-10T00:00:00Z", FeedbackType::Dislike, 0.2);

        let outcome = triage(&store, 5);
        assert_eq!(outcome.all_in_window.len(), 1);
        assert!(outcome.all_in_window[0].key.contains("in.json"));
    }

    #[test]
    fn malformed_body_is_skipped_not_fatal() {
        let store = MemoryObjectStore::new();
        store
            .put("conversation_logs/bad.json", b"not json", "application/json")
            .unwrap();
        let mut tags = SessionTags::needs_review();
        tags.feedback_type = FeedbackType::Dislike;
        store
            .put_tags("conversation_logs/bad.json", &tags.to_tag_set())
            .unwrap();
        seed_session(&store, "ok", "2025-05-10T10:00:00Z", FeedbackType::Dislike, 0.2);

        let outcome = triage(&store, 5);
        assert_eq!(outcome.all_in_window.len(), 1);
    }

    #[test]
    fn missing_timestamp_is_skipped() {
        let store = MemoryObjectStore::new();
        seed_session(&store, "a", "", FeedbackType::Dislike, 0.2);
        let outcome = triage(&store, 5);
        assert!(outcome.all_in_window.is_empty());
    }

    #[test]
    fn sample_is_bounded_exactly() {
        let store = MemoryObjectStore::new();
        for i in 0..12 {
            seed_session(
                &store,
                &format!("s{i:02}"),
                "2025-05-10T10:00:00Z",
                FeedbackType::Dislike,
                0.2,
            );
        }

        let outcome = triage(&store, 5);
        assert_eq!(outcome.all_in_window.len(), 12);
        assert_eq!(outcome.selected.len(), 5);
    }

    #[test]
    fn fixed_seed_reproduces_the_same_subset() {
        let store = MemoryObjectStore::new();
        for i in 0..12 {
            seed_session(
                &store,
                &format!("s{i:02}"),
                "2025-05-10T10:00:00Z",
                FeedbackType::Dislike,
                0.2,
            );
        }

        let keys = |outcome: TriageOutcome| -> Vec<String> {
            outcome.selected.into_iter().map(|s| s.key).collect()
        };
        let first = keys(triage(&store, 5));
        let second = keys(triage(&store, 5));
        assert_eq!(first, second);
    }

    #[test]
    fn missing_confidence_reads_as_confident() {
        let store = MemoryObjectStore::new();
        let body = SessionBody {
            prompt: "p".into(),
            response: "r".into(),
            temperature: None,
            top_p: None,
            timestamp: "2025-05-10T10:00:00Z".into(),
            session_id: Some("a".into()),
        };
        let mut tags = SessionTags::needs_review();
        tags.feedback_type = FeedbackType::Like;
        tags.confidence = None;
        put_session(&store, PREFIX, &body, &tags).unwrap();

        let outcome = triage(&store, 5);
        assert_eq!(outcome.all_in_window[0].class, TriageClass::Other);
    }

    #[test]
    fn trailing_window_spans_the_requested_minutes() {
        let w = TimeWindow::trailing(30);
        assert_eq!(w.end - w.start, Duration::minutes(30));
        assert!(!w.contains(w.end));
        assert!(w.contains(w.start));
    }
}
