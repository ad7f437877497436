//! Archive router — split the triaged window into holding areas.
//!
//! Selected sessions are copied under the review-wait prefix, everything
//! else in the window under the noisy prefix. Downstream consumers (the
//! training-data curation jobs) read those areas instead of re-scanning
//! the source. Copies go through the store's own get/put so any adapter
//! works; per-item failures are logged and skipped.

use std::collections::HashSet;

use serde::Serialize;

use super::triage::TriageOutcome;
use crate::store::{ObjectStore, StoreError};

/// Outcome of one archive run.
#[derive(Debug, Default, Serialize)]
pub struct ArchiveReport {
    pub to_review_wait: usize,
    pub to_noisy: usize,
    pub failed: usize,
}

/// Copy every in-window session into its holding area.
pub fn run_archive(
    store: &dyn ObjectStore,
    outcome: &TriageOutcome,
    source_prefix: &str,
    review_wait_prefix: &str,
    noisy_prefix: &str,
) -> ArchiveReport {
    let selected_keys: HashSet<&str> =
        outcome.selected.iter().map(|s| s.key.as_str()).collect();

    let mut report = ArchiveReport::default();
    for session in &outcome.all_in_window {
        let selected = selected_keys.contains(session.key.as_str());
        let target_prefix = if selected {
            review_wait_prefix
        } else {
            noisy_prefix
        };

        let suffix = session
            .key
            .strip_prefix(source_prefix)
            .unwrap_or(&session.key);
        let target = format!("{target_prefix}{suffix}");

        match copy_object(store, &session.key, &target) {
            Ok(()) => {
                if selected {
                    report.to_review_wait += 1;
                } else {
                    report.to_noisy += 1;
                }
            }
            Err(e) => {
                tracing::warn!(key = %session.key, error = %e, "Archive copy failed");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        review_wait = report.to_review_wait,
        noisy = report.to_noisy,
        failed = report.failed,
        "Archive split complete"
    );
    report
}

/// Copy body and tags. The contract has no native copy, so this is
/// get + put on both halves.
fn copy_object(store: &dyn ObjectStore, from: &str, to: &str) -> Result<(), StoreError> {
    let body = store.get(from)?;
    store.put(to, &body, "application/json")?;
    let tags = store.get_tags(from)?;
    store.put_tags(to, &tags)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::triage::{TriageClass, TriagedSession};
    use crate::store::{FeedbackType, MemoryObjectStore, TagSet};

    fn session(key: &str, class: TriageClass) -> TriagedSession {
        TriagedSession {
            key: key.to_string(),
            prompt: "p".into(),
            response: "r".into(),
            confidence: 0.5,
            feedback: FeedbackType::Dislike,
            class,
        }
    }

    fn seed(store: &MemoryObjectStore, key: &str) {
        store.put(key, b"{\"x\":1}", "application/json").unwrap();
        let mut tags = TagSet::new();
        tags.insert("feedback_type".into(), "dislike".into());
        store.put_tags(key, &tags).unwrap();
    }

    #[test]
    fn splits_selected_from_rest() {
        let store = MemoryObjectStore::new();
        seed(&store, "conversation_logs/a.json");
        seed(&store, "conversation_logs/b.json");

        let picked = session("conversation_logs/a.json", TriageClass::Disliked);
        let outcome = TriageOutcome {
            all_in_window: vec![
                picked.clone(),
                session("conversation_logs/b.json", TriageClass::Other),
            ],
            selected: vec![picked],
        };

        let report = run_archive(
            &store,
            &outcome,
            "conversation_logs/",
            "review_wait/",
            "noisy/",
        );
        assert_eq!(report.to_review_wait, 1);
        assert_eq!(report.to_noisy, 1);
        assert_eq!(report.failed, 0);

        assert!(store.get("review_wait/a.json").is_ok());
        assert!(store.get("noisy/b.json").is_ok());
        // tags travel with the body
        assert_eq!(
            store
                .get_tags("review_wait/a.json")
                .unwrap()
                .get("feedback_type")
                .map(String::as_str),
            Some("dislike")
        );
    }

    #[test]
    fn missing_source_is_counted_not_fatal() {
        let store = MemoryObjectStore::new();
        seed(&store, "conversation_logs/ok.json");

        let ghost = session("conversation_logs/ghost.json", TriageClass::Other);
        let ok = session("conversation_logs/ok.json", TriageClass::Other);
        let outcome = TriageOutcome {
            all_in_window: vec![ghost, ok],
            selected: vec![],
        };

        let report = run_archive(
            &store,
            &outcome,
            "conversation_logs/",
            "review_wait/",
            "noisy/",
        );
        assert_eq!(report.failed, 1);
        assert_eq!(report.to_noisy, 1);
    }

    #[test]
    fn empty_window_copies_nothing() {
        let store = MemoryObjectStore::new();
        let report = run_archive(
            &store,
            &TriageOutcome::default(),
            "conversation_logs/",
            "review_wait/",
            "noisy/",
        );
        assert_eq!(report.to_review_wait + report.to_noisy + report.failed, 0);
    }
}
