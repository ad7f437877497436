//! Verdict sync — write completed annotations back into session tags.
//!
//! For every labeled, not-yet-synced task: extract the first reviewer's
//! verdict, read-modify-write the linked session's tag set (full replace —
//! the store has no partial update), and mark the task synced so the next
//! run skips it. A failure on one session never aborts the rest of the
//! batch; the failed task stays unsynced and is retried on the next run,
//! which the monotonic status transition makes harmless.

use serde::Serialize;

use super::error::PipelineError;
use crate::annotation::{AnnotationBackend, ReviewTask, SYNCED_KEY};
use crate::store::{ObjectStore, ReviewStatus, SessionTags};

/// Outcome of one sync run.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    /// Verdicts written back and tasks marked synced.
    pub synced: usize,
    /// Labeled tasks skipped: no usable verdict, no back-reference, or an
    /// unknown decision value.
    pub skipped: usize,
    /// Tasks whose write-back or mark failed; retried next run.
    pub failed: usize,
}

/// Sync all completed, unsynced tasks of the review project.
///
/// The project must already exist — sync never creates it. Its absence is
/// the named precondition error, distinct from a transport failure.
pub fn run_sync(
    store: &dyn ObjectStore,
    gateway: &dyn AnnotationBackend,
    project_title: &str,
) -> Result<SyncReport, PipelineError> {
    let project = gateway
        .find_project(project_title)?
        .ok_or_else(|| PipelineError::ProjectNotFound(project_title.to_string()))?;

    let mut report = SyncReport::default();
    for task in gateway.list_tasks(project.id, None)? {
        if !task.is_labeled || task.is_synced() {
            continue;
        }
        match sync_task(store, gateway, &task) {
            Ok(true) => report.synced += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => {
                tracing::warn!(task_id = task.id, error = %e, "Verdict write-back failed");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        project_id = project.id,
        synced = report.synced,
        skipped = report.skipped,
        failed = report.failed,
        "Verdict sync complete"
    );
    Ok(report)
}

/// Write one task's verdict back. `Ok(false)` means the task carried
/// nothing usable and was skipped.
fn sync_task(
    store: &dyn ObjectStore,
    gateway: &dyn AnnotationBackend,
    task: &ReviewTask,
) -> Result<bool, PipelineError> {
    let Some(key) = task.linked_key() else {
        tracing::warn!(task_id = task.id, "Labeled task has no session back-reference");
        return Ok(false);
    };
    let Some(verdict) = task.first_verdict() else {
        tracing::warn!(task_id = task.id, "Labeled task has no extractable verdict");
        return Ok(false);
    };
    let Some(status) = ReviewStatus::parse(&verdict.decision).filter(ReviewStatus::is_decided)
    else {
        tracing::warn!(
            task_id = task.id,
            decision = %verdict.decision,
            "Unknown verdict decision"
        );
        return Ok(false);
    };

    // Read-modify-write of the whole tag set; not atomic, accepted race.
    let mut tags = SessionTags::from_tag_set(&store.get_tags(key)?);
    if tags.apply_verdict(status, &verdict.comment) {
        store.put_tags(key, &tags.to_tag_set())?;
        tracing::info!(key, verdict = status.as_str(), "Session verdict recorded");
    } else {
        tracing::debug!(key, "Session already decided; verdict left unchanged");
    }

    // Mark synced either way so the task is consumed exactly once. The full
    // meta is re-sent because the patch replaces the object — dropping the
    // back-reference here would break dispatch dedup.
    let mut meta = task.meta.clone();
    meta.insert(SYNCED_KEY.to_string(), "true".to_string());
    gateway.patch_task_meta(task.id, &meta)?;

    Ok(true)
}
