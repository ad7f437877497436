//! Review dispatcher — import the triage sample as annotation tasks,
//! exactly once per session.
//!
//! Dedup is by the task meta back-reference: before importing, the
//! dispatcher lists every task already in the project and drops sessions
//! whose key is already linked. Re-running with the same sample therefore
//! imports nothing, which is what makes the external scheduler's retry
//! policy safe to apply to this stage.

use std::collections::HashSet;

use serde::Serialize;

use super::error::PipelineError;
use super::triage::TriagedSession;
use crate::annotation::{AnnotationBackend, NewTask, Project, LABEL_CONFIG};

/// Outcome of one dispatch run.
#[derive(Debug, Serialize)]
pub struct DispatchReport {
    pub project_id: u64,
    pub imported: usize,
    pub skipped_existing: usize,
}

/// Resolve the review project by title, creating it on first use.
///
/// The project id is only valid for this run; every run re-resolves by
/// title, which is the dedup anchor across runs.
pub fn ensure_project(
    gateway: &dyn AnnotationBackend,
    title: &str,
) -> Result<Project, PipelineError> {
    if let Some(project) = gateway.find_project(title)? {
        return Ok(project);
    }
    tracing::info!(title, "Creating review project");
    Ok(gateway.create_project(title, LABEL_CONFIG)?)
}

/// Import `selected` into the review project, skipping sessions that
/// already have a task. Safe to re-run.
pub fn run_dispatch(
    gateway: &dyn AnnotationBackend,
    selected: &[TriagedSession],
    project_title: &str,
) -> Result<DispatchReport, PipelineError> {
    let project = ensure_project(gateway, project_title)?;

    let linked: HashSet<String> = gateway
        .list_tasks(project.id, None)?
        .iter()
        .filter_map(|t| t.linked_key().map(str::to_string))
        .collect();

    let to_import: Vec<NewTask> = selected
        .iter()
        .filter(|s| !linked.contains(&s.key))
        .map(|s| NewTask::for_session(&s.key, &s.prompt, &s.response, s.feedback.as_str()))
        .collect();

    let skipped_existing = selected.len() - to_import.len();
    if to_import.is_empty() {
        tracing::info!(
            project_id = project.id,
            skipped_existing,
            "No new sessions to dispatch"
        );
        return Ok(DispatchReport {
            project_id: project.id,
            imported: 0,
            skipped_existing,
        });
    }

    let imported = gateway.import_tasks(project.id, &to_import)?;
    tracing::info!(
        project_id = project.id,
        imported,
        skipped_existing,
        "Dispatched review tasks"
    );

    Ok(DispatchReport {
        project_id: project.id,
        imported,
        skipped_existing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::MockAnnotationBackend;
    use crate::pipeline::triage::TriageClass;
    use crate::store::FeedbackType;

    const TITLE: &str = "LLM Answer Clinician Review";

    fn session(key: &str) -> TriagedSession {
        TriagedSession {
            key: key.to_string(),
            prompt: "p".into(),
            response: "r".into(),
            confidence: 0.3,
            feedback: FeedbackType::Dislike,
            class: TriageClass::LowConfidence,
        }
    }

    #[test]
    fn creates_project_on_first_use_then_reuses_it() {
        let backend = MockAnnotationBackend::new();
        let first = ensure_project(&backend, TITLE).unwrap();
        let second = ensure_project(&backend, TITLE).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(backend.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn imports_each_selected_session_once() {
        let backend = MockAnnotationBackend::new();
        let selected = vec![session("logs/a.json"), session("logs/b.json")];

        let report = run_dispatch(&backend, &selected, TITLE).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped_existing, 0);
    }

    #[test]
    fn second_run_imports_nothing() {
        let backend = MockAnnotationBackend::new();
        let selected = vec![session("logs/a.json"), session("logs/b.json")];

        run_dispatch(&backend, &selected, TITLE).unwrap();
        let report = run_dispatch(&backend, &selected, TITLE).unwrap();

        assert_eq!(report.imported, 0);
        assert_eq!(report.skipped_existing, 2);
        assert_eq!(
            backend.list_tasks(report.project_id, None).unwrap().len(),
            2
        );
    }

    #[test]
    fn partial_overlap_imports_only_new_sessions() {
        let backend = MockAnnotationBackend::new();
        run_dispatch(&backend, &[session("logs/a.json")], TITLE).unwrap();

        let report = run_dispatch(
            &backend,
            &[session("logs/a.json"), session("logs/c.json")],
            TITLE,
        )
        .unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped_existing, 1);
    }

    #[test]
    fn empty_selection_is_a_noop_but_ensures_project() {
        let backend = MockAnnotationBackend::new();
        let report = run_dispatch(&backend, &[], TITLE).unwrap();
        assert_eq!(report.imported, 0);
        assert!(backend.find_project(TITLE).unwrap().is_some());
    }
}
