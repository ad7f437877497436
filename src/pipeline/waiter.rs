//! Completion waiter — block until every open task is annotated.
//!
//! Deprecated path: the default deployment runs dispatch and sync as two
//! independent periodic jobs and never waits. This blocking variant
//! survives for the single-run pipeline (`run-once --wait`), where it owns
//! its scheduler slot for at most the configured budget. Sleeping happens
//! in small increments so the deadline is honored promptly.

use std::time::{Duration, Instant};

use super::error::PipelineError;
use crate::annotation::AnnotationBackend;

/// Sleep granularity inside the poll interval.
const SLEEP_GRANULARITY: Duration = Duration::from_secs(5);

/// Poll the project's incomplete-task count until it reaches zero or the
/// budget elapses.
///
/// Returns `Ok` the moment no unlabeled tasks remain. A zero `max_wait`
/// fails right after the first unsatisfied poll — it never blocks.
pub fn wait_for_completion(
    gateway: &dyn AnnotationBackend,
    project_id: u64,
    max_wait: Duration,
    poll_interval: Duration,
) -> Result<(), PipelineError> {
    let started = Instant::now();

    loop {
        let incomplete = gateway.list_tasks(project_id, Some(false))?.len();
        if incomplete == 0 {
            tracing::info!(project_id, "All review tasks annotated");
            return Ok(());
        }

        if started.elapsed() >= max_wait {
            return Err(PipelineError::ReviewTimeout {
                waited_secs: started.elapsed().as_secs(),
                incomplete,
            });
        }

        tracing::info!(project_id, incomplete, "Waiting for reviewer annotations");
        sleep_until_next_poll(started, max_wait, poll_interval);
    }
}

/// Sleep one poll interval, in granules, stopping early at the deadline.
fn sleep_until_next_poll(started: Instant, max_wait: Duration, poll_interval: Duration) {
    let poll_deadline = Instant::now() + poll_interval;
    loop {
        let now = Instant::now();
        if now >= poll_deadline || started.elapsed() >= max_wait {
            return;
        }
        let remaining = poll_deadline - now;
        std::thread::sleep(remaining.min(SLEEP_GRANULARITY));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{MockAnnotationBackend, NewTask, LABEL_CONFIG};

    fn project_with_tasks(backend: &MockAnnotationBackend, n: usize) -> u64 {
        let project = backend.create_project("Review", LABEL_CONFIG).unwrap();
        let tasks: Vec<NewTask> = (0..n)
            .map(|i| NewTask::for_session(&format!("logs/{i}.json"), "p", "r", "dislike"))
            .collect();
        backend.import_tasks(project.id, &tasks).unwrap();
        project.id
    }

    #[test]
    fn returns_immediately_when_no_open_tasks() {
        let backend = MockAnnotationBackend::new();
        let project = backend.create_project("Review", LABEL_CONFIG).unwrap();

        let result = wait_for_completion(
            &backend,
            project.id,
            Duration::from_secs(0),
            Duration::from_secs(30),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn returns_once_every_task_is_labeled() {
        let backend = MockAnnotationBackend::new();
        let project_id = project_with_tasks(&backend, 2);
        for id in backend.task_ids(project_id) {
            backend.annotate(id, "approved", "");
        }

        let result = wait_for_completion(
            &backend,
            project_id,
            Duration::from_secs(0),
            Duration::from_secs(30),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn zero_budget_times_out_immediately() {
        let backend = MockAnnotationBackend::new();
        let project_id = project_with_tasks(&backend, 3);

        let started = Instant::now();
        let result = wait_for_completion(
            &backend,
            project_id,
            Duration::from_secs(0),
            Duration::from_secs(30),
        );
        assert!(started.elapsed() < Duration::from_secs(1), "must not block");

        match result {
            Err(PipelineError::ReviewTimeout { incomplete, .. }) => assert_eq!(incomplete, 3),
            other => panic!("expected ReviewTimeout, got {other:?}"),
        }
    }

    #[test]
    fn partially_labeled_project_still_times_out() {
        let backend = MockAnnotationBackend::new();
        let project_id = project_with_tasks(&backend, 2);
        let ids = backend.task_ids(project_id);
        backend.annotate(ids[0], "approved", "");

        let result = wait_for_completion(
            &backend,
            project_id,
            Duration::from_secs(0),
            Duration::from_secs(30),
        );
        assert!(matches!(
            result,
            Err(PipelineError::ReviewTimeout { incomplete: 1, .. })
        ));
    }
}
