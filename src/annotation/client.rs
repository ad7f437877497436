//! HTTP client for the annotation system, plus the mock used in tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::json;

use super::types::{Annotation, AnnotationResult, NewTask, Project, ResultValue, ReviewTask};
use super::types::{COMMENT_FIELD, VERDICT_FIELD};
use super::AnnotationError;
use crate::config::Config;

/// Annotation system abstraction (allows mocking).
pub trait AnnotationBackend: Send + Sync {
    fn list_projects(&self) -> Result<Vec<Project>, AnnotationError>;

    fn create_project(&self, title: &str, label_config: &str)
        -> Result<Project, AnnotationError>;

    /// Tasks in a project; `completed` filters on labeled state when set.
    fn list_tasks(
        &self,
        project_id: u64,
        completed: Option<bool>,
    ) -> Result<Vec<ReviewTask>, AnnotationError>;

    /// Import tasks into a project, returning how many were created.
    fn import_tasks(&self, project_id: u64, tasks: &[NewTask]) -> Result<usize, AnnotationError>;

    /// Replace a task's meta object.
    fn patch_task_meta(
        &self,
        task_id: u64,
        meta: &BTreeMap<String, String>,
    ) -> Result<(), AnnotationError>;

    /// Resolve a project by title.
    fn find_project(&self, title: &str) -> Result<Option<Project>, AnnotationError> {
        Ok(self.list_projects()?.into_iter().find(|p| p.title == title))
    }
}

// ═══════════════════════════════════════════════════════════
// HTTP client
// ═══════════════════════════════════════════════════════════

/// Response envelope for the project listing endpoint.
#[derive(Deserialize)]
struct ProjectListResponse {
    #[serde(default)]
    results: Vec<Project>,
}

/// Blocking HTTP client for the annotation system's REST API.
pub struct HttpAnnotationClient {
    base_url: String,
    token: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpAnnotationClient {
    /// Create a client for the annotation system at `base_url`.
    pub fn new(base_url: &str, token: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
            timeout_secs,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.annotation_url, &config.annotation_token, 30)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, e: reqwest::Error) -> AnnotationError {
        if e.is_connect() {
            AnnotationError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            AnnotationError::Transport(format!(
                "Request timed out after {}s",
                self.timeout_secs
            ))
        } else {
            AnnotationError::Transport(e.to_string())
        }
    }

    fn check(
        &self,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, AnnotationError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AnnotationError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl AnnotationBackend for HttpAnnotationClient {
    fn list_projects(&self) -> Result<Vec<Project>, AnnotationError> {
        let url = format!("{}/api/projects", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .send()
            .map_err(|e| self.transport_error(e))?;

        let parsed: ProjectListResponse = self
            .check(response)?
            .json()
            .map_err(|e| AnnotationError::ResponseParsing(e.to_string()))?;
        Ok(parsed.results)
    }

    fn create_project(
        &self,
        title: &str,
        label_config: &str,
    ) -> Result<Project, AnnotationError> {
        let url = format!("{}/api/projects", self.base_url);
        let body = json!({ "title": title, "label_config": label_config });
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.token))
            .json(&body)
            .send()
            .map_err(|e| self.transport_error(e))?;

        self.check(response)?
            .json()
            .map_err(|e| AnnotationError::ResponseParsing(e.to_string()))
    }

    fn list_tasks(
        &self,
        project_id: u64,
        completed: Option<bool>,
    ) -> Result<Vec<ReviewTask>, AnnotationError> {
        let url = format!("{}/api/projects/{}/tasks", self.base_url, project_id);
        let mut request = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token));
        if let Some(completed) = completed {
            request = request.query(&[("completed", completed.to_string())]);
        }

        let response = request.send().map_err(|e| self.transport_error(e))?;
        self.check(response)?
            .json()
            .map_err(|e| AnnotationError::ResponseParsing(e.to_string()))
    }

    fn import_tasks(&self, project_id: u64, tasks: &[NewTask]) -> Result<usize, AnnotationError> {
        let url = format!("{}/api/projects/{}/import", self.base_url, project_id);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.token))
            .json(&tasks)
            .send()
            .map_err(|e| self.transport_error(e))?;

        // The import endpoint reports its own count; fall back to the
        // request size when the field is absent.
        let parsed: serde_json::Value = self
            .check(response)?
            .json()
            .map_err(|e| AnnotationError::ResponseParsing(e.to_string()))?;
        Ok(parsed
            .get("task_count")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(tasks.len()))
    }

    fn patch_task_meta(
        &self,
        task_id: u64,
        meta: &BTreeMap<String, String>,
    ) -> Result<(), AnnotationError> {
        let url = format!("{}/api/tasks/{}", self.base_url, task_id);
        let response = self
            .client
            .patch(&url)
            .header("Authorization", format!("Token {}", self.token))
            .json(&json!({ "meta": meta }))
            .send()
            .map_err(|e| self.transport_error(e))?;

        self.check(response)?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Mock backend
// ═══════════════════════════════════════════════════════════

#[derive(Default)]
struct MockState {
    projects: Vec<Project>,
    tasks: BTreeMap<u64, Vec<ReviewTask>>,
    next_project_id: u64,
    next_task_id: u64,
}

/// In-memory annotation backend for tests: projects, tasks, and a helper
/// that plays the reviewer by attaching annotations.
#[derive(Default)]
pub struct MockAnnotationBackend {
    state: Mutex<MockState>,
}

impl MockAnnotationBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a first (authoritative) annotation to a task and mark it
    /// labeled — what a reviewer submission does in the real tool.
    pub fn annotate(&self, task_id: u64, decision: &str, comment: &str) {
        let mut state = self.state.lock().expect("mock mutex poisoned");
        for tasks in state.tasks.values_mut() {
            if let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) {
                let mut result = vec![AnnotationResult {
                    from_name: Some(VERDICT_FIELD.to_string()),
                    value: ResultValue {
                        choices: vec![decision.to_string()],
                        text: vec![],
                    },
                }];
                if !comment.is_empty() {
                    result.push(AnnotationResult {
                        from_name: Some(COMMENT_FIELD.to_string()),
                        value: ResultValue {
                            choices: vec![],
                            text: vec![comment.to_string()],
                        },
                    });
                }
                task.annotations.push(Annotation { result });
                task.is_labeled = true;
                return;
            }
        }
        panic!("no such task: {task_id}");
    }

    /// Snapshot of one task, for assertions.
    pub fn task(&self, task_id: u64) -> Option<ReviewTask> {
        let state = self.state.lock().expect("mock mutex poisoned");
        state
            .tasks
            .values()
            .flatten()
            .find(|t| t.id == task_id)
            .cloned()
    }

    /// All task ids of a project, in creation order.
    pub fn task_ids(&self, project_id: u64) -> Vec<u64> {
        let state = self.state.lock().expect("mock mutex poisoned");
        state
            .tasks
            .get(&project_id)
            .map(|tasks| tasks.iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }
}

impl AnnotationBackend for MockAnnotationBackend {
    fn list_projects(&self) -> Result<Vec<Project>, AnnotationError> {
        let state = self.state.lock().expect("mock mutex poisoned");
        Ok(state.projects.clone())
    }

    fn create_project(
        &self,
        title: &str,
        _label_config: &str,
    ) -> Result<Project, AnnotationError> {
        let mut state = self.state.lock().expect("mock mutex poisoned");
        state.next_project_id += 1;
        let project = Project {
            id: state.next_project_id,
            title: title.to_string(),
        };
        state.projects.push(project.clone());
        state.tasks.insert(project.id, Vec::new());
        Ok(project)
    }

    fn list_tasks(
        &self,
        project_id: u64,
        completed: Option<bool>,
    ) -> Result<Vec<ReviewTask>, AnnotationError> {
        let state = self.state.lock().expect("mock mutex poisoned");
        let tasks = state.tasks.get(&project_id).cloned().unwrap_or_default();
        Ok(match completed {
            Some(want) => tasks.into_iter().filter(|t| t.is_labeled == want).collect(),
            None => tasks,
        })
    }

    fn import_tasks(&self, project_id: u64, tasks: &[NewTask]) -> Result<usize, AnnotationError> {
        let mut state = self.state.lock().expect("mock mutex poisoned");
        let mut created = Vec::with_capacity(tasks.len());
        for task in tasks {
            state.next_task_id += 1;
            created.push(ReviewTask {
                id: state.next_task_id,
                data: task.data.clone(),
                meta: task.meta.clone(),
                is_labeled: false,
                annotations: vec![],
            });
        }
        let count = created.len();
        state.tasks.entry(project_id).or_default().extend(created);
        Ok(count)
    }

    fn patch_task_meta(
        &self,
        task_id: u64,
        meta: &BTreeMap<String, String>,
    ) -> Result<(), AnnotationError> {
        let mut state = self.state.lock().expect("mock mutex poisoned");
        for tasks in state.tasks.values_mut() {
            if let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) {
                task.meta = meta.clone();
                return Ok(());
            }
        }
        Err(AnnotationError::Http {
            status: 404,
            body: format!("task {task_id} not found"),
        })
    }
}
