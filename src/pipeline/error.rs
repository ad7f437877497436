//! Pipeline-level error types.
//!
//! Transient store/annotation failures surface to the external scheduler,
//! whose retry policy re-runs the whole stage — safe because every stage is
//! idempotent. Malformed session records are NOT errors at this level; the
//! scan logs and skips them.

use thiserror::Error;

use crate::annotation::AnnotationError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Annotation service error: {0}")]
    Annotation(#[from] AnnotationError),

    /// Sync ran before dispatch ever created the project — a missing
    /// precondition, distinct from the service being unreachable.
    #[error("Review project '{0}' not found; dispatch has not created it yet")]
    ProjectNotFound(String),

    #[error("Review round timed out after {waited_secs}s with {incomplete} tasks incomplete")]
    ReviewTimeout { waited_secs: u64, incomplete: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}
