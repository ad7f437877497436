//! Annotation gateway — CRUD over the external annotation system.
//!
//! Reviewers never touch this codebase directly: selected sessions are
//! imported as tasks into an external annotation tool, clinicians label
//! them there, and verdict sync reads the completed annotations back.
//! [`AnnotationBackend`] is the seam; [`HttpAnnotationClient`] speaks the
//! tool's REST dialect and [`MockAnnotationBackend`] stands in for tests.

pub mod client;
pub mod types;

use thiserror::Error;

pub use client::{AnnotationBackend, HttpAnnotationClient, MockAnnotationBackend};
pub use types::{
    Annotation, AnnotationResult, NewTask, Project, ResultValue, ReviewTask, TaskData, Verdict,
    COMMENT_FIELD, LABEL_CONFIG, LINK_KEY, SYNCED_KEY, VERDICT_FIELD,
};

/// Errors from the annotation system boundary.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Cannot reach annotation service at {0}")]
    Connection(String),

    #[error("Annotation service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Malformed response from annotation service: {0}")]
    ResponseParsing(String),
}
