//! Session status projection — the serving layer's poll target.
//!
//! The original requester only ever observes pending → approved|rejected
//! here; triage, dispatch retries, and timeouts are invisible except as
//! prolonged pending.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::store::{session_key, ReviewStatus, SessionBody, SessionTags, StoreError};

/// Status projection of one session.
#[derive(Debug, Serialize, PartialEq)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatusResponse {
    fn pending() -> Self {
        Self {
            status: "pending",
            response: None,
            reason: None,
        }
    }
}

/// `GET /status/{session_id}` — current review state of one session.
///
/// A session whose tags are momentarily absent (object just created, tags
/// not applied yet) reads as pending; only a missing object is a 404.
pub async fn lookup(
    State(ctx): State<ApiContext>,
    Path(session_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let key = session_key(&ctx.source_prefix, &session_id);

    let tags = match ctx.store.get_tags(&key) {
        Ok(raw) => SessionTags::from_tag_set(&raw),
        Err(StoreError::NotFound(_)) => {
            return Err(ApiError::NotFound(format!("Unknown session: {session_id}")))
        }
        Err(e) => return Err(e.into()),
    };

    let response = match tags.status {
        None | Some(ReviewStatus::NeedsReview) => StatusResponse::pending(),
        Some(ReviewStatus::Approved) => {
            let body: SessionBody = serde_json::from_slice(&ctx.store.get(&key)?)
                .map_err(|e| ApiError::Internal(format!("Malformed session body: {e}")))?;
            StatusResponse {
                status: "approved",
                response: Some(body.response),
                reason: None,
            }
        }
        Some(ReviewStatus::Rejected) => StatusResponse {
            status: "rejected",
            response: None,
            reason: Some(tags.doctor_comment.unwrap_or_default()),
        },
    };

    Ok(Json(response))
}
