//! Vettra — human-in-the-loop review layer for an LLM answering service.
//!
//! Generated answers are logged as sessions with confidence/feedback tags.
//! Low-confidence or disliked answers are triaged into a bounded sample,
//! dispatched to clinicians through an external annotation tool, and the
//! verdicts are synced back into the durable session record the serving
//! layer polls via the status API.
//!
//! Stages run as short-lived jobs under an external scheduler; see
//! [`pipeline`] for the stage contracts and [`api`] for the poll surface.

pub mod annotation;
pub mod api;
pub mod config;
pub mod pipeline;
pub mod store;
