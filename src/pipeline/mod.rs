//! Review pipeline — triage, dispatch, wait, sync.
//!
//! Four stages connected by the session store and the annotation gateway:
//!
//! ```text
//! Triage → Archive → Dispatch   (periodic dispatch job)
//!                    Sync       (independent periodic sync job)
//! ```
//!
//! Every stage is idempotent: triage is read-only, dispatch dedups by task
//! back-reference, sync marks tasks consumed and never reverses a decided
//! session. The blocking completion waiter is the deprecated single-run
//! variant, kept behind `run-once --wait`.

pub mod archive;
pub mod dispatch;
pub mod error;
pub mod runner;
pub mod sync;
pub mod triage;
pub mod waiter;

pub use archive::{run_archive, ArchiveReport};
pub use dispatch::{ensure_project, run_dispatch, DispatchReport};
pub use error::PipelineError;
pub use runner::{run_dispatch_job, run_once, run_sync_job, run_triage_job};
pub use sync::{run_sync, SyncReport};
pub use triage::{run_triage, TimeWindow, TriageClass, TriageOutcome, TriagedSession};
pub use waiter::wait_for_completion;
