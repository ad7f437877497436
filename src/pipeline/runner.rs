//! Stage composition for scheduler-invoked runs.
//!
//! The scheduler contract is "invoke a subcommand on a cadence": the
//! dispatch job (triage → archive → dispatch) and the sync job run as
//! independent periodic jobs, tolerating arbitrary gaps and rerun orders
//! because both ends are idempotent. `run_once` chains everything for
//! manual runs and keeps the deprecated blocking wait behind a flag.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::archive::run_archive;
use super::dispatch::{run_dispatch, DispatchReport};
use super::error::PipelineError;
use super::sync::{run_sync, SyncReport};
use super::triage::{run_triage, TimeWindow, TriageOutcome};
use super::waiter::wait_for_completion;
use crate::annotation::AnnotationBackend;
use crate::config::{Config, NOISY_PREFIX, REVIEW_WAIT_PREFIX};
use crate::store::ObjectStore;

/// RNG for the triage sampler: fixed seed when configured (reproducible
/// runs and tests), entropy otherwise.
fn sampler_rng(config: &Config) -> StdRng {
    match config.sample_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Triage one window without side effects — the inspection path.
pub fn run_triage_job(
    store: &dyn ObjectStore,
    config: &Config,
    window: &TimeWindow,
) -> Result<TriageOutcome, PipelineError> {
    run_triage(
        store,
        window,
        &config.source_prefix,
        config.sample_size,
        config.low_confidence_threshold,
        &mut sampler_rng(config),
    )
}

/// The periodic dispatch job: triage the window, split it into holding
/// areas, and import the sample as review tasks.
pub fn run_dispatch_job(
    store: &dyn ObjectStore,
    gateway: &dyn AnnotationBackend,
    config: &Config,
    window: &TimeWindow,
) -> Result<DispatchReport, PipelineError> {
    let outcome = run_triage_job(store, config, window)?;
    run_archive(
        store,
        &outcome,
        &config.source_prefix,
        REVIEW_WAIT_PREFIX,
        NOISY_PREFIX,
    );
    run_dispatch(gateway, &outcome.selected, &config.project_title)
}

/// The periodic sync job.
pub fn run_sync_job(
    store: &dyn ObjectStore,
    gateway: &dyn AnnotationBackend,
    config: &Config,
) -> Result<SyncReport, PipelineError> {
    run_sync(store, gateway, &config.project_title)
}

/// One full pipeline pass: dispatch, optionally block until every task is
/// annotated (deprecated), then sync whatever is complete.
pub fn run_once(
    store: &dyn ObjectStore,
    gateway: &dyn AnnotationBackend,
    config: &Config,
    window: &TimeWindow,
    wait: bool,
) -> Result<SyncReport, PipelineError> {
    let dispatched = run_dispatch_job(store, gateway, config, window)?;

    if wait {
        wait_for_completion(
            gateway,
            dispatched.project_id,
            Duration::from_secs(config.max_wait_minutes * 60),
            Duration::from_secs(config.poll_interval_secs),
        )?;
    }

    run_sync_job(store, gateway, config)
}
