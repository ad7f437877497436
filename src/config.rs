//! Environment-driven configuration for the review pipeline.
//!
//! Every knob has a default that works against a local annotation tool and a
//! data root under the user's home directory. Deployments override through
//! environment variables — the external scheduler injects them per job, so
//! nothing here is read more than once per run.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Vettra";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Title of the singleton review project in the annotation tool.
///
/// The title is the dedup anchor across runs: every run re-resolves the
/// project id by title, nothing is persisted between runs.
pub const DEFAULT_PROJECT_TITLE: &str = "LLM Answer Clinician Review";

/// Object-store prefix where the serving layer logs sessions.
pub const DEFAULT_SOURCE_PREFIX: &str = "conversation_logs/";

/// Prefix for sessions held while clinicians review them.
pub const REVIEW_WAIT_PREFIX: &str = "review_wait/";

/// Prefix for in-window sessions that were not selected for review.
pub const NOISY_PREFIX: &str = "noisy/";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "info,vettra=info".to_string()
}

/// Get the default data root: ~/Vettra/ on all platforms.
pub fn default_data_root() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the filesystem object store.
    pub data_root: PathBuf,
    /// Base URL of the external annotation system.
    pub annotation_url: String,
    /// API token for the annotation system.
    pub annotation_token: String,
    /// Review project title (dedup anchor, see [`DEFAULT_PROJECT_TITLE`]).
    pub project_title: String,
    /// Prefix under which the serving layer logs sessions.
    pub source_prefix: String,
    /// Upper bound on the review sample per triage run.
    pub sample_size: usize,
    /// Sessions strictly below this confidence are review candidates.
    pub low_confidence_threshold: f32,
    /// Budget for the blocking completion waiter.
    pub max_wait_minutes: u64,
    /// Poll cadence of the completion waiter.
    pub poll_interval_secs: u64,
    /// Fixed RNG seed for the triage sampler; unset means entropy-seeded.
    pub sample_seed: Option<u64>,
    /// Bind address for the session status API.
    pub status_bind: SocketAddr,
}

impl Config {
    /// Resolve configuration from the environment, falling back to defaults.
    ///
    /// Unparseable numeric values are logged and replaced by the default
    /// rather than aborting the run.
    pub fn from_env() -> Self {
        Self {
            data_root: std::env::var("VETTRA_DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_root()),
            annotation_url: env_or("ANNOTATION_URL", "http://localhost:8080"),
            annotation_token: env_or("ANNOTATION_TOKEN", ""),
            project_title: env_or("REVIEW_PROJECT_TITLE", DEFAULT_PROJECT_TITLE),
            source_prefix: env_or("SOURCE_PREFIX", DEFAULT_SOURCE_PREFIX),
            sample_size: env_parse("SAMPLE_SIZE", 5),
            low_confidence_threshold: env_parse("LOW_CONFIDENCE_THRESHOLD", 0.7),
            max_wait_minutes: env_parse("MAX_WAIT_MINUTES", 60),
            poll_interval_secs: env_parse("POLL_INTERVAL_SECS", 30),
            sample_seed: std::env::var("SAMPLE_SEED")
                .ok()
                .and_then(|v| v.parse().ok()),
            status_bind: env_parse(
                "STATUS_BIND",
                "127.0.0.1:3900".parse().expect("valid default bind"),
            ),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
{
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(var = name, value = %raw, ?default, "Unparseable value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_root_under_home() {
        let dir = default_data_root();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Vettra"));
    }

    #[test]
    fn prefixes_are_distinct() {
        assert_ne!(DEFAULT_SOURCE_PREFIX, REVIEW_WAIT_PREFIX);
        assert_ne!(DEFAULT_SOURCE_PREFIX, NOISY_PREFIX);
        assert!(DEFAULT_SOURCE_PREFIX.ends_with('/'));
        assert!(REVIEW_WAIT_PREFIX.ends_with('/'));
        assert!(NOISY_PREFIX.ends_with('/'));
    }

    #[test]
    fn env_parse_returns_default_when_unset() {
        let value: usize = env_parse("VETTRA_TEST_UNSET_VARIABLE", 5);
        assert_eq!(value, 5);
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
