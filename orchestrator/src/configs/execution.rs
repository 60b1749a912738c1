use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// What happens to a round when one of its participants fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The whole run fails.
    #[default]
    Abort,
    /// The participant is left out of the round's aggregation.
    Exclude,
}

/// How a run executes and where its outputs go.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    /// The base seed of every random choice, unset draws from the operating system.
    pub seed: Option<u64>,
    /// How long a participant may take for a single local step.
    pub participant_timeout_ms: Option<u64>,
    pub failure_policy: FailurePolicy,
    pub results_dir: PathBuf,
    /// Where the final global parameters are saved.
    pub checkpoint: Option<PathBuf>,
    /// A checkpoint to take the initial global parameters from.
    pub resume_from: Option<PathBuf>,
}

impl ExecutionConfig {
    pub fn participant_timeout(&self) -> Option<Duration> {
        self.participant_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            participant_timeout_ms: None,
            failure_policy: FailurePolicy::Abort,
            results_dir: PathBuf::from("results"),
            checkpoint: None,
            resume_from: None,
        }
    }
}
