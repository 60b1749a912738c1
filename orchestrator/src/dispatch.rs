//! Fan-out/fan-in of local steps over the selected participants.

use std::{sync::Arc, time::Duration};

use log::{debug, warn};
use machine_learning::ParameterSet;
use tokio::task::{self, JoinSet};
use worker::LocalTrainer;

use crate::{OrchestratorError, Result, configs::FailurePolicy};

/// How failed and slow participants are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    pub policy: FailurePolicy,
    /// The longest a participant may take, a slower one counts as failed.
    pub timeout: Option<Duration>,
}

/// A finished local step.
#[derive(Debug, Clone, PartialEq)]
pub struct Completed<T> {
    pub partition: String,
    pub value: T,
}

/// Runs a local step on every participant concurrently and waits for all of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(options: DispatchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    /// Runs `step` once per participant, each on a blocking thread of its own.
    ///
    /// # Arguments
    /// * `round` - The current round number.
    /// * `participants` - The trainers taking part in this step.
    /// * `template` - The global parameters, every participant receives its own copy.
    /// * `step` - The local step to run.
    ///
    /// # Returns
    /// The completed steps in participant order. Under `FailurePolicy::Abort` the first failure is
    /// returned, under `FailurePolicy::Exclude` failures are dropped and `EmptySelection` is returned
    /// only if nobody succeeded.
    pub async fn dispatch<T, F>(
        &self,
        round: usize,
        participants: &[Arc<dyn LocalTrainer>],
        template: &ParameterSet,
        step: F,
    ) -> Result<Vec<Completed<T>>>
    where
        T: Send + 'static,
        F: Fn(&dyn LocalTrainer, ParameterSet) -> worker::Result<T> + Send + Sync + 'static,
    {
        let step = Arc::new(step);
        let mut tasks = JoinSet::new();

        for (i, participant) in participants.iter().enumerate() {
            let participant = Arc::clone(participant);
            let params = template.clone();
            let step = Arc::clone(&step);
            let timeout = self.options.timeout;

            tasks.spawn(async move {
                let partition = participant.id().to_string();
                let handle = task::spawn_blocking(move || (*step)(participant.as_ref(), params));

                let outcome = match timeout {
                    Some(after) => match tokio::time::timeout(after, handle).await {
                        Ok(joined) => joined.map_err(OrchestratorError::Join),
                        Err(_) => Err(OrchestratorError::Timeout {
                            partition: partition.clone(),
                            after,
                        }),
                    },
                    None => handle.await.map_err(OrchestratorError::Join),
                };

                let outcome = outcome.and_then(|result| {
                    result.map_err(|source| OrchestratorError::Participant {
                        partition: partition.clone(),
                        source,
                    })
                });

                (i, partition, outcome)
            });
        }

        let mut completed: Vec<Option<Completed<T>>> = participants.iter().map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            let (i, partition, outcome) = joined?;

            match (outcome, self.options.policy) {
                (Ok(value), _) => {
                    debug!(round = round, partition = partition.as_str(); "participant finished");
                    completed[i] = Some(Completed { partition, value });
                }
                (Err(e), FailurePolicy::Abort) => return Err(e),
                (Err(e), FailurePolicy::Exclude) => {
                    warn!(round = round, partition = partition.as_str(); "excluding participant: {e}");
                }
            }
        }

        let completed: Vec<_> = completed.into_iter().flatten().collect();
        if completed.is_empty() {
            return Err(OrchestratorError::EmptySelection { round });
        }

        Ok(completed)
    }
}
