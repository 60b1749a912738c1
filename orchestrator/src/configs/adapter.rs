use std::num::NonZeroUsize;

use machine_learning::{arch::ForecasterSpec, initialization::Init};
use parameter_server::ParticipantSelector;
use worker::{
    ExecContext, WorkerConfig,
    data::{PartitionLoader, Split},
};

use super::FederationConfig;
use crate::{OrchestratorError, Result, dispatch::DispatchOptions};

/// Turns a validated `FederationConfig` into the values each component is built from.
pub struct Adapter<'a> {
    config: &'a FederationConfig,
}

impl<'a> Adapter<'a> {
    pub fn new(config: &'a FederationConfig) -> Self {
        Self { config }
    }

    /// The hyper parameters shared by every local trainer.
    pub fn worker_config(&self) -> Result<WorkerConfig> {
        let config = self.config;

        Ok(WorkerConfig {
            local_epochs: non_zero("local_epochs", config.local_epochs)?,
            window_size: non_zero("window_size", config.window_size)?,
            hidden_size: non_zero("model.hidden_size", config.model.hidden_size)?,
            learning_rate: config.model.learning_rate,
            batch_size: non_zero("model.batch_size", config.model.batch_size)?,
            test_range: non_zero("test_range", config.test_range)?,
        })
    }

    pub fn forecaster(&self) -> ForecasterSpec {
        ForecasterSpec::new(self.config.window_size, self.config.model.hidden_size)
    }

    pub fn init(&self) -> Init {
        self.config.model.init.into()
    }

    pub fn selector(&self) -> Result<ParticipantSelector> {
        let config = self.config;
        let selector =
            ParticipantSelector::from_options(config.take_all, config.num_participants, config.frac)?;
        Ok(selector)
    }

    pub fn split(&self) -> Split {
        match self.config.holdout() {
            Some(n) => Split::Holdout(n),
            None => Split::Ratio(self.config.split_ratio),
        }
    }

    pub fn loader(&self) -> PartitionLoader {
        let data = &self.config.data;
        PartitionLoader::new(
            &data.dir,
            &data.suffix,
            &data.column,
            self.split(),
            self.config.normalize_data,
        )
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        let execution = &self.config.execution;
        DispatchOptions {
            policy: execution.failure_policy,
            timeout: execution.participant_timeout(),
        }
    }

    pub fn exec_context(&self) -> ExecContext {
        ExecContext::new(self.config.execution.seed)
    }
}

fn non_zero(field: &str, value: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(value)
        .ok_or_else(|| OrchestratorError::InvalidConfig(format!("{field} must be greater than 0")))
}
