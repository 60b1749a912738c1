use std::{collections::BTreeMap, num::NonZeroUsize, sync::Arc};

use log::info;
use parameter_server::{Aggregator, FedAvg};
use tokio::task;
use worker::LocalTrainer;

use crate::{
    OrchestratorError, Result,
    ledger::PredictionLedger,
    metrics::ErrorMetrics,
    round::{RoundLoss, RoundOrchestrator},
};

/// The offsets into the held out data visited by an online round: from 0, in steps of
/// `step`, while smaller than `test_len - window`.
#[derive(Debug, Clone)]
pub struct RollingCursor {
    next: usize,
    end: usize,
    step: usize,
}

impl RollingCursor {
    pub fn new(test_len: usize, window: usize, step: NonZeroUsize) -> Self {
        Self {
            next: 0,
            end: test_len.saturating_sub(window),
            step: step.get(),
        }
    }
}

impl Iterator for RollingCursor {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }

        let cursor = self.next;
        self.next += self.step;
        Some(cursor)
    }
}

/// The results of an online round.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlineRoundReport {
    /// The index of this round among the online ones, warm up excluded.
    pub online_epoch: usize,
    pub loss: RoundLoss,
    /// The amount of cursor positions visited.
    pub steps: usize,
    /// The errors of the global model on the reference partition.
    pub global: ErrorMetrics,
    /// The errors of every participant on its own partition.
    pub partitions: BTreeMap<String, ErrorMetrics>,
}

/// Runs the online variant of federated training.
///
/// Each round walks a rolling cursor over the held out data. At every position the
/// global model forecasts the reference partition, every participant forecasts its
/// own partition and retrains, and the results are aggregated before moving on.
pub struct OnlineOrchestrator<A: Aggregator = FedAvg> {
    rounds: RoundOrchestrator<A>,
    reference: Arc<dyn LocalTrainer>,
    test_len: usize,
    window_size: usize,
    test_range: NonZeroUsize,
    online_epoch: usize,
}

impl<A: Aggregator> OnlineOrchestrator<A> {
    /// Creates a new `OnlineOrchestrator`.
    ///
    /// # Arguments
    /// * `rounds` - Drives selection, dispatch and aggregation.
    /// * `reference` - The partition the global model is evaluated on, never trained.
    /// * `test_len` - The amount of held out values the cursor walks over.
    /// * `window_size` - The forecaster's input window.
    /// * `test_range` - The cursor's step.
    ///
    /// # Returns
    /// An error if not even the first cursor position fits, or if the reference or any
    /// participant holds out fewer than `test_len` values.
    pub fn new(
        rounds: RoundOrchestrator<A>,
        reference: Arc<dyn LocalTrainer>,
        test_len: usize,
        window_size: usize,
        test_range: NonZeroUsize,
    ) -> Result<Self> {
        if test_len <= window_size {
            return Err(OrchestratorError::InvalidConfig(format!(
                "test_len ({test_len}) must be larger than window_size ({window_size})"
            )));
        }

        let short = std::iter::once(&reference)
            .chain(rounds.trainers())
            .find(|trainer| trainer.test_len() < test_len);

        if let Some(trainer) = short {
            return Err(OrchestratorError::InvalidConfig(format!(
                "partition {} holds out {} values, the rolling cursor needs {test_len}",
                trainer.id(),
                trainer.test_len()
            )));
        }

        Ok(Self {
            rounds,
            reference,
            test_len,
            window_size,
            test_range,
            online_epoch: 0,
        })
    }

    pub fn rounds(&self) -> &RoundOrchestrator<A> {
        &self.rounds
    }

    pub fn into_rounds(self) -> RoundOrchestrator<A> {
        self.rounds
    }

    /// The cursor positions of every online round.
    pub fn cursor(&self) -> RollingCursor {
        RollingCursor::new(self.test_len, self.window_size, self.test_range)
    }

    /// Runs ordinary rounds before the online ones.
    pub async fn warm_up(&mut self, rounds: usize) -> Result<()> {
        for _ in 0..rounds {
            self.rounds.round().await?;
        }

        Ok(())
    }

    /// Runs `online_epochs` online rounds and finishes.
    pub async fn run(&mut self, online_epochs: usize) -> Result<Vec<OnlineRoundReport>> {
        let mut reports = Vec::with_capacity(online_epochs);
        for _ in 0..online_epochs {
            reports.push(self.round().await?);
        }

        self.rounds.finish();
        Ok(reports)
    }

    /// Runs a single online round.
    pub async fn round(&mut self) -> Result<OnlineRoundReport> {
        let epoch = self.rounds.next_epoch();
        let online_epoch = self.online_epoch;
        let participants = self.rounds.select()?;

        let mut ledger = PredictionLedger::new();
        let mut losses = Vec::new();
        let mut steps = 0;

        for cursor in self.cursor() {
            info!(epoch = epoch, online_epoch = online_epoch, cursor = cursor; "online step");

            let forecast = self.global_forecast(cursor).await?;
            ledger.record_global(forecast);

            let ctx = *self.rounds.ctx();
            let completed = self
                .rounds
                .dispatch(epoch, &participants, move |trainer, params| {
                    trainer.infer_and_update_weights(cursor, params, epoch, &ctx)
                })
                .await?;

            let mut params = Vec::with_capacity(completed.len());
            for done in completed {
                ledger.record(&done.partition, done.value.forecast);
                losses.push(done.value.update.loss);
                params.push(done.value.update.params);
            }

            self.rounds.update(&params)?;
            steps += 1;
        }

        let loss = self.rounds.complete(epoch, &losses);
        let global = ErrorMetrics::from_pair(ledger.global());
        info!(
            epoch = epoch,
            rmse = global.rmse,
            nrmse = global.nrmse,
            mae = global.mae;
            "global model errors"
        );

        let partitions = ledger
            .partitions()
            .map(|(id, pair)| {
                let metrics = ErrorMetrics::from_pair(pair);
                info!(
                    partition = id.as_str(),
                    rmse = metrics.rmse,
                    nrmse = metrics.nrmse,
                    mae = metrics.mae;
                    "participant errors"
                );
                (id.clone(), metrics)
            })
            .collect();

        self.online_epoch += 1;

        Ok(OnlineRoundReport {
            online_epoch,
            loss,
            steps,
            global,
            partitions,
        })
    }

    /// Forecasts the reference partition with the current global parameters.
    async fn global_forecast(&self, cursor: usize) -> Result<worker::Forecast> {
        let reference = Arc::clone(&self.reference);
        let params = self.rounds.global().snapshot();
        let ctx = *self.rounds.ctx();

        task::spawn_blocking(move || reference.infer(cursor, &params, &ctx))
            .await?
            .map_err(|source| OrchestratorError::Participant {
                partition: self.reference.id().to_string(),
                source,
            })
    }
}
