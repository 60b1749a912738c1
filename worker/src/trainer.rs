use machine_learning::ParameterSet;

use crate::{ExecContext, Result, WorkerErr};

/// The outcome of a local training run.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalUpdate {
    /// The participant's parameters after training.
    pub params: ParameterSet,
    /// The mean training loss, never negative.
    pub loss: f32,
}

/// Observed and predicted values over a stretch of held out data, in the series' original units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    actual: Vec<f32>,
    predicted: Vec<f32>,
}

impl Forecast {
    /// Creates a new `Forecast`.
    ///
    /// # Returns
    /// An error if both sequences don't have the same length.
    pub fn new(actual: Vec<f32>, predicted: Vec<f32>) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(WorkerErr::InvalidForecast {
                actual: actual.len(),
                predicted: predicted.len(),
            });
        }

        Ok(Self { actual, predicted })
    }

    pub fn actual(&self) -> &[f32] {
        &self.actual
    }

    pub fn predicted(&self) -> &[f32] {
        &self.predicted
    }

    pub fn len(&self) -> usize {
        self.actual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }

    pub fn into_parts(self) -> (Vec<f32>, Vec<f32>) {
        (self.actual, self.predicted)
    }
}

/// The outcome of a combined inference and training step.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlineUpdate {
    pub update: LocalUpdate,
    pub forecast: Forecast,
}

/// A participant of the federation: trains a local model on its private data
/// starting from the global parameters.
///
/// Every call receives its own copy of the global parameters, implementors
/// never see the orchestrator's canonical set.
pub trait LocalTrainer: Send + Sync {
    /// The id of the partition this trainer owns.
    fn id(&self) -> &str;

    /// The amount of held out values the partition has.
    fn test_len(&self) -> usize;

    /// Trains the local model for a bounded amount of epochs.
    ///
    /// # Arguments
    /// * `params` - A copy of the global parameters, seeded into the local model.
    /// * `round` - The current round number.
    /// * `ctx` - The execution context.
    ///
    /// # Returns
    /// The trained parameters and their mean loss.
    fn update_weights(
        &self,
        params: ParameterSet,
        round: usize,
        ctx: &ExecContext,
    ) -> Result<LocalUpdate>;

    /// Runs inference over the held out sequences starting at `cursor`, without training.
    ///
    /// # Returns
    /// The forecast, or `InsufficientData` if fewer than `cursor + window` values are held out.
    fn infer(&self, cursor: usize, params: &ParameterSet, ctx: &ExecContext) -> Result<Forecast>;

    /// Runs `infer` at `cursor` and then trains like `update_weights`.
    fn infer_and_update_weights(
        &self,
        cursor: usize,
        params: ParameterSet,
        round: usize,
        ctx: &ExecContext,
    ) -> Result<OnlineUpdate> {
        let forecast = self.infer(cursor, &params, ctx)?;
        let update = self.update_weights(params, round, ctx)?;
        Ok(OnlineUpdate { update, forecast })
    }
}
