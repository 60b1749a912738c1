use std::ops::Range;

use log::debug;
use machine_learning::{
    ParameterSet,
    arch::{Model, Sequential, loss::Mse},
    dataset::WindowDataset,
    optimization::GradientDescent,
    training::ModelTrainer,
};

use crate::{
    ExecContext, Forecast, LocalTrainer, LocalUpdate, OnlineUpdate, Result, WorkerConfig,
    WorkerErr, data::Partition,
};

/// A `LocalTrainer` that fits the shared forecaster to one partition's series.
#[derive(Debug, Clone)]
pub struct SeriesTrainer {
    partition: Partition,
    config: WorkerConfig,
}

impl SeriesTrainer {
    /// Creates a new `SeriesTrainer`.
    ///
    /// # Arguments
    /// * `partition` - The private data of this participant.
    /// * `config` - The shared local hyper parameters.
    pub fn new(partition: Partition, config: WorkerConfig) -> Self {
        Self { partition, config }
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    fn model(&self, params: &ParameterSet) -> Result<Sequential> {
        let mut model = self.config.forecaster().build();
        model.load(params)?;
        Ok(model)
    }

    /// Fits a model seeded from `params` to `series`.
    fn train(
        &self,
        series: &[f32],
        params: &ParameterSet,
        rng_key: (usize, Option<usize>),
        ctx: &ExecContext,
    ) -> Result<LocalUpdate> {
        let mut dataset = WindowDataset::from_series(series, self.config.window_size.get())?;
        let rng = ctx.rng((self.partition.id(), rng_key));

        let mut trainer = ModelTrainer::new(
            self.model(params)?,
            GradientDescent::new(self.config.learning_rate),
            Mse,
            self.config.local_epochs,
            self.config.batch_size,
            rng,
        );

        let loss = trainer.fit(&mut dataset)?;
        Ok(LocalUpdate {
            params: trainer.into_model().store(),
            loss,
        })
    }

    /// The held out sequences inferred at `cursor`.
    ///
    /// # Returns
    /// The range of sequence starts, or `InsufficientData` if not even the window at `cursor` fits.
    fn sequences(&self, cursor: usize) -> Result<Range<usize>> {
        let window = self.config.window_size.get();
        let available = self.partition.test().len();

        if available < cursor + window {
            return Err(WorkerErr::InsufficientData {
                partition: self.partition.id().to_string(),
                needed: cursor + window,
                available,
            });
        }

        let end = (cursor + self.config.test_range.get()).min(available - window);
        Ok(cursor..end)
    }

    fn forecast(&self, params: &ParameterSet, sequences: Range<usize>) -> Result<Forecast> {
        if sequences.is_empty() {
            return Ok(Forecast::default());
        }

        let model = self.model(params)?;
        let window = self.config.window_size.get();
        let dataset = WindowDataset::from_series(self.partition.test(), window)?;
        let (x, y) = dataset.rows(sequences);

        let mut actual: Vec<f32> = y.iter().copied().collect();
        let mut predicted: Vec<f32> = model.predict(x).iter().copied().collect();
        self.partition.denormalize(&mut actual);
        self.partition.denormalize(&mut predicted);

        Forecast::new(actual, predicted)
    }
}

impl LocalTrainer for SeriesTrainer {
    fn id(&self) -> &str {
        self.partition.id()
    }

    fn test_len(&self) -> usize {
        self.partition.test().len()
    }

    fn update_weights(
        &self,
        params: ParameterSet,
        round: usize,
        ctx: &ExecContext,
    ) -> Result<LocalUpdate> {
        let update = self.train(self.partition.train(), &params, (round, None), ctx)?;
        debug!(partition = self.id(), round = round, loss = update.loss; "local update");
        Ok(update)
    }

    fn infer(&self, cursor: usize, params: &ParameterSet, _ctx: &ExecContext) -> Result<Forecast> {
        self.forecast(params, self.sequences(cursor)?)
    }

    // Retrains over everything observed up to the end of the inferred stretch,
    // the held out values stop being unseen once they've been forecast.
    fn infer_and_update_weights(
        &self,
        cursor: usize,
        params: ParameterSet,
        round: usize,
        ctx: &ExecContext,
    ) -> Result<OnlineUpdate> {
        let sequences = self.sequences(cursor)?;
        let forecast = self.forecast(&params, sequences.clone())?;

        let observed = sequences.end + self.config.window_size.get();
        let series: Vec<f32> = self
            .partition
            .train()
            .iter()
            .chain(&self.partition.test()[..observed])
            .copied()
            .collect();

        let update = self.train(&series, &params, (round, Some(cursor)), ctx)?;
        debug!(
            partition = self.id(),
            round = round,
            cursor = cursor,
            loss = update.loss;
            "online local update"
        );

        Ok(OnlineUpdate { update, forecast })
    }
}
