use std::num::NonZeroUsize;

use log::trace;
use ndarray::{Array2, ArrayView2};
use rand::Rng;

use crate::{
    MlErr, Result,
    arch::{Model, loss::LossFn},
    dataset::WindowDataset,
    optimization::Optimizer,
};

/// A model `ModelTrainer`. Contains the relevant components needed for training a model,
/// including the model itself.
pub struct ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    model: M,
    optimizer: O,
    loss_fn: L,
    epochs: NonZeroUsize,
    batch_size: NonZeroUsize,
    rng: R,
}

impl<M, O, L, R> ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    /// Returns a new `ModelTrainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `optimizer` - The optimizer applied after each batch.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output and the expected one.
    /// * `epochs` - The amount of passes over the dataset per `fit` call.
    /// * `batch_size` - The amount of samples per batch.
    /// * `rng` - A random number generator, used for shuffling.
    pub fn new(
        model: M,
        optimizer: O,
        loss_fn: L,
        epochs: NonZeroUsize,
        batch_size: NonZeroUsize,
        rng: R,
    ) -> Self {
        Self {
            model,
            optimizer,
            loss_fn,
            epochs,
            batch_size,
            rng,
        }
    }

    /// Trains the model over `dataset` for the configured amount of epochs.
    ///
    /// # Returns
    /// The mean of the epoch losses.
    pub fn fit(&mut self, dataset: &mut WindowDataset) -> Result<f32> {
        if dataset.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        let epochs = self.epochs.get();
        let mut total = 0.0;

        for epoch in 0..epochs {
            dataset.shuffle(&mut self.rng);
            let batches = dataset.batches(self.batch_size);

            let loss = self
                .model
                .backprop(&mut self.optimizer, &self.loss_fn, batches)?;

            trace!(epoch = epoch, loss = loss; "finished local epoch");
            total += loss;
        }

        Ok(total / epochs as f32)
    }

    /// Runs inference without touching the parameters.
    pub fn predict(&self, x: ArrayView2<f32>) -> Array2<f32> {
        self.model.predict(x)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Consumes the trainer, returning the trained model.
    pub fn into_model(self) -> M {
        self.model
    }
}
