use ndarray::{Array2, ArrayView2};

use crate::{ParameterSet, Result, arch::loss::LossFn, optimization::Optimizer};

pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Seeds the model with the given parameters.
    ///
    /// # Returns
    /// An error if `params` doesn't have the layout this model expects.
    fn load(&mut self, params: &ParameterSet) -> Result<()>;

    /// Returns a copy of the model's current parameters.
    fn store(&self) -> ParameterSet;

    /// Runs inference over `x`, one sample per row.
    fn predict(&self, x: ArrayView2<f32>) -> Array2<f32>;

    /// Computes the gradient of the loss function with respect to the parameters of the model
    /// over the provided batches and **updates the parameters** after each batch according to
    /// the optimization algorithm.
    ///
    /// # Arguments
    /// * `optimizer` - The optimizer that dictates how to update the weights on each gradient calculation.
    /// * `loss_fn` - The loss function.
    /// * `batches` - The batches of data.
    ///
    /// # Returns
    /// The epoch loss.
    fn backprop<'a, O, L, I>(&mut self, optimizer: &mut O, loss_fn: &L, batches: I) -> Result<f32>
    where
        O: Optimizer,
        L: LossFn,
        I: Iterator<Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>)>;
}
