/// An optimization algorithm, applies a gradient to a set of parameters.
pub trait Optimizer {
    /// Should update `params` in place following the algorithm's learning rule.
    ///
    /// # Arguments
    /// * `params` - The parameters that are going to be modified.
    /// * `grad` - The gradient of the loss with respect to `params`.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]);
}
