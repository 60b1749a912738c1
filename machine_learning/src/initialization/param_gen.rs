/// A source of initial values for a model's weights and biases.
///
/// Generators are bounded: once `limit` values were handed out every further
/// call returns `None`.
pub trait ParamGen {
    /// Draws up to `n` values, fewer if the generator is close to exhausted.
    ///
    /// # Returns
    /// The drawn values or `None` if nothing is left.
    fn sample(&mut self, n: usize) -> Option<Vec<f32>>;
}
