use machine_learning::ParameterSet;

use crate::Result;

/// Combines the parameters returned by the participants of a round into the
/// next global parameters.
pub trait Aggregator: Send + Sync {
    /// Should merge `params` into a single parameter set with the same layout.
    ///
    /// # Arguments
    /// * `params` - The participants' parameters, never mutated.
    ///
    /// # Returns
    /// The aggregate, or an error if `params` is empty or their layouts differ.
    fn aggregate(&self, params: &[ParameterSet]) -> Result<ParameterSet>;
}
