use machine_learning::ParameterSet;

use crate::{Result, ServerErr};

/// The owner of the canonical global parameters.
///
/// Participants only ever receive snapshots, the global parameters are replaced
/// wholesale once a round's aggregate is ready.
#[derive(Debug, Clone)]
pub struct GlobalModel {
    params: ParameterSet,
    version: usize,
}

impl GlobalModel {
    /// Creates a new `GlobalModel` at version 0.
    ///
    /// # Arguments
    /// * `params` - The initial global parameters.
    pub fn new(params: ParameterSet) -> Self {
        Self { params, version: 0 }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Returns an independent deep copy of the current parameters.
    pub fn snapshot(&self) -> ParameterSet {
        self.params.clone()
    }

    /// The amount of times the parameters have been replaced.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Replaces the global parameters with a new aggregate.
    ///
    /// # Returns
    /// An error if `params` doesn't have the current layout.
    pub fn replace(&mut self, params: ParameterSet) -> Result<()> {
        if !self.params.same_layout(&params) {
            return Err(ServerErr::LayoutChanged);
        }

        self.params = params;
        self.version += 1;
        Ok(())
    }

    pub fn into_params(self) -> ParameterSet {
        self.params
    }
}
