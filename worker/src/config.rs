use std::num::NonZeroUsize;

use machine_learning::arch::ForecasterSpec;

/// The hyper parameters every local trainer shares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerConfig {
    /// The amount of passes over the local data per update.
    pub local_epochs: NonZeroUsize,
    /// The amount of past values the forecaster looks at.
    pub window_size: NonZeroUsize,
    pub hidden_size: NonZeroUsize,
    pub learning_rate: f32,
    pub batch_size: NonZeroUsize,
    /// The amount of held out sequences inferred per rolling step.
    pub test_range: NonZeroUsize,
}

impl WorkerConfig {
    /// The architecture of the local forecaster.
    pub fn forecaster(&self) -> ForecasterSpec {
        ForecasterSpec::new(self.window_size.get(), self.hidden_size.get())
    }
}
