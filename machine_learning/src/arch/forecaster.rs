use super::{Sequential, activations::ActFn, layers::Dense};

/// The shape of the one step ahead forecaster shared by every participant:
/// a window of past values goes through one sigmoid hidden layer into a
/// single linear output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecasterSpec {
    pub window_size: usize,
    pub hidden_size: usize,
}

impl ForecasterSpec {
    pub fn new(window_size: usize, hidden_size: usize) -> Self {
        Self {
            window_size,
            hidden_size,
        }
    }

    /// Builds a zeroed model with this architecture.
    pub fn build(&self) -> Sequential {
        Sequential::new([
            Dense::new(
                (self.window_size, self.hidden_size),
                Some(ActFn::sigmoid(1.)),
            ),
            Dense::new((self.hidden_size, 1), None),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::Model;

    #[test]
    fn size_counts_weights_and_biases() {
        let model = ForecasterSpec::new(4, 3).build();
        assert_eq!(model.size(), (4 + 1) * 3 + (3 + 1));
    }
}
