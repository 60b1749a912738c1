use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{Model, layers::Dense, loss::LossFn};
use crate::{
    MlErr, ParameterSet, Result,
    initialization::{ConstParamGen, Init, ParamGen},
    optimization::Optimizer,
};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Dense>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Dense>,
    {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    /// Generates a fresh set of parameters for this architecture.
    ///
    /// Weights are sampled from `init` with each layer's fan in and fan out, biases start at zero.
    ///
    /// # Arguments
    /// * `init` - The weight initialization scheme.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// A new parameter set or an error if the initializer is invalid for some layer.
    pub fn init<R: Rng>(&self, init: &Init, rng: &mut R) -> Result<ParameterSet> {
        let mut params = ParameterSet::new();

        for (i, layer) in self.layers.iter().enumerate() {
            let (fan_in, fan_out) = layer.dim();
            let limit = fan_in * fan_out;

            let weights = init.param_gen(rng, limit, fan_in, fan_out)?.sample(limit);
            let weights = weights.unwrap_or_default();
            let w = Array2::from_shape_vec((fan_in, fan_out), weights).map_err(|_| {
                MlErr::SizeMismatch {
                    what: "initialized weights",
                    got: 0,
                    expected: limit,
                }
            })?;

            let biases = ConstParamGen::new(0., fan_out)
                .sample(fan_out)
                .unwrap_or_default();

            params.insert(param_name(i, "weight"), w);
            params.insert(param_name(i, "bias"), ndarray::Array1::from(biases));
        }

        Ok(params)
    }

    /// Makes a forward pass through the network, keeping the metadata for backprop.
    fn forward(&mut self, x: ArrayView2<f32>) -> Array2<f32> {
        let mut layers = self.layers.iter_mut();

        let Some(first) = layers.next() else {
            return x.to_owned();
        };

        layers.fold(first.forward(x), |y, layer| layer.forward(y.view()))
    }
}

fn param_name(layer: usize, kind: &str) -> String {
    format!("dense.{layer}.{kind}")
}

fn layer_prefix(layer: usize) -> String {
    format!("dense.{layer}")
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.layers.iter().map(|layer| layer.size()).sum()
    }

    fn load(&mut self, params: &ParameterSet) -> Result<()> {
        let expected = 2 * self.layers.len();
        if params.len() != expected {
            return Err(MlErr::SizeMismatch {
                what: "parameter set entries",
                got: params.len(),
                expected,
            });
        }

        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.load(params, &layer_prefix(i))?;
        }

        Ok(())
    }

    fn store(&self) -> ParameterSet {
        let mut params = ParameterSet::new();

        for (i, layer) in self.layers.iter().enumerate() {
            layer.store(&mut params, &layer_prefix(i));
        }

        params
    }

    fn predict(&self, x: ArrayView2<f32>) -> Array2<f32> {
        let mut layers = self.layers.iter();

        let Some(first) = layers.next() else {
            return x.to_owned();
        };

        layers.fold(first.infer(x), |y, layer| layer.infer(y.view()))
    }

    // NOTE: the returned loss is the average of the batch losses, which approximates the
    // loss over the whole epoch without an extra forward pass.
    fn backprop<'a, O, L, I>(&mut self, optimizer: &mut O, loss_fn: &L, batches: I) -> Result<f32>
    where
        O: Optimizer,
        L: LossFn,
        I: Iterator<Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>)>,
    {
        let mut total_loss = 0.0;
        let mut num_batches = 0;

        for (x, y) in batches {
            let y_pred = self.forward(x);
            total_loss += loss_fn.loss(y_pred.view(), y);
            num_batches += 1;

            let mut d = loss_fn.loss_prime(y_pred.view(), y);
            for layer in self.layers.iter_mut().rev() {
                d = layer.backward(d);
            }

            for layer in &mut self.layers {
                layer.optimize(optimizer)?;
            }
        }

        if num_batches == 0 {
            return Err(MlErr::EmptyDataset);
        }

        Ok(total_loss / num_batches as f32)
    }
}
