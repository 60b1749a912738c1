use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::ParamGen;
use crate::Result;

/// A parameter generator that follows a certain probabilistic distribution.
pub struct RandParamGen<'r, R: Rng, D: Distribution<f32>> {
    rng: &'r mut R,
    distribution: D,
    remaining: usize,
}

impl<'r, R: Rng, D: Distribution<f32>> RandParamGen<'r, R, D> {
    /// Creates a new `RandParamGen` parameter generator.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `distribution` - The distribution to sample the random numbers from.
    /// * `limit` - The maximum amount of numbers to generate.
    pub fn new(rng: &'r mut R, distribution: D, limit: usize) -> Self {
        Self {
            rng,
            distribution,
            remaining: limit,
        }
    }
}

impl<'r, R: Rng> RandParamGen<'r, R, Uniform<f32>> {
    /// Creates a new `RandParamGen` with a uniform distribution over `[low, high)`.
    ///
    /// # Returns
    /// An error if the range is invalid (low > high).
    pub fn uniform(rng: &'r mut R, limit: usize, low: f32, high: f32) -> Result<Self> {
        Ok(Self::new(rng, Uniform::new(low, high)?, limit))
    }

    /// Creates a new `RandParamGen` using Xavier uniform initialization.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `limit` - The maximum amount of numbers to generate.
    /// * `fan_in` - The number of input units in the weight tensor.
    /// * `fan_out` - The number of output units in the weight tensor.
    pub fn xavier_uniform(
        rng: &'r mut R,
        limit: usize,
        fan_in: usize,
        fan_out: usize,
    ) -> Result<Self> {
        let range = (6. / (fan_in + fan_out) as f32).sqrt();
        Self::uniform(rng, limit, -range, range)
    }

    /// Creates a new `RandParamGen` using LeCun uniform initialization.
    pub fn lecun_uniform(rng: &'r mut R, limit: usize, fan_in: usize) -> Result<Self> {
        let range = (3. / fan_in as f32).sqrt();
        Self::uniform(rng, limit, -range, range)
    }
}

impl<'r, R: Rng> RandParamGen<'r, R, Normal<f32>> {
    /// Creates a new `RandParamGen` with a normal distribution.
    ///
    /// # Returns
    /// An error if `std_dev` is not finite (Nan or infinite).
    pub fn normal(rng: &'r mut R, limit: usize, mean: f32, std_dev: f32) -> Result<Self> {
        Ok(Self::new(rng, Normal::new(mean, std_dev)?, limit))
    }

    /// Creates a new `RandParamGen` using Kaiming normal initialization.
    pub fn kaiming(rng: &'r mut R, limit: usize, fan_in: usize) -> Result<Self> {
        let std_dev = (2. / fan_in as f32).sqrt();
        Self::normal(rng, limit, 0., std_dev)
    }

    /// Creates a new `RandParamGen` using Xavier normal initialization.
    pub fn xavier(rng: &'r mut R, limit: usize, fan_in: usize, fan_out: usize) -> Result<Self> {
        let std_dev = (2. / (fan_in + fan_out) as f32).sqrt();
        Self::normal(rng, limit, 0., std_dev)
    }

    /// Creates a new `RandParamGen` using LeCun normal initialization.
    pub fn lecun(rng: &'r mut R, limit: usize, fan_in: usize) -> Result<Self> {
        let std_dev = (1. / fan_in as f32).sqrt();
        Self::normal(rng, limit, 0., std_dev)
    }
}

impl<R: Rng, D: Distribution<f32>> ParamGen for RandParamGen<'_, R, D> {
    fn sample(&mut self, mut n: usize) -> Option<Vec<f32>> {
        if self.remaining == 0 {
            return None;
        }

        n = n.min(self.remaining);
        self.remaining -= n;

        let sample = (0..n)
            .map(|_| self.distribution.sample(&mut *self.rng))
            .collect();
        Some(sample)
    }
}
