mod constant;
mod error;
mod param_gen;
mod random;

pub use constant::ConstParamGen;
pub use param_gen::ParamGen;
pub use random::RandParamGen;

use rand::Rng;

use crate::Result;

/// The weight initialization schemes available when creating a fresh model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Init {
    Const { value: f32 },
    Uniform { low: f32, high: f32 },
    Normal { mean: f32, std_dev: f32 },
    XavierUniform,
    Xavier,
    LecunUniform,
    Lecun,
    Kaiming,
}

impl Init {
    /// Builds the parameter generator for a weight tensor.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `limit` - The amount of weights in the tensor.
    /// * `fan_in` - The number of input units in the weight tensor.
    /// * `fan_out` - The number of output units in the weight tensor.
    ///
    /// # Returns
    /// A boxed generator or an error if the resulting distribution is invalid.
    pub fn param_gen<'r, R: Rng>(
        &self,
        rng: &'r mut R,
        limit: usize,
        fan_in: usize,
        fan_out: usize,
    ) -> Result<Box<dyn ParamGen + 'r>> {
        let param_gen: Box<dyn ParamGen + 'r> = match *self {
            Init::Const { value } => Box::new(ConstParamGen::new(value, limit)),
            Init::Uniform { low, high } => Box::new(RandParamGen::uniform(rng, limit, low, high)?),
            Init::Normal { mean, std_dev } => {
                Box::new(RandParamGen::normal(rng, limit, mean, std_dev)?)
            }
            Init::XavierUniform => {
                Box::new(RandParamGen::xavier_uniform(rng, limit, fan_in, fan_out)?)
            }
            Init::Xavier => Box::new(RandParamGen::xavier(rng, limit, fan_in, fan_out)?),
            Init::LecunUniform => Box::new(RandParamGen::lecun_uniform(rng, limit, fan_in)?),
            Init::Lecun => Box::new(RandParamGen::lecun(rng, limit, fan_in)?),
            Init::Kaiming => Box::new(RandParamGen::kaiming(rng, limit, fan_in)?),
        };

        Ok(param_gen)
    }
}
