use machine_learning::initialization::Init;
use serde::{Deserialize, Serialize};

/// How the initial global weights are drawn. Biases always start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum InitConfig {
    Const { value: f32 },
    Uniform { low: f32, high: f32 },
    Normal { mean: f32, std_dev: f32 },
    XavierUniform,
    Xavier,
    LecunUniform,
    Lecun,
    Kaiming,
}

impl From<InitConfig> for Init {
    fn from(config: InitConfig) -> Self {
        match config {
            InitConfig::Const { value } => Init::Const { value },
            InitConfig::Uniform { low, high } => Init::Uniform { low, high },
            InitConfig::Normal { mean, std_dev } => Init::Normal { mean, std_dev },
            InitConfig::XavierUniform => Init::XavierUniform,
            InitConfig::Xavier => Init::Xavier,
            InitConfig::LecunUniform => Init::LecunUniform,
            InitConfig::Lecun => Init::Lecun,
            InitConfig::Kaiming => Init::Kaiming,
        }
    }
}

/// The shared forecaster and its local optimizer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub hidden_size: usize,
    pub learning_rate: f32,
    pub batch_size: usize,
    pub init: InitConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_size: 32,
            learning_rate: 0.05,
            batch_size: 32,
            init: InitConfig::XavierUniform,
        }
    }
}
