use std::{fs, path::Path};

use log::info;
use serde::{Deserialize, Serialize};

use super::{DataConfig, ExecutionConfig, ModelConfig};
use crate::{OrchestratorError, Result};

/// The held out length used by online runs that don't set `test_len`.
pub const DEFAULT_ONLINE_TEST_LEN: usize = 1440;

/// Whether the run is plain federated training or the rolling online variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Offline,
    Online,
}

/// The whole configuration of a federated run.
///
/// Every field has a default, so an empty JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FederationConfig {
    pub mode: RunMode,
    /// Ordinary rounds, also the warm up of online runs.
    pub global_epochs: usize,
    pub local_epochs: usize,
    pub frac: f64,
    pub split_ratio: f64,
    pub normalize_data: bool,
    pub window_size: usize,
    pub online_epochs: usize,
    /// The amount of held out values per partition, `split_ratio` applies when unset.
    pub test_len: Option<usize>,
    pub test_range: usize,
    pub take_all: bool,
    pub num_participants: Option<usize>,
    pub data: DataConfig,
    pub model: ModelConfig,
    pub execution: ExecutionConfig,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Offline,
            global_epochs: 3,
            local_epochs: 2,
            frac: 0.7,
            split_ratio: 0.8,
            normalize_data: true,
            window_size: 48,
            online_epochs: 1,
            test_len: None,
            test_range: 48,
            take_all: false,
            num_participants: None,
            data: DataConfig::default(),
            model: ModelConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl FederationConfig {
    /// Reads and validates a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path:? = path; "reading configuration");

        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The held out length of every partition, if fixed.
    pub fn holdout(&self) -> Option<usize> {
        match self.mode {
            RunMode::Online => Some(self.test_len.unwrap_or(DEFAULT_ONLINE_TEST_LEN)),
            RunMode::Offline => self.test_len,
        }
    }

    /// Checks every option is within its range.
    ///
    /// # Returns
    /// An `InvalidConfig` error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        positive("global_epochs", self.global_epochs)?;
        positive("local_epochs", self.local_epochs)?;
        positive("window_size", self.window_size)?;
        positive("test_range", self.test_range)?;
        positive("model.hidden_size", self.model.hidden_size)?;
        positive("model.batch_size", self.model.batch_size)?;

        if !(self.frac > 0.0 && self.frac <= 1.0) {
            return Err(invalid(format!("frac must be in (0, 1], got {}", self.frac)));
        }

        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(invalid(format!(
                "split_ratio must be in (0, 1), got {}",
                self.split_ratio
            )));
        }

        if !(self.model.learning_rate.is_finite() && self.model.learning_rate > 0.0) {
            return Err(invalid(format!(
                "model.learning_rate must be positive, got {}",
                self.model.learning_rate
            )));
        }

        if let (false, Some(0)) = (self.take_all, self.num_participants) {
            return Err(invalid("num_participants must be at least 1".to_string()));
        }

        if self.execution.participant_timeout_ms == Some(0) {
            return Err(invalid(
                "execution.participant_timeout_ms must be positive".to_string(),
            ));
        }

        if let Some(test_len) = self.test_len {
            positive("test_len", test_len)?;
        }

        if self.mode == RunMode::Online {
            positive("online_epochs", self.online_epochs)?;

            let test_len = self.holdout().unwrap_or(DEFAULT_ONLINE_TEST_LEN);
            if test_len <= self.window_size {
                return Err(invalid(format!(
                    "test_len ({test_len}) must be larger than window_size ({})",
                    self.window_size
                )));
            }
        }

        Ok(())
    }
}

fn positive(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(invalid(format!("{field} must be greater than 0")));
    }

    Ok(())
}

fn invalid(msg: String) -> OrchestratorError {
    OrchestratorError::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::FailurePolicy;

    #[test]
    fn empty_object_uses_the_defaults() {
        let config = FederationConfig::from_json("{}").unwrap();

        assert_eq!(config, FederationConfig::default());
        assert_eq!(config.global_epochs, 3);
        assert_eq!(config.frac, 0.7);
        assert_eq!(config.data.reference, "g1");
        assert_eq!(config.holdout(), None);
    }

    #[test]
    fn online_runs_hold_out_a_day_by_default() {
        let config = FederationConfig::from_json(r#"{"mode": "online"}"#).unwrap();
        assert_eq!(config.holdout(), Some(DEFAULT_ONLINE_TEST_LEN));
    }

    #[test]
    fn nested_sections() {
        let json = r#"{
            "take_all": true,
            "num_participants": 4,
            "model": { "hidden_size": 8, "init": { "kind": "uniform", "low": -1.0, "high": 1.0 } },
            "execution": { "seed": 42, "failure_policy": "exclude", "participant_timeout_ms": 500 }
        }"#;
        let config = FederationConfig::from_json(json).unwrap();

        assert!(config.take_all);
        assert_eq!(config.model.hidden_size, 8);
        assert_eq!(config.model.batch_size, ModelConfig::default().batch_size);
        assert_eq!(config.execution.seed, Some(42));
        assert_eq!(config.execution.failure_policy, FailurePolicy::Exclude);
        assert_eq!(
            config.execution.participant_timeout(),
            Some(std::time::Duration::from_millis(500))
        );
    }

    #[test]
    fn out_of_range_options_are_rejected() {
        for json in [
            r#"{"global_epochs": 0}"#,
            r#"{"frac": 0.0}"#,
            r#"{"frac": 1.5}"#,
            r#"{"split_ratio": 1.0}"#,
            r#"{"num_participants": 0}"#,
            r#"{"mode": "online", "test_len": 10, "window_size": 10}"#,
            r#"{"model": {"learning_rate": -1.0}}"#,
        ] {
            let err = FederationConfig::from_json(json).unwrap_err();
            assert!(err.is_configuration(), "{json} gave {err}");
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            FederationConfig::from_json(r#"{"global_epoch": 3}"#),
            Err(OrchestratorError::Json(_))
        ));
    }
}
