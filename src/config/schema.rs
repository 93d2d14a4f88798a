//! Config schema and deserialization

use crate::aggregator::InputPolicy;
use crate::{AggregationConfig, RawAnswers, CYCLE_LEN, DEFAULT_STAGE_LABELS};
use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Root config structure for .enervirc.json
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default)]
    pub extends: Option<String>,

    /// Enable the blocked-transition penalty. Default: false
    #[serde(default)]
    pub penalty: Option<bool>,

    /// Blocked-transition threshold on the 0-10 scale. Default: 4.0
    #[serde(default)]
    pub tau: Option<f64>,

    /// Penalty per blocked neighbour on the 0-10 scale. Default: 0.3
    #[serde(default)]
    pub delta: Option<f64>,

    /// Handling of answers outside [0, 10]. Default: passthrough
    #[serde(default)]
    pub input_policy: Option<InputPolicy>,

    /// Display labels for S1..S7
    #[serde(default)]
    pub stage_labels: Option<Vec<String>>,

    /// Named answer sets, keyed by preset name
    #[serde(default)]
    pub presets: BTreeMap<String, RawAnswers>,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(
        mut self,
        penalty: Option<bool>,
        tau: Option<f64>,
        delta: Option<f64>,
        policy: Option<InputPolicy>,
    ) -> Self {
        if penalty.is_some() {
            self.penalty = penalty;
        }
        if tau.is_some() {
            self.tau = tau;
        }
        if delta.is_some() {
            self.delta = delta;
        }
        if policy.is_some() {
            self.input_policy = policy;
        }
        self
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        // Base values are overridden by this config's values
        if self.penalty.is_none() {
            self.penalty = base.penalty;
        }
        if self.tau.is_none() {
            self.tau = base.tau;
        }
        if self.delta.is_none() {
            self.delta = base.delta;
        }
        if self.input_policy.is_none() {
            self.input_policy = base.input_policy;
        }
        if self.stage_labels.is_none() {
            self.stage_labels = base.stage_labels;
        }
        if self.extends.is_none() {
            self.extends = base.extends;
        }
        for (name, answers) in base.presets {
            self.presets.entry(name).or_insert(answers);
        }
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if let Some(tau) = self.tau {
            if !AggregationConfig::is_valid_tau(tau) {
                anyhow::bail!("tau must be within [0, 10], got {}", tau);
            }
        }
        if let Some(delta) = self.delta {
            if !AggregationConfig::is_valid_delta(delta) {
                anyhow::bail!("delta must be a non-negative number, got {}", delta);
            }
        }
        if let Some(ref labels) = self.stage_labels {
            if labels.len() != CYCLE_LEN {
                anyhow::bail!(
                    "stageLabels must have exactly {} entries, got {}",
                    CYCLE_LEN,
                    labels.len()
                );
            }
        }
        Ok(())
    }

    /// Aggregation parameters with defaults filled in
    pub fn aggregation_config(&self) -> AggregationConfig {
        AggregationConfig {
            penalty_enabled: self.penalty.unwrap_or(false),
            tau: self.tau.unwrap_or(AggregationConfig::DEFAULT_TAU),
            delta: self.delta.unwrap_or(AggregationConfig::DEFAULT_DELTA),
        }
    }

    pub fn input_policy(&self) -> InputPolicy {
        self.input_policy.unwrap_or_default()
    }

    /// Stage labels, configured or default
    pub fn stage_labels(&self) -> Vec<String> {
        match self.stage_labels {
            Some(ref labels) if labels.len() == CYCLE_LEN => labels.clone(),
            _ => DEFAULT_STAGE_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.aggregation_config(), AggregationConfig::default());
        assert_eq!(config.input_policy(), InputPolicy::Passthrough);
        assert_eq!(config.stage_labels()[0], "Root");
        assert!(config.presets.is_empty());
    }

    #[test]
    fn test_camel_case_keys() {
        let config: Config = serde_json::from_str(
            r#"{
                "penalty": true,
                "tau": 5,
                "delta": 0.5,
                "inputPolicy": "clamp",
                "stageLabels": ["a", "b", "c", "d", "e", "f", "g"],
                "presets": { "calm": { "Q1": 6, "T1": 5 } }
            }"#,
        )
        .unwrap();
        let agg = config.aggregation_config();
        assert!(agg.penalty_enabled);
        assert_eq!(agg.tau, 5.0);
        assert_eq!(agg.delta, 0.5);
        assert_eq!(config.input_policy(), InputPolicy::Clamp);
        assert_eq!(config.stage_labels()[6], "g");

        let calm = config.presets["calm"];
        assert_eq!(calm.stages[0], 6.0);
        assert_eq!(calm.transitions[0], 5.0);
        assert_eq!(calm.stages[1], 0.0);
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = Config {
            penalty: Some(false),
            tau: Some(3.0),
            ..Config::default()
        }
        .merge_with_cli(Some(true), None, Some(1.0), Some(InputPolicy::Reject));

        assert_eq!(config.penalty, Some(true));
        assert_eq!(config.tau, Some(3.0));
        assert_eq!(config.delta, Some(1.0));
        assert_eq!(config.input_policy, Some(InputPolicy::Reject));
    }

    #[test]
    fn test_merge_from_keeps_child_values() {
        let mut child = Config {
            tau: Some(6.0),
            ..Config::default()
        };
        child
            .presets
            .insert("calm".to_string(), RawAnswers::uniform(2.0));

        let mut base = Config {
            tau: Some(2.0),
            delta: Some(0.8),
            ..Config::default()
        };
        base.presets.insert("calm".to_string(), RawAnswers::uniform(9.0));
        base.presets.insert("busy".to_string(), RawAnswers::uniform(8.0));

        child.merge_from(base);
        assert_eq!(child.tau, Some(6.0));
        assert_eq!(child.delta, Some(0.8));
        assert_eq!(child.presets["calm"], RawAnswers::uniform(2.0));
        assert_eq!(child.presets["busy"], RawAnswers::uniform(8.0));
    }

    #[test]
    fn test_validate_rejects_bad_tau() {
        let config = Config {
            tau: Some(11.0),
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("tau"));
    }

    #[test]
    fn test_validate_rejects_negative_delta() {
        let config = Config {
            delta: Some(-0.1),
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("delta"));
    }

    #[test]
    fn test_validate_rejects_wrong_label_count() {
        let config = Config {
            stage_labels: Some(vec!["only".to_string()]),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
