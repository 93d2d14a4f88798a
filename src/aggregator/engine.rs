//! Score aggregator - applies the input policy, then the scoring core

use crate::request::ScoreRequest;
use crate::{AggregationConfig, RawAnswers, ScoreResult};

use super::policy::{InputError, InputPolicy};
use super::scoring::compute;

/// Scores answers under a fixed aggregation config and input policy
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreAggregator {
    config: AggregationConfig,
    policy: InputPolicy,
}

impl ScoreAggregator {
    /// Create an aggregator with default parameters and passthrough inputs
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: AggregationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_policy(mut self, policy: InputPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    pub fn policy(&self) -> InputPolicy {
        self.policy
    }

    /// Score a set of answers
    pub fn score(&self, answers: &RawAnswers) -> Result<ScoreResult, InputError> {
        let answers = self.policy.apply(answers)?;
        Ok(compute(&answers, &self.config))
    }

    /// Score a request; its `penalty`/`tau`/`delta` fields override this
    /// aggregator's config for the one call
    pub fn score_request(&self, request: &ScoreRequest) -> Result<ScoreResult, InputError> {
        let config = request.resolve_config(&self.config);
        let answers = self.policy.apply(&request.answers)?;
        Ok(compute(&answers, &config))
    }
}
