//! Programmatic score requests: `{"Q1": 5, ..., "T7": 5, "penalty": false}`

use crate::{question_key, transition_key, AggregationConfig, RawAnswers, CYCLE_LEN};
use serde_json::{Map, Value};
use thiserror::Error;

/// A parsed score request: default-filled answers plus optional overrides
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRequest {
    pub answers: RawAnswers,
    /// Enables or disables the blocked-transition penalty for this request
    pub penalty: Option<bool>,
    pub tau: Option<f64>,
    pub delta: Option<f64>,
}

/// Malformed request body
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request must be a JSON object")]
    NotAnObject,

    #[error("{key} must be a number")]
    NotANumber { key: String },

    #[error("penalty must be true or false")]
    InvalidPenalty,

    #[error("{key} = {value} is out of range")]
    OutOfRange { key: &'static str, value: f64 },
}

impl ScoreRequest {
    /// Request for the given answers with no overrides
    pub fn from_answers(answers: RawAnswers) -> Self {
        Self {
            answers,
            penalty: None,
            tau: None,
            delta: None,
        }
    }

    /// Parse a request from JSON text
    pub fn from_json(text: &str) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Parse a request from a JSON value. Missing answer keys become 0 and
    /// unknown keys are ignored; a present key with the wrong type is an error.
    pub fn from_value(value: &Value) -> Result<Self, RequestError> {
        let obj = value.as_object().ok_or(RequestError::NotAnObject)?;

        let mut answers = RawAnswers::default();
        for i in 0..CYCLE_LEN {
            answers.stages[i] = number_or_zero(obj, &question_key(i))?;
            answers.transitions[i] = number_or_zero(obj, &transition_key(i))?;
        }

        let penalty = match obj.get("penalty") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => return Err(RequestError::InvalidPenalty),
        };

        let tau = optional_number(obj, "tau")?;
        if let Some(value) = tau.filter(|t| !AggregationConfig::is_valid_tau(*t)) {
            return Err(RequestError::OutOfRange { key: "tau", value });
        }
        let delta = optional_number(obj, "delta")?;
        if let Some(value) = delta.filter(|d| !AggregationConfig::is_valid_delta(*d)) {
            return Err(RequestError::OutOfRange { key: "delta", value });
        }

        let request = Self {
            answers,
            penalty,
            tau,
            delta,
        };
        log::debug!(
            "parsed request: {} keys, penalty={:?}",
            obj.len(),
            request.penalty
        );
        Ok(request)
    }

    /// Aggregation config for this request, falling back to `base`
    pub fn resolve_config(&self, base: &AggregationConfig) -> AggregationConfig {
        AggregationConfig {
            penalty_enabled: self.penalty.unwrap_or(base.penalty_enabled),
            tau: self.tau.unwrap_or(base.tau),
            delta: self.delta.unwrap_or(base.delta),
        }
    }
}

fn optional_number(obj: &Map<String, Value>, key: &str) -> Result<Option<f64>, RequestError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| RequestError::NotANumber {
                key: key.to_string(),
            }),
    }
}

fn number_or_zero(obj: &Map<String, Value>, key: &str) -> Result<f64, RequestError> {
    Ok(optional_number(obj, key)?.unwrap_or(0.0))
}
