//! Handling of raw inputs outside the nominal 0-10 range

use crate::{question_key, transition_key, RawAnswers, CYCLE_LEN};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest nominal input value
pub const INPUT_MIN: f64 = 0.0;
/// Highest nominal input value
pub const INPUT_MAX: f64 = 10.0;

/// What to do with answers outside `[0, 10]` before scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPolicy {
    /// Score values as given; out-of-range values propagate into the result
    #[default]
    Passthrough,
    /// Clamp each value into `[0, 10]`
    Clamp,
    /// Fail on the first value outside `[0, 10]`
    Reject,
}

impl InputPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "passthrough" | "pass" => Some(Self::Passthrough),
            "clamp" => Some(Self::Clamp),
            "reject" | "strict" => Some(Self::Reject),
            _ => None,
        }
    }

    /// Apply the policy, returning the answers to score
    pub fn apply(self, answers: &RawAnswers) -> Result<RawAnswers, InputError> {
        match self {
            InputPolicy::Passthrough => Ok(*answers),
            InputPolicy::Clamp => {
                check_finite(answers)?;
                let clamped = RawAnswers::new(
                    answers.stages.map(clamp_input),
                    answers.transitions.map(clamp_input),
                );
                if clamped != *answers {
                    log::debug!("clamped out-of-range answers into [{INPUT_MIN}, {INPUT_MAX}]");
                }
                Ok(clamped)
            }
            InputPolicy::Reject => {
                check_finite(answers)?;
                match answers.entries().find(|(_, v)| !in_range(*v)) {
                    Some((key, value)) => Err(InputError::OutOfRange { key, value }),
                    None => Ok(*answers),
                }
            }
        }
    }
}

impl std::fmt::Display for InputPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputPolicy::Passthrough => write!(f, "passthrough"),
            InputPolicy::Clamp => write!(f, "clamp"),
            InputPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Raw answers refused by the input policy
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{key} = {value} is outside the range [0, 10]")]
    OutOfRange { key: String, value: f64 },

    #[error("{key} is not a finite number")]
    NotFinite { key: String },
}

fn in_range(value: f64) -> bool {
    (INPUT_MIN..=INPUT_MAX).contains(&value)
}

fn clamp_input(value: f64) -> f64 {
    value.clamp(INPUT_MIN, INPUT_MAX)
}

fn check_finite(answers: &RawAnswers) -> Result<(), InputError> {
    for i in 0..CYCLE_LEN {
        if !answers.stages[i].is_finite() {
            return Err(InputError::NotFinite {
                key: question_key(i),
            });
        }
    }
    for i in 0..CYCLE_LEN {
        if !answers.transitions[i].is_finite() {
            return Err(InputError::NotFinite {
                key: transition_key(i),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_keeps_values() {
        let answers = RawAnswers::uniform(5.0).with_stage(0, 14.0).with_transition(3, -2.0);
        let out = InputPolicy::Passthrough.apply(&answers).unwrap();
        assert_eq!(out, answers);
    }

    #[test]
    fn test_passthrough_allows_nan() {
        let answers = RawAnswers::uniform(5.0).with_stage(2, f64::NAN);
        let out = InputPolicy::Passthrough.apply(&answers).unwrap();
        assert!(out.stages[2].is_nan());
    }

    #[test]
    fn test_clamp_bounds_values() {
        let answers = RawAnswers::uniform(5.0).with_stage(0, 14.0).with_transition(3, -2.0);
        let out = InputPolicy::Clamp.apply(&answers).unwrap();
        assert_eq!(out.stages[0], 10.0);
        assert_eq!(out.transitions[3], 0.0);
        assert_eq!(out.stages[1], 5.0);
    }

    #[test]
    fn test_clamp_rejects_non_finite() {
        let answers = RawAnswers::uniform(5.0).with_transition(6, f64::INFINITY);
        let err = InputPolicy::Clamp.apply(&answers).unwrap_err();
        assert_eq!(
            err,
            InputError::NotFinite {
                key: "T7".to_string()
            }
        );
    }

    #[test]
    fn test_reject_names_first_offending_key() {
        let answers = RawAnswers::uniform(5.0)
            .with_stage(4, 10.5)
            .with_transition(0, -1.0);
        let err = InputPolicy::Reject.apply(&answers).unwrap_err();
        assert_eq!(
            err,
            InputError::OutOfRange {
                key: "Q5".to_string(),
                value: 10.5
            }
        );
        assert!(err.to_string().contains("Q5 = 10.5"));
    }

    #[test]
    fn test_reject_accepts_bounds() {
        let answers = RawAnswers::new([0.0; CYCLE_LEN], [10.0; CYCLE_LEN]);
        assert!(InputPolicy::Reject.apply(&answers).is_ok());
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(InputPolicy::parse("clamp"), Some(InputPolicy::Clamp));
        assert_eq!(InputPolicy::parse("REJECT"), Some(InputPolicy::Reject));
        assert_eq!(InputPolicy::parse("passthrough"), Some(InputPolicy::Passthrough));
        assert_eq!(InputPolicy::parse("ignore"), None);
    }

    #[test]
    fn test_policy_serde_lowercase() {
        let p: InputPolicy = serde_json::from_str("\"clamp\"").unwrap();
        assert_eq!(p, InputPolicy::Clamp);
        assert_eq!(serde_json::to_string(&InputPolicy::Reject).unwrap(), "\"reject\"");
    }
}
