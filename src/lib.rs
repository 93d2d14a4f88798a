//! Enervi: seven-stage cycle scoring
//!
//! This library turns seven stage self-assessments and seven transition
//! scores into normalized stage/transition scores, the dominant stage and the
//! two bottleneck transitions of the cycle.

pub mod aggregator;
pub mod config;
pub mod mcp;
pub mod presets;
pub mod reporter;
pub mod request;
pub mod session;
pub mod watcher;

pub use aggregator::{compute, InputError, InputPolicy, ScoreAggregator};
pub use request::{RequestError, ScoreRequest};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of stages (and transitions) in the cycle
pub const CYCLE_LEN: usize = 7;

/// Default display labels for stages S1..S7
pub const DEFAULT_STAGE_LABELS: [&str; CYCLE_LEN] = [
    "Root",
    "Sacral",
    "Solar",
    "Heart",
    "Throat",
    "Third Eye",
    "Crown",
];

/// Input key for stage `index` (0-based): "Q1".."Q7"
pub fn question_key(index: usize) -> String {
    format!("Q{}", index + 1)
}

/// Output key for stage `index` (0-based): "S1".."S7"
pub fn stage_key(index: usize) -> String {
    format!("S{}", index + 1)
}

/// Input and output key for transition `index` (0-based): "T1".."T7"
pub fn transition_key(index: usize) -> String {
    format!("T{}", index + 1)
}

/// Parse "S3" / "T3" / "Q3" style keys back into a 0-based index
pub fn parse_key(key: &str, prefix: char) -> Option<usize> {
    let rest = key.strip_prefix(prefix)?;
    let n: usize = rest.parse().ok()?;
    (1..=CYCLE_LEN).contains(&n).then(|| n - 1)
}

/// Raw user answers: seven stage scores (`Q1..Q7`) and seven transition
/// scores (`T1..T7`), nominally on a 0-10 scale.
///
/// Built from a key/value map with missing keys filled with `0`, so the
/// scoring core always sees a fully populated record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct RawAnswers {
    /// Stage self-assessments, index i = stage i+1
    pub stages: [f64; CYCLE_LEN],
    /// Transition scores, index i = transition from stage i+1 to stage i+2 (mod 7)
    pub transitions: [f64; CYCLE_LEN],
}

impl RawAnswers {
    pub fn new(stages: [f64; CYCLE_LEN], transitions: [f64; CYCLE_LEN]) -> Self {
        Self {
            stages,
            transitions,
        }
    }

    /// Every stage and transition set to `value`
    pub fn uniform(value: f64) -> Self {
        Self::new([value; CYCLE_LEN], [value; CYCLE_LEN])
    }

    /// Build from `Q1..Q7` / `T1..T7` keys. Missing keys default to 0 and
    /// unknown keys are ignored.
    pub fn from_map(map: &BTreeMap<String, f64>) -> Self {
        let mut answers = Self::default();
        for i in 0..CYCLE_LEN {
            answers.stages[i] = map.get(&question_key(i)).copied().unwrap_or(0.0);
            answers.transitions[i] = map.get(&transition_key(i)).copied().unwrap_or(0.0);
        }
        answers
    }

    /// Flatten into `Q1..Q7` / `T1..T7` keys
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        for i in 0..CYCLE_LEN {
            map.insert(question_key(i), self.stages[i]);
            map.insert(transition_key(i), self.transitions[i]);
        }
        map
    }

    pub fn with_stage(mut self, index: usize, value: f64) -> Self {
        self.stages[index] = value;
        self
    }

    pub fn with_transition(mut self, index: usize, value: f64) -> Self {
        self.transitions[index] = value;
        self
    }

    /// All fourteen values with their input keys, stages first
    pub fn entries(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        let stages = self
            .stages
            .iter()
            .enumerate()
            .map(|(i, v)| (question_key(i), *v));
        let transitions = self
            .transitions
            .iter()
            .enumerate()
            .map(|(i, v)| (transition_key(i), *v));
        stages.chain(transitions)
    }
}

impl From<BTreeMap<String, f64>> for RawAnswers {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self::from_map(&map)
    }
}

impl From<RawAnswers> for BTreeMap<String, f64> {
    fn from(answers: RawAnswers) -> Self {
        answers.to_map()
    }
}

/// Parameters of the stage aggregation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationConfig {
    /// Subtract `delta` for each adjacent transition below `tau`
    pub penalty_enabled: bool,
    /// Threshold (0-10) below which a transition counts as blocked
    pub tau: f64,
    /// Penalty per blocked neighbour, on the 0-10 input scale
    pub delta: f64,
}

impl AggregationConfig {
    pub const DEFAULT_TAU: f64 = 4.0;
    pub const DEFAULT_DELTA: f64 = 0.3;

    /// `tau` lies on the 0-10 input scale
    pub fn is_valid_tau(tau: f64) -> bool {
        (0.0..=10.0).contains(&tau)
    }

    /// A negative `delta` would turn the penalty into a bonus
    pub fn is_valid_delta(delta: f64) -> bool {
        delta.is_finite() && delta >= 0.0
    }

    pub fn with_penalty(mut self, enabled: bool) -> Self {
        self.penalty_enabled = enabled;
        self
    }

    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            penalty_enabled: false,
            tau: Self::DEFAULT_TAU,
            delta: Self::DEFAULT_DELTA,
        }
    }
}

/// Result of scoring one set of answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Stage scores keyed S1..S7 (0-100 for nominal inputs, one decimal)
    pub stages: BTreeMap<String, f64>,
    /// Transition scores keyed T1..T7 (input x 10, one decimal)
    pub transitions: BTreeMap<String, f64>,
    /// Stage with the highest score (lowest index on ties)
    pub dominant_stage: String,
    /// The two lowest transitions, primary bottleneck first
    pub bottleneck_transitions: Vec<String>,
}

impl ScoreResult {
    /// Stage scores in cycle order
    pub fn stage_scores(&self) -> [f64; CYCLE_LEN] {
        let mut out = [0.0; CYCLE_LEN];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.stages.get(&stage_key(i)).copied().unwrap_or(0.0);
        }
        out
    }

    /// Transition scores in cycle order
    pub fn transition_scores(&self) -> [f64; CYCLE_LEN] {
        let mut out = [0.0; CYCLE_LEN];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.transitions.get(&transition_key(i)).copied().unwrap_or(0.0);
        }
        out
    }

    pub fn stage(&self, key: &str) -> Option<f64> {
        self.stages.get(key).copied()
    }

    pub fn transition(&self, key: &str) -> Option<f64> {
        self.transitions.get(key).copied()
    }

    /// Score of the dominant stage
    pub fn dominant_score(&self) -> f64 {
        self.stage(&self.dominant_stage).unwrap_or(0.0)
    }
}
