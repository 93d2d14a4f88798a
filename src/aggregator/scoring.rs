//! Stage and transition score calculation

use crate::{stage_key, transition_key, AggregationConfig, RawAnswers, ScoreResult, CYCLE_LEN};
use std::cmp::Ordering;

/// Weight of a stage's own self-assessment
pub const STAGE_WEIGHT: f64 = 0.60;
/// Weight of the transition entering the stage
pub const ENTERING_WEIGHT: f64 = 0.20;
/// Weight of the transition leaving the stage
pub const LEAVING_WEIGHT: f64 = 0.20;
/// Factor from the 0-10 input scale to the 0-100 display scale
pub const DISPLAY_SCALE: f64 = 10.0;
/// Number of bottleneck transitions reported
pub const BOTTLENECK_COUNT: usize = 2;

/// Score one set of answers.
///
/// Each stage is smoothed with its two neighbouring transitions on the cycle
/// (60/20/20). With the penalty enabled, every neighbouring transition below
/// `tau` subtracts `delta` and the stage is floored at zero; without it,
/// out-of-range inputs pass straight through to the result.
pub fn compute(answers: &RawAnswers, config: &AggregationConfig) -> ScoreResult {
    let raw: [f64; CYCLE_LEN] = std::array::from_fn(|i| raw_stage(answers, config, i));
    let stages: [f64; CYCLE_LEN] = raw.map(|r| round1(r * DISPLAY_SCALE));
    let transitions: [f64; CYCLE_LEN] = answers.transitions.map(|t| round1(t * DISPLAY_SCALE));

    let dominant = dominant_index(&stages);
    let bottlenecks = lowest_indices(&transitions, BOTTLENECK_COUNT);

    ScoreResult {
        stages: stages
            .iter()
            .enumerate()
            .map(|(i, v)| (stage_key(i), *v))
            .collect(),
        transitions: transitions
            .iter()
            .enumerate()
            .map(|(i, v)| (transition_key(i), *v))
            .collect(),
        dominant_stage: stage_key(dominant),
        bottleneck_transitions: bottlenecks.into_iter().map(transition_key).collect(),
    }
}

/// Index of the transition entering stage `index`
pub fn entering_transition(index: usize) -> usize {
    (index + CYCLE_LEN - 1) % CYCLE_LEN
}

/// Index of the transition leaving stage `index`
pub fn leaving_transition(index: usize) -> usize {
    index % CYCLE_LEN
}

/// Weighted stage value on the 0-10 scale, before display scaling
fn raw_stage(answers: &RawAnswers, config: &AggregationConfig, index: usize) -> f64 {
    let prev_t = answers.transitions[entering_transition(index)];
    let next_t = answers.transitions[leaving_transition(index)];
    let mut raw =
        STAGE_WEIGHT * answers.stages[index] + ENTERING_WEIGHT * prev_t + LEAVING_WEIGHT * next_t;

    if config.penalty_enabled {
        if prev_t < config.tau {
            raw -= config.delta;
        }
        if next_t < config.tau {
            raw -= config.delta;
        }
        log::trace!(
            "{}: entering={} leaving={} tau={} -> {}",
            stage_key(index),
            prev_t,
            next_t,
            config.tau,
            raw
        );
        raw = raw.max(0.0);
    }

    raw
}

/// Round to one decimal place. The exact binary value is rounded, ties to
/// even, so 0.85000000000000008 goes up even though `x * 10.0` lands on 8.5.
pub fn round1(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

/// First index holding the maximum value
pub fn dominant_index(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Indices of the `count` smallest values, ascending by value then index
pub fn lowest_indices(values: &[f64], count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // Stable sort keeps the lower index first among equal values
    order.sort_by(|&a, &b| compare_scores(values[a], values[b]));
    order.truncate(count);
    order
}

/// Total order on scores where -0.0 and 0.0 compare equal
fn compare_scores(a: f64, b: f64) -> Ordering {
    let norm = |v: f64| if v == 0.0 { 0.0 } else { v };
    norm(a).total_cmp(&norm(b))
}
