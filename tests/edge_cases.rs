//! Edge case tests: degenerate inputs must not panic.

use enervi::aggregator::{InputError, InputPolicy, ScoreAggregator};
use enervi::{compute, AggregationConfig, RawAnswers, ScoreRequest};

#[test]
fn empty_request_scores_all_zero() {
    let request = ScoreRequest::from_json("{}").unwrap();
    let result = ScoreAggregator::new().score_request(&request).unwrap();

    assert_eq!(result.stage_scores(), [0.0; 7]);
    assert_eq!(result.transition_scores(), [0.0; 7]);
    assert_eq!(result.dominant_stage, "S1");
    assert_eq!(result.bottleneck_transitions, vec!["T1", "T2"]);
}

#[test]
fn negative_inputs_propagate_without_penalty() {
    let answers = RawAnswers::uniform(5.0).with_stage(2, -5.0);
    let result = compute(&answers, &AggregationConfig::default());
    // 0.6*-5 + 1 + 1 = -1.0
    assert_eq!(result.stage("S3"), Some(-10.0));
}

#[test]
fn negative_inputs_floor_with_penalty() {
    let answers = RawAnswers::uniform(5.0).with_stage(2, -5.0);
    let result = compute(&answers, &AggregationConfig::default().with_penalty(true));
    assert_eq!(result.stage("S3"), Some(0.0));
}

#[test]
fn negative_transition_is_primary_bottleneck() {
    let answers = RawAnswers::uniform(5.0).with_transition(5, -3.0);
    let result = compute(&answers, &AggregationConfig::default());
    assert_eq!(result.transition("T6"), Some(-30.0));
    assert_eq!(result.bottleneck_transitions, vec!["T6", "T1"]);
}

#[test]
fn huge_values_do_not_panic() {
    let answers = RawAnswers::uniform(1e300);
    let result = compute(&answers, &AggregationConfig::default().with_penalty(true));
    assert_eq!(result.stages.len(), 7);
    assert_eq!(result.bottleneck_transitions.len(), 2);
}

#[test]
fn nan_passthrough_does_not_panic() {
    let answers = RawAnswers::uniform(5.0).with_stage(0, f64::NAN).with_transition(3, f64::NAN);
    let result = compute(&answers, &AggregationConfig::default());

    assert!(result.stage("S1").unwrap().is_nan());
    assert!(result.stage("S4").unwrap().is_nan());
    assert_eq!(result.stage("S2"), Some(50.0));
    assert_eq!(result.bottleneck_transitions.len(), 2);
    assert!(result.dominant_stage.starts_with('S'));
}

#[test]
fn nan_rejected_under_strict_policies() {
    let answers = RawAnswers::uniform(5.0).with_transition(3, f64::NAN);
    for policy in [InputPolicy::Clamp, InputPolicy::Reject] {
        let err = ScoreAggregator::new()
            .with_policy(policy)
            .score(&answers)
            .unwrap_err();
        assert_eq!(
            err,
            InputError::NotFinite {
                key: "T4".to_string()
            }
        );
    }
}

#[test]
fn zero_delta_disables_penalty_effect() {
    let answers = RawAnswers::new([5.0; 7], [1.0; 7]);
    let config = AggregationConfig::default().with_penalty(true).with_delta(0.0);
    let plain = compute(&answers, &AggregationConfig::default());
    assert_eq!(compute(&answers, &config), plain);
}

#[test]
fn tau_zero_never_blocks_nominal_inputs() {
    let answers = RawAnswers::new([5.0; 7], [0.0; 7]);
    let config = AggregationConfig::default().with_penalty(true).with_tau(0.0);
    let result = compute(&answers, &config);
    assert_eq!(result.stage_scores(), [30.0; 7]);
}
