//! Aggregator module - stage/transition scoring core

pub mod engine;
pub mod policy;
pub mod scoring;

pub use engine::ScoreAggregator;
pub use policy::{InputError, InputPolicy};
pub use scoring::compute;
