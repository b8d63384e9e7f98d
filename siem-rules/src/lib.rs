//! Rule loading/validation/hot-reload, selection matching, threshold and
//! correlation trackers, and the rule evaluator that ties them together
//! (§4.5, §4.6, §4.7).

pub mod correlation;
pub mod evaluator;
pub mod loader;
pub mod matcher;
pub mod threshold;

pub use correlation::CorrelationEngine;
pub use evaluator::{Match, RuleEvaluator};
pub use loader::RuleStore;
pub use threshold::ThresholdTracker;
