//! Rule evaluator (§4.6): for each event, tests every enabled rule in the
//! current snapshot and dispatches matches to the correct sub-evaluator by
//! rule type. Matching is order-independent -- each rule is evaluated
//! against the event in isolation, so shuffling the snapshot changes
//! nothing about which rules fire (§8).

use crate::correlation::CorrelationEngine;
use crate::matcher::selection_matches;
use crate::threshold::{parse_condition, ThresholdTracker};
use chrono::Utc;
use siem_common::dotted::group_key;
use siem_common::time::parse_timeframe;
use siem_schema::{Rule, RuleSnapshot, RuleType};
use std::sync::Arc;
use tracing::warn;

pub struct RuleEvaluator {
    thresholds: Arc<ThresholdTracker>,
    correlations: Arc<CorrelationEngine>,
}

/// A rule that matched and should become an alert, paired with the rule it
/// matched so the caller can build the `Alert` record (§3).
pub struct Match {
    pub rule: Arc<Rule>,
}

impl RuleEvaluator {
    pub fn new(thresholds: Arc<ThresholdTracker>, correlations: Arc<CorrelationEngine>) -> Self {
        RuleEvaluator {
            thresholds,
            correlations,
        }
    }

    /// Evaluates every enabled rule in `snapshot` against `event`. A single
    /// rule's evaluation failure (e.g. malformed condition) is logged and
    /// skipped for this event without affecting the rest (§7 kind 5).
    pub fn evaluate(&self, snapshot: &RuleSnapshot, event: &siem_schema::Event) -> Vec<Match> {
        let mut matches = Vec::new();
        for rule in snapshot.enabled_rules() {
            match self.evaluate_rule(rule, event) {
                Ok(true) => matches.push(Match { rule: rule.clone() }),
                Ok(false) => {}
                Err(e) => {
                    warn!(rule_id = %rule.id, error = %e, "rule evaluation failed, skipping for this event");
                }
            }
        }
        matches
    }

    fn evaluate_rule(
        &self,
        rule: &Arc<Rule>,
        event: &siem_schema::Event,
    ) -> siem_common::error::Result<bool> {
        if !selection_matches(event, &rule.detection.selection)? {
            return Ok(false);
        }

        match rule.rule_type {
            RuleType::Simple => Ok(true),
            RuleType::Threshold => {
                let condition_str = rule.detection.condition.as_deref().ok_or_else(|| {
                    siem_common::error::SiemError::rule_evaluation(format!(
                        "rule {} is type=threshold but has no detection.condition",
                        rule.id
                    ))
                })?;
                let timeframe_str = rule.detection.timeframe.as_deref().ok_or_else(|| {
                    siem_common::error::SiemError::rule_evaluation(format!(
                        "rule {} is type=threshold but has no detection.timeframe",
                        rule.id
                    ))
                })?;
                let condition = parse_condition(condition_str)?;
                let timeframe = parse_timeframe(timeframe_str)?;
                let key = group_key(event, &rule.detection.groupby);
                Ok(self.thresholds.submit(
                    &rule.id,
                    &key,
                    Utc::now(),
                    timeframe,
                    &condition,
                    event,
                ))
            }
            RuleType::Correlation => {
                let timeframe_str = rule.detection.timeframe.as_deref().ok_or_else(|| {
                    siem_common::error::SiemError::rule_evaluation(format!(
                        "rule {} is type=correlation but has no detection.timeframe",
                        rule.id
                    ))
                })?;
                let min_events = rule.correlation.min_events.ok_or_else(|| {
                    siem_common::error::SiemError::rule_evaluation(format!(
                        "rule {} is type=correlation but has no correlation.min_events",
                        rule.id
                    ))
                })?;
                let timeframe = parse_timeframe(timeframe_str)?;
                let key = group_key(event, &rule.detection.groupby);
                Ok(self.correlations.submit(
                    &rule.id,
                    &key,
                    Utc::now(),
                    timeframe,
                    min_events,
                    event.clone(),
                ))
            }
        }
    }
}
