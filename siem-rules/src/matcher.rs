//! Selection matching (§4.6): a rule matches an event iff every
//! `field: matcher` pair in `detection.selection` holds against the event's
//! dotted-path value. Missing paths are absent, never equal to anything.

use regex::Regex;
use serde_json::Value;
use siem_common::dotted::get_path;
use siem_common::error::{Result, SiemError};
use siem_schema::Matcher;
use std::collections::HashMap;

pub fn selection_matches(event: &Value, selection: &HashMap<String, Matcher>) -> Result<bool> {
    for (field, matcher) in selection {
        let actual = get_path(event, field);
        if !matcher_holds(actual, matcher)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matcher_holds(actual: Option<&Value>, matcher: &Matcher) -> Result<bool> {
    match matcher {
        Matcher::Scalar(expected) => Ok(actual == Some(expected)),
        Matcher::List(options) => Ok(match actual {
            Some(v) => options.iter().any(|o| o == v),
            None => false,
        }),
        Matcher::Ops(ops) => {
            for (op, target) in ops {
                if !op_holds(actual, op, target)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn op_holds(actual: Option<&Value>, op: &str, target: &Value) -> Result<bool> {
    match op {
        "gte" | "lte" | "gt" | "lt" => {
            let (Some(a), Some(t)) = (as_f64(actual), target.as_f64()) else {
                return Ok(false);
            };
            Ok(match op {
                "gte" => a >= t,
                "lte" => a <= t,
                "gt" => a > t,
                "lt" => a < t,
                _ => unreachable!(),
            })
        }
        "contains" => {
            let Some(actual) = actual else { return Ok(false) };
            let haystack = stringify(actual);
            let needle = stringify(target);
            Ok(haystack.contains(&needle))
        }
        "regex" => {
            let Some(actual) = actual else { return Ok(false) };
            let pattern = target
                .as_str()
                .ok_or_else(|| SiemError::rule_evaluation("regex operator target is not a string"))?;
            let re = Regex::new(&format!("(?i){pattern}"))
                .map_err(|e| SiemError::rule_evaluation(format!("invalid regex {pattern}: {e}")))?;
            Ok(re.is_match(&stringify(actual)))
        }
        other => Err(SiemError::rule_evaluation(format!(
            "unknown selection operator: {other}"
        ))),
    }
}

fn as_f64(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn selection(json: Value) -> HashMap<String, Matcher> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn scalar_equality() {
        let event = json!({"event": {"code": "4624"}});
        let sel = selection(json!({"event.code": "4624"}));
        assert!(selection_matches(&event, &sel).unwrap());

        let sel_no = selection(json!({"event.code": "4625"}));
        assert!(!selection_matches(&event, &sel_no).unwrap());
    }

    #[test]
    fn missing_path_never_matches() {
        let event = json!({"message": "hi"});
        let sel = selection(json!({"source.ip": "10.0.0.1"}));
        assert!(!selection_matches(&event, &sel).unwrap());
    }

    #[test]
    fn list_membership() {
        let event = json!({"event": {"code": "4625"}});
        let sel = selection(json!({"event.code": ["4624", "4625"]}));
        assert!(selection_matches(&event, &sel).unwrap());
    }

    #[test]
    fn gte_is_strict_failure_below_target() {
        let event = json!({"http": {"response": {"status_code": 500}}});
        let sel = selection(json!({"http.response.status_code": {"gte": 500}}));
        assert!(selection_matches(&event, &sel).unwrap());

        let event_below = json!({"http": {"response": {"status_code": 499}}});
        assert!(!selection_matches(&event_below, &sel).unwrap());
    }

    #[test]
    fn contains_substring_on_stringified_value() {
        let event = json!({"url": {"query": "q=UNION SELECT * FROM users"}});
        let sel = selection(json!({"url.query": {"contains": "UNION"}}));
        assert!(selection_matches(&event, &sel).unwrap());
    }

    #[test]
    fn regex_matches_anywhere_case_insensitive() {
        let event = json!({"url": {"query": "q=union select * from users"}});
        let sel = selection(json!({"url.query": {"regex": "(union|select)"}}));
        assert!(selection_matches(&event, &sel).unwrap());
    }

    #[test]
    fn all_selection_fields_must_hold() {
        let event = json!({"event": {"code": "4624"}, "user": {"name": "root"}});
        let sel = selection(json!({"event.code": "4624", "user.name": "admin"}));
        assert!(!selection_matches(&event, &sel).unwrap());
    }
}
