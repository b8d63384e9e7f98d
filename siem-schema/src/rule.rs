use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Simple,
    Threshold,
    Correlation,
}

impl Default for RuleType {
    fn default() -> Self {
        RuleType::Simple
    }
}

/// A single `detection.selection` entry. Scalars compare by equality, lists
/// are membership tests, and mappings are operator bags (`gte`, `lte`, `gt`,
/// `lt`, `contains`, `regex`), per §4.6.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Matcher {
    Ops(HashMap<String, serde_json::Value>),
    List(Vec<serde_json::Value>),
    Scalar(serde_json::Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub selection: HashMap<String, Matcher>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub groupby: Vec<String>,
    #[serde(default)]
    pub unique_count: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Correlation {
    #[serde(default)]
    pub min_events: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type", default)]
    pub action_type: String,
    #[serde(default)]
    pub notification: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// The raw, on-disk shape of a rule file (§6); every field here is optional
/// at the parse layer so the validator (not serde) decides what's missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFile {
    pub name: Option<String>,
    pub id: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, rename = "type")]
    pub rule_type: RuleType,
    #[serde(default)]
    pub detection: Detection,
    #[serde(default)]
    pub correlation: Correlation,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A validated rule, ready for evaluation. Constructed only by
/// `siem_rules::loader::validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub category: Option<String>,
    pub enabled: bool,
    pub rule_type: RuleType,
    pub detection: Detection,
    pub correlation: Correlation,
    pub tags: Vec<String>,
    pub actions: Vec<Action>,
}

/// An immutable, generation-numbered snapshot of all validated rules,
/// published atomically by the rule store's reload loop (§4.5).
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    pub generation: u64,
    pub rules: Vec<Arc<Rule>>,
}

impl RuleSnapshot {
    pub fn empty() -> Self {
        RuleSnapshot {
            generation: 0,
            rules: Vec::new(),
        }
    }

    pub fn new(generation: u64, rules: Vec<Arc<Rule>>) -> Self {
        RuleSnapshot { generation, rules }
    }

    pub fn enabled_rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.iter().filter(|r| r.enabled)
    }
}
