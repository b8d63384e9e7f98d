//! Rule store and hot reload (§4.5): recursively scans a rules directory
//! for rule files, validates each, and publishes an immutable, generation-
//! numbered snapshot. A background ticker re-scans on a timer; readers take
//! one atomic read of the current snapshot per event (§9, §5).

use arc_swap::ArcSwap;
use siem_common::error::{Result, SiemError};
use siem_common::time::is_valid_timeframe;
use siem_schema::{Rule, RuleFile, RuleSnapshot, RuleType};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Files with this extension under the rules directory are candidate rule
/// files; anything else is ignored (§6).
pub const RULE_FILE_EXTENSION: &str = "yml";

/// Validates a freshly-deserialized `RuleFile` against §3's required-field
/// and shape invariants, producing the immutable `Rule` the evaluator reads.
pub fn validate(file: RuleFile, path: &Path) -> Result<Rule> {
    let ctx = || path.display().to_string();
    let id = file
        .id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SiemError::rule_validation(format!("{}: missing id", ctx())))?;
    let name = file
        .name
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SiemError::rule_validation(format!("{}: missing name", ctx())))?;
    let description = file
        .description
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SiemError::rule_validation(format!("{}: missing description", ctx())))?;
    let severity = file
        .severity
        .ok_or_else(|| SiemError::rule_validation(format!("{}: missing severity", ctx())))?;

    if let Some(timeframe) = &file.detection.timeframe {
        if !is_valid_timeframe(timeframe) {
            return Err(SiemError::rule_validation(format!(
                "{}: invalid timeframe {timeframe:?}, expected ^[0-9]+[smhd]$",
                ctx()
            )));
        }
    }

    match file.rule_type {
        RuleType::Threshold if file.detection.timeframe.is_none() => {
            return Err(SiemError::rule_validation(format!(
                "{}: threshold rule requires detection.timeframe",
                ctx()
            )))
        }
        RuleType::Threshold if file.detection.condition.is_none() => {
            return Err(SiemError::rule_validation(format!(
                "{}: threshold rule requires detection.condition",
                ctx()
            )))
        }
        RuleType::Correlation if file.detection.timeframe.is_none() => {
            return Err(SiemError::rule_validation(format!(
                "{}: correlation rule requires detection.timeframe",
                ctx()
            )))
        }
        RuleType::Correlation if file.correlation.min_events.is_none() => {
            return Err(SiemError::rule_validation(format!(
                "{}: correlation rule requires correlation.min_events",
                ctx()
            )))
        }
        _ => {}
    }

    Ok(Rule {
        id,
        name,
        description,
        severity,
        category: file.category,
        enabled: file.enabled,
        rule_type: file.rule_type,
        detection: file.detection,
        correlation: file.correlation,
        tags: file.tags,
        actions: file.actions,
    })
}

/// Recursively loads every rule file under `dir`, discarding invalid files
/// with a warning rather than failing the whole scan (§4.5, §7 kind 4).
/// Duplicate `id`s: the first rule wins; later duplicates are rejected.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Vec<Rule> {
    let mut rules = Vec::new();
    let mut seen_ids = std::collections::HashSet::new();

    for entry in WalkDir::new(dir.as_ref())
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(RULE_FILE_EXTENSION))
                .unwrap_or(false)
        })
    {
        let path = entry.path();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read rule file");
                continue;
            }
        };
        let file: RuleFile = match serde_yaml::from_str(&raw) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "rule file failed to parse, discarding");
                continue;
            }
        };
        match validate(file, path) {
            Ok(rule) => {
                if !seen_ids.insert(rule.id.clone()) {
                    warn!(path = %path.display(), rule_id = %rule.id, "duplicate rule id, discarding");
                    continue;
                }
                rules.push(rule);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "rule validation failed, discarding");
            }
        }
    }

    rules
}

/// Owns the current rule snapshot behind an atomic pointer and the
/// background reload ticker. Readers call `current()` once per event.
pub struct RuleStore {
    snapshot: ArcSwap<RuleSnapshot>,
    generation: AtomicU64,
    rules_dir: std::path::PathBuf,
}

impl RuleStore {
    /// Loads the initial snapshot (generation 1) from `rules_dir`.
    pub fn load<P: AsRef<Path>>(rules_dir: P) -> Self {
        let rules_dir = rules_dir.as_ref().to_path_buf();
        let rules = load_dir(&rules_dir);
        info!(count = rules.len(), dir = %rules_dir.display(), "loaded rule snapshot generation 1");
        let snapshot = RuleSnapshot::new(1, rules.into_iter().map(Arc::new).collect());
        RuleStore {
            snapshot: ArcSwap::new(Arc::new(snapshot)),
            generation: AtomicU64::new(1),
            rules_dir,
        }
    }

    pub fn current(&self) -> Arc<RuleSnapshot> {
        self.snapshot.load_full()
    }

    /// Re-scans the rules directory and publishes a new generation if the
    /// scan found at least one valid rule. An empty re-scan keeps the prior
    /// snapshot rather than evaporating all rules because of e.g. a
    /// directory mounted mid-rewrite (§4.5, §7 kind 4: "keep prior snapshot
    /// if reload finds no valid rules").
    pub fn reload(&self) {
        let rules = load_dir(&self.rules_dir);
        if rules.is_empty() && !self.snapshot.load().rules.is_empty() {
            warn!(dir = %self.rules_dir.display(), "reload found zero valid rules, keeping prior snapshot");
            return;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count = rules.len(), generation, "publishing new rule snapshot");
        let snapshot = RuleSnapshot::new(generation, rules.into_iter().map(Arc::new).collect());
        self.snapshot.store(Arc::new(snapshot));
    }

    /// Runs `reload` on a fixed interval until `running` goes false. Matches
    /// the cancellation model in §5: finish the current tick, then return.
    pub async fn run_reload_loop(self: Arc<Self>, interval: Duration, running: Arc<std::sync::atomic::AtomicBool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it, generation 1 is already loaded
        while running.load(Ordering::SeqCst) {
            ticker.tick().await;
            if !running.load(Ordering::SeqCst) {
                break;
            }
            self.reload();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_rule(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    const VALID_RULE: &str = r#"
name: SSH Brute Force
id: auth-001
description: Repeated failed SSH logins
severity: HIGH
type: threshold
detection:
  selection:
    event.category: authentication
  condition: "count > 5"
  timeframe: "5m"
  groupby: ["source.ip"]
"#;

    #[test]
    fn loads_valid_rule_file() {
        let dir = tempdir().unwrap();
        write_rule(dir.path(), "auth.yml", VALID_RULE);
        let rules = load_dir(dir.path());
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "auth-001");
    }

    #[test]
    fn discards_rule_missing_required_field() {
        let dir = tempdir().unwrap();
        write_rule(
            dir.path(),
            "bad.yml",
            "name: No Id\ndescription: d\nseverity: LOW\ndetection: {}\n",
        );
        let rules = load_dir(dir.path());
        assert!(rules.is_empty());
    }

    #[test]
    fn discards_unknown_rule_type() {
        let dir = tempdir().unwrap();
        write_rule(
            dir.path(),
            "bad.yml",
            "name: n\nid: x\ndescription: d\nseverity: LOW\ntype: not_a_type\ndetection: {}\n",
        );
        let rules = load_dir(dir.path());
        assert!(rules.is_empty());
    }

    #[test]
    fn ignores_files_with_wrong_extension() {
        let dir = tempdir().unwrap();
        write_rule(dir.path(), "auth.txt", VALID_RULE);
        let rules = load_dir(dir.path());
        assert!(rules.is_empty());
    }

    #[test]
    fn recurses_into_subdirectories() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("auth");
        std::fs::create_dir(&sub).unwrap();
        write_rule(&sub, "ssh.yml", VALID_RULE);
        let rules = load_dir(dir.path());
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn store_reload_publishes_new_generation() {
        let dir = tempdir().unwrap();
        let store = RuleStore::load(dir.path());
        assert_eq!(store.current().generation, 1);
        assert_eq!(store.current().rules.len(), 0);

        write_rule(dir.path(), "auth.yml", VALID_RULE);
        store.reload();
        assert_eq!(store.current().generation, 2);
        assert_eq!(store.current().rules.len(), 1);
    }

    #[test]
    fn reload_with_zero_valid_rules_keeps_prior_snapshot() {
        let dir = tempdir().unwrap();
        write_rule(dir.path(), "auth.yml", VALID_RULE);
        let store = RuleStore::load(dir.path());
        assert_eq!(store.current().rules.len(), 1);

        std::fs::remove_file(dir.path().join("auth.yml")).unwrap();
        write_rule(dir.path(), "broken.yml", "id: only-id\n");
        store.reload();
        assert_eq!(store.current().generation, 1);
        assert_eq!(store.current().rules.len(), 1);
    }
}
