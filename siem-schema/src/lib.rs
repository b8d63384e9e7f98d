//! ECS-shaped event, rule, and alert types shared by the detection engine
//! and the alert manager.

pub mod alert;
pub mod event;
pub mod mapper;
pub mod raw_event;
pub mod rule;

pub use alert::{Alert, AlertRule, AlertStatus};
pub use event::{Event, ECS_VERSION};
pub use raw_event::RawEvent;
pub use rule::{Action, Correlation, Detection, Matcher, Rule, RuleFile, RuleSnapshot, RuleType, Severity};
