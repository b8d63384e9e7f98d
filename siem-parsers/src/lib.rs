//! Log format parsers and the dispatch table that selects one by
//! `source_type` (§4.2).

pub mod dispatch;
pub mod firewall;
pub mod json;
pub mod syslog;
pub mod web_access;
pub mod windows;

use serde_json::Value;
use siem_schema::RawEvent;

/// Every parser is total: a mismatch returns `None` rather than panicking
/// or raising, so the caller can log-and-skip (§4.2, §7).
pub trait Parser {
    fn parse(&self, raw: &RawEvent) -> Option<Value>;
}

pub use dispatch::ParserEngine;
