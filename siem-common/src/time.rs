use crate::error::{Result, SiemError};
use chrono::Duration;

/// Parses a timeframe string like `"5m"`, `"1h"`, `"30s"`, `"2d"` per the
/// `^[0-9]+[smhd]$` rule-file invariant.
pub fn parse_timeframe(timeframe: &str) -> Result<Duration> {
    if timeframe.is_empty() {
        return Err(SiemError::rule_validation("empty timeframe"));
    }
    let (value, unit) = timeframe.split_at(timeframe.len() - 1);
    let amount: i64 = value
        .parse()
        .map_err(|_| SiemError::rule_validation(format!("invalid timeframe: {timeframe}")))?;

    match unit {
        "s" => Ok(Duration::seconds(amount)),
        "m" => Ok(Duration::minutes(amount)),
        "h" => Ok(Duration::hours(amount)),
        "d" => Ok(Duration::days(amount)),
        other => Err(SiemError::rule_validation(format!(
            "unknown time unit: {other}"
        ))),
    }
}

/// Validates the `^[0-9]+[smhd]$` shape without fully parsing the duration.
pub fn is_valid_timeframe(timeframe: &str) -> bool {
    let bytes = timeframe.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let (digits, unit) = bytes.split_at(bytes.len() - 1);
    !digits.is_empty()
        && digits.iter().all(|b| b.is_ascii_digit())
        && matches!(unit[0], b's' | b'm' | b'h' | b'd')
}

/// Exponential backoff with a floor, cap, and reset-on-success, shared by the
/// queue client, the bulk indexer, and any other transient-infra retry loop.
#[derive(Debug, Clone)]
pub struct Backoff {
    floor: std::time::Duration,
    cap: std::time::Duration,
    current: std::time::Duration,
}

impl Backoff {
    pub fn new(floor: std::time::Duration, cap: std::time::Duration) -> Self {
        Self {
            floor,
            cap,
            current: floor,
        }
    }

    /// Standard 1s-floor, 30s-cap backoff used throughout the pipeline.
    pub fn standard() -> Self {
        Self::new(std::time::Duration::from_secs(1), std::time::Duration::from_secs(30))
    }

    /// Current delay, then doubles (capped) for next time.
    pub fn next_delay(&mut self) -> std::time::Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.cap);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.floor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes() {
        assert_eq!(parse_timeframe("5m").unwrap(), Duration::minutes(5));
    }

    #[test]
    fn parses_seconds_hours_days() {
        assert_eq!(parse_timeframe("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse_timeframe("1h").unwrap(), Duration::hours(1));
        assert_eq!(parse_timeframe("2d").unwrap(), Duration::days(2));
    }

    #[test]
    fn rejects_bad_unit() {
        assert!(parse_timeframe("5x").is_err());
        assert!(parse_timeframe("").is_err());
        assert!(parse_timeframe("m").is_err());
    }

    #[test]
    fn validates_shape() {
        assert!(is_valid_timeframe("5m"));
        assert!(is_valid_timeframe("100d"));
        assert!(!is_valid_timeframe("5mm"));
        assert!(!is_valid_timeframe("m5"));
        assert!(!is_valid_timeframe(""));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let mut b = Backoff::new(std::time::Duration::from_secs(1), std::time::Duration::from_secs(8));
        assert_eq!(b.next_delay(), std::time::Duration::from_secs(1));
        assert_eq!(b.next_delay(), std::time::Duration::from_secs(2));
        assert_eq!(b.next_delay(), std::time::Duration::from_secs(4));
        assert_eq!(b.next_delay(), std::time::Duration::from_secs(8));
        assert_eq!(b.next_delay(), std::time::Duration::from_secs(8));
        b.reset();
        assert_eq!(b.next_delay(), std::time::Duration::from_secs(1));
    }
}
