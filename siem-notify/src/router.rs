//! Severity-based channel routing (§4.9, §8): `CRITICAL` reaches every
//! channel, `LOW` reaches none (digest delivery is out of scope per §4.9 --
//! "not implemented; no immediate delivery").

use siem_schema::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    PagerDuty,
    Slack,
    Email,
}

pub fn channels_for_severity(severity: Severity) -> &'static [Channel] {
    match severity {
        Severity::Critical => &[Channel::PagerDuty, Channel::Slack, Channel::Email],
        Severity::High => &[Channel::Slack, Channel::Email],
        Severity::Medium => &[Channel::Email],
        Severity::Low => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_routes_to_all_three() {
        assert_eq!(
            channels_for_severity(Severity::Critical),
            &[Channel::PagerDuty, Channel::Slack, Channel::Email]
        );
    }

    #[test]
    fn high_routes_to_slack_and_email() {
        assert_eq!(
            channels_for_severity(Severity::High),
            &[Channel::Slack, Channel::Email]
        );
    }

    #[test]
    fn medium_routes_to_email_only() {
        assert_eq!(channels_for_severity(Severity::Medium), &[Channel::Email]);
    }

    #[test]
    fn low_routes_nowhere() {
        assert!(channels_for_severity(Severity::Low).is_empty());
    }
}
