//! Settings for the alert manager binary, in the same `clap::Parser` +
//! env-overridable idiom as the detection engine (§6, §9.1).

use clap::Parser;

#[derive(Parser, Clone, Debug)]
#[command(name = "siem-alert-manager", about = "SIEM alert manager: dedup, throttle, severity-routed notification fan-out")]
pub struct Settings {
    #[arg(long, env = "REDIS_HOST", default_value = "redis")]
    pub redis_host: String,

    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    #[arg(long, env = "REDIS_DB", default_value_t = 0)]
    pub redis_db: u8,

    #[arg(long, env = "ALERT_WORKERS", default_value_t = 2)]
    pub alert_workers: usize,

    #[arg(long, env = "DEDUP_WINDOW_SECS", default_value_t = 300)]
    pub dedup_window_secs: i64,

    #[arg(long, env = "THROTTLE_WINDOW_SECS", default_value_t = 3600)]
    pub throttle_window_secs: i64,

    #[arg(long, env = "THROTTLE_LIMIT", default_value_t = 100)]
    pub throttle_limit: usize,

    #[arg(long, env = "SLACK_WEBHOOK_URL")]
    pub slack_webhook_url: Option<String>,

    #[arg(long, env = "PAGERDUTY_ROUTING_KEY")]
    pub pagerduty_routing_key: Option<String>,

    #[arg(long, env = "PAGERDUTY_SEVERITY_THRESHOLD", default_value = "HIGH")]
    pub pagerduty_severity_threshold: String,

    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    #[arg(long, env = "SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    #[arg(long, env = "SMTP_PASSWORD")]
    pub smtp_password: Option<String>,

    #[arg(long, env = "SMTP_FROM")]
    pub smtp_from: Option<String>,

    #[arg(long, env = "SMTP_TO", value_delimiter = ',')]
    pub smtp_to: Vec<String>,

    #[arg(long, env = "WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    #[arg(long, env = "WEBHOOK_BEARER_TOKEN")]
    pub webhook_bearer_token: Option<String>,
}

impl Settings {
    pub fn redis_url(&self) -> String {
        format!(
            "redis://{}:{}/{}",
            self.redis_host, self.redis_port, self.redis_db
        )
    }

    /// Parses `pagerduty_severity_threshold`, falling back to `HIGH` on an
    /// unrecognized value rather than failing startup over a notifier
    /// threshold (§7 kind 5: notification delivery problems are not fatal).
    pub fn pagerduty_threshold(&self) -> siem_schema::Severity {
        use siem_schema::Severity;
        match self.pagerduty_severity_threshold.to_uppercase().as_str() {
            "LOW" => Severity::Low,
            "MEDIUM" => Severity::Medium,
            "CRITICAL" => Severity::Critical,
            _ => Severity::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let settings = Settings::try_parse_from(["bin"]).unwrap();
        assert_eq!(settings.alert_workers, 2);
        assert_eq!(settings.dedup_window_secs, 300);
        assert_eq!(settings.throttle_window_secs, 3600);
        assert_eq!(settings.throttle_limit, 100);
    }
}
