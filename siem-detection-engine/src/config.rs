//! Settings loaded by layering CLI flags over environment variables over
//! defaults (§6), in the teacher's `clap::Parser` + `features = ["derive",
//! "env"]` idiom.

use clap::Parser;
use siem_common::error::{Result, SiemError};

#[derive(Parser, Clone, Debug)]
#[command(name = "siem-detection-engine", about = "SIEM detection engine: queue consumer, parser dispatch, enrichment, rule evaluation, bulk indexing")]
pub struct Settings {
    #[arg(long, env = "REDIS_HOST", default_value = "redis")]
    pub redis_host: String,

    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    #[arg(long, env = "REDIS_DB", default_value_t = 0)]
    pub redis_db: u8,

    #[arg(long, env = "OPENSEARCH_HOST")]
    pub opensearch_host: Option<String>,

    #[arg(long, env = "OPENSEARCH_PORT", default_value_t = 9200)]
    pub opensearch_port: u16,

    #[arg(long, env = "OPENSEARCH_USER")]
    pub opensearch_user: Option<String>,

    #[arg(long, env = "OPENSEARCH_PASSWORD")]
    pub opensearch_password: Option<String>,

    #[arg(long, env = "OPENSEARCH_USE_SSL", default_value_t = false, action = clap::ArgAction::Set)]
    pub opensearch_use_ssl: bool,

    #[arg(long, env = "DETECTION_WORKERS", default_value_t = 2)]
    pub detection_workers: usize,

    #[arg(long, env = "DETECTION_BATCH_SIZE", default_value_t = 100)]
    pub detection_batch_size: usize,

    #[arg(long, env = "DETECTION_POLL_INTERVAL", default_value_t = 1)]
    pub detection_poll_interval_secs: u64,

    #[arg(long, env = "RULE_RELOAD_INTERVAL", default_value_t = 60)]
    pub rule_reload_interval_secs: u64,

    #[arg(long, env = "INDEX_EVENTS", default_value = "siem-events")]
    pub index_events_prefix: String,

    #[arg(long, env = "RULES_DIR", default_value = "./rules")]
    pub rules_dir: String,

    #[arg(long, env = "GEOIP_DB_PATH")]
    pub geoip_db_path: Option<String>,

    #[arg(long, env = "THREAT_INTEL_FEED_PATH")]
    pub threat_intel_feed_path: Option<String>,
}

impl Settings {
    pub fn redis_url(&self) -> String {
        format!(
            "redis://{}:{}/{}",
            self.redis_host, self.redis_port, self.redis_db
        )
    }

    pub fn opensearch_base_url(&self) -> Result<String> {
        let host = self
            .opensearch_host
            .as_ref()
            .ok_or_else(|| SiemError::startup("OPENSEARCH_HOST is required"))?;
        let scheme = if self.opensearch_use_ssl { "https" } else { "http" };
        Ok(format!("{scheme}://{host}:{}", self.opensearch_port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_url_formats_host_port_db() {
        let settings = Settings::try_parse_from(["bin"]).unwrap();
        assert_eq!(settings.redis_url(), "redis://redis:6379/0");
    }

    #[test]
    fn opensearch_base_url_requires_host() {
        let settings = Settings::try_parse_from(["bin"]).unwrap();
        assert!(settings.opensearch_base_url().is_err());
    }

    #[test]
    fn opensearch_base_url_uses_https_when_ssl_enabled() {
        let settings =
            Settings::try_parse_from(["bin", "--opensearch-host", "search.local", "--opensearch-use-ssl", "true"])
                .unwrap();
        assert_eq!(
            settings.opensearch_base_url().unwrap(),
            "https://search.local:9200"
        );
    }
}
