use thiserror::Error;

pub type Result<T> = std::result::Result<T, SiemError>;

/// Error taxonomy for the detection engine and alert manager.
///
/// Mirrors the error-kind list the pipeline is specified against: transient
/// infrastructure failures are retried by callers, parse/enrichment/rule
/// failures are logged and the affected item is skipped, and only a handful
/// of startup conditions are fatal.
#[derive(Error, Debug)]
pub enum SiemError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("queue error: {0}")]
    Queue(#[from] redis::RedisError),

    #[error("queue error: {0}")]
    QueueMsg(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("rule validation error: {0}")]
    RuleValidation(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("enrichment error: {0}")]
    Enrichment(String),

    #[error("rule evaluation error: {0}")]
    RuleEvaluation(String),

    #[error("indexing error: {0}")]
    Indexing(String),

    #[error("notification error: {0}")]
    Notification(String),

    #[error("fatal startup error: {0}")]
    Startup(String),
}

impl SiemError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SiemError::Config(msg.into())
    }

    pub fn queue<S: Into<String>>(msg: S) -> Self {
        SiemError::QueueMsg(msg.into())
    }

    pub fn rule_validation<S: Into<String>>(msg: S) -> Self {
        SiemError::RuleValidation(msg.into())
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self {
        SiemError::Parse(msg.into())
    }

    pub fn enrichment<S: Into<String>>(msg: S) -> Self {
        SiemError::Enrichment(msg.into())
    }

    pub fn rule_evaluation<S: Into<String>>(msg: S) -> Self {
        SiemError::RuleEvaluation(msg.into())
    }

    pub fn indexing<S: Into<String>>(msg: S) -> Self {
        SiemError::Indexing(msg.into())
    }

    pub fn notification<S: Into<String>>(msg: S) -> Self {
        SiemError::Notification(msg.into())
    }

    pub fn startup<S: Into<String>>(msg: S) -> Self {
        SiemError::Startup(msg.into())
    }
}
