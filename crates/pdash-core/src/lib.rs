pub mod app_config;
pub mod config;
pub mod products;
pub mod report;
pub mod rows;

pub use app_config::{
    AppConfig, DbSsl, Environment, DEFAULT_INGEST_BATCH_SIZE, DEFAULT_UPLOAD_MAX_BYTES,
    MAX_INGEST_BATCH_SIZE,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{ProductRecord, ValidProduct};
pub use report::{IngestIssue, IngestReport, IssueReason, ReportMessage};
pub use rows::{Cell, RawRow};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
