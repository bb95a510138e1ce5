pub mod app_config;
pub mod cancel;
pub mod config;
pub mod fields;

use thiserror::Error;

pub use app_config::AppConfig;
pub use cancel::CancelToken;
pub use config::{load_app_config, load_app_config_from_env};
pub use fields::{Business, DateRange, FieldSelection, NoteKind, PerfVariant};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown performance field label: {0}")]
    UnknownField(String),
}
