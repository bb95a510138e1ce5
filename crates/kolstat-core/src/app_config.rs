use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the creator-analytics platform. Overridable so tests can
    /// point the whole stack at a mock server.
    pub base_url: String,
    pub referer: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Total attempts per sub-fetch on the platform's transient 406 status.
    pub retry_max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Delay between jobs within one worker loop.
    pub throttle_ms: u64,
    /// Number of concurrent worker loops, clamped to 1..=10.
    pub concurrency: usize,
    /// Maximum times one credential may be used per calendar day.
    pub max_uses_per_day: u32,
    pub accounts_path: PathBuf,
    pub settings_path: PathBuf,
    /// Default targets file; the CLI flag overrides it per run.
    pub targets_path: PathBuf,
    pub output_path: PathBuf,
    pub log_level: String,
}
