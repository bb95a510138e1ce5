use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
///
/// Every knob has a default: the collector runs without any environment at all,
/// since credentials live in the accounts file, not in env vars.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let base_url = or_default("KOLSTAT_BASE_URL", "https://pgy.xiaohongshu.com");
    let referer = or_default(
        "KOLSTAT_REFERER",
        "https://pgy.xiaohongshu.com/solar/pre-trade/home",
    );
    let user_agent = or_default(
        "KOLSTAT_USER_AGENT",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36",
    );

    let request_timeout_secs = parse_u64("KOLSTAT_REQUEST_TIMEOUT_SECS", "10")?;
    let retry_max_attempts = parse_u32("KOLSTAT_RETRY_MAX_ATTEMPTS", "3")?;
    let retry_delay_ms = parse_u64("KOLSTAT_RETRY_DELAY_MS", "500")?;
    let throttle_ms = parse_u64("KOLSTAT_THROTTLE_MS", "1000")?;
    // The platform tolerates only a handful of parallel sessions per IP before
    // tripping its abuse heuristics, so the ceiling is deliberately low.
    let concurrency = parse_usize("KOLSTAT_CONCURRENCY", "2")?.clamp(1, 10);
    let max_uses_per_day = parse_u32("KOLSTAT_MAX_USES_PER_DAY", "9999")?;

    let accounts_path = PathBuf::from(or_default("KOLSTAT_ACCOUNTS_PATH", "./data/accounts.json"));
    let settings_path = PathBuf::from(or_default("KOLSTAT_SETTINGS_PATH", "./data/settings.json"));
    let targets_path = PathBuf::from(or_default("KOLSTAT_TARGETS_PATH", "./data/targets.txt"));
    let output_path = PathBuf::from(or_default("KOLSTAT_OUTPUT_PATH", "./data/results.jsonl"));
    let log_level = or_default("KOLSTAT_LOG_LEVEL", "info");

    Ok(AppConfig {
        base_url,
        referer,
        user_agent,
        request_timeout_secs,
        retry_max_attempts,
        retry_delay_ms,
        throttle_ms,
        concurrency,
        max_uses_per_day,
        accounts_path,
        settings_path,
        targets_path,
        output_path,
        log_level,
    })
}
