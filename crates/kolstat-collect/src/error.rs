use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("license check denied collection{}", tier_suffix(.tier.as_deref()))]
    LicenseDenied { tier: Option<String> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Serde(#[from] serde_json::Error),
}

fn tier_suffix(tier: Option<&str>) -> String {
    match tier {
        Some(tier) => format!(" (tier: {tier})"),
        None => String::new(),
    }
}
