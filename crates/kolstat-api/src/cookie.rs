//! Session-cookie handling.
//!
//! Credentials are opaque browser cookie strings captured elsewhere. Two
//! pieces matter to the client: the `a1` token (feeds the signature engine)
//! and the `webId` device id, which the platform correlates across requests
//! and which the source client re-randomizes on every call.

use std::sync::LazyLock;

use rand::Rng;
use regex::{Captures, Regex};

static A1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"a1=([^;]+)").expect("valid regex"));
static WEB_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)webId=([a-f0-9]+)").expect("valid regex"));

/// Extracts the `a1` session token from a cookie string.
#[must_use]
pub fn extract_session_token(cookie: &str) -> Option<String> {
    A1_RE
        .captures(cookie)
        .map(|c| c[1].to_string())
}

/// Replaces the `webId` cookie value with a fresh random hex string of the
/// same length. Cookies without a `webId` pass through unchanged.
#[must_use]
pub fn randomize_web_id(cookie: &str) -> String {
    let mut rng = rand::rng();
    WEB_ID_RE
        .replace(cookie, |caps: &Captures<'_>| {
            let random: String = (0..caps[1].len())
                .map(|_| char::from_digit(rng.random_range(0..16u32), 16).unwrap_or('0'))
                .collect();
            format!("webId={random}")
        })
        .into_owned()
}
