//! HTTP client for the creator-analytics platform.
//!
//! Wraps `reqwest` with the platform-specific request shape: browser-like
//! headers, a per-call randomized `webId` cookie, and the signature triplet
//! from [`crate::sign`] on every request. Responses are mapped onto the
//! [`ApiError`] taxonomy; the JSON envelope is checked before any payload is
//! handed back.

use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;

use crate::cookie::{extract_session_token, randomize_web_id};
use crate::error::ApiError;
use crate::sign::sign_request;
use crate::types::Envelope;

const ACCEPT: &str = "application/json, text/plain, */*";
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9";

/// Client for the platform's signed JSON API.
///
/// Holds the HTTP client, base URL and referer. Use a mock-server base URL
/// in tests; the signing pipeline runs identically against it.
pub struct SolarClient {
    client: Client,
    base_url: Url,
    referer: String,
}

impl SolarClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`ApiError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        referer: &str,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so path
        // joins resolve against the root rather than a trailing segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            referer: referer.to_string(),
        })
    }

    fn url_for(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Issues one signed request and returns the envelope's `data` payload.
    ///
    /// Each call randomizes the cookie's `webId`, extracts the `a1` session
    /// token, and signs path+query(+body) with the current wall clock.
    pub(crate) async fn request_data<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
        cookie: &str,
        context: &str,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        let url = self.url_for(path, query)?;
        let cookie = randomize_web_id(cookie);
        let token = extract_session_token(&cookie).ok_or(ApiError::MissingSessionToken)?;

        let path_and_query = match url.query() {
            Some(q) => format!("{}?{q}", url.path()),
            None => url.path().to_string(),
        };
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let triplet = sign_request(&path_and_query, body.as_ref(), &token, timestamp_ms);

        let mut request = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .header(reqwest::header::REFERER, &self.referer)
            .header(reqwest::header::COOKIE, cookie)
            .header("X-s", &triplet.x_s)
            .header("X-t", &triplet.x_t)
            .header("X-S-Common", &triplet.x_s_common);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.as_u16() == 406 {
            return Err(ApiError::Transient {
                context: context.to_string(),
            });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::AuthRejected {
                status: status.as_u16(),
                context: context.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                context: context.to_string(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let envelope: Envelope<T> =
            serde_json::from_value(body).map_err(|e| ApiError::Deserialize {
                context: context.to_string(),
                source: e,
            })?;

        if envelope.code != 0 || !envelope.success {
            return Err(ApiError::Business {
                context: context.to_string(),
                code: envelope.code,
                msg: envelope
                    .msg
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        Ok(envelope.data.unwrap_or_default())
    }
}
