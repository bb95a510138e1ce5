use thiserror::Error;

/// Failure taxonomy for one platform call.
///
/// The distinction that matters downstream: [`ApiError::Transient`] is the
/// platform's "no data for this query right now" signal (HTTP 406) and is the
/// only retryable condition; [`ApiError::AuthRejected`] means the credential
/// itself is bad and should be pulled from rotation; everything else is
/// terminal for the sub-fetch that hit it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 406 — the platform reports the requested data slice as
    /// temporarily unavailable. Retryable; resolves to "no data", not failure.
    #[error("data temporarily unavailable (406) for {context}")]
    Transient { context: String },

    /// Envelope-level failure: the response parsed but `code != 0`.
    #[error("platform error for {context}: code {code}, {msg}")]
    Business {
        context: String,
        code: i64,
        msg: String,
    },

    /// The session cookie or request signature was rejected outright.
    #[error("authentication rejected (HTTP {status}) for {context}")]
    AuthRejected { status: u16, context: String },

    #[error("unexpected HTTP status {status} for {context}")]
    UnexpectedStatus { status: u16, context: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The credential's cookie string carries no `a1` session token, so no
    /// request can be signed with it.
    #[error("cookie contains no a1 session token")]
    MissingSessionToken,

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ApiError {
    /// `true` only for the platform's transient-unavailability signal.
    /// Transport errors are deliberately not retried here; the source system
    /// treated them as terminal and the retry policy preserves that.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transient { .. })
    }

    /// `true` when the credential behind this call should be considered
    /// invalid and excluded from future rotation.
    #[must_use]
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, ApiError::AuthRejected { .. })
    }
}
