//! Typed endpoint methods on [`SolarClient`].
//!
//! One method per platform sub-resource. All are single-attempt; the retry
//! policy in [`crate::retry`] wraps them at the call site so cancellation can
//! be observed between attempts.

use reqwest::Method;

use kolstat_core::fields::VariantParams;

use crate::client::SolarClient;
use crate::error::ApiError;
use crate::types::{
    BloggerInfo, CoreData, DataSummary, FansProfile, FansSummary, NotesRate, UserInfo,
};

impl SolarClient {
    /// Fetches the creator's identity card. This is the mandatory first
    /// sub-fetch of every collection job.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; see the taxonomy on that type.
    pub async fn blogger_info(&self, user_id: &str, cookie: &str) -> Result<BloggerInfo, ApiError> {
        let path = format!("/api/solar/cooperator/user/blogger/{user_id}");
        self.request_data(
            Method::GET,
            &path,
            &[],
            None,
            cookie,
            &format!("blogger_info({user_id})"),
        )
        .await
    }

    /// Fetches aggregate note metrics for one business view (0 = daily,
    /// 1 = cooperation).
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; see the taxonomy on that type.
    pub async fn data_summary(
        &self,
        user_id: &str,
        business: u8,
        cookie: &str,
    ) -> Result<DataSummary, ApiError> {
        self.request_data(
            Method::GET,
            "/api/pgy/kol/data/data_summary",
            &[
                ("userId", user_id.to_string()),
                ("business", business.to_string()),
            ],
            None,
            cookie,
            &format!("data_summary({user_id}, business={business})"),
        )
        .await
    }

    /// Fetches follower growth and activity rates.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; see the taxonomy on that type.
    pub async fn fans_summary(&self, user_id: &str, cookie: &str) -> Result<FansSummary, ApiError> {
        self.request_data(
            Method::GET,
            "/api/solar/kol/data_v3/fans_summary",
            &[("userId", user_id.to_string())],
            None,
            cookie,
            &format!("fans_summary({user_id})"),
        )
        .await
    }

    /// Fetches follower demographics.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; see the taxonomy on that type.
    pub async fn fans_profile(&self, user_id: &str, cookie: &str) -> Result<FansProfile, ApiError> {
        let path = format!("/api/solar/kol/data/{user_id}/fans_profile");
        self.request_data(
            Method::GET,
            &path,
            &[],
            None,
            cookie,
            &format!("fans_profile({user_id})"),
        )
        .await
    }

    /// Fetches per-variant engagement medians and traffic-source splits.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; see the taxonomy on that type.
    pub async fn notes_rate(
        &self,
        user_id: &str,
        params: VariantParams,
        cookie: &str,
    ) -> Result<NotesRate, ApiError> {
        self.request_data(
            Method::GET,
            "/api/solar/kol/data_v3/notes_rate",
            &[
                ("userId", user_id.to_string()),
                ("business", params.business.to_string()),
                ("noteType", params.note_type.to_string()),
                ("dateType", params.date_type.to_string()),
                ("advertiseSwitch", params.advertise_switch.to_string()),
            ],
            None,
            cookie,
            &format!("notes_rate({user_id}, business={})", params.business),
        )
        .await
    }

    /// Fetches per-variant median impressions/reads/engagements and unit
    /// price estimates.
    ///
    /// Quirk preserved from the platform client: this POST body carries
    /// `business` as a string, while `notes_rate` sends it numeric.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; see the taxonomy on that type.
    pub async fn core_data(
        &self,
        user_id: &str,
        params: VariantParams,
        cookie: &str,
    ) -> Result<CoreData, ApiError> {
        let body = serde_json::json!({
            "userId": user_id,
            "business": params.business.to_string(),
            "noteType": params.note_type,
            "dateType": params.date_type,
            "advertiseSwitch": params.advertise_switch,
        });
        self.request_data(
            Method::POST,
            "/api/pgy/kol/data/core_data",
            &[],
            Some(body),
            cookie,
            &format!("core_data({user_id}, business={})", params.business),
        )
        .await
    }

    /// Validates a credential's session by fetching the account's own user
    /// info. Used by credential management, not by collection jobs.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; an [`ApiError::AuthRejected`] or
    /// [`ApiError::Business`] here means the session is stale.
    pub async fn user_info(&self, cookie: &str) -> Result<UserInfo, ApiError> {
        self.request_data(
            Method::GET,
            "/api/solar/user/info",
            &[],
            None,
            cookie,
            "user_info",
        )
        .await
    }
}
