//! Wire types for the platform's JSON envelope and endpoint payloads.
//!
//! The API is reverse-engineered and loose about numeric types — the same
//! field may arrive as a number or a string depending on the account tier.
//! Fields the collector only ever renders verbatim are therefore kept as
//! `serde_json::Value`; fields that feed arithmetic (percentage scaling) are
//! typed `f64`.

use serde::Deserialize;

/// Standard response envelope: business `code` 0 plus `success: true` means
/// the `data` payload is usable; anything else carries a `msg`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub code: i64,
    pub data: Option<T>,
    pub msg: Option<String>,
}

/// Identity card for one creator. The mandatory first fetch of every job.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BloggerInfo {
    pub name: String,
    pub gender: String,
    pub red_id: String,
    pub location: String,
    pub fans_count: i64,
    pub like_collect_count_info: serde_json::Value,
    pub picture_price: f64,
    pub video_price: f64,
    pub lower_price: f64,
    pub note_sign: Option<NoteSign>,
    pub content_tags: Vec<ContentTagGroup>,
    pub trade_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteSign {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentTagGroup {
    pub taxonomy2_tags: Vec<String>,
}

/// Aggregate note metrics, shape shared by the daily (business=0) and
/// cooperation (business=1) views; each view populates its own subset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataSummary {
    pub note_number: i64,
    pub note_type: Vec<NoteTypeShare>,
    pub date_key: String,
    pub m_accum_imp_num: serde_json::Value,
    pub m_valid_raw_read_feed_num: serde_json::Value,
    pub m_engagement_num: serde_json::Value,
    pub estimate_picture_cpm: serde_json::Value,
    pub estimate_video_cpm: serde_json::Value,
    pub pic_read_cost: serde_json::Value,
    pub video_read_cost_v2: serde_json::Value,
    pub estimate_picture_engage_cost: serde_json::Value,
    pub estimate_video_engage_cost: serde_json::Value,
    pub estimate_picture_cpuv: serde_json::Value,
    pub estimate_video_cpuv: serde_json::Value,
    pub active_day_in_last7: serde_json::Value,
    pub response_rate: serde_json::Value,
    pub fans30_growth_beyond_rate: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteTypeShare {
    pub content_tag: String,
    pub percent: serde_json::Value,
}

/// Follower growth and activity rates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FansSummary {
    pub fans_increase_num: serde_json::Value,
    pub fans_growth_rate: Option<f64>,
    pub active_fans_rate: Option<f64>,
    pub read_fans_rate: Option<f64>,
    pub engage_fans_rate: Option<f64>,
    pub pay_fans_user_rate30d: Option<f64>,
}

/// Follower demographics. Ratios are fractions of 1 on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FansProfile {
    pub gender: GenderSplit,
    pub ages: Vec<GroupShare>,
    pub provinces: Vec<NamedShare>,
    pub cities: Vec<NamedShare>,
    pub devices: Vec<DeviceShare>,
    pub interests: Vec<NamedShare>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenderSplit {
    pub male: f64,
    pub female: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupShare {
    pub group: String,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamedShare {
    pub name: String,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceShare {
    pub desc: String,
    pub percent: f64,
}

/// Per-variant engagement medians and traffic-source breakdowns.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotesRate {
    pub note_number: serde_json::Value,
    pub note_type: Vec<NoteTypeShare>,
    pub like_median: serde_json::Value,
    pub collect_median: serde_json::Value,
    pub comment_median: serde_json::Value,
    pub share_median: serde_json::Value,
    pub mfollow_cnt: serde_json::Value,
    pub interaction_rate: serde_json::Value,
    pub picture3s_view_rate: serde_json::Value,
    pub thousand_like_percent: serde_json::Value,
    pub hundred_like_percent: serde_json::Value,
    pub page_percent_vo: PagePercent,
}

/// Read/impression source ratios, fractions of 1.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PagePercent {
    pub read_homefeed_percent: Option<f64>,
    pub read_search_percent: Option<f64>,
    pub read_follow_percent: Option<f64>,
    pub read_detail_percent: Option<f64>,
    pub read_nearby_percent: Option<f64>,
    pub read_other_percent: Option<f64>,
    pub imp_homefeed_percent: Option<f64>,
    pub imp_search_percent: Option<f64>,
    pub imp_follow_percent: Option<f64>,
    pub imp_detail_percent: Option<f64>,
    pub imp_nearby_percent: Option<f64>,
    pub imp_other_percent: Option<f64>,
}

/// Envelope payload of the `core_data` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreData {
    pub sum_data: CoreSums,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreSums {
    pub imp: serde_json::Value,
    pub read: serde_json::Value,
    pub engage: serde_json::Value,
    pub cpm: Option<f64>,
    pub cpv: Option<f64>,
    pub cpe: Option<f64>,
    pub third_user_num: serde_json::Value,
}

/// Payload of the session-validation endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    pub role_info_list: Vec<RoleInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleInfo {
    pub nick_name: String,
}
