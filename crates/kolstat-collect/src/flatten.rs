//! Typed endpoint payloads → flat string fields.
//!
//! Every payload flattens into its own dotted namespace (`blogger.*`,
//! `summary.daily.*`, `fans.*`, …), which keeps merged records collision-free
//! by construction. Rendering reproduces the platform's own presentation:
//! rates as `x.y%` of a fraction, prices and CPx at two decimals, breakdown
//! lists as `name(share)` comma lists with the platform's truncation limits.

use kolstat_api::types::{
    BloggerInfo, CoreData, DataSummary, FansProfile, FansSummary, NoteTypeShare, NotesRate,
};
use kolstat_core::fields::{Business, PerfVariant};

use crate::aggregate::ResultRecord;

const PROVINCE_LIMIT: usize = 20;
const CITY_LIMIT: usize = 9;
const DEVICE_LIMIT: usize = 10;
const INTEREST_LIMIT: usize = 20;

/// Renders a loosely-typed wire value verbatim; null becomes empty.
fn value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fraction of 1 → `x.y%`.
fn pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Fraction of 1 → `x.yz%`, used where the platform shows two decimals.
fn pct2(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn opt_pct(fraction: Option<f64>) -> String {
    fraction.map(pct).unwrap_or_default()
}

fn money(v: f64) -> String {
    format!("{v:.2}")
}

fn opt_money(v: Option<f64>) -> String {
    v.map(money).unwrap_or_default()
}

/// `tag(percent)` comma list for note-type distributions. The wire percent
/// here is already scaled, so it is rendered verbatim.
fn note_type_list(shares: &[NoteTypeShare]) -> String {
    shares
        .iter()
        .map(|s| format!("{}({})", s.content_tag, value(&s.percent)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn insert(record: &mut ResultRecord, key: impl Into<String>, val: String) {
    record.insert(key.into(), val);
}

/// `blogger.*` namespace, from the mandatory identity fetch.
#[must_use]
pub fn flatten_blogger(info: &BloggerInfo) -> ResultRecord {
    let mut r = ResultRecord::new();
    insert(&mut r, "blogger.name", info.name.clone());
    insert(&mut r, "blogger.gender", info.gender.clone());
    insert(&mut r, "blogger.red_id", info.red_id.clone());
    insert(&mut r, "blogger.location", info.location.clone());
    insert(&mut r, "blogger.fans_count", info.fans_count.to_string());
    insert(
        &mut r,
        "blogger.like_collect_count",
        value(&info.like_collect_count_info),
    );
    insert(&mut r, "blogger.picture_price", money(info.picture_price));
    insert(&mut r, "blogger.video_price", money(info.video_price));
    insert(&mut r, "blogger.lower_price", money(info.lower_price));
    insert(
        &mut r,
        "blogger.agency",
        info.note_sign
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_default(),
    );
    let tags: Vec<&str> = info
        .content_tags
        .iter()
        .flat_map(|g| g.taxonomy2_tags.iter().map(String::as_str))
        .collect();
    insert(&mut r, "blogger.content_tags", tags.join(", "));
    insert(&mut r, "blogger.trade_type", info.trade_type.clone());
    r
}

/// `summary.daily.*` or `summary.coop.*`, depending on which business view
/// the payload came from.
#[must_use]
pub fn flatten_summary(business: Business, summary: &DataSummary) -> ResultRecord {
    let ns = format!("summary.{}.", business.key());
    let mut r = ResultRecord::new();
    let mut put = |key: &str, val: String| {
        r.insert(format!("{ns}{key}"), val);
    };
    put("note_number", summary.note_number.to_string());
    put("note_type", note_type_list(&summary.note_type));
    put("date_key", summary.date_key.clone());
    put("imp", value(&summary.m_accum_imp_num));
    put("read", value(&summary.m_valid_raw_read_feed_num));
    put("engage", value(&summary.m_engagement_num));
    put("picture_cpm", value(&summary.estimate_picture_cpm));
    put("video_cpm", value(&summary.estimate_video_cpm));
    put("pic_read_cost", value(&summary.pic_read_cost));
    put("video_read_cost", value(&summary.video_read_cost_v2));
    put(
        "picture_engage_cost",
        value(&summary.estimate_picture_engage_cost),
    );
    put(
        "video_engage_cost",
        value(&summary.estimate_video_engage_cost),
    );
    put("picture_cpuv", value(&summary.estimate_picture_cpuv));
    put("video_cpuv", value(&summary.estimate_video_cpuv));
    put("active_days_last7", value(&summary.active_day_in_last7));
    put("response_rate", value(&summary.response_rate));
    put(
        "fans30_growth_beyond_rate",
        value(&summary.fans30_growth_beyond_rate),
    );
    r
}

/// `fans.*` namespace: growth and activity rates.
#[must_use]
pub fn flatten_fans_summary(fans: &FansSummary) -> ResultRecord {
    let mut r = ResultRecord::new();
    insert(&mut r, "fans.increase_num", value(&fans.fans_increase_num));
    insert(&mut r, "fans.growth_rate", opt_pct(fans.fans_growth_rate));
    insert(&mut r, "fans.active_rate", opt_pct(fans.active_fans_rate));
    insert(&mut r, "fans.read_rate", opt_pct(fans.read_fans_rate));
    insert(&mut r, "fans.engage_rate", opt_pct(fans.engage_fans_rate));
    insert(
        &mut r,
        "fans.pay_rate_30d",
        opt_pct(fans.pay_fans_user_rate30d),
    );
    r
}

/// `name(x.y%)` comma list, truncated to the platform's display limit.
fn share_list<'a, I>(items: I, limit: usize) -> String
where
    I: Iterator<Item = (&'a str, f64)>,
{
    items
        .take(limit)
        .map(|(name, share)| format!("{}({})", name, pct(share)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `profile.*` namespace: follower demographics.
#[must_use]
pub fn flatten_fans_profile(profile: &FansProfile) -> ResultRecord {
    let mut r = ResultRecord::new();
    insert(
        &mut r,
        "profile.gender",
        format!(
            "male {}, female {}",
            pct2(profile.gender.male),
            pct2(profile.gender.female)
        ),
    );
    insert(
        &mut r,
        "profile.ages",
        share_list(
            profile.ages.iter().map(|a| (a.group.as_str(), a.percent)),
            usize::MAX,
        ),
    );
    insert(
        &mut r,
        "profile.provinces",
        share_list(
            profile
                .provinces
                .iter()
                .map(|p| (p.name.as_str(), p.percent)),
            PROVINCE_LIMIT,
        ),
    );
    insert(
        &mut r,
        "profile.cities",
        share_list(
            profile.cities.iter().map(|c| (c.name.as_str(), c.percent)),
            CITY_LIMIT,
        ),
    );
    insert(
        &mut r,
        "profile.devices",
        share_list(
            profile.devices.iter().map(|d| (d.desc.as_str(), d.percent)),
            DEVICE_LIMIT,
        ),
    );
    insert(
        &mut r,
        "profile.interests",
        share_list(
            profile
                .interests
                .iter()
                .map(|i| (i.name.as_str(), i.percent)),
            INTEREST_LIMIT,
        ),
    );
    r
}

/// Per-variant engagement fields under `perf.<business>.<kind>.<range>.`.
#[must_use]
pub fn flatten_notes_rate(variant: &PerfVariant, rate: &NotesRate) -> ResultRecord {
    let prefix = variant.prefix();
    let mut r = ResultRecord::new();
    let mut put = |key: &str, val: String| {
        r.insert(format!("{prefix}{key}"), val);
    };
    put("note_number", value(&rate.note_number));
    put("note_type", note_type_list(&rate.note_type));
    put("like_median", value(&rate.like_median));
    put("collect_median", value(&rate.collect_median));
    put("comment_median", value(&rate.comment_median));
    put("share_median", value(&rate.share_median));
    put("follow_cnt", value(&rate.mfollow_cnt));
    put("interaction_rate", value(&rate.interaction_rate));
    put("picture3s_view_rate", value(&rate.picture3s_view_rate));
    put("thousand_like_percent", value(&rate.thousand_like_percent));
    put("hundred_like_percent", value(&rate.hundred_like_percent));

    let p = &rate.page_percent_vo;
    put("read_homefeed", opt_pct(p.read_homefeed_percent));
    put("read_search", opt_pct(p.read_search_percent));
    put("read_follow", opt_pct(p.read_follow_percent));
    put("read_detail", opt_pct(p.read_detail_percent));
    put("read_nearby", opt_pct(p.read_nearby_percent));
    put("read_other", opt_pct(p.read_other_percent));
    put("imp_homefeed", opt_pct(p.imp_homefeed_percent));
    put("imp_search", opt_pct(p.imp_search_percent));
    put("imp_follow", opt_pct(p.imp_follow_percent));
    put("imp_detail", opt_pct(p.imp_detail_percent));
    put("imp_nearby", opt_pct(p.imp_nearby_percent));
    put("imp_other", opt_pct(p.imp_other_percent));
    r
}

/// Per-variant traffic sums under the same prefix as the notes-rate fields.
/// `third_user_num` is a cooperation-only metric; the daily view always
/// reports zero, so it is omitted there.
#[must_use]
pub fn flatten_core_data(variant: &PerfVariant, core: &CoreData) -> ResultRecord {
    let prefix = variant.prefix();
    let mut r = ResultRecord::new();
    let mut put = |key: &str, val: String| {
        r.insert(format!("{prefix}{key}"), val);
    };
    let sums = &core.sum_data;
    put("imp", value(&sums.imp));
    put("read", value(&sums.read));
    put("engage", value(&sums.engage));
    put("cpm", opt_money(sums.cpm));
    put("cpv", opt_money(sums.cpv));
    put("cpe", opt_money(sums.cpe));
    if variant.business == Business::Coop {
        put("third_user_num", value(&sums.third_user_num));
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use kolstat_api::types::{CoreSums, GenderSplit, NamedShare, NoteSign, PagePercent};
    use kolstat_core::fields::{DateRange, NoteKind};

    #[test]
    fn blogger_fields_land_in_namespace() {
        let info = BloggerInfo {
            name: "Creator".to_string(),
            red_id: "900001".to_string(),
            fans_count: 120_000,
            picture_price: 4000.0,
            note_sign: Some(NoteSign {
                name: "Agency".to_string(),
            }),
            ..BloggerInfo::default()
        };
        let r = flatten_blogger(&info);
        assert_eq!(r["blogger.name"], "Creator");
        assert_eq!(r["blogger.fans_count"], "120000");
        assert_eq!(r["blogger.picture_price"], "4000.00");
        assert_eq!(r["blogger.agency"], "Agency");
        assert!(r.keys().all(|k| k.starts_with("blogger.")));
    }

    #[test]
    fn summary_namespace_follows_business() {
        let summary = DataSummary {
            note_number: 12,
            ..DataSummary::default()
        };
        let daily = flatten_summary(Business::Daily, &summary);
        let coop = flatten_summary(Business::Coop, &summary);
        assert_eq!(daily["summary.daily.note_number"], "12");
        assert_eq!(coop["summary.coop.note_number"], "12");
    }

    #[test]
    fn rates_render_as_percent_of_fraction() {
        let fans = FansSummary {
            fans_growth_rate: Some(0.0123),
            active_fans_rate: None,
            ..FansSummary::default()
        };
        let r = flatten_fans_summary(&fans);
        assert_eq!(r["fans.growth_rate"], "1.2%");
        assert_eq!(r["fans.active_rate"], "");
    }

    #[test]
    fn profile_gender_is_composite_and_cities_truncate() {
        let profile = FansProfile {
            gender: GenderSplit {
                male: 0.3456,
                female: 0.6544,
            },
            cities: (0..15)
                .map(|i| NamedShare {
                    name: format!("city{i}"),
                    percent: 0.01,
                })
                .collect(),
            ..FansProfile::default()
        };
        let r = flatten_fans_profile(&profile);
        assert_eq!(r["profile.gender"], "male 34.56%, female 65.44%");
        assert_eq!(r["profile.cities"].matches("city").count(), 9);
    }

    #[test]
    fn core_data_keeps_third_party_count_for_coop_only() {
        let core = CoreData {
            sum_data: CoreSums {
                cpm: Some(12.345),
                third_user_num: serde_json::json!(3),
                ..CoreSums::default()
            },
        };
        let coop = PerfVariant {
            business: Business::Coop,
            note_kind: NoteKind::Video,
            date_range: DateRange::Last90,
        };
        let daily = PerfVariant {
            business: Business::Daily,
            ..coop
        };
        let coop_r = flatten_core_data(&coop, &core);
        let daily_r = flatten_core_data(&daily, &core);
        assert_eq!(coop_r["perf.coop.video.d90.cpm"], "12.35");
        assert_eq!(coop_r["perf.coop.video.d90.third_user_num"], "3");
        assert!(!daily_r.contains_key("perf.daily.video.d90.third_user_num"));
    }

    #[test]
    fn notes_rate_page_percents_scale() {
        let rate = NotesRate {
            page_percent_vo: PagePercent {
                read_homefeed_percent: Some(0.5),
                ..PagePercent::default()
            },
            ..NotesRate::default()
        };
        let v = PerfVariant {
            business: Business::Daily,
            note_kind: NoteKind::Image,
            date_range: DateRange::Last30,
        };
        let r = flatten_notes_rate(&v, &rate);
        assert_eq!(r["perf.daily.image.d30.read_homefeed"], "50.0%");
        assert!(r.keys().all(|k| k.starts_with("perf.daily.image.d30.")));
    }
}
