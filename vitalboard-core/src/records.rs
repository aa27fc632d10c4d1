//! Typed records, one per dataset
//!
//! CSV headers follow the facility's export format. Each record lists the
//! columns it needs so a missing or renamed column is reported when the
//! table is loaded, not when a chart is drawn.

use crate::dataset::Dataset;
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;

/// A row type bound to one dataset
pub trait TableRecord: DeserializeOwned {
    const DATASET: Dataset;
    const COLUMNS: &'static [&'static str];

    /// Uniqueness key, for tables where each key may appear once
    fn key(&self) -> Option<String> {
        None
    }
}

/// Realtime heart and respiration rate with yesterday's averages
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RealtimeVitals {
    #[serde(rename = "リアルタイムの心拍数")]
    pub heart_rate: f64,
    #[serde(rename = "昨日の心拍数の平均")]
    pub yesterday_heart_rate_avg: f64,
    #[serde(rename = "リアルタイムの呼吸数")]
    pub respiration_rate: f64,
    #[serde(rename = "昨日の呼吸数の平均")]
    pub yesterday_respiration_avg: f64,
}

impl TableRecord for RealtimeVitals {
    const DATASET: Dataset = Dataset::Realtime;
    const COLUMNS: &'static [&'static str] = &[
        "リアルタイムの心拍数",
        "昨日の心拍数の平均",
        "リアルタイムの呼吸数",
        "昨日の呼吸数の平均",
    ];
}

/// One hourly vital reading for today
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VitalReading {
    #[serde(rename = "時間")]
    pub hour: u32,
    #[serde(rename = "心拍数")]
    pub heart_rate: f64,
    #[serde(rename = "呼吸数")]
    pub respiration_rate: f64,
}

impl TableRecord for VitalReading {
    const DATASET: Dataset = Dataset::DailyVitals;
    const COLUMNS: &'static [&'static str] = &["時間", "心拍数", "呼吸数"];
}

/// Five-number summary of one day's heart and respiration rates
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeeklyVitalSummary {
    #[serde(rename = "日付", deserialize_with = "de::date")]
    pub date: NaiveDate,
    #[serde(rename = "心拍数最小値")]
    pub heart_rate_min: f64,
    #[serde(rename = "心拍数Q1")]
    pub heart_rate_q1: f64,
    #[serde(rename = "心拍数中央値")]
    pub heart_rate_median: f64,
    #[serde(rename = "心拍数Q3")]
    pub heart_rate_q3: f64,
    #[serde(rename = "心拍数最大値")]
    pub heart_rate_max: f64,
    #[serde(rename = "呼吸数最小値")]
    pub respiration_min: f64,
    #[serde(rename = "呼吸数Q1")]
    pub respiration_q1: f64,
    #[serde(rename = "呼吸数中央値")]
    pub respiration_median: f64,
    #[serde(rename = "呼吸数Q3")]
    pub respiration_q3: f64,
    #[serde(rename = "呼吸数最大値")]
    pub respiration_max: f64,
}

impl TableRecord for WeeklyVitalSummary {
    const DATASET: Dataset = Dataset::WeeklyVitals;
    const COLUMNS: &'static [&'static str] = &[
        "日付",
        "心拍数最小値",
        "心拍数Q1",
        "心拍数中央値",
        "心拍数Q3",
        "心拍数最大値",
        "呼吸数最小値",
        "呼吸数Q1",
        "呼吸数中央値",
        "呼吸数Q3",
        "呼吸数最大値",
    ];

    fn key(&self) -> Option<String> {
        Some(self.date.to_string())
    }
}

/// Today's and yesterday's sleep and activity totals
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SleepActivitySummary {
    #[serde(rename = "本日の起床時間")]
    pub wake_time: String,
    #[serde(rename = "本日の就寝時間")]
    pub bed_time: String,
    #[serde(rename = "本日の睡眠時間")]
    pub sleep_hours: f64,
    #[serde(rename = "昨日の睡眠時間")]
    pub yesterday_sleep_hours: f64,
    #[serde(rename = "本日の活動時間")]
    pub active_hours: f64,
    #[serde(rename = "昨日の活動時間")]
    pub yesterday_active_hours: f64,
}

impl TableRecord for SleepActivitySummary {
    const DATASET: Dataset = Dataset::SleepSummary;
    const COLUMNS: &'static [&'static str] = &[
        "本日の起床時間",
        "本日の就寝時間",
        "本日の睡眠時間",
        "昨日の睡眠時間",
        "本日の活動時間",
        "昨日の活動時間",
    ];
}

/// One day of the monthly sleep/activity breakdown
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailySleepActivity {
    #[serde(rename = "日付", deserialize_with = "de::date")]
    pub date: NaiveDate,
    #[serde(rename = "週目")]
    pub week: u32,
    #[serde(rename = "曜日")]
    pub weekday: String,
    #[serde(rename = "睡眠時間")]
    pub sleep_hours: f64,
    #[serde(rename = "活動時間")]
    pub active_hours: f64,
}

impl TableRecord for DailySleepActivity {
    const DATASET: Dataset = Dataset::MonthlySleep;
    const COLUMNS: &'static [&'static str] = &["日付", "週目", "曜日", "睡眠時間", "活動時間"];

    fn key(&self) -> Option<String> {
        Some(self.date.to_string())
    }
}

/// Today's and yesterday's room entries and distance travelled
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovementSummary {
    #[serde(rename = "本日の入退室数")]
    pub room_entries: f64,
    #[serde(rename = "昨日の入退室数")]
    pub yesterday_room_entries: f64,
    #[serde(rename = "本日の移動距離")]
    pub distance: f64,
    #[serde(rename = "昨日の移動距離")]
    pub yesterday_distance: f64,
}

impl TableRecord for MovementSummary {
    const DATASET: Dataset = Dataset::Movement;
    const COLUMNS: &'static [&'static str] = &[
        "本日の入退室数",
        "昨日の入退室数",
        "本日の移動距離",
        "昨日の移動距離",
    ];
}

/// Distance moved in and out of bed during one time slot (cm)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistanceSample {
    #[serde(rename = "時刻")]
    pub time: String,
    #[serde(rename = "ベッド内移動距離")]
    pub in_bed: f64,
    #[serde(rename = "ベッド外移動距離")]
    pub out_of_bed: f64,
}

impl TableRecord for DistanceSample {
    const DATASET: Dataset = Dataset::Distance;
    const COLUMNS: &'static [&'static str] = &["時刻", "ベッド内移動距離", "ベッド外移動距離"];
}

/// Room entries and exits within one hour bucket
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoomTransition {
    #[serde(rename = "日付", deserialize_with = "de::date")]
    pub date: NaiveDate,
    #[serde(rename = "時刻")]
    pub hour: u32,
    #[serde(rename = "入退室数")]
    pub count: f64,
}

impl TableRecord for RoomTransition {
    const DATASET: Dataset = Dataset::RoomTransitions;
    const COLUMNS: &'static [&'static str] = &["日付", "時刻", "入退室数"];

    fn key(&self) -> Option<String> {
        Some(format!("{} {}", self.date, self.hour))
    }
}

/// Falls detected on one calendar day
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FallCount {
    #[serde(rename = "週目")]
    pub week: u32,
    #[serde(rename = "曜日")]
    pub weekday: String,
    #[serde(rename = "転倒検知")]
    pub count: f64,
}

impl TableRecord for FallCount {
    const DATASET: Dataset = Dataset::Falls;
    const COLUMNS: &'static [&'static str] = &["週目", "曜日", "転倒検知"];
}

/// Urgency of an anomaly event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Severity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "normal" | "正常" | "通常" | "注意" => Ok(Severity::Normal),
            "critical" | "危険" => Ok(Severity::Critical),
            other => Err(format!("unrecognized severity label `{}`", other)),
        }
    }
}

/// A severity cell as written in the log, with the level it maps to
///
/// The raw text is what the anomaly table shows, so `注意` stays `注意`
/// even though it is a normal-level entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct SeverityLabel {
    pub label: String,
    pub level: Severity,
}

impl TryFrom<String> for SeverityLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let label = value.trim().to_string();
        let level = Severity::try_from(value)?;
        Ok(SeverityLabel { label, level })
    }
}

/// One entry of the anomaly/fall detection log
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnomalyEvent {
    #[serde(rename = "日時", deserialize_with = "de::timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "危険度")]
    pub severity: SeverityLabel,
    #[serde(rename = "種別")]
    pub category: String,
    #[serde(rename = "内容")]
    pub message: String,
}

impl TableRecord for AnomalyEvent {
    const DATASET: Dataset = Dataset::Anomalies;
    const COLUMNS: &'static [&'static str] = &["日時", "危険度", "種別", "内容"];
}

/// Staff-page vitals: today's and yesterday's rates
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StaffVitals {
    #[serde(rename = "今日の心拍数")]
    pub heart_rate: f64,
    #[serde(rename = "昨日の心拍数")]
    pub yesterday_heart_rate: f64,
    #[serde(rename = "今日の呼吸数")]
    pub respiration_rate: f64,
    #[serde(rename = "昨日の呼吸数")]
    pub yesterday_respiration_rate: f64,
}

impl TableRecord for StaffVitals {
    const DATASET: Dataset = Dataset::StaffVitals;
    const COLUMNS: &'static [&'static str] =
        &["今日の心拍数", "昨日の心拍数", "今日の呼吸数", "昨日の呼吸数"];
}

/// Where the resident was during one hour (asleep, indoor, outdoor)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivityStateSample {
    #[serde(rename = "日付", deserialize_with = "de::date")]
    pub date: NaiveDate,
    #[serde(rename = "時刻")]
    pub hour: u32,
    #[serde(rename = "状態")]
    pub state: String,
}

impl TableRecord for ActivityStateSample {
    const DATASET: Dataset = Dataset::ActivityStates;
    const COLUMNS: &'static [&'static str] = &["日付", "時刻", "状態"];

    fn key(&self) -> Option<String> {
        Some(format!("{} {}", self.date, self.hour))
    }
}

/// A line of today's care record shown to family members
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CareEvent {
    #[serde(rename = "時刻")]
    pub time: String,
    #[serde(rename = "内容")]
    pub description: String,
}

impl TableRecord for CareEvent {
    const DATASET: Dataset = Dataset::CareEvents;
    const COLUMNS: &'static [&'static str] = &["時刻", "内容"];
}

/// One axis of the monthly health score radar
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthScore {
    #[serde(rename = "項目")]
    pub category: String,
    #[serde(rename = "スコア")]
    pub score: f64,
}

impl TableRecord for HealthScore {
    const DATASET: Dataset = Dataset::HealthScores;
    const COLUMNS: &'static [&'static str] = &["項目", "スコア"];

    fn key(&self) -> Option<String> {
        Some(self.category.clone())
    }
}

/// Hours spent in one place within the facility this month
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceShare {
    #[serde(rename = "場所")]
    pub place: String,
    #[serde(rename = "時間")]
    pub hours: f64,
}

impl TableRecord for PlaceShare {
    const DATASET: Dataset = Dataset::PlaceShares;
    const COLUMNS: &'static [&'static str] = &["場所", "時間"];

    fn key(&self) -> Option<String> {
        Some(self.place.clone())
    }
}

/// Lenient date and timestamp parsing for exported CSVs
pub(crate) mod de {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer};

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
    const TIMESTAMP_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
    ];

    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    }

    pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    pub fn date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{}`", raw)))
    }

    pub fn timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{}`", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_accepts_both_spellings() {
        assert_eq!(Severity::try_from("危険".to_string()), Ok(Severity::Critical));
        assert_eq!(Severity::try_from("critical".to_string()), Ok(Severity::Critical));
        assert_eq!(Severity::try_from("正常".to_string()), Ok(Severity::Normal));
        assert_eq!(Severity::try_from(" normal ".to_string()), Ok(Severity::Normal));
    }

    #[test]
    fn test_severity_label_keeps_raw_text() {
        let label = SeverityLabel::try_from(" 注意 ".to_string()).unwrap();
        assert_eq!(label.label, "注意");
        assert_eq!(label.level, Severity::Normal);
        assert!(SeverityLabel::try_from("warning".to_string()).is_err());
    }

    #[test]
    fn test_severity_rejects_unknown_label() {
        assert!(Severity::try_from("warning".to_string()).is_err());
        assert!(Severity::try_from(String::new()).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap();
        assert_eq!(de::parse_date("2024-11-03"), Some(expected));
        assert_eq!(de::parse_date("2024/11/03"), Some(expected));
        assert_eq!(de::parse_date("11/03/2024"), None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let ts = de::parse_timestamp("2024-11-03 08:32").unwrap();
        assert_eq!(ts.format("%H:%M:%S").to_string(), "08:32:00");
        assert!(de::parse_timestamp("2024/11/03 21:05:09").is_some());
        assert!(de::parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_keys_for_keyed_tables() {
        let transition = RoomTransition {
            date: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            hour: 7,
            count: 2.0,
        };
        assert_eq!(transition.key().as_deref(), Some("2024-11-01 7"));

        let event = CareEvent {
            time: "8:32".to_string(),
            description: "woke up".to_string(),
        };
        assert!(event.key().is_none());
    }
}
