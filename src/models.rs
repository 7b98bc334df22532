use chrono::NaiveDate;
use serde::Deserialize;

/// One night's sleep telemetry, flattened for tabular output.
///
/// Duration fields are hours (upstream seconds / 3600, a missing value
/// counting as zero). The derived percentage fields stay `None` until the
/// derived-metrics pass runs over the assembled table.
#[derive(Debug, Clone, PartialEq)]
pub struct SleepRecord {
    pub date: NaiveDate,
    pub total_sleep: f64,
    pub deep_sleep: f64,
    pub light_sleep: f64,
    pub rem_sleep: f64,
    pub awake_time: f64,
    pub sleep_score: Option<i64>,
    pub sleep_quality: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub resting_heart_rate: Option<i64>,
    pub avg_hrv: Option<f64>,
    pub avg_stress: Option<f64>,
    pub body_battery_change: Option<i64>,
    pub awake_count: Option<i64>,
    pub average_respiration: Option<f64>,
    pub lowest_respiration: Option<f64>,
    pub highest_respiration: Option<f64>,
    pub restless_moments: Option<i64>,
    pub sleep_efficiency: Option<f64>,
    pub deep_sleep_percentage: Option<f64>,
    pub rem_sleep_percentage: Option<f64>,
}

/// Which columns an export extracts and writes.
///
/// `Basic` covers the headline nightly numbers; `Full` adds the sleep-stage
/// breakdown, stress and respiration metrics, and the derived percentage
/// columns computed after the table is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FieldSet {
    Basic,
    Full,
}

impl FieldSet {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            FieldSet::Basic => &[
                "date",
                "total_sleep",
                "sleep_score",
                "start_time",
                "end_time",
                "resting_heart_rate",
                "avg_hrv",
                "sleep_quality",
            ],
            FieldSet::Full => &[
                "date",
                "total_sleep",
                "deep_sleep",
                "light_sleep",
                "rem_sleep",
                "awake_time",
                "sleep_score",
                "start_time",
                "end_time",
                "resting_heart_rate",
                "avg_stress",
                "body_battery_change",
                "avg_hrv",
                "awake_count",
                "sleep_quality",
                "average_respiration",
                "lowest_respiration",
                "highest_respiration",
                "restless_moments",
                "sleep_efficiency",
                "deep_sleep_percentage",
                "rem_sleep_percentage",
            ],
        }
    }

    /// Derived percentage columns exist only in the full set.
    pub fn has_derived(self) -> bool {
        matches!(self, FieldSet::Full)
    }
}

/// Raw per-day payload from the wellness daily-sleep endpoint.
///
/// Every sub-key can be absent; a payload without `dailySleepDTO` means
/// "no sleep recorded for this date" rather than an error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SleepEnvelope {
    #[serde(rename = "dailySleepDTO")]
    pub daily_sleep_dto: Option<DailySleepSummary>,
    pub resting_heart_rate: Option<i64>,
    pub avg_overnight_hrv: Option<f64>,
    pub body_battery_change: Option<i64>,
    pub restless_moments_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailySleepSummary {
    pub sleep_time_seconds: Option<i64>,
    pub deep_sleep_seconds: Option<i64>,
    pub light_sleep_seconds: Option<i64>,
    pub rem_sleep_seconds: Option<i64>,
    pub awake_sleep_seconds: Option<i64>,
    /// Epoch milliseconds already shifted to the account's local time.
    pub sleep_start_timestamp_local: Option<i64>,
    pub sleep_end_timestamp_local: Option<i64>,
    pub avg_sleep_stress: Option<f64>,
    pub awake_count: Option<i64>,
    pub average_respiration_value: Option<f64>,
    pub lowest_respiration_value: Option<f64>,
    pub highest_respiration_value: Option<f64>,
    pub sleep_scores: Option<SleepScores>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SleepScores {
    pub overall: Option<OverallScore>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverallScore {
    pub value: Option<i64>,
    pub qualifier_key: Option<String>,
}
