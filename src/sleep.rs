use chrono::{DateTime, Duration, Local, NaiveDate};
use log::{info, warn};

use crate::garmin::GarminClient;
use crate::models::{SleepEnvelope, SleepRecord};

/// Closed calendar interval, iterated in ascending order.
///
/// `start > end` is a valid (empty) range rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Apply the defaulting rule: `end` falls back to today, `start` to
    /// `end - 7 days`.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self::resolve_from(start, end, Local::now().date_naive())
    }

    fn resolve_from(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        let end = end.unwrap_or(today);
        let start = start.unwrap_or(end - Duration::days(7));
        Self { start, end }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), |date| date.succ_opt())
            .take_while(move |date| *date <= end)
    }
}

/// Fetch and normalize every date in the range, in ascending order.
///
/// A failed or empty date contributes no row and never aborts the rest of
/// the range; rows already collected are kept.
pub async fn collect_range(client: &GarminClient, range: &DateRange) -> Vec<SleepRecord> {
    let mut records = Vec::new();

    for date in range.days() {
        info!("fetching sleep data for {date}");
        match client.daily_sleep(date).await {
            Ok(Some(envelope)) => match normalize_day(date, &envelope) {
                Some(record) => records.push(record),
                None => info!("no sleep summary for {date}"),
            },
            Ok(None) => info!("no sleep data for {date}"),
            Err(err) => warn!("skipping {date}: {err}"),
        }
    }

    records
}

/// Flatten one day's payload, or `None` when the summary key is missing.
pub fn normalize_day(date: NaiveDate, envelope: &SleepEnvelope) -> Option<SleepRecord> {
    let summary = envelope.daily_sleep_dto.as_ref()?;
    let overall = summary.sleep_scores.as_ref().and_then(|s| s.overall.as_ref());

    Some(SleepRecord {
        date,
        total_sleep: hours(summary.sleep_time_seconds),
        deep_sleep: hours(summary.deep_sleep_seconds),
        light_sleep: hours(summary.light_sleep_seconds),
        rem_sleep: hours(summary.rem_sleep_seconds),
        awake_time: hours(summary.awake_sleep_seconds),
        sleep_score: overall.and_then(|o| o.value),
        sleep_quality: overall.and_then(|o| o.qualifier_key.clone()),
        start_time: local_timestamp(summary.sleep_start_timestamp_local),
        end_time: local_timestamp(summary.sleep_end_timestamp_local),
        resting_heart_rate: envelope.resting_heart_rate,
        avg_hrv: envelope.avg_overnight_hrv,
        avg_stress: summary.avg_sleep_stress,
        body_battery_change: envelope.body_battery_change,
        awake_count: summary.awake_count,
        average_respiration: summary.average_respiration_value,
        lowest_respiration: summary.lowest_respiration_value,
        highest_respiration: summary.highest_respiration_value,
        restless_moments: envelope.restless_moments_count,
        sleep_efficiency: None,
        deep_sleep_percentage: None,
        rem_sleep_percentage: None,
    })
}

/// Fill the derived percentage columns once the table is assembled.
///
/// A zero total coerces every percentage to 0 instead of NaN or infinity.
pub fn apply_derived_metrics(records: &mut [SleepRecord]) {
    for record in records {
        let stages = record.deep_sleep + record.light_sleep + record.rem_sleep;
        record.sleep_efficiency = Some(percentage_of(stages, record.total_sleep));
        record.deep_sleep_percentage = Some(percentage_of(record.deep_sleep, record.total_sleep));
        record.rem_sleep_percentage = Some(percentage_of(record.rem_sleep, record.total_sleep));
    }
}

fn percentage_of(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

fn hours(seconds: Option<i64>) -> f64 {
    seconds.unwrap_or(0) as f64 / 3600.0
}

/// Upstream "local" timestamps are epoch milliseconds pre-shifted to the
/// account's wall-clock time; a zero value counts as absent.
fn local_timestamp(millis: Option<i64>) -> Option<String> {
    let millis = millis.filter(|&ms| ms != 0)?;
    let stamp = DateTime::from_timestamp_millis(millis)?;
    Some(stamp.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
}
