use std::path::Path;

use anyhow::Context;

use crate::models::{FieldSet, SleepRecord};

/// Header plus one row per record; absent values become empty cells.
pub fn render_csv(records: &[SleepRecord], fields: FieldSet) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(fields.columns())?;
    for record in records {
        wtr.write_record(record_row(record, fields))?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn write_csv(path: &Path, records: &[SleepRecord], fields: FieldSet) -> anyhow::Result<()> {
    let data = render_csv(records, fields)?;
    std::fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn record_row(record: &SleepRecord, fields: FieldSet) -> Vec<String> {
    match fields {
        FieldSet::Basic => vec![
            record.date.to_string(),
            hours_cell(record.total_sleep),
            opt_cell(&record.sleep_score),
            opt_cell(&record.start_time),
            opt_cell(&record.end_time),
            opt_cell(&record.resting_heart_rate),
            opt_cell(&record.avg_hrv),
            opt_cell(&record.sleep_quality),
        ],
        FieldSet::Full => vec![
            record.date.to_string(),
            hours_cell(record.total_sleep),
            hours_cell(record.deep_sleep),
            hours_cell(record.light_sleep),
            hours_cell(record.rem_sleep),
            hours_cell(record.awake_time),
            opt_cell(&record.sleep_score),
            opt_cell(&record.start_time),
            opt_cell(&record.end_time),
            opt_cell(&record.resting_heart_rate),
            opt_cell(&record.avg_stress),
            opt_cell(&record.body_battery_change),
            opt_cell(&record.avg_hrv),
            opt_cell(&record.awake_count),
            opt_cell(&record.sleep_quality),
            opt_cell(&record.average_respiration),
            opt_cell(&record.lowest_respiration),
            opt_cell(&record.highest_respiration),
            opt_cell(&record.restless_moments),
            percent_cell(record.sleep_efficiency),
            percent_cell(record.deep_sleep_percentage),
            percent_cell(record.rem_sleep_percentage),
        ],
    }
}

fn hours_cell(value: f64) -> String {
    format!("{value:.2}")
}

fn percent_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn opt_cell<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_record() -> SleepRecord {
        SleepRecord {
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            total_sleep: 8.0,
            deep_sleep: 2.0,
            light_sleep: 4.0,
            rem_sleep: 1.0,
            awake_time: 1.0,
            sleep_score: Some(84),
            sleep_quality: Some("GOOD".to_string()),
            start_time: Some("2025-01-14 22:10:00".to_string()),
            end_time: Some("2025-01-15 06:40:00".to_string()),
            resting_heart_rate: Some(47),
            avg_hrv: Some(52.5),
            avg_stress: Some(14.2),
            body_battery_change: Some(58),
            awake_count: Some(2),
            average_respiration: Some(14.5),
            lowest_respiration: Some(12.0),
            highest_respiration: Some(17.0),
            restless_moments: Some(21),
            sleep_efficiency: Some(87.5),
            deep_sleep_percentage: Some(25.0),
            rem_sleep_percentage: Some(12.5),
        }
    }

    #[test]
    fn basic_header_matches_field_set() {
        let csv = render_csv(&[sample_record()], FieldSet::Basic).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(
            header,
            "date,total_sleep,sleep_score,start_time,end_time,resting_heart_rate,avg_hrv,sleep_quality"
        );
    }

    #[test]
    fn full_header_includes_derived_columns() {
        let csv = render_csv(&[sample_record()], FieldSet::Full).unwrap();
        let header = csv.lines().next().unwrap();
        let cols: Vec<&str> = header.split(',').collect();

        assert_eq!(cols.len(), FieldSet::Full.columns().len());
        assert!(cols.contains(&"deep_sleep"));
        assert!(cols.contains(&"sleep_efficiency"));
        assert!(cols.contains(&"deep_sleep_percentage"));
        assert!(cols.contains(&"rem_sleep_percentage"));
    }

    #[test]
    fn rows_format_hours_and_percentages() {
        let csv = render_csv(&[sample_record()], FieldSet::Full).unwrap();
        let row = csv.lines().nth(1).unwrap();

        assert!(row.starts_with("2025-01-15,8.00,2.00,4.00,1.00,1.00,84,"));
        assert!(row.ends_with("87.50,25.00,12.50"));
        assert!(row.contains("2025-01-14 22:10:00"));
        assert!(row.contains("GOOD"));
    }

    #[test]
    fn absent_values_become_empty_cells() {
        let mut record = sample_record();
        record.sleep_score = None;
        record.sleep_quality = None;
        record.start_time = None;
        record.end_time = None;
        record.resting_heart_rate = None;
        record.avg_hrv = None;

        let csv = render_csv(&[record], FieldSet::Basic).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "2025-01-15,8.00,,,,,,");
    }

    #[test]
    fn row_count_matches_table() {
        let records = vec![sample_record(), sample_record(), sample_record()];
        let csv = render_csv(&records, FieldSet::Basic).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }
}
