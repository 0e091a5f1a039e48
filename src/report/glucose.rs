use crate::chart::{ChartRenderer, TARGET_HIGH, TARGET_LOW};
use crate::error::Error;
use crate::model::{GlucoseReading, ReportData};
use crate::pdf::LayoutEngine;

use super::{GLUCOSE_READINGS_SECTION, GLUCOSE_SECTION, format_number};

pub const GLUCOSE_READINGS_HEADERS: [&str; 4] = ["Date", "Time", "Level (mg/dL)", "Type"];
const SUMMARY_HEADERS: [&str; 2] = ["Metric", "Value"];

#[derive(Clone, Debug, PartialEq)]
pub struct GlucoseSummary {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Share of readings inside the target range, percent.
    pub in_range_pct: f64,
    pub below: usize,
    pub above: usize,
}

impl GlucoseSummary {
    pub fn from_readings(readings: &[&GlucoseReading]) -> Option<Self> {
        if readings.is_empty() {
            return None;
        }
        let count = readings.len();
        let levels = readings.iter().map(|r| r.level);
        let sum: f64 = levels.clone().sum();
        let min = levels.clone().fold(f64::INFINITY, f64::min);
        let max = levels.clone().fold(f64::NEG_INFINITY, f64::max);
        let below = levels.clone().filter(|&l| l < TARGET_LOW).count();
        let above = levels.filter(|&l| l > TARGET_HIGH).count();
        let in_range = count - below - above;

        Some(GlucoseSummary {
            count,
            average: sum / count as f64,
            min,
            max,
            in_range_pct: in_range as f64 / count as f64 * 100.0,
            below,
            above,
        })
    }

    fn rows(&self) -> Vec<Vec<Option<String>>> {
        let row = |label: &str, value: String| vec![Some(label.to_string()), Some(value)];
        vec![
            row("Readings", self.count.to_string()),
            row("Average (mg/dL)", format!("{:.1}", self.average)),
            row("Lowest (mg/dL)", format_number(self.min)),
            row("Highest (mg/dL)", format_number(self.max)),
            row(
                &format!("In range {TARGET_LOW:.0}-{TARGET_HIGH:.0}"),
                format!("{:.1}%", self.in_range_pct),
            ),
            row(&format!("Below {TARGET_LOW:.0}"), self.below.to_string()),
            row(&format!("Above {TARGET_HIGH:.0}"), self.above.to_string()),
        ]
    }
}

fn reading_rows(readings: &[&GlucoseReading]) -> Vec<Vec<Option<String>>> {
    readings
        .iter()
        .map(|r| {
            vec![
                Some(r.timestamp.format("%Y-%m-%d").to_string()),
                Some(r.timestamp.format("%H:%M").to_string()),
                Some(format_number(r.level)),
                Some(r.reading_type.label().to_string()),
            ]
        })
        .collect()
}

pub(super) fn build(
    engine: &mut LayoutEngine,
    data: &ReportData,
    charts: &dyn ChartRenderer,
) -> Result<(), Error> {
    let readings = data.glucose_in_period();
    log::debug!("glucose section: {} readings in period", readings.len());

    engine.section_title(GLUCOSE_SECTION);
    let chart = charts.glucose_trend(&readings)?;
    engine.draw_image(chart.as_deref())?;

    let summary_rows = GlucoseSummary::from_readings(&readings)
        .map(|s| s.rows())
        .unwrap_or_default();
    engine.draw_table(&SUMMARY_HEADERS, &summary_rows)?;

    engine.section_title(GLUCOSE_READINGS_SECTION);
    engine.draw_table(&GLUCOSE_READINGS_HEADERS, &reading_rows(&readings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReadingType;
    use chrono::NaiveDate;

    fn reading(level: f64) -> GlucoseReading {
        GlucoseReading {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(7, 30, 0)
                .unwrap(),
            level,
            reading_type: ReadingType::Fasting,
            notes: None,
        }
    }

    #[test]
    fn summary_counts_out_of_range_readings() {
        let readings = [reading(65.0), reading(100.0), reading(140.0), reading(200.0)];
        let refs: Vec<&GlucoseReading> = readings.iter().collect();
        let summary = GlucoseSummary::from_readings(&refs).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.below, 1);
        assert_eq!(summary.above, 1);
        assert_eq!(summary.min, 65.0);
        assert_eq!(summary.max, 200.0);
        assert!((summary.average - 126.25).abs() < 1e-9);
        assert!((summary.in_range_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn range_bounds_count_as_in_range() {
        let readings = [reading(70.0), reading(180.0)];
        let refs: Vec<&GlucoseReading> = readings.iter().collect();
        let summary = GlucoseSummary::from_readings(&refs).unwrap();
        assert_eq!(summary.below + summary.above, 0);
    }

    #[test]
    fn no_readings_no_summary() {
        assert!(GlucoseSummary::from_readings(&[]).is_none());
    }

    #[test]
    fn reading_rows_follow_header_order() {
        let readings = [reading(112.0)];
        let refs: Vec<&GlucoseReading> = readings.iter().collect();
        let rows = reading_rows(&refs);
        assert_eq!(
            rows[0],
            vec![
                Some("2024-03-05".to_string()),
                Some("07:30".to_string()),
                Some("112".to_string()),
                Some("Fasting".to_string()),
            ]
        );
    }
}
