mod chart;
mod config;
mod error;
mod fonts;
mod model;
mod pdf;
mod report;
mod store;

pub use chart::{ChartRenderer, NoCharts, PlottersRenderer, TARGET_HIGH, TARGET_LOW};
pub use config::{FONTS_ENV, FontSource, LayoutConfig, PaperSize};
pub use error::Error;
pub use fonts::FontStyle;
pub use model::{
    GlucoseReading, Meal, MealType, Medication, PatientInfo, ReadingType, ReportData, ReportKind,
    ReportPeriod,
};
pub use report::{
    GLUCOSE_READINGS_HEADERS, GLUCOSE_READINGS_SECTION, GLUCOSE_SECTION, GlucoseSummary,
    MEAL_HEADERS, MEAL_SECTION, MEDICATION_HEADERS, MEDICATION_SECTION, REPORT_TITLE,
    layout_report,
};
pub use store::{
    ReportRecord, ReportStatus, StoredReport, format_size, run_report, save_report,
};

/// The layout engine and its primitives.
pub mod layout {
    pub use crate::pdf::*;
}

use std::path::Path;
use std::time::Instant;

/// Generate a report and return the PDF bytes.
pub fn generate_report(
    data: &ReportData,
    kind: ReportKind,
    config: LayoutConfig,
    charts: &dyn ChartRenderer,
) -> Result<Vec<u8>, Error> {
    report::generate(data, kind, config, charts)
}

/// Parse report data from JSON and generate the PDF bytes.
pub fn generate_report_from_json(
    input: &[u8],
    kind: ReportKind,
    config: LayoutConfig,
    charts: &dyn ChartRenderer,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();
    let data = ReportData::from_json(input)?;
    let t_parse = t0.elapsed();

    let bytes = report::generate(&data, kind, config, charts)?;
    log::info!(
        "Timing: parse={:.1}ms, generate={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t0.elapsed() - t_parse).as_secs_f64() * 1000.0,
        bytes.len(),
    );
    Ok(bytes)
}

/// Read report data from `input`, generate the report and store it as
/// `<out_dir>/<report_id>.pdf`. The returned record is `Failed` (with the
/// error message) when generation or writing failed after the input was read.
pub fn generate_report_to_dir(
    input: &Path,
    out_dir: &Path,
    report_id: &str,
    kind: ReportKind,
    config: LayoutConfig,
    charts: &dyn ChartRenderer,
) -> Result<ReportRecord, Error> {
    let t0 = Instant::now();

    let raw = std::fs::read(input).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, input.display()),
        ))
    })?;
    let data = ReportData::from_json(&raw)?;
    let t_parse = t0.elapsed();

    let mut record = ReportRecord::new(report_id, kind);
    match run_report(&mut record, &data, config, charts, out_dir) {
        Ok(stored) => log::info!(
            "report {} stored at {} ({})",
            record.id,
            stored.path.display(),
            stored.size
        ),
        // Already logged by `run_report`; the record carries the message.
        Err(e) => log::debug!("report {} marked failed: {e}", record.id),
    }
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, report={:.1}ms, total={:.1}ms (status {:?})",
        t_parse.as_secs_f64() * 1000.0,
        (t_total - t_parse).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        record.status,
    );

    Ok(record)
}
