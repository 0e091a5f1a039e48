//! Report orchestration: the header block, then the section builders the
//! report kind calls for, in a fixed order.

mod glucose;
mod meals;
mod medication;

use crate::chart::ChartRenderer;
use crate::config::LayoutConfig;
use crate::error::Error;
use crate::model::{ReportData, ReportKind};
use crate::pdf::{LayoutEngine, TextStyle};

pub use glucose::{GLUCOSE_READINGS_HEADERS, GlucoseSummary};
pub use meals::MEAL_HEADERS;
pub use medication::MEDICATION_HEADERS;

pub const REPORT_TITLE: &str = "Diabetes Management Report";
const TITLE_STYLE: TextStyle = TextStyle::bold(20.0);
const TITLE_ADVANCE: f32 = 30.0;
const INFO_STYLE: TextStyle = TextStyle::regular(10.0);
const INFO_ADVANCE: f32 = 16.0;

pub const GLUCOSE_SECTION: &str = "Glucose Analysis";
pub const GLUCOSE_READINGS_SECTION: &str = "Glucose Readings";
pub const MEDICATION_SECTION: &str = "Medication Analysis";
pub const MEAL_SECTION: &str = "Meal Analysis";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Glucose,
    Medication,
    Meals,
}

fn sections_for(kind: ReportKind) -> &'static [Section] {
    match kind {
        ReportKind::Comprehensive => &[Section::Glucose, Section::Medication, Section::Meals],
        ReportKind::Glucose => &[Section::Glucose],
        ReportKind::Medication => &[Section::Medication],
        ReportKind::Meals => &[Section::Meals],
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Title, patient details (blank fields are left out), report type, period
/// and generation date, closed by a rule.
fn draw_header_block(engine: &mut LayoutEngine, data: &ReportData, kind: ReportKind) {
    engine.draw_text(REPORT_TITLE, TITLE_STYLE);
    engine.move_down(TITLE_ADVANCE);

    let patient = &data.patient;
    let patient_lines = [
        ("Patient", non_blank(&patient.name)),
        ("Email", non_blank(&patient.email)),
        ("Diabetes type", non_blank(&patient.diabetes_type)),
    ];
    for (label, value) in patient_lines {
        if let Some(value) = value {
            engine.draw_text(&format!("{label}: {value}"), INFO_STYLE);
            engine.move_down(INFO_ADVANCE);
        }
    }

    let period = &data.period;
    engine.draw_text(&format!("Report type: {}", kind.label()), INFO_STYLE);
    engine.move_down(INFO_ADVANCE);
    engine.draw_text(
        &format!(
            "Period: {} to {}",
            period.start.format("%Y-%m-%d"),
            period.end.format("%Y-%m-%d")
        ),
        INFO_STYLE,
    );
    engine.move_down(INFO_ADVANCE);
    engine.draw_text(
        &format!("Generated: {}", chrono::Local::now().format("%Y-%m-%d %H:%M")),
        INFO_STYLE,
    );
    engine.move_down(INFO_ADVANCE);
    engine.draw_line();
}

/// Lay out the whole report without serializing it.
pub fn layout_report(
    data: &ReportData,
    kind: ReportKind,
    config: LayoutConfig,
    charts: &dyn ChartRenderer,
) -> Result<LayoutEngine, Error> {
    data.period.validate()?;
    let mut engine = LayoutEngine::init(config)?;
    draw_header_block(&mut engine, data, kind);

    for section in sections_for(kind) {
        let page_before = engine.page_count();
        match section {
            Section::Glucose => glucose::build(&mut engine, data, charts)?,
            Section::Medication => medication::build(&mut engine, data, charts)?,
            Section::Meals => meals::build(&mut engine, data, charts)?,
        }
        log::debug!(
            "{section:?} section spans pages {}..={}",
            page_before,
            engine.page_count()
        );
    }
    Ok(engine)
}

/// Lay out and serialize a report into PDF bytes.
pub fn generate(
    data: &ReportData,
    kind: ReportKind,
    config: LayoutConfig,
    charts: &dyn ChartRenderer,
) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let engine = layout_report(data, kind, config, charts)?;
    let pages = engine.page_count();
    let t_layout = t0.elapsed();

    let bytes = engine.finalize()?;
    log::info!(
        "{kind} report: layout={:.1}ms, write={:.1}ms ({pages} pages, {} bytes)",
        t_layout.as_secs_f64() * 1000.0,
        (t0.elapsed() - t_layout).as_secs_f64() * 1000.0,
        bytes.len(),
    );
    Ok(bytes)
}

pub(crate) fn format_number(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
