mod common;

use glycoreport::layout::{DrawOp, LayoutEngine, NO_CHART_DATA, NO_TABLE_DATA};
use glycoreport::{
    GLUCOSE_READINGS_HEADERS, GLUCOSE_READINGS_SECTION, GLUCOSE_SECTION, LayoutConfig,
    MEAL_SECTION, MEDICATION_SECTION, NoCharts, PatientInfo, REPORT_TITLE, ReportData,
    ReportKind, layout_report,
};

fn layout(data: &ReportData, kind: ReportKind) -> LayoutEngine {
    common::init_logging();
    layout_report(data, kind, LayoutConfig::default(), &NoCharts).expect("layout report")
}

fn page_of(engine: &LayoutEngine, text: &str) -> usize {
    common::page_with_text(engine, text).unwrap_or_else(|| panic!("'{text}' not drawn"))
}

#[test]
fn header_block_opens_the_first_page() {
    let data = common::sample_data(3, common::medications(), 2);
    let engine = layout(&data, ReportKind::Glucose);
    let first = &engine.pages()[0];

    assert!(first.contains_text(REPORT_TITLE));
    assert!(first.contains_text("Patient: Ada Lovelace"));
    assert!(first.contains_text("Email: ada@example.com"));
    assert!(first.contains_text("Diabetes type: Type 2"));
    assert!(first.contains_text("Report type: Glucose"));
    assert!(first.contains_text("Period: 2024-03-01 to 2024-03-31"));
    assert!(first.texts().any(|t| t.starts_with("Generated: ")));
    assert!(first.find_text(REPORT_TITLE).unwrap() < first.find_text(GLUCOSE_SECTION).unwrap());
}

#[test]
fn blank_patient_fields_are_left_out() {
    let mut data = common::sample_data(3, Vec::new(), 0);
    data.patient = PatientInfo {
        name: Some("Ada Lovelace".into()),
        email: Some("   ".into()),
        diabetes_type: None,
    };
    let engine = layout(&data, ReportKind::Glucose);
    let first = &engine.pages()[0];
    assert!(first.contains_text("Patient: Ada Lovelace"));
    assert!(!first.texts().any(|t| t.starts_with("Email")));
    assert!(!first.texts().any(|t| t.starts_with("Diabetes type")));
}

#[test]
fn comprehensive_sections_appear_in_order_on_fresh_pages() {
    let data = common::sample_data(10, common::medications(), 6);
    let engine = layout(&data, ReportKind::Comprehensive);

    let glucose = page_of(&engine, GLUCOSE_SECTION);
    let readings = page_of(&engine, GLUCOSE_READINGS_SECTION);
    let medication = page_of(&engine, MEDICATION_SECTION);
    let meals = page_of(&engine, MEAL_SECTION);

    assert_eq!(glucose, 0);
    assert!(glucose < readings && readings < medication && medication < meals);

    for (page, title) in [
        (readings, GLUCOSE_READINGS_SECTION),
        (medication, MEDICATION_SECTION),
        (meals, MEAL_SECTION),
    ] {
        let y = engine.pages()[page].ops().iter().find_map(|op| match op {
            DrawOp::Text { y, text, .. } if text == title => Some(*y),
            _ => None,
        });
        assert_eq!(y, Some(742.0), "{title} should open its page");
    }
}

#[test]
fn medication_section_without_medications_keeps_its_title() {
    let data = common::sample_data(5, Vec::new(), 3);
    let engine = layout(&data, ReportKind::Comprehensive);

    let page = page_of(&engine, MEDICATION_SECTION);
    let ops = &engine.pages()[page];
    let title = ops.find_text(MEDICATION_SECTION).unwrap();
    let chart = ops.find_text(NO_CHART_DATA).expect("chart placeholder");
    let table = ops.find_text(NO_TABLE_DATA).expect("table placeholder");
    assert!(title < chart && chart < table);
    assert!(page_of(&engine, MEAL_SECTION) > page);
}

#[test]
fn single_kind_reports_only_build_their_section() {
    let data = common::sample_data(5, common::medications(), 3);

    let engine = layout(&data, ReportKind::Meals);
    assert!(common::page_with_text(&engine, MEAL_SECTION).is_some());
    assert!(common::page_with_text(&engine, GLUCOSE_SECTION).is_none());
    assert!(common::page_with_text(&engine, MEDICATION_SECTION).is_none());

    let engine = layout(&data, ReportKind::Medication);
    assert_eq!(page_of(&engine, MEDICATION_SECTION), 0);
    assert!(common::page_with_text(&engine, "Metformin").is_some());
    assert!(common::page_with_text(&engine, "89% (55/62)").is_some());
}

#[test]
fn long_reading_table_repeats_its_header() {
    let data = common::sample_data(45, Vec::new(), 0);
    let engine = layout(&data, ReportKind::Glucose);
    let level_header = GLUCOSE_READINGS_HEADERS[2];

    let start = page_of(&engine, GLUCOSE_READINGS_SECTION);
    let mut pages_with_rows = 0;
    for page in &engine.pages()[start..] {
        let has_rows = page
            .texts()
            .any(|t| t.len() == 10 && t.starts_with("2024-03-"));
        if has_rows {
            pages_with_rows += 1;
            assert_eq!(common::count_text(page, level_header), 1);
        }
    }
    assert!(pages_with_rows >= 2);
}

#[test]
fn out_of_period_records_are_ignored() {
    let mut data = common::sample_data(0, Vec::new(), 0);
    data.glucose = common::readings(2);
    data.glucose[1].timestamp = chrono::NaiveDate::from_ymd_opt(2024, 4, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let engine = layout(&data, ReportKind::Glucose);
    assert!(common::page_with_text(&engine, "2024-04-02").is_none());
    assert!(common::page_with_text(&engine, "2024-03-01").is_some());
}

#[test]
fn empty_report_still_has_every_section() {
    let data = common::sample_data(0, Vec::new(), 0);
    let engine = layout(&data, ReportKind::Comprehensive);
    for title in [
        GLUCOSE_SECTION,
        GLUCOSE_READINGS_SECTION,
        MEDICATION_SECTION,
        MEAL_SECTION,
    ] {
        page_of(&engine, title);
    }
    let placeholders: usize = engine
        .pages()
        .iter()
        .map(|p| common::count_text(p, NO_TABLE_DATA))
        .sum();
    // Summary, readings, medications, meals.
    assert_eq!(placeholders, 4);
}
