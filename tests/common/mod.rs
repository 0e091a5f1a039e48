#![allow(dead_code)]

use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime};
use glycoreport::layout::{LayoutEngine, Page};
use glycoreport::{
    GlucoseReading, Meal, MealType, Medication, PatientInfo, ReadingType, ReportData,
    ReportPeriod,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Encode a solid RGBA PNG of the given pixel size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([30, 120, 200, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn march() -> ReportPeriod {
    ReportPeriod {
        start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
    }
}

/// `n` readings spread over March, cycling through low, in-range and high.
pub fn readings(n: usize) -> Vec<GlucoseReading> {
    const LEVELS: [f64; 5] = [64.0, 95.0, 132.0, 178.0, 221.0];
    const TYPES: [ReadingType; 4] = [
        ReadingType::Fasting,
        ReadingType::AfterMeal,
        ReadingType::BeforeMeal,
        ReadingType::Bedtime,
    ];
    (0..n)
        .map(|i| GlucoseReading {
            timestamp: at(1 + (i / 4) as u32 % 31, 7 + (i % 4) as u32 * 4, 0),
            level: LEVELS[i % LEVELS.len()],
            reading_type: TYPES[i % TYPES.len()],
            notes: None,
        })
        .collect()
}

pub fn medications() -> Vec<Medication> {
    vec![
        Medication {
            name: "Metformin".into(),
            dosage: Some("500 mg".into()),
            frequency: Some("Twice daily".into()),
            doses_taken: 55,
            doses_scheduled: 62,
            ..Medication::default()
        },
        Medication {
            name: "Insulin glargine".into(),
            dosage: Some("18 units".into()),
            frequency: None,
            doses_taken: 31,
            doses_scheduled: 31,
            ..Medication::default()
        },
    ]
}

pub fn meals(n: usize) -> Vec<Meal> {
    (0..n)
        .map(|i| Meal {
            timestamp: at(1 + (i / 3) as u32 % 31, 8 + (i % 3) as u32 * 5, 30),
            meal_type: MealType::ALL[i % 3],
            description: Some(format!("Meal {i}")),
            carbs: Some(30.0 + (i % 5) as f64 * 7.5),
            calories: if i % 4 == 0 { None } else { Some(420.0) },
        })
        .collect()
}

pub fn sample_data(glucose: usize, medications: Vec<Medication>, meal_count: usize) -> ReportData {
    ReportData {
        patient: PatientInfo {
            name: Some("Ada Lovelace".into()),
            email: Some("ada@example.com".into()),
            diabetes_type: Some("Type 2".into()),
        },
        period: march(),
        glucose: readings(glucose),
        medications,
        meals: meals(meal_count),
    }
}

/// Index of the first page carrying `text`.
pub fn page_with_text(engine: &LayoutEngine, text: &str) -> Option<usize> {
    engine.pages().iter().position(|p| p.contains_text(text))
}

pub fn count_text(page: &Page, text: &str) -> usize {
    page.texts().filter(|t| *t == text).count()
}

/// Number of `/Type /Page` objects (not `/Pages`) in raw PDF bytes.
pub fn pdf_page_count(pdf: &[u8]) -> usize {
    let needle = b"/Type /Page";
    pdf.windows(needle.len() + 1)
        .filter(|w| w.starts_with(needle) && w[needle.len()] != b's')
        .count()
}

pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
