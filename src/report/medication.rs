use crate::chart::ChartRenderer;
use crate::error::Error;
use crate::model::{Medication, ReportData};
use crate::pdf::LayoutEngine;

use super::MEDICATION_SECTION;

pub const MEDICATION_HEADERS: [&str; 4] = ["Medication", "Dosage", "Frequency", "Adherence"];

fn medication_rows(medications: &[Medication]) -> Vec<Vec<Option<String>>> {
    medications
        .iter()
        .map(|m| {
            vec![
                Some(m.name.clone()),
                m.dosage.clone(),
                m.frequency.clone(),
                m.adherence().map(|pct| {
                    format!("{pct:.0}% ({}/{})", m.doses_taken, m.doses_scheduled)
                }),
            ]
        })
        .collect()
}

pub(super) fn build(
    engine: &mut LayoutEngine,
    data: &ReportData,
    charts: &dyn ChartRenderer,
) -> Result<(), Error> {
    log::debug!("medication section: {} medications", data.medications.len());

    engine.section_title(MEDICATION_SECTION);
    let chart = charts.medication_adherence(&data.medications)?;
    engine.draw_image(chart.as_deref())?;
    engine.draw_table(&MEDICATION_HEADERS, &medication_rows(&data.medications))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_stay_empty_for_the_dash() {
        let meds = [Medication {
            name: "Metformin".into(),
            dosage: Some("500 mg".into()),
            frequency: None,
            doses_taken: 9,
            doses_scheduled: 10,
            ..Medication::default()
        }];
        let rows = medication_rows(&meds);
        assert_eq!(rows[0][0].as_deref(), Some("Metformin"));
        assert_eq!(rows[0][2], None);
        assert_eq!(rows[0][3].as_deref(), Some("90% (9/10)"));
    }

    #[test]
    fn unscheduled_medication_has_no_adherence() {
        let meds = [Medication {
            name: "Glucagon".into(),
            ..Medication::default()
        }];
        assert_eq!(medication_rows(&meds)[0][3], None);
    }
}
