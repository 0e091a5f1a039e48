use crate::chart::ChartRenderer;
use crate::error::Error;
use crate::model::{Meal, ReportData};
use crate::pdf::LayoutEngine;

use super::{MEAL_SECTION, format_number};

pub const MEAL_HEADERS: [&str; 5] = ["Date", "Time", "Meal", "Carbs (g)", "Calories"];

fn meal_rows(meals: &[&Meal]) -> Vec<Vec<Option<String>>> {
    meals
        .iter()
        .map(|m| {
            vec![
                Some(m.timestamp.format("%Y-%m-%d").to_string()),
                Some(m.timestamp.format("%H:%M").to_string()),
                Some(m.meal_type.label().to_string()),
                m.carbs.map(format_number),
                m.calories.map(format_number),
            ]
        })
        .collect()
}

pub(super) fn build(
    engine: &mut LayoutEngine,
    data: &ReportData,
    charts: &dyn ChartRenderer,
) -> Result<(), Error> {
    let meals = data.meals_in_period();
    log::debug!("meal section: {} meals in period", meals.len());

    engine.section_title(MEAL_SECTION);
    let chart = charts.meal_carbs(&meals)?;
    engine.draw_image(chart.as_deref())?;
    engine.draw_table(&MEAL_HEADERS, &meal_rows(&meals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MealType;
    use chrono::NaiveDate;

    #[test]
    fn unknown_nutrition_is_left_empty() {
        let meal = Meal {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(12, 15, 0)
                .unwrap(),
            meal_type: MealType::Lunch,
            description: Some("Lentil soup".into()),
            carbs: Some(42.5),
            calories: None,
        };
        let rows = meal_rows(&[&meal]);
        assert_eq!(
            rows[0],
            vec![
                Some("2024-03-09".to_string()),
                Some("12:15".to_string()),
                Some("Lunch".to_string()),
                Some("42.5".to_string()),
                None,
            ]
        );
    }
}
