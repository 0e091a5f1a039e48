use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Which sections a report contains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Glucose, then medication, then meals.
    #[default]
    Comprehensive,
    Glucose,
    Medication,
    Meals,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Comprehensive => "comprehensive",
            ReportKind::Glucose => "glucose",
            ReportKind::Medication => "medication",
            ReportKind::Meals => "meals",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Comprehensive => "Comprehensive",
            ReportKind::Glucose => "Glucose",
            ReportKind::Medication => "Medication",
            ReportKind::Meals => "Meals",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comprehensive" | "full" => Ok(ReportKind::Comprehensive),
            "glucose" => Ok(ReportKind::Glucose),
            "medication" | "medications" => Ok(ReportKind::Medication),
            "meals" | "meal" => Ok(ReportKind::Meals),
            other => Err(Error::InvalidInput(format!("unknown report type '{other}'"))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub diabetes_type: Option<String>,
}

/// Inclusive date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportPeriod {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let day = at.date();
        day >= self.start && day <= self.end
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.end < self.start {
            return Err(Error::InvalidInput(format!(
                "report period ends ({}) before it starts ({})",
                self.end, self.start
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingType {
    Fasting,
    BeforeMeal,
    AfterMeal,
    Bedtime,
    #[default]
    Random,
}

impl ReadingType {
    pub fn label(self) -> &'static str {
        match self {
            ReadingType::Fasting => "Fasting",
            ReadingType::BeforeMeal => "Before meal",
            ReadingType::AfterMeal => "After meal",
            ReadingType::Bedtime => "Bedtime",
            ReadingType::Random => "Random",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    pub timestamp: NaiveDateTime,
    /// mg/dL
    pub level: f64,
    #[serde(default)]
    pub reading_type: ReadingType,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub doses_taken: u32,
    #[serde(default)]
    pub doses_scheduled: u32,
}

impl Medication {
    /// Percentage of scheduled doses taken, capped at 100. `None` when
    /// nothing was scheduled.
    pub fn adherence(&self) -> Option<f64> {
        if self.doses_scheduled == 0 {
            return None;
        }
        let pct = self.doses_taken as f64 / self.doses_scheduled as f64 * 100.0;
        Some(pct.min(100.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub timestamp: NaiveDateTime,
    pub meal_type: MealType,
    #[serde(default)]
    pub description: Option<String>,
    /// grams
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
}

/// Everything a report is built from, as already queried from storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    #[serde(default)]
    pub patient: PatientInfo,
    pub period: ReportPeriod,
    #[serde(default)]
    pub glucose: Vec<GlucoseReading>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub meals: Vec<Meal>,
}

impl ReportData {
    pub fn from_json(input: &[u8]) -> Result<Self, Error> {
        let data: ReportData = serde_json::from_slice(input)?;
        data.period.validate()?;
        Ok(data)
    }

    /// Readings inside the period, oldest first.
    pub fn glucose_in_period(&self) -> Vec<&GlucoseReading> {
        let mut readings: Vec<&GlucoseReading> = self
            .glucose
            .iter()
            .filter(|r| self.period.contains(r.timestamp))
            .collect();
        readings.sort_by_key(|r| r.timestamp);
        readings
    }

    /// Meals inside the period, oldest first.
    pub fn meals_in_period(&self) -> Vec<&Meal> {
        let mut meals: Vec<&Meal> = self
            .meals
            .iter()
            .filter(|m| self.period.contains(m.timestamp))
            .collect();
        meals.sort_by_key(|m| m.timestamp);
        meals
    }
}
