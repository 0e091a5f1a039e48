//! Chart images for the report sections.
//!
//! The layout engine only ever sees encoded image bytes; a renderer returns
//! `Ok(None)` when there is nothing to plot and the section shows the
//! no-data placeholder instead.

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::Error;
use crate::model::{GlucoseReading, Meal, MealType, Medication};

/// Lower and upper bound of the usual glucose target range, mg/dL.
pub const TARGET_LOW: f64 = 70.0;
pub const TARGET_HIGH: f64 = 180.0;

const TARGET_BAND: RGBColor = RGBColor(220, 240, 220);
const TREND_LINE: RGBColor = RGBColor(31, 119, 180);
const AXIS: RGBColor = RGBColor(120, 120, 120);
const GOOD: RGBColor = RGBColor(0, 176, 80);
const FAIR: RGBColor = RGBColor(255, 165, 0);
const POOR: RGBColor = RGBColor(220, 50, 47);
const CARBS: RGBColor = RGBColor(112, 48, 160);

pub trait ChartRenderer {
    fn glucose_trend(&self, readings: &[&GlucoseReading]) -> Result<Option<Vec<u8>>, Error>;
    fn medication_adherence(&self, medications: &[Medication]) -> Result<Option<Vec<u8>>, Error>;
    fn meal_carbs(&self, meals: &[&Meal]) -> Result<Option<Vec<u8>>, Error>;
}

/// Renders nothing; every chart slot gets the placeholder.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCharts;

impl ChartRenderer for NoCharts {
    fn glucose_trend(&self, _: &[&GlucoseReading]) -> Result<Option<Vec<u8>>, Error> {
        Ok(None)
    }

    fn medication_adherence(&self, _: &[Medication]) -> Result<Option<Vec<u8>>, Error> {
        Ok(None)
    }

    fn meal_carbs(&self, _: &[&Meal]) -> Result<Option<Vec<u8>>, Error> {
        Ok(None)
    }
}

/// Rasterizes charts with the `plotters` bitmap backend and encodes PNG.
/// No text is drawn; the tables beside each chart carry the numbers.
#[derive(Clone, Copy, Debug)]
pub struct PlottersRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        PlottersRenderer {
            width: 800,
            height: 400,
        }
    }
}

fn chart_err(e: impl std::fmt::Display) -> Error {
    Error::Chart(e.to_string())
}

/// Bytes in an RGB buffer of `width` x `height` pixels.
fn rgb_buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

impl PlottersRenderer {
    fn render<F>(&self, draw: F) -> Result<Vec<u8>, Error>
    where
        F: FnOnce(&Area<'_>) -> Result<(), Error>,
    {
        let (width, height) = (self.width, self.height);
        let mut buffer = vec![0u8; rgb_buffer_len(width, height)];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(chart_err)?;
            draw(&root)?;
            root.present().map_err(chart_err)?;
        }

        let img = image::RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| Error::Chart("chart buffer has the wrong size".into()))?;
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;
        Ok(png)
    }
}

/// Bars for `values` on a 0..`y_max` scale.
fn draw_bars(area: &Area<'_>, values: &[(f64, RGBColor)], y_max: f64) -> Result<(), Error> {
    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .build_cartesian_2d(0f64..values.len() as f64, 0f64..y_max)
        .map_err(chart_err)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, &(v, color))| {
            Rectangle::new(
                [(i as f64 + 0.15, 0.0), (i as f64 + 0.85, v)],
                color.filled(),
            )
        }))
        .map_err(chart_err)?;
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(0.0, 0.0), (values.len() as f64, 0.0)],
            AXIS.stroke_width(2),
        )))
        .map_err(chart_err)?;
    Ok(())
}

impl ChartRenderer for PlottersRenderer {
    fn glucose_trend(&self, readings: &[&GlucoseReading]) -> Result<Option<Vec<u8>>, Error> {
        if readings.is_empty() {
            return Ok(None);
        }
        let points: Vec<(f64, f64)> = readings
            .iter()
            .enumerate()
            .map(|(i, r)| (i as f64, r.level))
            .collect();
        let x_max = (points.len().max(2) - 1) as f64;
        let y_max = readings
            .iter()
            .map(|r| r.level)
            .fold(TARGET_HIGH, f64::max)
            + 20.0;
        let y_min = readings
            .iter()
            .map(|r| r.level)
            .fold(TARGET_LOW, f64::min)
            .min(40.0);

        self.render(|area| {
            let mut chart = ChartBuilder::on(area)
                .margin(20)
                .build_cartesian_2d(0f64..x_max, y_min..y_max)
                .map_err(chart_err)?;

            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(0.0, TARGET_LOW), (x_max, TARGET_HIGH)],
                    TARGET_BAND.filled(),
                )))
                .map_err(chart_err)?;
            for bound in [TARGET_LOW, TARGET_HIGH] {
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(0.0, bound), (x_max, bound)],
                        GOOD.stroke_width(1),
                    )))
                    .map_err(chart_err)?;
            }
            chart
                .draw_series(LineSeries::new(points.clone(), TREND_LINE.stroke_width(2)))
                .map_err(chart_err)?;
            chart
                .draw_series(points.iter().map(|&(x, y)| {
                    let color = if (TARGET_LOW..=TARGET_HIGH).contains(&y) {
                        TREND_LINE
                    } else {
                        POOR
                    };
                    Circle::new((x, y), 4, color.filled())
                }))
                .map_err(chart_err)?;
            Ok(())
        })
        .map(Some)
    }

    fn medication_adherence(&self, medications: &[Medication]) -> Result<Option<Vec<u8>>, Error> {
        let values: Vec<(f64, RGBColor)> = medications
            .iter()
            .filter_map(|m| m.adherence())
            .map(|pct| {
                let color = if pct >= 80.0 {
                    GOOD
                } else if pct >= 50.0 {
                    FAIR
                } else {
                    POOR
                };
                (pct, color)
            })
            .collect();
        if values.is_empty() {
            return Ok(None);
        }
        self.render(|area| draw_bars(area, &values, 100.0)).map(Some)
    }

    fn meal_carbs(&self, meals: &[&Meal]) -> Result<Option<Vec<u8>>, Error> {
        if meals.iter().all(|m| m.carbs.is_none()) {
            return Ok(None);
        }
        let values: Vec<(f64, RGBColor)> = MealType::ALL
            .iter()
            .map(|&kind| {
                let total: f64 = meals
                    .iter()
                    .filter(|m| m.meal_type == kind)
                    .filter_map(|m| m.carbs)
                    .sum();
                (total, CARBS)
            })
            .collect();
        let y_max = values.iter().map(|&(v, _)| v).fold(0.0, f64::max).max(1.0) * 1.1;
        self.render(|area| draw_bars(area, &values, y_max)).map(Some)
    }
}
