use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;
use crate::pdf::ORPHAN_THRESHOLD;

/// Environment variable naming a directory of TrueType/OpenType files to
/// embed instead of the built-in Helvetica family.
pub const FONTS_ENV: &str = "GLYCOREPORT_FONTS";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaperSize {
    #[default]
    Letter,
    A4,
}

impl PaperSize {
    /// (width, height) in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PaperSize::Letter => (612.0, 792.0),
            PaperSize::A4 => (595.28, 841.89),
        }
    }
}

impl FromStr for PaperSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "letter" | "us-letter" => Ok(PaperSize::Letter),
            "a4" => Ok(PaperSize::A4),
            other => Err(Error::InvalidInput(format!("unknown paper size '{other}'"))),
        }
    }
}

/// Where the regular, bold and italic faces come from.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FontSource {
    /// Base-14 Helvetica, Helvetica-Bold, Helvetica-Oblique. Never embedded.
    #[default]
    Builtin,
    /// Scan a directory and pick faces by their OS/2 bold/italic flags.
    Directory(PathBuf),
    Files {
        regular: PathBuf,
        bold: PathBuf,
        italic: PathBuf,
    },
}

impl FontSource {
    pub fn from_env() -> Self {
        match std::env::var(FONTS_ENV) {
            Ok(val) if !val.trim().is_empty() => FontSource::Directory(PathBuf::from(val.trim())),
            _ => FontSource::Builtin,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub fonts: FontSource,
    /// Flate-compress page content streams.
    pub compress: bool,
    /// Written to the PDF info dictionary.
    pub title: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let (page_width, page_height) = PaperSize::default().dimensions();
        LayoutConfig {
            page_width,
            page_height,
            margin_top: 50.0,
            margin_bottom: 50.0,
            margin_left: 50.0,
            margin_right: 50.0,
            fonts: FontSource::Builtin,
            compress: true,
            title: "Diabetes Management Report".to_string(),
        }
    }
}

impl LayoutConfig {
    pub fn with_paper(mut self, paper: PaperSize) -> Self {
        let (w, h) = paper.dimensions();
        self.page_width = w;
        self.page_height = h;
        self
    }

    pub fn with_fonts(mut self, fonts: FontSource) -> Self {
        self.fonts = fonts;
        self
    }

    /// Cursor position of a fresh page.
    pub fn content_top(&self) -> f32 {
        self.page_height - self.margin_top
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub fn content_height(&self) -> f32 {
        self.content_top() - self.margin_bottom
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.content_width() <= 0.0 || self.content_height() <= 0.0 {
            return Err(Error::Layout(format!(
                "margins leave no content area on a {:.1}x{:.1} page",
                self.page_width, self.page_height
            )));
        }
        // Anything shorter cannot hold a section start, nor a table header
        // with a row beneath it.
        if self.content_height() < ORPHAN_THRESHOLD {
            return Err(Error::Layout(format!(
                "content area is {:.1}pt tall, at least {ORPHAN_THRESHOLD:.0}pt is needed",
                self.content_height()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_content_box() {
        let config = LayoutConfig::default();
        assert_eq!(config.content_top(), 742.0);
        assert_eq!(config.content_width(), 512.0);
        assert_eq!(config.content_height(), 692.0);
    }

    #[test]
    fn paper_size_parsing() {
        assert_eq!("A4".parse::<PaperSize>().unwrap(), PaperSize::A4);
        assert_eq!(" letter ".parse::<PaperSize>().unwrap(), PaperSize::Letter);
        assert!("legal".parse::<PaperSize>().is_err());
    }

    #[test]
    fn oversized_margins_rejected() {
        let config = LayoutConfig {
            margin_left: 400.0,
            margin_right: 400.0,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn content_box_shorter_than_a_section_start_rejected() {
        let squat = LayoutConfig {
            margin_top: 380.0,
            margin_bottom: 390.0,
            ..LayoutConfig::default()
        };
        assert!(matches!(squat.validate(), Err(Error::Layout(_))));

        let just_enough = LayoutConfig {
            margin_top: 321.0,
            margin_bottom: 321.0,
            ..LayoutConfig::default()
        };
        assert_eq!(just_enough.content_height(), ORPHAN_THRESHOLD);
        assert!(just_enough.validate().is_ok());
        assert!(LayoutConfig::default().with_paper(PaperSize::A4).validate().is_ok());
    }
}
