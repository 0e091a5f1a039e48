//! Page layout engine.
//!
//! A [`LayoutEngine`] owns the document being built: its pages, the fonts
//! loaded at [`LayoutEngine::init`], decoded images, and a single vertical
//! write cursor. Every primitive that consumes vertical space goes through
//! [`LayoutEngine::move_down`], which is the only place a page break is
//! triggered by overflow. Callers never see page boundaries.
//!
//! The cursor is the baseline Y of the next write in PDF user space, so it
//! starts at `page_height - margin_top` and decreases.

mod images;
mod page;
mod table;
mod writer;

use crate::config::LayoutConfig;
use crate::error::Error;
use crate::fonts::{FontSet, FontStyle};

pub use images::{IMAGE_SCALE, IMAGE_SPACING, scaled_size};
pub use page::{DrawOp, Page, TextStyle};
pub use table::{
    CELL_GUTTER, NULL_CELL, TABLE_CELL_STYLE, TABLE_HEADER_RULE_OFFSET, TABLE_HEADER_STYLE,
    TABLE_ROW_HEIGHT, TABLE_TRAILING_SPACE, column_offsets,
};

use images::DecodedImage;

/// Baseline of the `Page {n}` footer, measured from the page bottom.
pub const FOOTER_Y: f32 = 25.0;
pub const FOOTER_STYLE: TextStyle = TextStyle::regular(9.0);

/// Gap before the first section when it shares a page with the header block.
pub const SECTION_GAP: f32 = 20.0;
/// Minimum space above the bottom margin needed to start the first section
/// on the current page.
pub const ORPHAN_THRESHOLD: f32 = 150.0;
pub const SECTION_TITLE_STYLE: TextStyle = TextStyle::bold(16.0);
pub const SECTION_TITLE_ADVANCE: f32 = 22.0;
pub const SECTION_RULE_ADVANCE: f32 = 18.0;

pub const PLACEHOLDER_STYLE: TextStyle = TextStyle::italic(10.0);
pub const PLACEHOLDER_ADVANCE: f32 = 30.0;
pub const NO_CHART_DATA: &str = "No data available for this chart";
pub const NO_TABLE_DATA: &str = "No data found for this period";

pub const RULE_WIDTH: f32 = 1.0;

#[derive(Debug)]
pub struct LayoutEngine {
    config: LayoutConfig,
    fonts: FontSet,
    pages: Vec<Page>,
    images: Vec<DecodedImage>,
    cursor: f32,
    first_section: bool,
}

impl LayoutEngine {
    /// Load fonts and open the first page. Font failures are fatal.
    pub fn init(config: LayoutConfig) -> Result<Self, Error> {
        config.validate()?;
        let fonts = FontSet::load(&config.fonts)?;
        let mut engine = LayoutEngine {
            cursor: config.content_top(),
            config,
            fonts,
            pages: Vec::new(),
            images: Vec::new(),
            first_section: true,
        };
        engine.add_page();
        Ok(engine)
    }

    /// Start a new page, reset the cursor and stamp the page number footer.
    pub fn add_page(&mut self) {
        self.pages
            .push(Page::new(self.config.page_width, self.config.page_height));
        self.cursor = self.config.content_top();

        let n = self.pages.len();
        let label = format!("Page {n}");
        let width = self
            .fonts
            .get(FOOTER_STYLE.font)
            .text_width(&label, FOOTER_STYLE.size);
        let x = (self.config.page_width - width) / 2.0;
        self.push_op(DrawOp::Text {
            x,
            y: FOOTER_Y,
            style: FOOTER_STYLE,
            text: label,
        });
        log::debug!("page {n} started");
    }

    /// Move the cursor down by `amount`. Returns `true` when this overflowed
    /// the bottom margin and a new page was started.
    pub fn move_down(&mut self, amount: f32) -> bool {
        self.cursor -= amount;
        if self.cursor < self.config.margin_bottom {
            log::debug!(
                "page break: cursor {:.1} below bottom margin {:.1}",
                self.cursor,
                self.config.margin_bottom
            );
            self.add_page();
            true
        } else {
            false
        }
    }

    /// Space left between the cursor and the bottom margin.
    pub fn remaining(&self) -> f32 {
        self.cursor - self.config.margin_bottom
    }

    /// Only the first section may share a page with what precedes it; every
    /// later section starts on a fresh page.
    pub fn section_title(&mut self, title: &str) {
        if self.first_section {
            self.move_down(SECTION_GAP);
            if self.remaining() < ORPHAN_THRESHOLD {
                self.add_page();
            }
            self.first_section = false;
        } else {
            self.add_page();
        }

        self.draw_text(title, SECTION_TITLE_STYLE);
        self.move_down(SECTION_TITLE_ADVANCE);
        self.draw_line();
        self.move_down(SECTION_RULE_ADVANCE);
    }

    /// Draw `text` at the left margin on the cursor baseline. Does not move
    /// the cursor.
    pub fn draw_text(&mut self, text: &str, style: TextStyle) {
        self.draw_text_at(self.config.margin_left, text, style);
    }

    pub fn draw_text_at(&mut self, x: f32, text: &str, style: TextStyle) {
        self.push_op(DrawOp::Text {
            x,
            y: self.cursor,
            style,
            text: text.to_string(),
        });
    }

    pub fn draw_text_centered(&mut self, text: &str, style: TextStyle) {
        let width = self.text_width(text, style);
        let x = (self.config.page_width - width) / 2.0;
        self.draw_text_at(x, text, style);
    }

    /// Horizontal rule across the content width at the cursor.
    pub fn draw_line(&mut self) {
        self.draw_rule(RULE_WIDTH);
    }

    pub(crate) fn draw_rule(&mut self, width: f32) {
        let y = self.cursor;
        self.push_op(DrawOp::Line {
            x1: self.config.margin_left,
            y1: y,
            x2: self.config.page_width - self.config.margin_right,
            y2: y,
            width,
        });
    }

    /// Italic stand-in for absent content.
    pub fn draw_placeholder(&mut self, message: &str) {
        self.draw_text(message, PLACEHOLDER_STYLE);
        self.move_down(PLACEHOLDER_ADVANCE);
    }

    pub fn text_width(&self, text: &str, style: TextStyle) -> f32 {
        self.fonts.get(style.font).text_width(text, style.size)
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Whether the next `section_title` is the first of the document.
    pub fn is_first_section(&self) -> bool {
        self.first_section
    }

    pub fn uses_builtin_fonts(&self) -> bool {
        FontStyle::ALL
            .iter()
            .all(|&style| self.fonts.get(style).is_builtin())
    }

    /// Serialize every page into a PDF.
    pub fn finalize(self) -> Result<Vec<u8>, Error> {
        writer::write_document(self)
    }

    fn push_op(&mut self, op: DrawOp) {
        // `init` opens the first page, so there is always a current page.
        if let Some(page) = self.pages.last_mut() {
            page.push(op);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> LayoutEngine {
        LayoutEngine::init(LayoutConfig::default()).unwrap()
    }

    #[test]
    fn init_opens_first_page_with_footer() {
        let engine = engine();
        assert_eq!(engine.page_count(), 1);
        assert_eq!(engine.cursor(), 742.0);
        let page = &engine.pages()[0];
        match &page.ops()[0] {
            DrawOp::Text { y, text, .. } => {
                assert_eq!(text, "Page 1");
                assert_eq!(*y, FOOTER_Y);
            }
            other => panic!("expected footer text, got {other:?}"),
        }
    }

    #[test]
    fn move_down_within_page_does_not_break() {
        let mut engine = engine();
        assert!(!engine.move_down(100.0));
        assert_eq!(engine.cursor(), 642.0);
        assert_eq!(engine.page_count(), 1);
    }

    #[test]
    fn move_down_to_exact_margin_stays_on_page() {
        let mut engine = engine();
        assert!(!engine.move_down(692.0));
        assert_eq!(engine.cursor(), 50.0);
        assert!(engine.move_down(0.5));
        assert_eq!(engine.cursor(), 742.0);
        assert_eq!(engine.page_count(), 2);
    }

    #[test]
    fn footer_numbers_follow_page_index() {
        let mut engine = engine();
        engine.add_page();
        engine.add_page();
        for (i, page) in engine.pages().iter().enumerate() {
            assert!(page.contains_text(&format!("Page {}", i + 1)));
        }
    }

    #[test]
    fn centered_text_is_symmetric() {
        let mut engine = engine();
        let style = TextStyle::bold(20.0);
        engine.draw_text_centered("Report", style);
        let width = engine.text_width("Report", style);
        match engine.pages()[0].ops().last().unwrap() {
            DrawOp::Text { x, .. } => assert!((x * 2.0 + width - 612.0).abs() < 0.01),
            other => panic!("unexpected op {other:?}"),
        }
    }
}
