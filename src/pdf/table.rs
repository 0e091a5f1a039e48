use crate::error::Error;
use crate::fonts::FontHandle;

use super::{LayoutEngine, NO_TABLE_DATA, TextStyle};

pub const TABLE_HEADER_STYLE: TextStyle = TextStyle::bold(10.0);
pub const TABLE_CELL_STYLE: TextStyle = TextStyle::regular(9.0);
/// Distance from the header baseline down to its separator rule.
pub const TABLE_HEADER_RULE_OFFSET: f32 = 5.0;
pub const TABLE_ROW_HEIGHT: f32 = 20.0;
pub const TABLE_TRAILING_SPACE: f32 = 20.0;
const TABLE_RULE_WIDTH: f32 = 0.5;
/// Empty space kept at the right of every column.
pub const CELL_GUTTER: f32 = 4.0;
/// Rendered in place of a missing or blank cell value.
pub const NULL_CELL: &str = "-";

const ELLIPSIS: &str = "...";

/// Left edge of each column: the content width split evenly, no content
/// measurement.
pub fn column_offsets(margin_left: f32, content_width: f32, columns: usize) -> Vec<f32> {
    let width = content_width / columns as f32;
    (0..columns).map(|i| margin_left + i as f32 * width).collect()
}

/// Shorten `text` with a trailing ellipsis until it fits `max_width`.
fn fit_to_width(font: &FontHandle, text: &str, font_size: f32, max_width: f32) -> String {
    if font.text_width(text, font_size) <= max_width {
        return text.to_string();
    }
    let ellipsis_w = font.text_width(ELLIPSIS, font_size);
    let mut out = String::new();
    let mut width = 0.0;
    for ch in text.chars() {
        let w = font.char_width_1000(ch) * font_size / 1000.0;
        if width + w + ellipsis_w > max_width {
            break;
        }
        width += w;
        out.push(ch);
    }
    let trimmed = out.trim_end();
    format!("{trimmed}{ELLIPSIS}")
}

impl LayoutEngine {
    /// Draw a table with evenly split columns. The header row and its rule
    /// are repeated at the top of every page the rows spill onto. Empty
    /// `rows` draws the no-data placeholder.
    pub fn draw_table<S: AsRef<str>>(
        &mut self,
        headers: &[S],
        rows: &[Vec<Option<String>>],
    ) -> Result<(), Error> {
        if rows.is_empty() {
            self.draw_placeholder(NO_TABLE_DATA);
            return Ok(());
        }
        if headers.is_empty() {
            return Err(Error::Layout(format!(
                "table with {} rows has no columns",
                rows.len()
            )));
        }

        let headers: Vec<&str> = headers.iter().map(AsRef::as_ref).collect();
        let offsets = column_offsets(
            self.config.margin_left,
            self.config.content_width(),
            headers.len(),
        );
        let cell_max = self.config.content_width() / headers.len() as f32 - CELL_GUTTER;

        // Keep the header together with at least one row.
        if self.remaining() < TABLE_HEADER_RULE_OFFSET + TABLE_ROW_HEIGHT {
            self.add_page();
        }
        self.draw_table_header(&headers, &offsets, cell_max);

        for (ri, row) in rows.iter().enumerate() {
            if self.move_down(TABLE_ROW_HEIGHT) {
                log::debug!(
                    "table continues on page {} at row {ri}",
                    self.page_count()
                );
                self.draw_table_header(&headers, &offsets, cell_max);
                self.move_down(TABLE_ROW_HEIGHT);
            }
            for (col, &x) in offsets.iter().enumerate() {
                let value = row
                    .get(col)
                    .and_then(|cell| cell.as_deref())
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or(NULL_CELL);
                let text = fit_to_width(
                    self.fonts.get(TABLE_CELL_STYLE.font),
                    value,
                    TABLE_CELL_STYLE.size,
                    cell_max,
                );
                self.draw_text_at(x, &text, TABLE_CELL_STYLE);
            }
        }

        self.move_down(TABLE_TRAILING_SPACE);
        Ok(())
    }

    fn draw_table_header(&mut self, headers: &[&str], offsets: &[f32], cell_max: f32) {
        for (label, &x) in headers.iter().zip(offsets) {
            let text = fit_to_width(
                self.fonts.get(TABLE_HEADER_STYLE.font),
                label,
                TABLE_HEADER_STYLE.size,
                cell_max,
            );
            self.draw_text_at(x, &text, TABLE_HEADER_STYLE);
        }
        self.move_down(TABLE_HEADER_RULE_OFFSET);
        self.draw_rule(TABLE_RULE_WIDTH);
    }
}
