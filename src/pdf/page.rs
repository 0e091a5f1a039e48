use crate::fonts::FontStyle;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font: FontStyle,
    pub size: f32,
}

impl TextStyle {
    pub const fn new(font: FontStyle, size: f32) -> Self {
        TextStyle { font, size }
    }

    pub const fn regular(size: f32) -> Self {
        Self::new(FontStyle::Regular, size)
    }

    pub const fn bold(size: f32) -> Self {
        Self::new(FontStyle::Bold, size)
    }

    pub const fn italic(size: f32) -> Self {
        Self::new(FontStyle::Italic, size)
    }
}

/// One primitive recorded on a page, in PDF user space (origin bottom-left).
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// `y` is the baseline.
    Text {
        x: f32,
        y: f32,
        style: TextStyle,
        text: String,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
    },
    /// `y` is the bottom edge; `image` indexes the document's image list.
    Image {
        image: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Clone, Debug)]
pub struct Page {
    width: f32,
    height: f32,
    ops: Vec<DrawOp>,
}

impl Page {
    pub(crate) fn new(width: f32, height: f32) -> Self {
        Page {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Primitives in placement order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Text runs in placement order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Index of the first text op equal to `needle`.
    pub fn find_text(&self, needle: &str) -> Option<usize> {
        self.ops
            .iter()
            .position(|op| matches!(op, DrawOp::Text { text, .. } if text == needle))
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.find_text(needle).is_some()
    }

    pub fn images(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Image { .. }))
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Line { .. }))
    }
}
