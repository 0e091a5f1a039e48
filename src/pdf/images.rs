use crate::error::Error;

use super::{DrawOp, LayoutEngine, NO_CHART_DATA};

/// Native pixels are drawn at this many points each.
pub const IMAGE_SCALE: f32 = 0.5;
/// Space left below a placed image.
pub const IMAGE_SPACING: f32 = 20.0;

/// Pixel data kept until the document is written.
#[derive(Debug)]
pub(crate) struct DecodedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgb: Vec<u8>,
    /// Present only when some pixel is not fully opaque.
    pub(crate) alpha: Option<Vec<u8>>,
}

impl DecodedImage {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, Error> {
        let decoded = image::load_from_memory(data)?;
        let rgba: image::RgbaImage = decoded.to_rgba8();
        let (width, height) = (rgba.width(), rgba.height());
        if width == 0 || height == 0 {
            return Err(Error::Layout("image has no pixels".into()));
        }
        let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

        let rgb: Vec<u8> = rgba
            .pixels()
            .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
            .collect();
        let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect());

        Ok(DecodedImage {
            width,
            height,
            rgb,
            alpha,
        })
    }
}

/// Scale native pixel dimensions by [`IMAGE_SCALE`], shrinking further
/// (aspect preserved) so the result fits inside `max_w` x `max_h`.
pub fn scaled_size(px_w: f32, px_h: f32, max_w: f32, max_h: f32) -> (f32, f32) {
    let w = px_w * IMAGE_SCALE;
    let h = px_h * IMAGE_SCALE;
    let fit = (max_w / w).min(max_h / h).min(1.0);
    (w * fit, h * fit)
}

impl LayoutEngine {
    /// Place an image centred on the content width, never split across
    /// pages. `None` draws the no-data placeholder instead.
    pub fn draw_image(&mut self, data: Option<&[u8]>) -> Result<(), Error> {
        let Some(data) = data else {
            self.draw_placeholder(NO_CHART_DATA);
            return Ok(());
        };

        let decoded = DecodedImage::decode(data)?;
        let (width, height) = scaled_size(
            decoded.width as f32,
            decoded.height as f32,
            self.config.content_width(),
            self.config.content_height(),
        );

        if self.cursor - height < self.config.margin_bottom {
            log::debug!(
                "image {:.1}pt tall does not fit in {:.1}pt, breaking page",
                height,
                self.remaining()
            );
            self.add_page();
        }

        let index = self.images.len();
        self.images.push(decoded);
        self.push_op(DrawOp::Image {
            image: index,
            x: (self.config.page_width - width) / 2.0,
            y: self.cursor - height,
            width,
            height,
        });
        self.move_down(height + IMAGE_SPACING);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_half_native_size() {
        assert_eq!(scaled_size(800.0, 400.0, 512.0, 692.0), (400.0, 200.0));
    }

    #[test]
    fn wide_images_shrink_to_content_width() {
        let (w, h) = scaled_size(2048.0, 512.0, 512.0, 692.0);
        assert_eq!(w, 512.0);
        assert_eq!(h, 128.0);
    }

    #[test]
    fn tall_images_shrink_to_content_height() {
        let (w, h) = scaled_size(400.0, 4000.0, 512.0, 692.0);
        assert!((h - 692.0).abs() < 0.01);
        assert!((w - 69.2).abs() < 0.01);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(DecodedImage::decode(b"not an image").is_err());
    }
}
