use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Local, Timelike};
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Error;
use crate::fonts::{EmbeddedFont, FontStyle, embed_font};

use super::{DrawOp, LayoutEngine, Page};

const DEFLATE_LEVEL: u8 = 6;

fn render_page(
    page: &Page,
    fonts: &BTreeMap<FontStyle, EmbeddedFont>,
    image_names: &[String],
) -> Content {
    let mut content = Content::new();
    for op in page.ops() {
        match op {
            DrawOp::Text { x, y, style, text } => {
                let Some(font) = fonts.get(&style.font) else {
                    continue;
                };
                let bytes = font.encode(text);
                content
                    .begin_text()
                    .set_font(Name(font.pdf_name.as_bytes()), style.size)
                    .next_line(*x, *y)
                    .show(Str(&bytes))
                    .end_text();
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                width,
            } => {
                content.save_state();
                content.set_line_width(*width);
                content.move_to(*x1, *y1);
                content.line_to(*x2, *y2);
                content.stroke();
                content.restore_state();
            }
            DrawOp::Image {
                image,
                x,
                y,
                width,
                height,
            } => {
                let Some(name) = image_names.get(*image) else {
                    continue;
                };
                content.save_state();
                content.transform([*width, 0.0, 0.0, *height, *x, *y]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
            }
        }
    }
    content
}

fn creation_date() -> Date {
    let now = Local::now();
    Date::new(u16::try_from(now.year()).unwrap_or(1970))
        .month(now.month() as u8)
        .day(now.day() as u8)
        .hour(now.hour() as u8)
        .minute(now.minute() as u8)
        .second(now.second() as u8)
}

pub(super) fn write_document(engine: LayoutEngine) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let LayoutEngine {
        config,
        fonts,
        pages,
        images,
        ..
    } = engine;

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: embed the faces that were actually drawn with
    let mut used_chars: BTreeMap<FontStyle, BTreeSet<char>> = BTreeMap::new();
    for page in &pages {
        for op in page.ops() {
            if let DrawOp::Text { style, text, .. } = op {
                used_chars
                    .entry(style.font)
                    .or_default()
                    .extend(text.chars());
            }
        }
    }
    let mut embedded: BTreeMap<FontStyle, EmbeddedFont> = BTreeMap::new();
    for (i, (style, chars)) in used_chars.iter_mut().enumerate() {
        chars.insert(' ');
        let font = embed_font(
            &mut pdf,
            fonts.get(*style),
            format!("F{}", i + 1),
            chars,
            &mut alloc,
        )?;
        embedded.insert(*style, font);
    }
    let t_fonts = t0.elapsed();

    // Phase 2: image XObjects
    let mut image_xobjects: Vec<(String, Ref)> = Vec::with_capacity(images.len());
    for img in &images {
        let xobj_ref = alloc();
        let pdf_name = format!("Im{}", image_xobjects.len() + 1);

        let smask_ref = match &img.alpha {
            Some(alpha) => {
                let compressed_alpha =
                    miniz_oxide::deflate::compress_to_vec_zlib(alpha, DEFLATE_LEVEL);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(img.width as i32);
                mask.height(img.height as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            }
            None => None,
        };

        let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&img.rgb, DEFLATE_LEVEL);
        let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
        xobj.filter(Filter::FlateDecode);
        xobj.width(img.width as i32);
        xobj.height(img.height as i32);
        xobj.color_space().device_rgb();
        xobj.bits_per_component(8);
        if let Some(mask_ref) = smask_ref {
            xobj.s_mask(mask_ref);
        }

        image_xobjects.push((pdf_name, xobj_ref));
    }
    let t_images = t0.elapsed();

    // Phase 3: page content streams
    let n = pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let image_names: Vec<String> = image_xobjects.iter().map(|(name, _)| name.clone()).collect();

    for (i, page) in pages.iter().enumerate() {
        let raw = render_page(page, &embedded, &image_names).finish();
        if config.compress {
            let compressed =
                miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), DEFLATE_LEVEL);
            pdf.stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);
        } else {
            pdf.stream(content_ids[i], raw.as_slice());
        }
    }

    // Phase 4: document structure
    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let font_pairs: Vec<(String, Ref)> = embedded
        .values()
        .map(|f| (f.pdf_name.clone(), f.font_ref))
        .collect();

    for (i, page) in pages.iter().enumerate() {
        let mut pdf_page = pdf.page(page_ids[i]);
        pdf_page
            .media_box(Rect::new(0.0, 0.0, page.width(), page.height()))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = pdf_page.resources();
        {
            let mut fonts = resources.fonts();
            for (name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), *font_ref);
            }
        }
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    pdf.document_info(info_id)
        .title(TextStr(&config.title))
        .producer(TextStr(concat!("glycoreport ", env!("CARGO_PKG_VERSION"))))
        .creation_date(creation_date());

    let bytes = pdf.finish();
    let t_total = t0.elapsed();

    log::info!(
        "Write phases: fonts={:.1}ms, images={:.1}ms, pages={:.1}ms ({} pages, {} images, {} bytes)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t_total - t_images).as_secs_f64() * 1000.0,
        n,
        images.len(),
        bytes.len(),
    );

    Ok(bytes)
}
