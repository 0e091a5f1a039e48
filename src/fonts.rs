use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::config::FontSource;
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

impl FontStyle {
    pub(crate) const ALL: [FontStyle; 3] = [FontStyle::Regular, FontStyle::Bold, FontStyle::Italic];

    fn builtin_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "Helvetica",
            FontStyle::Bold => "Helvetica-Bold",
            FontStyle::Italic => "Helvetica-Oblique",
        }
    }
}

enum FontData {
    Builtin,
    TrueType {
        ps_name: String,
        path: PathBuf,
        data: Vec<u8>,
        face_index: u32,
    },
}

/// A loaded face, valid for the lifetime of one document.
pub struct FontHandle {
    style: FontStyle,
    data: FontData,
    widths_1000: Vec<f32>,
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.data {
            FontData::Builtin => self.style.builtin_name().to_string(),
            FontData::TrueType { path, .. } => path.display().to_string(),
        };
        f.debug_struct("FontHandle")
            .field("style", &self.style)
            .field("source", &source)
            .finish()
    }
}

impl FontHandle {
    fn builtin(style: FontStyle) -> Self {
        FontHandle {
            style,
            data: FontData::Builtin,
            widths_1000: helvetica_widths(style == FontStyle::Bold),
        }
    }

    fn from_file(style: FontStyle, path: &Path, face_index: u32) -> Result<Self, Error> {
        let data = std::fs::read(path).map_err(|e| Error::font(Some(path), e.to_string()))?;
        let face =
            Face::parse(&data, face_index).map_err(|e| Error::font(Some(path), e.to_string()))?;

        let widths_1000: Vec<f32> = (32u8..=255u8)
            .map(|byte| {
                face.glyph_index(winansi_to_char(byte))
                    .map_or(0.0, |gid| advance_1000(&face, gid))
            })
            .collect();
        let ps_name = font_family_name(&face)
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "Embedded".to_string())
            })
            .replace(' ', "");

        log::debug!(
            "loaded {:?} face {} from {}",
            style,
            ps_name,
            path.display()
        );

        Ok(FontHandle {
            style,
            data: FontData::TrueType {
                ps_name,
                path: path.to_path_buf(),
                data,
                face_index,
            },
            widths_1000,
        })
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.data, FontData::Builtin)
    }

    /// Width of a single character in 1000-units. WinAnsi characters come from
    /// the cached table; anything else is looked up in the face itself.
    pub fn char_width_1000(&self, ch: char) -> f32 {
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            return self.widths_1000[(byte - 32) as usize];
        }
        match &self.data {
            FontData::Builtin => 0.0,
            FontData::TrueType {
                data, face_index, ..
            } => Face::parse(data, *face_index)
                .ok()
                .and_then(|face| face.glyph_index(ch).map(|gid| advance_1000(&face, gid)))
                .unwrap_or(0.0),
        }
    }

    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }
}

/// The three faces every report uses.
#[derive(Debug)]
pub struct FontSet {
    regular: FontHandle,
    bold: FontHandle,
    italic: FontHandle,
}

impl FontSet {
    pub fn load(source: &FontSource) -> Result<Self, Error> {
        let t0 = std::time::Instant::now();
        let set = match source {
            FontSource::Builtin => FontSet {
                regular: FontHandle::builtin(FontStyle::Regular),
                bold: FontHandle::builtin(FontStyle::Bold),
                italic: FontHandle::builtin(FontStyle::Italic),
            },
            FontSource::Files {
                regular,
                bold,
                italic,
            } => FontSet {
                regular: FontHandle::from_file(FontStyle::Regular, regular, 0)?,
                bold: FontHandle::from_file(FontStyle::Bold, bold, 0)?,
                italic: FontHandle::from_file(FontStyle::Italic, italic, 0)?,
            },
            FontSource::Directory(dir) => {
                let found = scan_font_dir(dir)?;
                let pick = |style: FontStyle| -> Result<FontHandle, Error> {
                    let (path, face_index) = found.get(&style).ok_or_else(|| {
                        Error::font(Some(dir), format!("no {style:?} face found"))
                    })?;
                    FontHandle::from_file(style, path, *face_index)
                };
                FontSet {
                    regular: pick(FontStyle::Regular)?,
                    bold: pick(FontStyle::Bold)?,
                    italic: pick(FontStyle::Italic)?,
                }
            }
        };
        log::debug!(
            "font set loaded in {:.1}ms",
            t0.elapsed().as_secs_f64() * 1000.0
        );
        Ok(set)
    }

    pub fn get(&self, style: FontStyle) -> &FontHandle {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc" | "otc"))
        .unwrap_or(false)
}

fn is_font_collection(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "ttc" | "otc"))
        .unwrap_or(false)
}

/// Classify the faces in `dir` by their OS/2 flags. Bold-italic faces are
/// ignored; the first file (by path) wins for each style.
fn scan_font_dir(dir: &Path) -> Result<HashMap<FontStyle, (PathBuf, u32)>, Error> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::font(Some(dir), e.to_string()))?;
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| is_font_file(p))
        .collect();
    paths.sort();

    let mut found: HashMap<FontStyle, (PathBuf, u32)> = HashMap::new();
    for path in paths {
        let Ok(data) = std::fs::read(&path) else {
            log::warn!("unreadable font file {}", path.display());
            continue;
        };
        let face_count = if is_font_collection(&path) {
            ttf_parser::fonts_in_collection(&data).unwrap_or(1)
        } else {
            1
        };
        for face_idx in 0..face_count {
            let Ok(face) = Face::parse(&data, face_idx) else {
                continue;
            };
            let style = match (face.is_bold(), face.is_italic()) {
                (false, false) => FontStyle::Regular,
                (true, false) => FontStyle::Bold,
                (false, true) => FontStyle::Italic,
                (true, true) => continue,
            };
            found.entry(style).or_insert_with(|| (path.clone(), face_idx));
        }
    }
    Ok(found)
}

/// The 0x80-0x9F block of Windows-1252, the only bytes that do not map to
/// the code point of the same value. 0x81, 0x8D, 0x8F, 0x90 and 0x9D are
/// unassigned.
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

fn winansi_to_char(byte: u8) -> char {
    WINANSI_HIGH
        .iter()
        .find(|&&(b, _)| b == byte)
        .map_or(byte as char, |&(_, ch)| ch)
}

/// WinAnsi byte for `c`, or 0 when the code page has no slot for it.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x20..=0x7F | 0xA0..=0xFF => c as u8,
        _ => WINANSI_HIGH
            .iter()
            .find(|&&(_, ch)| ch == c)
            .map_or(0, |&(b, _)| b),
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Characters outside the code page are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter_map(|c| match char_to_winansi(c) {
            0 => None,
            b => Some(b),
        })
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
/// The bold cut runs wider for letters and punctuation.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    let (upper, lower, narrow, punct) = if bold {
        (722.0, 611.0, 333.0, 333.0)
    } else {
        (667.0, 556.0, 278.0, 333.0)
    };
    (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,                            // space
            33..=47 => punct,                       // punctuation
            48..=57 => 556.0,                       // digits
            58..=64 => punct,                       // more punctuation
            73 | 74 => narrow,                      // I J (narrow uppercase)
            77 => 833.0,                            // M (wide)
            65..=90 => upper,                       // uppercase A-Z (average)
            91..=96 => punct,                       // brackets etc.
            102 | 105 | 106 | 108 | 116 => narrow,  // narrow lowercase: f i j l t
            109 | 119 => 833.0 + (lower - 556.0),   // m w (wide)
            97..=122 => lower,                      // lowercase a-z (average)
            _ => lower,
        })
        .collect()
}

/// A font as written into the PDF, ready to encode text for content streams.
pub(crate) struct EmbeddedFont {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    char_to_gid: Option<HashMap<char, u16>>,
}

impl EmbeddedFont {
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

pub(crate) fn embed_font(
    pdf: &mut Pdf,
    handle: &FontHandle,
    pdf_name: String,
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<EmbeddedFont, Error> {
    let font_ref = alloc();
    let char_to_gid = match &handle.data {
        FontData::Builtin => {
            pdf.type1_font(font_ref)
                .base_font(Name(handle.style.builtin_name().as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            None
        }
        FontData::TrueType {
            ps_name,
            path,
            data,
            face_index,
        } => Some(embed_truetype(
            pdf,
            font_ref,
            ps_name,
            path,
            data,
            *face_index,
            used_chars,
            alloc,
        )?),
    };
    Ok(EmbeddedFont {
        pdf_name,
        font_ref,
        char_to_gid,
    })
}

/// Advance width of `gid` in 1000-units.
fn advance_1000(face: &Face, gid: ttf_parser::GlyphId) -> f32 {
    let units = face.units_per_em() as f32;
    face.glyph_hor_advance(gid)
        .map_or(0.0, |adv| adv as f32 / units * 1000.0)
}

/// Glyphs kept in a subset: each used char with its new glyph id and width.
struct Subset {
    program: Vec<u8>,
    glyphs: Vec<(char, u16, f32)>,
}

fn subset_face(
    face: &Face,
    font_data: &[u8],
    face_index: u32,
    ps_name: &str,
    used_chars: &BTreeSet<char>,
) -> Subset {
    let mut remapper = subsetter::GlyphRemapper::new();
    let glyphs: Vec<(char, u16, f32)> = used_chars
        .iter()
        .filter_map(|&ch| {
            let gid = face.glyph_index(ch)?;
            Some((ch, remapper.remap(gid.0), advance_1000(face, gid)))
        })
        .collect();
    let program = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {ps_name}: {e}, embedding full font");
        font_data.to_vec()
    });
    Subset { program, glyphs }
}

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    }
}

fn write_descriptor(
    pdf: &mut Pdf,
    descriptor_ref: Ref,
    program_ref: Ref,
    ps_name: &str,
    face: &Face,
) {
    let units = face.units_per_em() as f32;
    let scale = |v: i16| v as f32 / units * 1000.0;
    let bb = face.global_bounding_box();
    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(scale(bb.x_min), scale(bb.y_min), scale(bb.x_max), scale(bb.y_max)))
        .italic_angle(face.italic_angle())
        .ascent(scale(face.ascender()))
        .descent(scale(face.descender()))
        .cap_height(face.capital_height().map_or(700.0, scale))
        .stem_v(80.0)
        .font_file2(program_ref);
}

/// Widths grouped into runs of consecutive glyph ids, one `W` entry each.
fn width_runs(glyphs: &[(char, u16, f32)]) -> Vec<(u16, Vec<f32>)> {
    let mut by_gid: Vec<(u16, f32)> = glyphs.iter().map(|&(_, gid, w)| (gid, w)).collect();
    by_gid.sort_by_key(|&(gid, _)| gid);
    by_gid.dedup_by_key(|&mut (gid, _)| gid);

    let mut runs: Vec<(u16, Vec<f32>)> = Vec::new();
    for (gid, width) in by_gid {
        match runs.last_mut() {
            Some((start, widths)) if usize::from(*start) + widths.len() == usize::from(gid) => {
                widths.push(width)
            }
            _ => runs.push((gid, vec![width])),
        }
    }
    runs
}

/// Embed a TrueType/OpenType face as a Type0 font over a CIDFontType2
/// descendant (Identity-H), subset to the chars the document draws, with a
/// ToUnicode CMap so the text stays extractable.
#[allow(clippy::too_many_arguments)]
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    ps_name: &str,
    path: &Path,
    font_data: &[u8],
    face_index: u32,
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<HashMap<char, u16>, Error> {
    let face =
        Face::parse(font_data, face_index).map_err(|e| Error::font(Some(path), e.to_string()))?;
    let subset = subset_face(&face, font_data, face_index, ps_name, used_chars);

    let program_ref = alloc();
    let program_len = i32::try_from(subset.program.len())
        .map_err(|_| Error::font(Some(path), "font program too large"))?;
    pdf.stream(program_ref, &subset.program)
        .pair(Name(b"Length1"), program_len);

    let descriptor_ref = alloc();
    write_descriptor(pdf, descriptor_ref, program_ref, ps_name, &face);

    let cid_font_ref = alloc();
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2)
            .base_font(Name(ps_name.as_bytes()))
            .system_info(identity_system_info())
            .font_descriptor(descriptor_ref)
            .default_width(0.0)
            .cid_to_gid_map_predefined(Name(b"Identity"));
        let runs = width_runs(&subset.glyphs);
        if !runs.is_empty() {
            let mut widths = cid.widths();
            for (start, run) in runs {
                widths.consecutive(start, run);
            }
        }
    }

    let to_unicode_ref = alloc();
    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap =
        pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    for &(ch, gid, _) in &subset.glyphs {
        cmap.pair(gid, ch);
    }
    pdf.stream(to_unicode_ref, cmap.finish().as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(to_unicode_ref);

    log::debug!(
        "embedded {ps_name}: {} glyphs, {} byte program",
        subset.glyphs.len(),
        subset.program.len()
    );
    Ok(subset.glyphs.iter().map(|&(ch, gid, _)| (ch, gid)).collect())
}
