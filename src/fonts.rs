use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo, UnicodeCmap};
use pdf_writer::{Name, Pdf, Rect, Ref, Str};
use ttf_parser::Face;

use crate::error::{Error, Result};

pub const ELLIPSIS: char = '\u{2026}';

/// Bold/italic variant selector within a [`FontBook`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    pub const REGULAR: FontStyle = FontStyle {
        bold: false,
        italic: false,
    };
    pub const BOLD: FontStyle = FontStyle {
        bold: true,
        italic: false,
    };

    pub fn new(bold: bool, italic: bool) -> Self {
        Self { bold, italic }
    }

    fn slot(self) -> usize {
        match (self.bold, self.italic) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }
}

enum FontSource {
    /// One of the standard 14 PDF fonts, referenced by name and WinAnsi-encoded.
    Standard(&'static str),
    TrueType { data: Vec<u8>, face_index: u32 },
}

pub struct FontEntry {
    name: String,
    widths_1000: Vec<f32>,
    char_widths_1000: Option<HashMap<char, f32>>,
    ascender_ratio: f32,
    source: FontSource,
}

impl FontEntry {
    fn standard(base_font: &'static str, scale: f32) -> Self {
        Self {
            name: base_font.to_string(),
            widths_1000: helvetica_widths().into_iter().map(|w| w * scale).collect(),
            char_widths_1000: None,
            ascender_ratio: 0.718,
            source: FontSource::Standard(base_font),
        }
    }

    /// Read a TrueType/OpenType face and its horizontal metrics.
    pub fn load(path: &Path, face_index: u32) -> Result<Self> {
        let t0 = std::time::Instant::now();
        let file = File::open(path)?;
        let data = unsafe { Mmap::map(&file) }?;
        let face = Face::parse(&data, face_index)
            .map_err(|e| Error::Font(format!("{}: {e}", path.display())))?;

        let units = face.units_per_em() as f32;
        let advance = |gid| {
            face.glyph_hor_advance(gid)
                .map(|adv| adv as f32 / units * 1000.0)
                .unwrap_or(0.0)
        };

        let widths_1000: Vec<f32> = (32u8..=255u8)
            .map(|byte| {
                face.glyph_index(winansi_to_char(byte))
                    .map(advance)
                    .unwrap_or(0.0)
            })
            .collect();

        let mut char_widths_1000 = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                subtable.codepoints(|cp| {
                    if let (Some(ch), Some(gid)) = (char::from_u32(cp), subtable.glyph_index(cp)) {
                        char_widths_1000.entry(ch).or_insert_with(|| advance(gid));
                    }
                });
            }
        }

        let ascender_ratio = face.ascender() as f32 / units;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Embedded")
            .replace(' ', "");

        log::debug!(
            "load font {} ({} glyph widths) → {:.1}ms",
            path.display(),
            char_widths_1000.len(),
            t0.elapsed().as_secs_f64() * 1000.0,
        );

        Ok(Self {
            name,
            widths_1000,
            char_widths_1000: Some(char_widths_1000),
            ascender_ratio,
            source: FontSource::TrueType {
                data: data.to_vec(),
                face_index,
            },
        })
    }

    /// Width of a single character in 1000-units. Uses the per-char table of
    /// TrueType fonts, falls back to the WinAnsi table.
    pub fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000
            && let Some(&w) = map.get(&ch)
        {
            return w;
        }
        char_to_winansi(ch).map_or(0.0, |byte| self.widths_1000[(byte - 32) as usize])
    }

    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }

    pub fn ascender_ratio(&self) -> f32 {
        self.ascender_ratio
    }
}

/// The four style variants of the single family a document is set in.
pub struct FontBook {
    variants: [FontEntry; 4],
}

impl Default for FontBook {
    fn default() -> Self {
        Self::helvetica()
    }
}

impl FontBook {
    /// Built-in Helvetica metrics; nothing is embedded in the output.
    pub fn helvetica() -> Self {
        Self {
            variants: [
                FontEntry::standard("Helvetica", 1.0),
                // Approximation: bold Helvetica runs about 6% wider.
                FontEntry::standard("Helvetica-Bold", 1.06),
                FontEntry::standard("Helvetica-Oblique", 1.0),
                FontEntry::standard("Helvetica-BoldOblique", 1.06),
            ],
        }
    }

    /// Load a TrueType family. Missing variants fall back to the regular face.
    pub fn from_files(
        regular: &Path,
        bold: Option<&Path>,
        italic: Option<&Path>,
        bold_italic: Option<&Path>,
    ) -> Result<Self> {
        let load = |path: Option<&Path>| FontEntry::load(path.unwrap_or(regular), 0);
        Ok(Self {
            variants: [
                load(Some(regular))?,
                load(bold)?,
                load(italic)?,
                load(bold_italic.or(bold))?,
            ],
        })
    }

    pub fn get(&self, style: FontStyle) -> &FontEntry {
        &self.variants[style.slot()]
    }

    pub fn text_width(&self, text: &str, style: FontStyle, font_size: f32) -> f32 {
        self.get(style).text_width(text, font_size)
    }

    pub(crate) fn styles() -> [FontStyle; 4] {
        [
            FontStyle::new(false, false),
            FontStyle::new(true, false),
            FontStyle::new(false, true),
            FontStyle::new(true, true),
        ]
    }
}

/// A font written into a PDF, with the encoding its content streams need.
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

/// Where WinAnsi (Windows-1252) departs from Latin-1: bytes 0x80-0x9F.
/// Bytes of that block not listed here are undefined.
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, ELLIPSIS),
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

/// WinAnsi byte of a printable char, `None` if the encoding lacks it.
fn char_to_winansi(ch: char) -> Option<u8> {
    match ch as u32 {
        0x20..=0x7F | 0xA0..=0xFF => Some(ch as u8),
        _ => WINANSI_HIGH
            .iter()
            .find(|&&(_, c)| c == ch)
            .map(|&(b, _)| b),
    }
}

/// Text bytes for a standard font. Chars outside WinAnsi are dropped.
pub(crate) fn to_winansi_bytes(text: &str) -> Vec<u8> {
    text.chars().filter_map(char_to_winansi).collect()
}

/// Big-endian 2-byte glyph ids for an Identity-H font; unknown chars become
/// glyph 0.
fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    text.chars()
        .flat_map(|ch| char_to_gid.get(&ch).copied().unwrap_or(0).to_be_bytes())
        .collect()
}

/// Rough Helvetica advance (1000 units/em) by character class.
fn helvetica_width(ch: char) -> f32 {
    match ch {
        ' ' | 'I' | 'J' | 'f' | 'i' | 'j' | 'l' | 't' => 278.0,
        'M' | 'm' | 'w' => 833.0,
        'A'..='Z' => 667.0,
        '!'..='/' | ':'..='@' | '['..='`' => 333.0,
        ELLIPSIS => 1000.0,
        _ => 556.0,
    }
}

fn helvetica_widths() -> Vec<f32> {
    (32u8..=255u8)
        .map(|byte| helvetica_width(winansi_to_char(byte)))
        .collect()
}

/// Font-wide metrics in PDF glyph space (1000 units/em).
struct FaceMetrics {
    ascent: f32,
    descent: f32,
    cap_height: f32,
    bbox: Rect,
}

impl FaceMetrics {
    fn of(face: &Face) -> Self {
        let scale = 1000.0 / face.units_per_em() as f32;
        let bb = face.global_bounding_box();
        Self {
            ascent: face.ascender() as f32 * scale,
            descent: face.descender() as f32 * scale,
            cap_height: face.capital_height().map_or(700.0, |h| h as f32 * scale),
            bbox: Rect::new(
                bb.x_min as f32 * scale,
                bb.y_min as f32 * scale,
                bb.x_max as f32 * scale,
                bb.y_max as f32 * scale,
            ),
        }
    }
}

/// Subset a TrueType/OpenType face to `used_chars` and write it as a Type0
/// font with Identity-H encoding under `font_ref`. Returns the char to new
/// glyph id mapping content streams must use.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<HashMap<char, u16>> {
    let face = Face::parse(font_data, face_index)
        .map_err(|e| Error::Font(format!("{font_name}: {e}")))?;
    let scale = 1000.0 / face.units_per_em() as f32;
    let metrics = FaceMetrics::of(&face);

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut widths: BTreeMap<u16, f32> = BTreeMap::new();
    for &ch in used_chars {
        let Some(gid) = face.glyph_index(ch) else {
            continue;
        };
        let new_gid = remapper.remap(gid.0);
        char_to_gid.insert(ch, new_gid);
        let advance = face.glyph_hor_advance(gid).unwrap_or(0);
        widths.insert(new_gid, advance as f32 * scale);
    }

    let program = match subsetter::subset(font_data, face_index, &remapper) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("subsetting {font_name} failed ({e}), embedding the whole face");
            font_data.to_vec()
        }
    };
    let program_len = i32::try_from(program.len())
        .map_err(|_| Error::Font(format!("{font_name}: font program too large")))?;

    let program_ref = alloc();
    pdf.stream(program_ref, &program)
        .pair(Name(b"Length1"), program_len);

    let descriptor_ref = alloc();
    pdf.font_descriptor(descriptor_ref)
        .name(Name(font_name.as_bytes()))
        .flags(FontFlags::NON_SYMBOLIC)
        .bbox(metrics.bbox)
        .italic_angle(0.0)
        .ascent(metrics.ascent)
        .descent(metrics.descent)
        .cap_height(metrics.cap_height)
        .stem_v(80.0)
        .font_file2(program_ref);

    let identity = || SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    };

    let cid_ref = alloc();
    {
        let mut cid = pdf.cid_font(cid_ref);
        cid.subtype(CidFontType::Type2)
            .base_font(Name(font_name.as_bytes()))
            .system_info(identity())
            .font_descriptor(descriptor_ref)
            .default_width(0.0)
            .cid_to_gid_map_predefined(Name(b"Identity"));
        if !widths.is_empty() {
            let mut w = cid.widths();
            for (&gid, &width) in &widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_ref = alloc();
    let cmap_name = format!("{font_name}-UTF16");
    let mut cmap = UnicodeCmap::new(Name(cmap_name.as_bytes()), identity());
    for (&ch, &gid) in &char_to_gid {
        cmap.pair(gid, ch);
    }
    pdf.stream(cmap_ref, cmap.finish().as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(font_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_ref)
        .to_unicode(cmap_ref);

    Ok(char_to_gid)
}

/// Write `entry` into the PDF under the resource name `pdf_name`.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    entry: &FontEntry,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> Result<EmbeddedFont> {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = match &entry.source {
        FontSource::Standard(base_font) => {
            pdf.type1_font(font_ref)
                .base_font(Name(base_font.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            None
        }
        FontSource::TrueType { data, face_index } => Some(embed_truetype(
            pdf,
            font_ref,
            &entry.name,
            data,
            *face_index,
            used_chars,
            alloc,
        )?),
    };

    log::debug!(
        "register_font: {} ({} chars) → {:.1}ms",
        entry.name,
        used_chars.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(EmbeddedFont {
        pdf_name,
        font_ref,
        char_to_gid,
    })
}
