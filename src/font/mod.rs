//! # Font Model
//!
//! A [`Font`] is either a single-byte [`SimpleFont`] (base-14 or Type1) or a
//! CID-keyed [`CidFont`] (TrueType or CFF-flavored OpenType, written as a
//! Type0 composite). Fonts are created when first referenced, collect used
//! characters while content is typeset, and are written exactly once by
//! [`crate::pdf::PdfFactory::make_font`] when the document is closed.
//!
//! All metrics are in 1/1000 em.

pub mod cid;
pub mod encoding;
pub mod glyph_map;
pub mod loader;
pub mod shaping;
pub mod subset;
pub mod type1;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cid::CidSet;
use encoding::SingleByteEncoding;
use glyph_map::CharGlyphMap;

/// Substituted for characters a font has no glyph for.
pub const NOT_FOUND: char = '#';

/// Descriptor flag bits.
pub mod flags {
    pub const FIXED_PITCH: u32 = 1;
    pub const SERIF: u32 = 1 << 1;
    pub const SYMBOLIC: u32 = 1 << 2;
    pub const SCRIPT: u32 = 1 << 3;
    pub const NONSYMBOLIC: u32 = 1 << 5;
    pub const ITALIC: u32 = 1 << 6;
}

/// How much of a font program goes into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Whatever suits the font type: subset for CID fonts, full for Type1.
    #[default]
    Auto,
    Full,
    Subset,
}

impl EmbeddingMode {
    /// Resolves `Auto` against a document default and then the font
    /// type's own default.
    pub fn resolve(self, document_default: EmbeddingMode, font_default: EmbeddingMode) -> EmbeddingMode {
        match (self, document_default) {
            (EmbeddingMode::Auto, EmbeddingMode::Auto) => font_default,
            (EmbeddingMode::Auto, mode) => mode,
            (mode, _) => mode,
        }
    }
}

/// Flavor of an embeddable font program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontProgramKind {
    TrueType,
    OpenTypeCff,
    Type1,
}

/// Where a font's program bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontProgram {
    /// Locator handed to the document's resource resolver.
    pub locator: String,
    pub kind: FontProgramKind,
    /// Face index inside a font collection.
    pub collection_index: u32,
}

/// Descriptor-level metrics shared by both font variants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontMetrics {
    /// PostScript name.
    pub font_name: String,
    pub full_name: String,
    pub family_names: BTreeSet<String>,
    pub ascender: i32,
    pub descender: i32,
    pub cap_height: i32,
    pub x_height: i32,
    /// `[x_min, y_min, x_max, y_max]`
    pub bbox: [i32; 4],
    pub flags: u32,
    pub stem_v: i32,
    pub italic_angle: i32,
    pub weight: u16,
    pub missing_width: i32,
}

impl FontMetrics {
    pub fn is_symbolic(&self) -> bool {
        self.flags & flags::SYMBOLIC != 0
    }
}

/// Pair kerning between characters.
pub trait Kernable {
    fn has_kerning(&self) -> bool;
    /// Adjustment in 1/1000 em, if the pair is kerned.
    fn kerning(&self, left: char, right: char) -> Option<i32>;
}

/// Glyph substitution (ligatures, contextual forms) from the font's GSUB.
pub trait Substitutable {
    fn performs_substitution(&self) -> bool;
    /// Returns the text with each output glyph represented by a character
    /// that maps forward to it. Glyphs without a character of their own
    /// are given a private-use code point, or [`NOT_FOUND`] once those are
    /// exhausted.
    fn perform_substitution(&self, text: &str) -> String;
}

/// Glyph positioning (mark attachment, pair adjustment) from the font's GPOS.
pub trait Positionable {
    fn performs_positioning(&self) -> bool;
    /// Per-glyph `[x placement, y placement, x advance, y advance]`
    /// adjustments at `font_size`, or `None` when nothing moves.
    fn perform_positioning(&self, text: &str, font_size: f64) -> Option<Vec<[f64; 4]>>;
}

/// The 14 standard PDF fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
            Self::Symbol => "Symbol",
            Self::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Symbol and ZapfDingbats only use their built-in encodings.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbol | Self::ZapfDingbats)
    }
}

/// A single-byte font.
#[derive(Debug, Clone)]
pub struct SimpleFont {
    pub metrics: FontMetrics,
    program: Option<FontProgram>,
    embedding_mode: EmbeddingMode,
    standard: Option<StandardFont>,
    encoding: SingleByteEncoding,
    first_char: u8,
    /// Widths for `first_char..`, 1/1000 em.
    widths: Vec<i32>,
    used: BTreeMap<u8, char>,
    kerning: HashMap<(char, char), i32>,
}

impl SimpleFont {
    pub fn new(
        metrics: FontMetrics,
        program: Option<FontProgram>,
        embedding_mode: EmbeddingMode,
        encoding: SingleByteEncoding,
        first_char: u8,
        widths: Vec<i32>,
    ) -> Self {
        SimpleFont {
            metrics,
            program,
            embedding_mode,
            standard: None,
            encoding,
            first_char,
            widths,
            used: BTreeMap::new(),
            kerning: HashMap::new(),
        }
    }

    /// One of the base-14 fonts. These have no descriptor and no program;
    /// widths are whatever the caller supplies through [`Self::set_widths`].
    pub fn standard(font: StandardFont) -> Self {
        let mut metrics = FontMetrics {
            font_name: font.pdf_name().to_string(),
            full_name: font.pdf_name().to_string(),
            ..FontMetrics::default()
        };
        metrics.flags = if font.is_symbolic() {
            flags::SYMBOLIC
        } else {
            flags::NONSYMBOLIC
        };
        let encoding = if font.is_symbolic() {
            SingleByteEncoding::new(format!("{}Encoding", font.pdf_name()), std::iter::empty())
        } else {
            SingleByteEncoding::win_ansi()
        };
        let mut simple = SimpleFont::new(metrics, None, EmbeddingMode::Auto, encoding, 0, Vec::new());
        simple.standard = Some(font);
        simple
    }

    pub fn set_widths(&mut self, first_char: u8, widths: Vec<i32>) {
        self.first_char = first_char;
        self.widths = widths;
    }

    pub fn set_kerning(&mut self, kerning: HashMap<(char, char), i32>) {
        self.kerning = kerning;
    }

    pub fn standard_font(&self) -> Option<StandardFont> {
        self.standard
    }

    pub fn encoding(&self) -> &SingleByteEncoding {
        &self.encoding
    }

    pub fn program(&self) -> Option<&FontProgram> {
        self.program.as_ref()
    }

    pub fn embedding_mode(&self) -> EmbeddingMode {
        self.embedding_mode
    }

    pub fn is_embeddable(&self) -> bool {
        self.program.is_some()
    }

    pub fn first_char(&self) -> u8 {
        self.first_char
    }

    /// Widths from [`Self::first_char`] on, 1/1000 em.
    pub fn widths(&self) -> &[i32] {
        &self.widths
    }

    pub fn last_char(&self) -> u8 {
        let count = self.widths.len().min(256 - self.first_char as usize);
        (self.first_char as usize + count.saturating_sub(1)) as u8
    }

    pub fn has_char(&self, c: char) -> bool {
        self.encoding.map_char(c).is_some()
    }

    /// Code for `c`, recording it as used. Characters outside the encoding
    /// come out as the code for [`NOT_FOUND`].
    pub fn map_char(&mut self, c: char) -> u8 {
        let code = match self.encoding.map_char(c) {
            Some(code) => code,
            None => {
                log::warn!(
                    "Glyph for U+{:04X} not available in font '{}'",
                    c as u32,
                    self.metrics.font_name
                );
                self.encoding.map_char(NOT_FOUND).unwrap_or(b'#')
            }
        };
        let ch = self.encoding.char_for(code).unwrap_or(c);
        self.used.entry(code).or_insert(ch);
        code
    }

    /// Width of `code` in 1/1000 em.
    pub fn width_units(&self, code: u8) -> i32 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or(self.metrics.missing_width)
    }

    /// Width of `code` at `size` points.
    pub fn width(&self, code: u8, size: f64) -> f64 {
        self.width_units(code) as f64 * size / 1000.0
    }

    /// Codes used so far, with the character each stands for.
    pub fn used_codes(&self) -> &BTreeMap<u8, char> {
        &self.used
    }

    /// Glyph names of the used codes, for Type1 subsetting.
    pub fn used_glyph_names(&self) -> BTreeSet<String> {
        self.used
            .keys()
            .filter_map(|&code| self.encoding.glyph_name(code).map(str::to_string))
            .collect()
    }
}

impl Kernable for SimpleFont {
    fn has_kerning(&self) -> bool {
        !self.kerning.is_empty()
    }

    fn kerning(&self, left: char, right: char) -> Option<i32> {
        self.kerning.get(&(left, right)).copied()
    }
}

/// CIDFont subtype in the descendant font dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CidFontType {
    /// CFF outlines.
    Type0,
    /// TrueType outlines.
    Type2,
}

impl CidFontType {
    pub fn subtype(&self) -> &'static str {
        match self {
            CidFontType::Type0 => "CIDFontType0",
            CidFontType::Type2 => "CIDFontType2",
        }
    }
}

/// Font bytes kept around for GSUB/GPOS shaping.
#[derive(Debug, Clone)]
pub struct ShapingData {
    pub data: Arc<Vec<u8>>,
    pub index: u32,
    pub units_per_em: u16,
    pub has_gsub: bool,
    pub has_gpos: bool,
}

/// A CID-keyed font written as a Type0 composite with Identity-H.
#[derive(Debug, Clone)]
pub struct CidFont {
    pub metrics: FontMetrics,
    program: Option<FontProgram>,
    embedding_mode: EmbeddingMode,
    cid_type: CidFontType,
    glyph_map: CharGlyphMap,
    cid_set: CidSet,
    /// Per original glyph, 1/1000 em.
    widths: Vec<i32>,
    kerning: HashMap<(char, char), i32>,
    shaping: Option<ShapingData>,
    warned: BTreeSet<char>,
    used: bool,
}

impl CidFont {
    pub fn new(
        metrics: FontMetrics,
        program: Option<FontProgram>,
        embedding_mode: EmbeddingMode,
        cid_type: CidFontType,
        glyph_map: CharGlyphMap,
        widths: Vec<i32>,
    ) -> Self {
        let embedding_mode = embedding_mode.resolve(EmbeddingMode::Auto, EmbeddingMode::Subset);
        CidFont {
            metrics,
            program,
            embedding_mode,
            cid_type,
            glyph_map,
            cid_set: CidSet::for_mode(embedding_mode),
            widths,
            kerning: HashMap::new(),
            shaping: None,
            warned: BTreeSet::new(),
            used: false,
        }
    }

    pub fn set_kerning(&mut self, kerning: HashMap<(char, char), i32>) {
        self.kerning = kerning;
    }

    pub fn set_shaping(&mut self, shaping: ShapingData) {
        self.shaping = Some(shaping);
    }

    pub(crate) fn shaping(&self) -> Option<&ShapingData> {
        self.shaping.as_ref()
    }

    pub fn program(&self) -> Option<&FontProgram> {
        self.program.as_ref()
    }

    pub fn embedding_mode(&self) -> EmbeddingMode {
        self.embedding_mode
    }

    pub fn is_embeddable(&self) -> bool {
        self.program.is_some()
    }

    pub fn cid_type(&self) -> CidFontType {
        self.cid_type
    }

    /// CFF-flavored OpenType.
    pub fn is_otf(&self) -> bool {
        self.cid_type == CidFontType::Type0
    }

    pub fn glyph_map(&self) -> &CharGlyphMap {
        &self.glyph_map
    }

    pub fn cid_set(&self) -> &CidSet {
        &self.cid_set
    }

    pub(crate) fn cid_set_mut(&mut self) -> &mut CidSet {
        &mut self.cid_set
    }

    pub fn num_glyphs(&self) -> u16 {
        self.widths.len() as u16
    }

    pub fn original_widths(&self) -> &[i32] {
        &self.widths
    }

    pub fn has_char(&self, c: char) -> bool {
        self.glyph_map.find_glyph_index(c as u32).is_some()
    }

    /// Index to write in content streams for `c`: the glyph index, renumbered
    /// through the CID set when the font is embedded.
    pub fn map_char(&mut self, c: char) -> u16 {
        let mut glyph = self.glyph_map.find_glyph_index(c as u32);
        if glyph.is_none() {
            if self.warned.insert(c) {
                log::warn!(
                    "Glyph for U+{:04X} not available in font '{}'",
                    c as u32,
                    self.metrics.font_name
                );
            }
            if !self.is_otf() {
                glyph = self.glyph_map.find_glyph_index(NOT_FOUND as u32);
            }
        }
        self.record_glyph(glyph.unwrap_or(0), c)
    }

    /// Records `glyph` as used for `c` without a character lookup, for
    /// glyphs picked by shaping. Returns the content-stream index.
    pub fn record_glyph(&mut self, glyph: u16, c: char) -> u16 {
        self.used = true;
        if self.is_embeddable() {
            self.cid_set.map_glyph(glyph, c)
        } else {
            glyph
        }
    }

    /// Width of content-stream index `index` in 1/1000 em.
    pub fn width_units(&self, index: u16) -> i32 {
        let glyph = if self.is_embeddable() {
            self.cid_set.original_glyph_index(index)
        } else {
            index
        };
        self.widths
            .get(glyph as usize)
            .copied()
            .unwrap_or(self.metrics.missing_width)
    }

    /// Width of content-stream index `index` at `size` points.
    pub fn width(&self, index: u16, size: f64) -> f64 {
        self.width_units(index) as f64 * size / 1000.0
    }

    /// Widths by content-stream index, for the `/W` array.
    pub fn output_widths(&self) -> Vec<i32> {
        if self.is_embeddable() {
            self.cid_set.widths(&self.widths)
        } else {
            self.widths.clone()
        }
    }

    /// Content-stream index → character, for the ToUnicode CMap.
    pub fn output_chars(&self) -> BTreeMap<u16, char> {
        if self.is_embeddable() {
            self.cid_set.chars(&self.glyph_map)
        } else {
            self.glyph_map.chars_by_glyph()
        }
    }
}

impl Kernable for CidFont {
    fn has_kerning(&self) -> bool {
        !self.kerning.is_empty()
    }

    fn kerning(&self, left: char, right: char) -> Option<i32> {
        self.kerning.get(&(left, right)).copied()
    }
}

#[derive(Debug, Clone)]
pub enum Font {
    Simple(SimpleFont),
    Cid(CidFont),
}

impl Font {
    pub fn metrics(&self) -> &FontMetrics {
        match self {
            Font::Simple(f) => &f.metrics,
            Font::Cid(f) => &f.metrics,
        }
    }

    pub fn font_name(&self) -> &str {
        &self.metrics().font_name
    }

    pub fn program(&self) -> Option<&FontProgram> {
        match self {
            Font::Simple(f) => f.program(),
            Font::Cid(f) => f.program(),
        }
    }

    pub fn embedding_mode(&self) -> EmbeddingMode {
        match self {
            Font::Simple(f) => f.embedding_mode(),
            Font::Cid(f) => f.embedding_mode(),
        }
    }

    pub fn is_embeddable(&self) -> bool {
        self.program().is_some()
    }

    /// Whether any character has been mapped through this font.
    pub fn is_used(&self) -> bool {
        match self {
            Font::Simple(f) => !f.used.is_empty(),
            Font::Cid(f) => f.used,
        }
    }

    /// Content-stream code for `c`.
    pub fn map_char(&mut self, c: char) -> u16 {
        match self {
            Font::Simple(f) => f.map_char(c) as u16,
            Font::Cid(f) => f.map_char(c),
        }
    }

    pub fn has_char(&self, c: char) -> bool {
        match self {
            Font::Simple(f) => f.has_char(c),
            Font::Cid(f) => f.has_char(c),
        }
    }

    /// Width of a content-stream code at `size` points.
    pub fn width(&self, code: u16, size: f64) -> f64 {
        match self {
            Font::Simple(f) => u8::try_from(code)
                .map(|c| f.width(c, size))
                .unwrap_or(f.metrics.missing_width as f64 * size / 1000.0),
            Font::Cid(f) => f.width(code, size),
        }
    }

    pub fn as_substitutable(&self) -> Option<&dyn Substitutable> {
        match self {
            Font::Cid(f) if f.performs_substitution() => Some(f),
            _ => None,
        }
    }

    pub fn as_positionable(&self) -> Option<&dyn Positionable> {
        match self {
            Font::Cid(f) if f.performs_positioning() => Some(f),
            _ => None,
        }
    }
}

impl Kernable for Font {
    fn has_kerning(&self) -> bool {
        match self {
            Font::Simple(f) => f.has_kerning(),
            Font::Cid(f) => f.has_kerning(),
        }
    }

    fn kerning(&self, left: char, right: char) -> Option<i32> {
        match self {
            Font::Simple(f) => f.kerning(left, right),
            Font::Cid(f) => f.kerning(left, right),
        }
    }
}

/// Lookup key for registered fonts.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, weight: u32, italic: bool) -> Self {
        FontKey {
            family: family.to_string(),
            weight,
            italic,
        }
    }
}

/// A font together with the resource name content streams use for it.
#[derive(Debug, Clone)]
pub struct RegisteredFont {
    pub resource_name: String,
    pub font: Font,
}

/// The fonts of one document, by family/weight/style, each with a
/// resource name (`F1`, `F2`, ...).
#[derive(Debug, Clone)]
pub struct FontRegistry {
    keys: HashMap<FontKey, usize>,
    fonts: Vec<RegisteredFont>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    /// A registry preloaded with the Helvetica, Times and Courier families.
    pub fn new() -> Self {
        let mut registry = FontRegistry {
            keys: HashMap::new(),
            fonts: Vec::new(),
        };

        let standard_mappings = [
            (("Helvetica", 400, false), StandardFont::Helvetica),
            (("Helvetica", 700, false), StandardFont::HelveticaBold),
            (("Helvetica", 400, true), StandardFont::HelveticaOblique),
            (("Helvetica", 700, true), StandardFont::HelveticaBoldOblique),
            (("Times", 400, false), StandardFont::TimesRoman),
            (("Times", 700, false), StandardFont::TimesBold),
            (("Times", 400, true), StandardFont::TimesItalic),
            (("Times", 700, true), StandardFont::TimesBoldItalic),
            (("Courier", 400, false), StandardFont::Courier),
            (("Courier", 700, false), StandardFont::CourierBold),
            (("Courier", 400, true), StandardFont::CourierOblique),
            (("Courier", 700, true), StandardFont::CourierBoldOblique),
            (("Symbol", 400, false), StandardFont::Symbol),
            (("ZapfDingbats", 400, false), StandardFont::ZapfDingbats),
        ];
        for ((family, weight, italic), font) in standard_mappings {
            registry.register(family, weight, italic, Font::Simple(SimpleFont::standard(font)));
        }
        registry
    }

    /// Adds a font, replacing any font already under the same key, and
    /// returns its resource name.
    pub fn register(&mut self, family: &str, weight: u32, italic: bool, font: Font) -> String {
        let key = FontKey::new(family, weight, italic);
        if let Some(&index) = self.keys.get(&key) {
            self.fonts[index].font = font;
            return self.fonts[index].resource_name.clone();
        }
        let resource_name = format!("F{}", self.fonts.len() + 1);
        self.keys.insert(key, self.fonts.len());
        self.fonts.push(RegisteredFont {
            resource_name: resource_name.clone(),
            font,
        });
        resource_name
    }

    /// Looks up a font, snapping the weight to 400/700 and falling back to
    /// Helvetica.
    pub fn resolve(&mut self, family: &str, weight: u32, italic: bool) -> &mut RegisteredFont {
        let snapped_weight = if weight >= 600 { 700 } else { 400 };
        let index = [
            FontKey::new(family, weight, italic),
            FontKey::new(family, snapped_weight, italic),
            FontKey::new("Helvetica", snapped_weight, italic),
        ]
        .iter()
        .find_map(|key| self.keys.get(key).copied())
        .unwrap_or(0);
        &mut self.fonts[index]
    }

    pub fn get_mut(&mut self, resource_name: &str) -> Option<&mut RegisteredFont> {
        self.fonts.iter_mut().find(|f| f.resource_name == resource_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredFont> {
        self.fonts.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RegisteredFont> {
        self.fonts.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_map::CMapSegment;

    fn cid_font(program: Option<FontProgram>, mode: EmbeddingMode, cid_type: CidFontType) -> CidFont {
        let map = CharGlyphMap::new(
            "Test",
            vec![
                CMapSegment::new('#' as u32, '#' as u32, 2),
                CMapSegment::new(0x41, 0x5A, 3),
                CMapSegment::new(0x61, 0x7A, 29),
            ],
        );
        let widths = (0..60).map(|g| 500 + g * 10).collect();
        let metrics = FontMetrics {
            font_name: "Test".to_string(),
            missing_width: 250,
            ..FontMetrics::default()
        };
        CidFont::new(metrics, program, mode, cid_type, map, widths)
    }

    fn program() -> Option<FontProgram> {
        Some(FontProgram {
            locator: "test.ttf".to_string(),
            kind: FontProgramKind::TrueType,
            collection_index: 0,
        })
    }

    #[test]
    fn test_auto_resolves_to_subset_for_cid_fonts() {
        let font = cid_font(program(), EmbeddingMode::Auto, CidFontType::Type2);
        assert_eq!(font.embedding_mode(), EmbeddingMode::Subset);
        assert!(font.cid_set().is_subset());
    }

    #[test]
    fn test_mode_resolution_order() {
        assert_eq!(
            EmbeddingMode::Auto.resolve(EmbeddingMode::Full, EmbeddingMode::Subset),
            EmbeddingMode::Full
        );
        assert_eq!(
            EmbeddingMode::Subset.resolve(EmbeddingMode::Full, EmbeddingMode::Full),
            EmbeddingMode::Subset
        );
        assert_eq!(
            EmbeddingMode::Auto.resolve(EmbeddingMode::Auto, EmbeddingMode::Full),
            EmbeddingMode::Full
        );
    }

    #[test]
    fn test_embedded_map_char_renumbers() {
        let mut font = cid_font(program(), EmbeddingMode::Subset, CidFontType::Type2);
        assert_eq!(font.map_char('n'), 3);
        assert_eq!(font.map_char('A'), 4);
        assert_eq!(font.map_char('n'), 3);
        // width goes through the original glyph index
        assert_eq!(font.width_units(3), 500 + 42 * 10);
        assert_eq!(font.width(4, 10.0), 5.3);
        assert_eq!(font.output_chars().get(&3), Some(&'n'));
    }

    #[test]
    fn test_recorded_glyph_joins_subset() {
        let mut font = cid_font(program(), EmbeddingMode::Subset, CidFontType::Type2);
        assert_eq!(font.record_glyph(57, 'ﬁ'), 3);
        assert_eq!(font.map_char('A'), 4);
        assert_eq!(font.cid_set().subset_order(), &[0, 1, 2, 57, 3]);
        assert_eq!(font.output_chars().get(&3), Some(&'ﬁ'));
    }

    #[test]
    fn test_unembedded_map_char_is_glyph_index() {
        let mut font = cid_font(None, EmbeddingMode::Subset, CidFontType::Type2);
        assert_eq!(font.map_char('n'), 42);
        assert_eq!(font.width_units(42), 920);
    }

    #[test]
    fn test_missing_char_falls_back_to_not_found() {
        let mut font = cid_font(None, EmbeddingMode::Subset, CidFontType::Type2);
        assert_eq!(font.map_char('中'), 2);

        let mut otf = cid_font(None, EmbeddingMode::Subset, CidFontType::Type0);
        assert_eq!(otf.map_char('中'), 0);
    }

    #[test]
    fn test_simple_font_maps_through_encoding() {
        let mut font = SimpleFont::standard(StandardFont::Helvetica);
        font.set_widths(32, vec![278; 224]);
        assert_eq!(font.map_char('A'), 0x41);
        assert_eq!(font.map_char('€'), 0x80);
        assert_eq!(font.map_char('中'), b'#');
        assert_eq!(font.width(0x41, 12.0), 278.0 * 12.0 / 1000.0);
        assert_eq!(font.last_char(), 255);
        assert_eq!(font.used_codes().len(), 3);
    }

    #[test]
    fn test_symbolic_standard_fonts() {
        let font = SimpleFont::standard(StandardFont::ZapfDingbats);
        assert!(font.metrics.is_symbolic());
        assert!(!font.encoding().is_predefined());
        assert!(!SimpleFont::standard(StandardFont::Courier).metrics.is_symbolic());
    }

    #[test]
    fn test_registry_resolves_with_fallback() {
        let mut registry = FontRegistry::new();
        assert_eq!(registry.resolve("Times", 700, false).resource_name, "F6");
        assert_eq!(registry.resolve("Times", 800, false).resource_name, "F6");
        let fallback = registry.resolve("Nope", 400, true);
        assert_eq!(fallback.font.font_name(), "Helvetica-Oblique");
    }

    #[test]
    fn test_registry_register_custom() {
        let mut registry = FontRegistry::new();
        let font = Font::Cid(cid_font(program(), EmbeddingMode::Subset, CidFontType::Type2));
        let name = registry.register("Test", 400, false, font);
        assert_eq!(name, "F15");
        let entry = registry.get_mut(&name).unwrap();
        assert_eq!(entry.font.map_char('A'), 3);
        assert!(entry.font.is_used());
    }
}
