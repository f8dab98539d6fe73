//! # OpenType Shaping
//!
//! Wraps rustybuzz to run a CID font's GSUB and GPOS lookups. Substitution
//! results are folded back into characters through the font's glyph map, so
//! ligatures and alternates survive as ordinary text that maps forward to
//! the substituted glyph.

use super::{CidFont, Positionable, ShapingData, Substitutable, NOT_FOUND};

/// A single glyph produced by OpenType shaping.
#[derive(Debug, Clone)]
pub struct ShapedGlyph {
    /// Real glyph ID after GSUB.
    pub glyph_id: u16,
    /// Byte offset of the first input character behind this glyph.
    pub cluster: u32,
    /// Advances and offsets in font units.
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
}

/// Shape text with the font bytes in `shaping`.
///
/// Returns `None` if the font data can't be parsed.
pub fn shape_text(text: &str, shaping: &ShapingData) -> Option<Vec<ShapedGlyph>> {
    let face = rustybuzz::Face::from_slice(&shaping.data, shaping.index)?;
    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.guess_segment_properties();

    let output = rustybuzz::shape(&face, &[], buffer);

    let glyphs = output
        .glyph_infos()
        .iter()
        .zip(output.glyph_positions().iter())
        .map(|(info, pos)| ShapedGlyph {
            glyph_id: info.glyph_id as u16,
            cluster: info.cluster,
            x_advance: pos.x_advance,
            y_advance: pos.y_advance,
            x_offset: pos.x_offset,
            y_offset: pos.y_offset,
        })
        .collect();

    Some(glyphs)
}

/// Total advance width of shaped glyphs in points.
pub fn shaped_width(glyphs: &[ShapedGlyph], units_per_em: u16, font_size: f64) -> f64 {
    let scale = font_size / units_per_em as f64;
    glyphs.iter().map(|g| g.x_advance as f64 * scale).sum()
}

impl Substitutable for CidFont {
    fn performs_substitution(&self) -> bool {
        self.shaping().is_some_and(|s| s.has_gsub)
    }

    fn perform_substitution(&self, text: &str) -> String {
        let Some(shaping) = self.shaping().filter(|s| s.has_gsub) else {
            return text.to_string();
        };
        let Some(glyphs) = shape_text(text, shaping) else {
            log::warn!("Could not shape text with font '{}'", self.metrics.font_name);
            return text.to_string();
        };

        glyphs
            .iter()
            .map(|g| {
                self.glyph_map()
                    .find_char_from_glyph(g.glyph_id, true)
                    .and_then(char::from_u32)
                    .unwrap_or(NOT_FOUND)
            })
            .collect()
    }
}

impl Positionable for CidFont {
    fn performs_positioning(&self) -> bool {
        self.shaping().is_some_and(|s| s.has_gpos)
    }

    fn perform_positioning(&self, text: &str, font_size: f64) -> Option<Vec<[f64; 4]>> {
        let shaping = self.shaping().filter(|s| s.has_gpos)?;
        let glyphs = shape_text(text, shaping)?;
        let scale = font_size / shaping.units_per_em as f64;

        let mut moved = false;
        let adjustments: Vec<[f64; 4]> = glyphs
            .iter()
            .map(|g| {
                let nominal = self
                    .original_widths()
                    .get(g.glyph_id as usize)
                    .copied()
                    .unwrap_or(0) as f64
                    * font_size
                    / 1000.0;
                let advance = g.x_advance as f64 * scale - nominal;
                let adjustment = [
                    g.x_offset as f64 * scale,
                    g.y_offset as f64 * scale,
                    if advance.abs() < 1e-6 { 0.0 } else { advance },
                    g.y_advance as f64 * scale,
                ];
                moved |= adjustment.iter().any(|v| *v != 0.0);
                adjustment
            })
            .collect();

        moved.then_some(adjustments)
    }
}
