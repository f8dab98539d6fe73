//! # Font Loading
//!
//! Builds [`Font`]s from program bytes: TrueType, CFF-flavored OpenType and
//! collections through ttf-parser, PFB Type1 programs through
//! [`super::type1`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use ttf_parser::{name_id, GlyphId, Tag};

use super::encoding::SingleByteEncoding;
use super::glyph_map::CharGlyphMap;
use super::subset::detect_format;
use super::type1::{PfbSegments, Type1Encoding, Type1Info};
use super::{
    flags, CidFont, CidFontType, EmbeddingMode, Font, FontMetrics, FontProgram, FontProgramKind, ShapingData,
    SimpleFont,
};
use crate::error::FolioError;

/// Loads the first face of `data`. `locator`, if given, is kept so the
/// program can be read again when the font is embedded; without one the
/// font is referenced but not embedded.
pub fn load_font(
    data: &[u8],
    locator: Option<&str>,
    mode: EmbeddingMode,
    document_default: EmbeddingMode,
) -> Result<Font, FolioError> {
    load_font_from_collection(data, 0, locator, mode, document_default)
}

/// Like [`load_font`], picking face `index` of a font collection.
pub fn load_font_from_collection(
    data: &[u8],
    index: u32,
    locator: Option<&str>,
    mode: EmbeddingMode,
    document_default: EmbeddingMode,
) -> Result<Font, FolioError> {
    match detect_format(data) {
        Some(FontProgramKind::Type1) => load_type1(data, locator, mode, document_default),
        Some(_) => load_opentype(data, index, locator, mode, document_default),
        None => Err(FolioError::UnsupportedFontFormat(format!(
            "{} is not a TrueType, OpenType or PFB font",
            locator.unwrap_or("font data")
        ))),
    }
}

// ─── OpenType ──────────────────────────────────────────────────

fn load_opentype(
    data: &[u8],
    index: u32,
    locator: Option<&str>,
    mode: EmbeddingMode,
    document_default: EmbeddingMode,
) -> Result<Font, FolioError> {
    let face = ttf_parser::Face::parse(data, index)
        .map_err(|e| FolioError::Font(format!("Failed to parse {}: {}", locator.unwrap_or("font"), e)))?;

    let upem = face.units_per_em().max(1) as f64;
    let scale = |v: f64| (v * 1000.0 / upem).round() as i32;

    let font_name = find_name(&face, name_id::POST_SCRIPT_NAME)
        .or_else(|| find_name(&face, name_id::FULL_NAME))
        .map(|n| n.replace(' ', ""))
        .unwrap_or_else(|| fallback_name(locator));
    let full_name = find_name(&face, name_id::FULL_NAME).unwrap_or_else(|| font_name.clone());
    let family_names: BTreeSet<String> = find_name(&face, name_id::FAMILY).into_iter().collect();

    let is_cff = face.tables().cff.is_some();
    let cid_type = if is_cff { CidFontType::Type0 } else { CidFontType::Type2 };

    let mut pairs = Vec::new();
    if let Some(cmap) = face.tables().cmap {
        for subtable in cmap.subtables {
            if !subtable.is_unicode() {
                continue;
            }
            subtable.codepoints(|cp| {
                if let Some(gid) = subtable.glyph_index(cp) {
                    pairs.push((cp, gid.0));
                }
            });
        }
    }
    let glyph_map = CharGlyphMap::from_pairs(font_name.clone(), pairs);

    let widths: Vec<i32> = (0..face.number_of_glyphs())
        .map(|g| scale(face.glyph_hor_advance(GlyphId(g)).unwrap_or(0) as f64))
        .collect();

    let bbox = face.global_bounding_box();
    let weight = face.weight().to_number();
    let italic_angle = post_italic_angle(&face);
    let mut font_flags = flags::SYMBOLIC;
    if face.is_monospaced() {
        font_flags |= flags::FIXED_PITCH;
    }
    if face.is_italic() || italic_angle != 0 {
        font_flags |= flags::ITALIC;
    }

    let metrics = FontMetrics {
        font_name: font_name.clone(),
        full_name,
        family_names,
        ascender: scale(face.ascender() as f64),
        descender: scale(face.descender() as f64),
        cap_height: face.capital_height().map_or(0, |h| scale(h as f64)),
        x_height: face.x_height().map_or(0, |h| scale(h as f64)),
        bbox: [
            scale(bbox.x_min as f64),
            scale(bbox.y_min as f64),
            scale(bbox.x_max as f64),
            scale(bbox.y_max as f64),
        ],
        flags: font_flags,
        stem_v: stem_v(weight),
        italic_angle,
        weight,
        missing_width: widths.first().copied().unwrap_or(0),
    };

    let program = locator.map(|locator| FontProgram {
        locator: locator.to_string(),
        kind: if is_cff {
            FontProgramKind::OpenTypeCff
        } else {
            FontProgramKind::TrueType
        },
        collection_index: index,
    });
    let mode = mode.resolve(document_default, EmbeddingMode::Subset);

    let mut font = CidFont::new(metrics, program, mode, cid_type, glyph_map, widths);
    font.set_kerning(read_kerning(&face, upem));

    let has_gsub = face.raw_face().table(Tag::from_bytes(b"GSUB")).is_some();
    let has_gpos = face.raw_face().table(Tag::from_bytes(b"GPOS")).is_some();
    if has_gsub || has_gpos {
        font.set_shaping(ShapingData {
            data: Arc::new(data.to_vec()),
            index,
            units_per_em: face.units_per_em(),
            has_gsub,
            has_gpos,
        });
    }

    log::debug!(
        "Loaded {} font '{}' with {} glyphs",
        cid_type.subtype(),
        font_name,
        face.number_of_glyphs()
    );
    Ok(Font::Cid(font))
}

fn find_name(face: &ttf_parser::Face, id: u16) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == id)
        .find_map(|name| name.to_string())
        .filter(|s| !s.is_empty())
}

fn fallback_name(locator: Option<&str>) -> String {
    locator
        .and_then(|l| l.rsplit(['/', '\\']).next())
        .and_then(|file| file.split('.').next())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

/// Italic angle from the `post` table (Fixed 16.16 at offset 4).
fn post_italic_angle(face: &ttf_parser::Face) -> i32 {
    face.raw_face()
        .table(Tag::from_bytes(b"post"))
        .filter(|post| post.len() >= 8)
        .map(|post| {
            let fixed = i32::from_be_bytes([post[4], post[5], post[6], post[7]]);
            (fixed as f64 / 65536.0).round() as i32
        })
        .unwrap_or(0)
}

/// StemV estimated from the weight class.
fn stem_v(weight: u16) -> i32 {
    (10.0 + 0.244 * (weight as f64 - 50.0)).max(0.0).round() as i32
}

/// Pair kerning for characters 32-255 from horizontal `kern` subtables.
fn read_kerning(face: &ttf_parser::Face, upem: f64) -> HashMap<(char, char), i32> {
    let mut kerning = HashMap::new();
    let Some(kern) = face.tables().kern else {
        return kerning;
    };
    let glyphs: Vec<(char, GlyphId)> = (32u8..=255)
        .map(char::from)
        .filter_map(|c| face.glyph_index(c).map(|g| (c, g)))
        .collect();

    for subtable in kern.subtables {
        if !subtable.horizontal || subtable.has_cross_stream || subtable.has_state_machine {
            continue;
        }
        for &(left, left_gid) in &glyphs {
            for &(right, right_gid) in &glyphs {
                if let Some(value) = subtable.glyphs_kerning(left_gid, right_gid) {
                    if value != 0 {
                        kerning
                            .entry((left, right))
                            .or_insert((value as f64 * 1000.0 / upem).round() as i32);
                    }
                }
            }
        }
    }
    kerning
}

// ─── Type1 ─────────────────────────────────────────────────────

fn load_type1(
    data: &[u8],
    locator: Option<&str>,
    mode: EmbeddingMode,
    document_default: EmbeddingMode,
) -> Result<Font, FolioError> {
    let segments = PfbSegments::parse(data).map_err(FolioError::Font)?;
    let info = Type1Info::parse(&segments).map_err(FolioError::Font)?;

    let (encoding, mut font_flags) = match &info.encoding {
        Type1Encoding::Standard => (SingleByteEncoding::standard(), flags::NONSYMBOLIC),
        Type1Encoding::BuiltIn(names) => (
            SingleByteEncoding::from_glyph_names(format!("{}Encoding", info.font_name), names),
            flags::SYMBOLIC,
        ),
    };
    if info.is_fixed_pitch {
        font_flags |= flags::FIXED_PITCH;
    }
    if info.italic_angle != 0 {
        font_flags |= flags::ITALIC;
    }

    let by_name: HashMap<&str, i32> = info.widths.iter().map(|(n, w)| (n.as_str(), *w)).collect();
    let coded: Vec<(u8, i32)> = (0u8..=255)
        .filter_map(|code| {
            let name = encoding.glyph_name(code)?;
            by_name.get(name).map(|&w| (code, w))
        })
        .collect();
    let missing_width = by_name.get(".notdef").copied().unwrap_or(0);
    let (first_char, widths) = match (coded.first(), coded.last()) {
        (Some(&(first, _)), Some(&(last, _))) => {
            let mut widths = vec![missing_width; (last - first) as usize + 1];
            for &(code, w) in &coded {
                widths[(code - first) as usize] = w;
            }
            (first, widths)
        }
        _ => (0, Vec::new()),
    };

    let metrics = FontMetrics {
        font_name: info.font_name.clone(),
        full_name: info.full_name.clone().unwrap_or_else(|| info.font_name.clone()),
        family_names: info.family_name.clone().into_iter().collect(),
        ascender: info.bbox[3],
        descender: info.bbox[1],
        cap_height: info.bbox[3],
        x_height: info.bbox[3] / 2,
        bbox: info.bbox,
        flags: font_flags,
        stem_v: stem_v(400),
        italic_angle: info.italic_angle,
        weight: 400,
        missing_width,
    };
    let program = locator.map(|locator| FontProgram {
        locator: locator.to_string(),
        kind: FontProgramKind::Type1,
        collection_index: 0,
    });
    let mode = mode.resolve(document_default, EmbeddingMode::Full);

    log::debug!("Loaded Type1 font '{}' with {} charstrings", info.font_name, info.widths.len());
    Ok(Font::Simple(SimpleFont::new(metrics, program, mode, encoding, first_char, widths)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = load_font(b"not a font at all", Some("x.bin"), EmbeddingMode::Auto, EmbeddingMode::Auto)
            .unwrap_err();
        assert!(matches!(err, FolioError::UnsupportedFontFormat(_)));
        assert!(err.to_string().contains("x.bin"));
    }

    #[test]
    fn test_truncated_truetype_is_a_font_error() {
        let err = load_font(&[0, 1, 0, 0, 0, 0], None, EmbeddingMode::Auto, EmbeddingMode::Auto).unwrap_err();
        assert!(matches!(err, FolioError::Font(_)));
    }

    #[test]
    fn test_stem_v_from_weight() {
        assert_eq!(stem_v(400), 95);
        assert_eq!(stem_v(700), 169);
        assert_eq!(stem_v(0), 0);
    }

    #[test]
    fn test_fallback_name() {
        assert_eq!(fallback_name(Some("/fonts/Noto Sans.ttf")), "Noto Sans");
        assert_eq!(fallback_name(None), "Unknown");
    }
}
