//! # Font Program Embedding
//!
//! Turns a font's program bytes into what goes into the font file stream:
//! the untouched program for FULL embedding, or a reduced program holding
//! only the used glyphs for SUBSET.

pub mod opentype;
pub mod truetype;
pub mod type1;

use crate::error::FolioError;
use crate::font::type1::PfbSegments;
use crate::font::{EmbeddingMode, Font, FontProgramKind};

/// A font program ready to be written as a font file stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddedProgram {
    /// `/FontFile2`
    TrueType(Vec<u8>),
    /// `/FontFile3 /Subtype /CIDFontType0C`: a bare CFF table.
    Cff(Vec<u8>),
    /// `/FontFile3 /Subtype /OpenType`: the whole OpenType file.
    OpenType(Vec<u8>),
    /// `/FontFile` with `/Length1-3`.
    Type1(PfbSegments),
}

impl EmbeddedProgram {
    /// Key under which the descriptor references the stream.
    pub fn descriptor_key(&self) -> &'static str {
        match self {
            EmbeddedProgram::TrueType(_) => "FontFile2",
            EmbeddedProgram::Cff(_) | EmbeddedProgram::OpenType(_) => "FontFile3",
            EmbeddedProgram::Type1(_) => "FontFile",
        }
    }

    /// `/Subtype` of the font file stream, if it has one.
    pub fn subtype(&self) -> Option<&'static str> {
        match self {
            EmbeddedProgram::Cff(_) => Some("CIDFontType0C"),
            EmbeddedProgram::OpenType(_) => Some("OpenType"),
            EmbeddedProgram::TrueType(_) | EmbeddedProgram::Type1(_) => None,
        }
    }

    /// Unencoded lengths the stream dictionary declares.
    pub fn lengths(&self) -> Vec<(&'static str, usize)> {
        match self {
            EmbeddedProgram::TrueType(data) => vec![("Length1", data.len())],
            EmbeddedProgram::Cff(_) | EmbeddedProgram::OpenType(_) => Vec::new(),
            EmbeddedProgram::Type1(segments) => vec![
                ("Length1", segments.cleartext.len()),
                ("Length2", segments.binary.len()),
                ("Length3", segments.trailer.len()),
            ],
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            EmbeddedProgram::TrueType(data) | EmbeddedProgram::Cff(data) | EmbeddedProgram::OpenType(data) => data,
            EmbeddedProgram::Type1(segments) => segments.program_bytes(),
        }
    }
}

/// Sniffs the program flavor from the first bytes.
pub fn detect_format(data: &[u8]) -> Option<FontProgramKind> {
    match data.get(0..4)? {
        b"OTTO" => Some(FontProgramKind::OpenTypeCff),
        [0x00, 0x01, 0x00, 0x00] | b"true" | b"ttcf" => Some(FontProgramKind::TrueType),
        [0x80, 0x01, _, _] => Some(FontProgramKind::Type1),
        _ => None,
    }
}

/// Builds the program to embed for `font` from `data`. `prefix` is the
/// subset tag (`EAAAAA+`) used when the font is subset.
///
/// Composite components pulled in by TrueType subsetting are recorded in
/// the font's CID set so the CIDSet bitmap and widths cover them.
pub fn embed_program(font: &mut Font, data: &[u8], prefix: &str) -> Result<EmbeddedProgram, FolioError> {
    let Some(program) = font.program().cloned() else {
        return Err(FolioError::Font(format!("font '{}' has no program to embed", font.font_name())));
    };
    let detected = detect_format(data);
    let compatible = match (program.kind, detected) {
        (FontProgramKind::TrueType, Some(FontProgramKind::TrueType)) => true,
        // a ttcf collection may hold CFF faces
        (FontProgramKind::OpenTypeCff, Some(FontProgramKind::OpenTypeCff | FontProgramKind::TrueType)) => true,
        (FontProgramKind::Type1, Some(FontProgramKind::Type1)) => true,
        _ => false,
    };
    if !compatible {
        return Err(FolioError::UnsupportedFontFormat(format!(
            "font '{}' expects a {:?} program but the data is {}",
            font.font_name(),
            program.kind,
            detected.map_or("unrecognized".to_string(), |k| format!("{:?}", k))
        )));
    }

    let subset = font.embedding_mode() == EmbeddingMode::Subset;
    let font_name = font.font_name().to_string();
    match (font, program.kind) {
        (Font::Cid(cid), FontProgramKind::TrueType) if subset => {
            let order = cid.cid_set().subset_order().to_vec();
            let chars = cid.output_chars();
            let result = truetype::subset_truetype(data, program.collection_index, &order, &chars, &font_name)
                .map_err(FolioError::Font)?;
            for &glyph in &result.added {
                cid.cid_set_mut().add_dependency(glyph);
            }
            if !result.added.is_empty() {
                log::debug!(
                    "Added {} composite component glyphs to subset of '{}'",
                    result.added.len(),
                    font_name
                );
            }
            Ok(EmbeddedProgram::TrueType(result.data))
        }
        (Font::Cid(cid), FontProgramKind::OpenTypeCff) if subset => {
            let order = cid.cid_set().subset_order().to_vec();
            opentype::subset_cff(data, program.collection_index, &order)
                .map(EmbeddedProgram::Cff)
                .map_err(FolioError::Font)
        }
        (Font::Simple(simple), FontProgramKind::Type1) if subset => {
            type1::subset_type1(data, &simple.used_glyph_names(), prefix)
                .map(EmbeddedProgram::Type1)
                .map_err(FolioError::Font)
        }
        (_, FontProgramKind::TrueType) => Ok(EmbeddedProgram::TrueType(data.to_vec())),
        (_, FontProgramKind::OpenTypeCff) => Ok(EmbeddedProgram::OpenType(data.to_vec())),
        (_, FontProgramKind::Type1) => PfbSegments::parse(data)
            .map(EmbeddedProgram::Type1)
            .map_err(FolioError::Font),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(b"OTTO...."), Some(FontProgramKind::OpenTypeCff));
        assert_eq!(detect_format(&[0, 1, 0, 0, 0, 9]), Some(FontProgramKind::TrueType));
        assert_eq!(detect_format(b"ttcf"), Some(FontProgramKind::TrueType));
        assert_eq!(detect_format(&[0x80, 0x01, 0x10, 0x00]), Some(FontProgramKind::Type1));
        assert_eq!(detect_format(b"%!PS-AdobeFont"), None);
        assert_eq!(detect_format(b"ab"), None);
    }

    #[test]
    fn test_stream_dictionary_values() {
        let program = EmbeddedProgram::Type1(PfbSegments {
            cleartext: vec![0; 10],
            binary: vec![0; 20],
            trailer: vec![0; 3],
        });
        assert_eq!(program.descriptor_key(), "FontFile");
        assert_eq!(program.lengths()[1], ("Length2", 20));
        assert_eq!(program.subtype(), None);
        assert_eq!(program.into_bytes().len(), 33);
        assert_eq!(EmbeddedProgram::Cff(vec![]).descriptor_key(), "FontFile3");
        assert_eq!(EmbeddedProgram::OpenType(vec![]).subtype(), Some("OpenType"));
    }
}
