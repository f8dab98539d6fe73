//! CFF-flavored OpenType subsetting through the `subsetter` crate.

use super::truetype::find_table;

/// Subsets a CFF OpenType font to `order` (original glyphs in output
/// order) and returns the bare `CFF ` table, ready for
/// `/FontFile3 /Subtype /CIDFontType0C`.
///
/// The remapper is fed in the same order the CID set assigned indices, so
/// CIDs in the subset equal the indices already written to content streams.
pub fn subset_cff(data: &[u8], index: u32, order: &[u16]) -> Result<Vec<u8>, String> {
    let mut remapper = subsetter::GlyphRemapper::new();
    for &gid in order {
        remapper.remap(gid);
    }

    let subset = subsetter::subset(data, index, &remapper).map_err(|e| format!("CFF subsetting failed: {}", e))?;
    find_table(&subset, 0, b"CFF ")
        .map(<[u8]>::to_vec)
        .ok_or_else(|| "Subset font has no CFF table".to_string())
}
