//! ToUnicode CMaps and CID width arrays.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

use super::object::PdfValue;

/// Content-stream code width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeWidth {
    /// Simple fonts.
    OneByte,
    /// Identity-H composite fonts.
    TwoByte,
}

/// Build a ToUnicode CMap for text extraction/copy-paste support.
pub fn build_tounicode_cmap(mappings: &BTreeMap<u16, char>, code_width: CodeWidth) -> String {
    let mut cmap = String::new();
    let _ = writeln!(cmap, "/CIDInit /ProcSet findresource begin");
    let _ = writeln!(cmap, "12 dict begin");
    let _ = writeln!(cmap, "begincmap");
    let _ = writeln!(cmap, "/CIDSystemInfo");
    let _ = writeln!(cmap, "<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def");
    let _ = writeln!(cmap, "/CMapName /Adobe-Identity-UCS def");
    let _ = writeln!(cmap, "/CMapType 2 def");
    let _ = writeln!(cmap, "1 begincodespacerange");
    match code_width {
        CodeWidth::OneByte => {
            let _ = writeln!(cmap, "<00> <FF>");
        }
        CodeWidth::TwoByte => {
            let _ = writeln!(cmap, "<0000> <FFFF>");
        }
    }
    let _ = writeln!(cmap, "endcodespacerange");

    let entries: Vec<(u16, char)> = mappings
        .iter()
        .filter(|&(&code, _)| code_width == CodeWidth::TwoByte || code <= 0xFF)
        .map(|(&code, &ch)| (code, ch))
        .collect();

    // beginbfchar blocks hold at most 100 entries
    for chunk in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for &(code, ch) in chunk {
            let src = match code_width {
                CodeWidth::OneByte => format!("{:02X}", code),
                CodeWidth::TwoByte => format!("{:04X}", code),
            };
            let _ = writeln!(cmap, "<{}> <{}>", src, utf16_hex(ch));
        }
        let _ = writeln!(cmap, "endbfchar");
    }

    let _ = writeln!(cmap, "endcmap");
    let _ = writeln!(cmap, "CMapName currentdict /CMap defineresource pop");
    let _ = writeln!(cmap, "end");
    let _ = writeln!(cmap, "end");
    cmap
}

/// UTF-16BE hex digits of `ch`, as a surrogate pair above the BMP.
fn utf16_hex(ch: char) -> String {
    let mut units = [0u16; 2];
    ch.encode_utf16(&mut units)
        .iter()
        .map(|u| format!("{:04X}", u))
        .collect()
}

/// The `/W` array for widths indexed from 0: `[0 [w0 w1 ...]]`.
pub fn build_w_array(widths: &[i32]) -> PdfValue {
    if widths.is_empty() {
        return PdfValue::Array(Vec::new());
    }
    PdfValue::Array(vec![
        PdfValue::Int(0),
        PdfValue::Array(widths.iter().map(|&w| PdfValue::Int(w as i64)).collect()),
    ])
}
