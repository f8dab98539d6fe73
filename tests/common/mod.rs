//! In-memory font programs for the integration tests.

#![allow(dead_code)]

use folio::font::type1::{encrypt, PfbSegments, CHARSTRING_KEY, EEXEC_KEY};

pub const TTF_GLYPHS: u16 = 60;
/// Glyph drawn for 'H'; a composite of [`COMPONENT_GLYPH`].
pub const COMPOSITE_GLYPH: u16 = 10;
pub const COMPONENT_GLYPH: u16 = 11;

/// Advance of glyph `gid` in the test TrueType font, in font units (1000
/// per em).
pub fn ttf_advance(gid: u16) -> u16 {
    500 + gid * 10
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_i16(out: &mut Vec<u8>, v: i16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn head() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0001_0000); // version
    push_u32(&mut t, 0x0001_0000); // fontRevision
    push_u32(&mut t, 0); // checkSumAdjustment
    push_u32(&mut t, 0x5F0F_3CF5); // magic
    push_u16(&mut t, 0); // flags
    push_u16(&mut t, 1000); // unitsPerEm
    t.extend_from_slice(&[0; 16]); // created, modified
    push_i16(&mut t, 0);
    push_i16(&mut t, -200);
    push_i16(&mut t, 1000);
    push_i16(&mut t, 800);
    push_u16(&mut t, 0); // macStyle
    push_u16(&mut t, 8); // lowestRecPPEM
    push_i16(&mut t, 2); // fontDirectionHint
    push_i16(&mut t, 0); // indexToLocFormat: short
    push_i16(&mut t, 0); // glyphDataFormat
    t
}

fn hhea() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0001_0000);
    push_i16(&mut t, 800); // ascender
    push_i16(&mut t, -200); // descender
    push_i16(&mut t, 0); // lineGap
    push_u16(&mut t, ttf_advance(TTF_GLYPHS - 1));
    push_i16(&mut t, 0);
    push_i16(&mut t, 0);
    push_i16(&mut t, 1000);
    push_i16(&mut t, 1); // caretSlopeRise
    push_i16(&mut t, 0);
    push_i16(&mut t, 0);
    t.extend_from_slice(&[0; 8]);
    push_i16(&mut t, 0); // metricDataFormat
    push_u16(&mut t, TTF_GLYPHS); // numberOfHMetrics
    t
}

fn maxp() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0000_5000);
    push_u16(&mut t, TTF_GLYPHS);
    t
}

fn hmtx() -> Vec<u8> {
    let mut t = Vec::new();
    for gid in 0..TTF_GLYPHS {
        push_u16(&mut t, ttf_advance(gid));
        push_i16(&mut t, 0);
    }
    t
}

/// One on-curve point, padded to an even length.
fn simple_glyph(gid: u16) -> Vec<u8> {
    let mut g = Vec::new();
    push_i16(&mut g, 1); // numberOfContours
    push_i16(&mut g, 0);
    push_i16(&mut g, 0);
    push_i16(&mut g, gid as i16);
    push_i16(&mut g, 700);
    push_u16(&mut g, 0); // endPtsOfContours[0]
    push_u16(&mut g, 0); // instructionLength
    g.push(0x01); // on curve, word coordinates
    push_i16(&mut g, gid as i16);
    push_i16(&mut g, 700);
    g.push(0);
    g
}

fn composite_glyph(component: u16) -> Vec<u8> {
    let mut g = Vec::new();
    push_i16(&mut g, -1);
    push_i16(&mut g, 0);
    push_i16(&mut g, 0);
    push_i16(&mut g, 100);
    push_i16(&mut g, 700);
    push_u16(&mut g, 0x0003); // ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES
    push_u16(&mut g, component);
    push_i16(&mut g, 0);
    push_i16(&mut g, 0);
    g
}

fn glyf_and_loca() -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Vec::new();
    let mut loca = Vec::new();
    for gid in 0..TTF_GLYPHS {
        push_u16(&mut loca, (glyf.len() / 2) as u16);
        if gid == COMPOSITE_GLYPH {
            glyf.extend(composite_glyph(COMPONENT_GLYPH));
        } else {
            glyf.extend(simple_glyph(gid));
        }
    }
    push_u16(&mut loca, (glyf.len() / 2) as u16);
    (glyf, loca)
}

/// Format 4 cmap: A-Z → 3..28, a-z → 29..54.
fn cmap() -> Vec<u8> {
    let segments: [(u16, u16, u16); 3] = [(0x41, 0x5A, 3), (0x61, 0x7A, 29), (0xFFFF, 0xFFFF, 0)];
    let seg_count = segments.len() as u16;
    let mut sub = Vec::new();
    push_u16(&mut sub, 4);
    push_u16(&mut sub, 16 + 8 * seg_count);
    push_u16(&mut sub, 0);
    push_u16(&mut sub, seg_count * 2);
    push_u16(&mut sub, 4); // searchRange
    push_u16(&mut sub, 1); // entrySelector
    push_u16(&mut sub, seg_count * 2 - 4); // rangeShift
    for &(_, end, _) in &segments {
        push_u16(&mut sub, end);
    }
    push_u16(&mut sub, 0);
    for &(start, _, _) in &segments {
        push_u16(&mut sub, start);
    }
    for &(start, _, glyph) in &segments {
        let delta = if start == 0xFFFF { 1 } else { glyph.wrapping_sub(start) };
        push_u16(&mut sub, delta);
    }
    for _ in &segments {
        push_u16(&mut sub, 0);
    }

    let mut t = Vec::new();
    push_u16(&mut t, 0);
    push_u16(&mut t, 1);
    push_u16(&mut t, 3); // Windows
    push_u16(&mut t, 1); // Unicode BMP
    push_u32(&mut t, 12);
    t.extend(sub);
    t
}

fn name() -> Vec<u8> {
    let strings: [(u16, &str); 2] = [(1, "Test Sans"), (6, "TestSans")];
    let mut storage = Vec::new();
    let mut records = Vec::new();
    for &(id, s) in &strings {
        let encoded: Vec<u8> = s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        push_u16(&mut records, 3);
        push_u16(&mut records, 1);
        push_u16(&mut records, 0x0409);
        push_u16(&mut records, id);
        push_u16(&mut records, encoded.len() as u16);
        push_u16(&mut records, storage.len() as u16);
        storage.extend(encoded);
    }
    let mut t = Vec::new();
    push_u16(&mut t, 0);
    push_u16(&mut t, strings.len() as u16);
    push_u16(&mut t, 6 + 12 * strings.len() as u16);
    t.extend(records);
    t.extend(storage);
    t
}

/// A complete glyf-flavored TrueType font with 60 glyphs.
pub fn build_ttf() -> Vec<u8> {
    let (glyf, loca) = glyf_and_loca();
    let mut tables: Vec<(&[u8; 4], Vec<u8>)> = vec![
        (b"cmap", cmap()),
        (b"glyf", glyf),
        (b"head", head()),
        (b"hhea", hhea()),
        (b"hmtx", hmtx()),
        (b"loca", loca),
        (b"maxp", maxp()),
        (b"name", name()),
    ];
    tables.sort_by_key(|(tag, _)| **tag);

    let num_tables = tables.len() as u16;
    let mut out = Vec::new();
    push_u32(&mut out, 0x0001_0000);
    push_u16(&mut out, num_tables);
    push_u16(&mut out, 128); // searchRange
    push_u16(&mut out, 3); // entrySelector
    push_u16(&mut out, num_tables * 16 - 128);

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in &tables {
        out.extend_from_slice(*tag);
        push_u32(&mut out, 0);
        push_u32(&mut out, offset as u32);
        push_u32(&mut out, data.len() as u32);
        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() + body.len();
    }
    out.extend(body);
    out
}

fn type1_number(v: i32) -> Vec<u8> {
    match v {
        -107..=107 => vec![(v + 139) as u8],
        108..=1131 => {
            let v = v - 108;
            vec![(v / 256 + 247) as u8, (v % 256) as u8]
        }
        _ => {
            let mut out = vec![255];
            out.extend_from_slice(&v.to_be_bytes());
            out
        }
    }
}

/// `hsbw` then either `endchar` or a `seac` of `base` + `accent`.
fn type1_charstring(width: i32, seac: Option<(u8, u8)>) -> Vec<u8> {
    let mut plain = vec![0, 0, 0, 0];
    plain.extend(type1_number(0));
    plain.extend(type1_number(width));
    plain.push(13);
    match seac {
        Some((base, accent)) => {
            for v in [0, 0, 0, base as i32, accent as i32] {
                plain.extend(type1_number(v));
            }
            plain.extend_from_slice(&[12, 6]);
        }
        None => plain.push(14),
    }
    encrypt(&plain, CHARSTRING_KEY)
}

/// A PFB Type1 font "TestSerif" in StandardEncoding with `.notdef`,
/// `space`, `A`, `B`, `acute` and the accented `Aacute`.
pub fn build_pfb() -> Vec<u8> {
    let clear = b"%!PS-AdobeFont-1.0: TestSerif\n/FontName /TestSerif def\n/FamilyName (Test Serif) readonly def\n/ItalicAngle 0 def\n/isFixedPitch false def\n/FontBBox {-20 -210 980 790} readonly def\n/Encoding StandardEncoding def\ncurrentfile eexec\n".to_vec();
    let glyphs = [
        (".notdef", type1_charstring(250, None)),
        ("space", type1_charstring(250, None)),
        ("A", type1_charstring(722, None)),
        ("B", type1_charstring(667, None)),
        ("acute", type1_charstring(333, None)),
        ("Aacute", type1_charstring(722, Some((65, 194)))),
    ];
    let mut private = format!(
        "xxxxdup /Private 8 dict dup begin\n/lenIV 4 def\n2 index /CharStrings {} dict dup begin\n",
        glyphs.len()
    )
    .into_bytes();
    for (name, cs) in &glyphs {
        private.extend_from_slice(format!("/{} {} RD ", name, cs.len()).as_bytes());
        private.extend_from_slice(cs);
        private.extend_from_slice(b" ND\n");
    }
    private.extend_from_slice(b"end\nend\nmark currentfile closefile\n");

    PfbSegments {
        cleartext: clear,
        binary: encrypt(&private, EEXEC_KEY),
        trailer: b"0000000000000000\ncleartomark\n".to_vec(),
    }
    .to_pfb()
}

/// Byte offset of `needle` in `haystack`.
pub fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// The dictionary text of object `number` in an uncompressed file.
pub fn object_text(pdf: &[u8], number: u32) -> String {
    let header = format!("\n{} 0 obj\n", number);
    let start = find_bytes(pdf, header.as_bytes()).map(|i| i + header.len()).unwrap_or(0);
    let end = find_bytes(&pdf[start..], b"endobj").map(|i| start + i).unwrap_or(pdf.len());
    String::from_utf8_lossy(&pdf[start..end]).to_string()
}
