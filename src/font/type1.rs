//! # Type1 Font Programs
//!
//! Reads PFB files: the segment framing, the eexec-encrypted private part
//! and the charstrings inside it. Only as much PostScript is understood as
//! metrics extraction and subsetting need.

// ─── Encryption ────────────────────────────────────────────────

/// eexec key for the private part.
pub const EEXEC_KEY: u16 = 55665;
/// Key for individual charstrings.
pub const CHARSTRING_KEY: u16 = 4330;

const C1: u16 = 52845;
const C2: u16 = 22719;

pub fn decrypt(data: &[u8], key: u16) -> Vec<u8> {
    let mut r = key;
    data.iter()
        .map(|&c| {
            let plain = c ^ (r >> 8) as u8;
            r = (c as u16).wrapping_add(r).wrapping_mul(C1).wrapping_add(C2);
            plain
        })
        .collect()
}

pub fn encrypt(data: &[u8], key: u16) -> Vec<u8> {
    let mut r = key;
    data.iter()
        .map(|&p| {
            let c = p ^ (r >> 8) as u8;
            r = (c as u16).wrapping_add(r).wrapping_mul(C1).wrapping_add(C2);
            c
        })
        .collect()
}

// ─── PFB Segments ──────────────────────────────────────────────

const SEGMENT_MARKER: u8 = 0x80;
const SEGMENT_ASCII: u8 = 1;
const SEGMENT_BINARY: u8 = 2;
const SEGMENT_EOF: u8 = 3;

/// The three parts of a Type1 program, as written to `/FontFile` with
/// `/Length1`, `/Length2` and `/Length3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PfbSegments {
    pub cleartext: Vec<u8>,
    pub binary: Vec<u8>,
    pub trailer: Vec<u8>,
}

impl PfbSegments {
    pub fn is_pfb(data: &[u8]) -> bool {
        data.len() >= 6 && data[0] == SEGMENT_MARKER && data[1] == SEGMENT_ASCII
    }

    pub fn parse(data: &[u8]) -> Result<Self, String> {
        let mut segments = PfbSegments {
            cleartext: Vec::new(),
            binary: Vec::new(),
            trailer: Vec::new(),
        };
        let mut pos = 0;
        let mut seen_binary = false;

        while pos < data.len() {
            if data[pos] != SEGMENT_MARKER || pos + 2 > data.len() {
                return Err(format!("Invalid PFB segment header at offset {}", pos));
            }
            let kind = data[pos + 1];
            if kind == SEGMENT_EOF {
                break;
            }
            if pos + 6 > data.len() {
                return Err("Truncated PFB segment header".to_string());
            }
            let len = u32::from_le_bytes([data[pos + 2], data[pos + 3], data[pos + 4], data[pos + 5]]) as usize;
            let start = pos + 6;
            let end = start
                .checked_add(len)
                .filter(|&e| e <= data.len())
                .ok_or_else(|| format!("PFB segment at offset {} runs past end of file", pos))?;
            let body = &data[start..end];

            match kind {
                SEGMENT_ASCII if seen_binary => segments.trailer.extend_from_slice(body),
                SEGMENT_ASCII => segments.cleartext.extend_from_slice(body),
                SEGMENT_BINARY => {
                    seen_binary = true;
                    segments.binary.extend_from_slice(body);
                }
                other => return Err(format!("Unknown PFB segment type {}", other)),
            }
            pos = end;
        }

        if segments.cleartext.is_empty() || segments.binary.is_empty() {
            return Err("PFB file has no cleartext or no encrypted part".to_string());
        }
        Ok(segments)
    }

    /// Re-frames the segments as a PFB file.
    pub fn to_pfb(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (kind, body) in [
            (SEGMENT_ASCII, &self.cleartext),
            (SEGMENT_BINARY, &self.binary),
            (SEGMENT_ASCII, &self.trailer),
        ] {
            out.push(SEGMENT_MARKER);
            out.push(kind);
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
            out.extend_from_slice(body);
        }
        out.extend_from_slice(&[SEGMENT_MARKER, SEGMENT_EOF]);
        out
    }

    /// The program as embedded: cleartext, binary and trailer back to back.
    pub fn program_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.cleartext.len() + self.binary.len() + self.trailer.len());
        out.extend_from_slice(&self.cleartext);
        out.extend_from_slice(&self.binary);
        out.extend_from_slice(&self.trailer);
        out
    }

    /// The decrypted private part, lead-in bytes included.
    pub fn private_dict(&self) -> Vec<u8> {
        decrypt(&self.binary, EEXEC_KEY)
    }
}

// ─── PostScript Scanning ───────────────────────────────────────

pub(crate) fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'/' | b'[' | b']' | b'{' | b'}' | b'(' | b')' | b'<' | b'>')
}

/// Byte cursor over PostScript source.
pub(crate) struct Scanner<'a> {
    data: &'a [u8],
    pub(crate) pos: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(data: &'a [u8], pos: usize) -> Self {
        Scanner { data, pos }
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    pub(crate) fn starts_with(&self, prefix: &[u8]) -> bool {
        self.data[self.pos.min(self.data.len())..].starts_with(prefix)
    }

    /// Next token: a `/name` (slash included), a single delimiter, or a run
    /// of regular characters.
    pub(crate) fn token(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let start = self.pos;
        let first = *self.data.get(start)?;
        self.pos += 1;
        if first == b'/' || !is_delimiter(first) {
            while self.pos < self.data.len() && !is_delimiter(self.data[self.pos]) {
                self.pos += 1;
            }
        }
        let data = self.data;
        std::str::from_utf8(&data[start..self.pos]).ok()
    }

    pub(crate) fn number(&mut self) -> Option<f64> {
        self.token()?.parse().ok()
    }

    /// Contents of a `( ... )` string, without nesting or escapes.
    fn paren_string(&mut self) -> Option<String> {
        self.skip_whitespace();
        if !self.starts_with(b"(") {
            return None;
        }
        let end = find(self.data, b")", self.pos)?;
        let text = String::from_utf8_lossy(&self.data[self.pos + 1..end]).into_owned();
        self.pos = end + 1;
        Some(text)
    }

    pub(crate) fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let data = self.data;
        let bytes = data.get(self.pos..self.pos.checked_add(len)?)?;
        self.pos += len;
        Some(bytes)
    }
}

fn value_after<'a>(data: &'a [u8], key: &[u8]) -> Option<Scanner<'a>> {
    let pos = find(data, key, 0)?;
    Some(Scanner::new(data, pos + key.len()))
}

// ─── Charstrings ───────────────────────────────────────────────

/// One `/name len RD <bytes> ND` entry of the CharStrings dictionary.
#[derive(Debug, Clone)]
pub struct CharStringEntry {
    pub name: String,
    /// Still encrypted with [`CHARSTRING_KEY`].
    pub data: Vec<u8>,
    /// Byte span of the whole entry in the private part.
    pub span: (usize, usize),
}

/// Location of the CharStrings dictionary in the decrypted private part.
#[derive(Debug, Clone)]
pub struct CharStrings {
    /// Byte span of the entry count after `/CharStrings`.
    pub count_span: (usize, usize),
    /// Offset just past `begin`.
    pub body_start: usize,
    /// Offset of the closing `end`.
    pub body_end: usize,
    pub entries: Vec<CharStringEntry>,
}

impl CharStrings {
    pub fn parse(private: &[u8]) -> Result<Self, String> {
        let key = find(private, b"/CharStrings", 0).ok_or("No /CharStrings dictionary in font program")?;
        let mut scanner = Scanner::new(private, key + b"/CharStrings".len());
        scanner.skip_whitespace();
        let count_start = scanner.pos;
        scanner
            .number()
            .ok_or("CharStrings dictionary has no entry count")?;
        let count_span = (count_start, scanner.pos);

        let begin = find(private, b"begin", scanner.pos).ok_or("CharStrings dictionary has no 'begin'")?;
        let body_start = begin + b"begin".len();
        scanner.pos = body_start;

        let mut entries = Vec::new();
        loop {
            scanner.skip_whitespace();
            if scanner.pos >= private.len() {
                return Err("CharStrings dictionary is not terminated".to_string());
            }
            if scanner.starts_with(b"end") {
                break;
            }
            let entry_start = scanner.pos;
            let name = scanner
                .token()
                .and_then(|t| t.strip_prefix('/'))
                .ok_or_else(|| format!("Expected glyph name at offset {}", entry_start))?
                .to_string();
            let len = scanner
                .number()
                .filter(|n| *n >= 0.0)
                .ok_or_else(|| format!("Expected charstring length for /{}", name))? as usize;
            scanner.token(); // RD or -|
            scanner.pos += 1;
            let data = scanner
                .take(len)
                .ok_or_else(|| format!("Charstring for /{} runs past end of data", name))?
                .to_vec();
            match scanner.token() {
                Some("noaccess") => {
                    scanner.token();
                }
                Some(_) => {}
                None => return Err(format!("Charstring for /{} is not terminated", name)),
            }
            entries.push(CharStringEntry {
                name,
                data,
                span: (entry_start, scanner.pos),
            });
        }

        Ok(CharStrings {
            count_span,
            body_start,
            body_end: scanner.pos,
            entries,
        })
    }
}

/// What a charstring says about its glyph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharStringInfo {
    /// Advance width from `hsbw` or `sbw`.
    pub width: Option<i32>,
    /// StandardEncoding codes of the base and accent of a `seac` composite.
    pub seac: Option<(u8, u8)>,
}

/// Decrypts and walks a charstring far enough to find its width and any
/// `seac` components. Subroutine calls are not followed.
pub fn inspect_charstring(encrypted: &[u8], len_iv: usize) -> CharStringInfo {
    let plain = decrypt(encrypted, CHARSTRING_KEY);
    let ops = plain.get(len_iv..).unwrap_or(&[]);
    let mut info = CharStringInfo::default();
    let mut stack: Vec<i32> = Vec::new();
    let mut i = 0;

    while i < ops.len() {
        let b = ops[i];
        match b {
            32..=246 => {
                stack.push(b as i32 - 139);
                i += 1;
            }
            247..=250 => {
                let Some(&next) = ops.get(i + 1) else { break };
                stack.push((b as i32 - 247) * 256 + next as i32 + 108);
                i += 2;
            }
            251..=254 => {
                let Some(&next) = ops.get(i + 1) else { break };
                stack.push(-(b as i32 - 251) * 256 - next as i32 - 108);
                i += 2;
            }
            255 => {
                let Some(bytes) = ops.get(i + 1..i + 5) else { break };
                stack.push(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
                i += 5;
            }
            12 => {
                let Some(&escape) = ops.get(i + 1) else { break };
                i += 2;
                match escape {
                    // seac: asb adx ady bchar achar
                    6 if stack.len() >= 5 => {
                        info.seac = Some((stack[3] as u8, stack[4] as u8));
                        break;
                    }
                    // sbw: sbx sby wx wy
                    7 if stack.len() >= 4 => {
                        info.width = Some(stack[2]);
                        stack.clear();
                    }
                    // div
                    12 if stack.len() >= 2 => {
                        let den = stack.pop().unwrap_or(1);
                        let num = stack.pop().unwrap_or(0);
                        stack.push(if den == 0 { 0 } else { num / den });
                    }
                    _ => stack.clear(),
                }
            }
            // hsbw: sbx wx
            13 if stack.len() >= 2 => {
                info.width = Some(stack[1]);
                stack.clear();
                i += 1;
            }
            14 => break,
            _ => {
                stack.clear();
                i += 1;
            }
        }
    }
    info
}

// ─── Font Dictionary ───────────────────────────────────────────

/// A Type1 font's encoding as declared in its cleartext part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type1Encoding {
    Standard,
    BuiltIn(Vec<(u8, String)>),
}

/// What the font dictionary and charstrings say about a Type1 font.
#[derive(Debug, Clone)]
pub struct Type1Info {
    pub font_name: String,
    pub family_name: Option<String>,
    pub full_name: Option<String>,
    pub bbox: [i32; 4],
    pub italic_angle: i32,
    pub is_fixed_pitch: bool,
    pub encoding: Type1Encoding,
    /// Advance widths by glyph name.
    pub widths: Vec<(String, i32)>,
}

impl Type1Info {
    pub fn parse(segments: &PfbSegments) -> Result<Self, String> {
        let clear = &segments.cleartext;

        let font_name = value_after(clear, b"/FontName")
            .and_then(|mut s| s.token().map(|t| t.trim_start_matches('/').to_string()))
            .filter(|n| !n.is_empty())
            .ok_or("Type1 font has no /FontName")?;
        let family_name = value_after(clear, b"/FamilyName").and_then(|mut s| s.paren_string());
        let full_name = value_after(clear, b"/FullName").and_then(|mut s| s.paren_string());
        let italic_angle = value_after(clear, b"/ItalicAngle")
            .and_then(|mut s| s.number())
            .unwrap_or(0.0)
            .round() as i32;
        let is_fixed_pitch = value_after(clear, b"/isFixedPitch")
            .and_then(|mut s| s.token().map(|t| t == "true"))
            .unwrap_or(false);

        let mut bbox = [0i32; 4];
        if let Some(mut s) = value_after(clear, b"/FontBBox") {
            s.token(); // { or [
            for slot in bbox.iter_mut() {
                *slot = s.number().unwrap_or(0.0).round() as i32;
            }
        }

        let encoding = parse_encoding(clear);

        let private = segments.private_dict();
        let len_iv = value_after(&private, b"/lenIV")
            .and_then(|mut s| s.number())
            .map(|n| n as usize)
            .unwrap_or(4);
        let charstrings = CharStrings::parse(&private)?;
        let widths = charstrings
            .entries
            .iter()
            .filter_map(|e| inspect_charstring(&e.data, len_iv).width.map(|w| (e.name.clone(), w)))
            .collect();

        Ok(Type1Info {
            font_name,
            family_name,
            full_name,
            bbox,
            italic_angle,
            is_fixed_pitch,
            encoding,
            widths,
        })
    }
}

fn parse_encoding(clear: &[u8]) -> Type1Encoding {
    let Some(mut scanner) = value_after(clear, b"/Encoding") else {
        return Type1Encoding::Standard;
    };
    if scanner.token() == Some("StandardEncoding") {
        return Type1Encoding::Standard;
    }

    let end = find(clear, b"readonly def", scanner.pos)
        .or_else(|| find(clear, b"def", scanner.pos))
        .unwrap_or(clear.len());
    let mut entries = Vec::new();
    while let Some(dup) = find(clear, b"dup ", scanner.pos).filter(|&p| p < end) {
        scanner.pos = dup + 4;
        let code = scanner.number();
        let name = scanner.token().and_then(|t| t.strip_prefix('/'));
        if let (Some(code), Some(name)) = (code, name) {
            if (0.0..=255.0).contains(&code) {
                entries.push((code as u8, name.to_string()));
            }
        }
    }
    Type1Encoding::BuiltIn(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_number(v: i32) -> Vec<u8> {
        match v {
            -107..=107 => vec![(v + 139) as u8],
            108..=1131 => {
                let v = v - 108;
                vec![(v / 256 + 247) as u8, (v % 256) as u8]
            }
            -1131..=-108 => {
                let v = -v - 108;
                vec![(v / 256 + 251) as u8, (v % 256) as u8]
            }
            _ => {
                let mut out = vec![255];
                out.extend_from_slice(&v.to_be_bytes());
                out
            }
        }
    }

    fn charstring(width: i32, seac: Option<(u8, u8)>) -> Vec<u8> {
        let mut plain = vec![0, 0, 0, 0];
        plain.extend(encode_number(0));
        plain.extend(encode_number(width));
        plain.push(13);
        if let Some((base, accent)) = seac {
            for v in [0, 0, 0, base as i32, accent as i32] {
                plain.extend(encode_number(v));
            }
            plain.extend_from_slice(&[12, 6]);
        } else {
            plain.push(14);
        }
        encrypt(&plain, CHARSTRING_KEY)
    }

    fn test_font() -> Vec<u8> {
        let clear = b"%!PS-AdobeFont-1.0: Test\n/FontName /TestType1 def\n/FamilyName (Test) readonly def\n/ItalicAngle -12 def\n/isFixedPitch false def\n/FontBBox {-50 -200 1000 800} readonly def\n/Encoding StandardEncoding def\ncurrentfile eexec\n".to_vec();
        let mut private = b"xxxxdup /Private 8 dict dup begin\n/lenIV 4 def\n2 index /CharStrings 3 dict dup begin\n".to_vec();
        for (name, cs) in [
            (".notdef", charstring(250, None)),
            ("A", charstring(667, None)),
            ("Aacute", charstring(667, Some((65, 194)))),
        ] {
            private.extend_from_slice(format!("/{} {} RD ", name, cs.len()).as_bytes());
            private.extend_from_slice(&cs);
            private.extend_from_slice(b" ND\n");
        }
        private.extend_from_slice(b"end\nend\nmark currentfile closefile\n");

        PfbSegments {
            cleartext: clear,
            binary: encrypt(&private, EEXEC_KEY),
            trailer: b"0000000000\ncleartomark\n".to_vec(),
        }
        .to_pfb()
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let data = b"dup /Private 8 dict".to_vec();
        assert_eq!(decrypt(&encrypt(&data, EEXEC_KEY), EEXEC_KEY), data);
        assert_ne!(encrypt(&data, EEXEC_KEY), data);
    }

    #[test]
    fn test_pfb_segments() {
        let pfb = test_font();
        assert!(PfbSegments::is_pfb(&pfb));
        let segments = PfbSegments::parse(&pfb).unwrap();
        assert!(segments.cleartext.starts_with(b"%!PS"));
        assert!(segments.trailer.ends_with(b"cleartomark\n"));
        assert_eq!(segments.to_pfb(), pfb);
    }

    #[test]
    fn test_truncated_pfb_is_rejected() {
        let pfb = test_font();
        assert!(PfbSegments::parse(&pfb[..20]).is_err());
    }

    #[test]
    fn test_charstrings_parse() {
        let segments = PfbSegments::parse(&test_font()).unwrap();
        let private = segments.private_dict();
        let charstrings = CharStrings::parse(&private).unwrap();
        let names: Vec<&str> = charstrings.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![".notdef", "A", "Aacute"]);
        assert_eq!(&private[charstrings.count_span.0..charstrings.count_span.1], b"3");
        assert!(private[charstrings.body_end..].starts_with(b"end"));
    }

    #[test]
    fn test_inspect_charstring() {
        let info = inspect_charstring(&charstring(667, Some((65, 194))), 4);
        assert_eq!(info.width, Some(667));
        assert_eq!(info.seac, Some((65, 194)));
        let info = inspect_charstring(&charstring(-300, None), 4);
        assert_eq!(info.width, Some(-300));
        assert_eq!(info.seac, None);
    }

    #[test]
    fn test_font_info() {
        let segments = PfbSegments::parse(&test_font()).unwrap();
        let info = Type1Info::parse(&segments).unwrap();
        assert_eq!(info.font_name, "TestType1");
        assert_eq!(info.family_name.as_deref(), Some("Test"));
        assert_eq!(info.italic_angle, -12);
        assert_eq!(info.bbox, [-50, -200, 1000, 800]);
        assert_eq!(info.encoding, Type1Encoding::Standard);
        assert!(info.widths.contains(&("A".to_string(), 667)));
    }

    #[test]
    fn test_builtin_encoding() {
        let clear = b"/Encoding 256 array\n0 1 255 {1 index exch /.notdef put} for\ndup 65 /alpha put\ndup 66 /beta put\nreadonly def\n";
        assert_eq!(
            parse_encoding(clear),
            Type1Encoding::BuiltIn(vec![(65, "alpha".to_string()), (66, "beta".to_string())])
        );
    }
}
