//! Single-byte encodings for simple fonts.

use std::collections::HashMap;

/// Encodings a PDF reader knows by name.
pub const PREDEFINED_ENCODINGS: [&str; 3] = ["WinAnsiEncoding", "MacRomanEncoding", "MacExpertEncoding"];

pub fn is_predefined_encoding(name: &str) -> bool {
    PREDEFINED_ENCODINGS.contains(&name)
}

/// Windows-1252 code points 0x80-0x9F; `None` marks unassigned codes.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

/// Adobe StandardEncoding outside the letters and digits.
const STANDARD_ENCODING: &[(u8, &str, char)] = &[
    (32, "space", ' '), (33, "exclam", '!'), (34, "quotedbl", '"'),
    (35, "numbersign", '#'), (36, "dollar", '$'), (37, "percent", '%'),
    (38, "ampersand", '&'), (39, "quoteright", '\u{2019}'), (40, "parenleft", '('),
    (41, "parenright", ')'), (42, "asterisk", '*'), (43, "plus", '+'),
    (44, "comma", ','), (45, "hyphen", '-'), (46, "period", '.'),
    (47, "slash", '/'), (58, "colon", ':'), (59, "semicolon", ';'),
    (60, "less", '<'), (61, "equal", '='), (62, "greater", '>'),
    (63, "question", '?'), (64, "at", '@'), (91, "bracketleft", '['),
    (92, "backslash", '\\'), (93, "bracketright", ']'), (94, "asciicircum", '^'),
    (95, "underscore", '_'), (96, "quoteleft", '\u{2018}'), (123, "braceleft", '{'),
    (124, "bar", '|'), (125, "braceright", '}'), (126, "asciitilde", '~'),
    (161, "exclamdown", '\u{A1}'), (162, "cent", '\u{A2}'), (163, "sterling", '\u{A3}'),
    (164, "fraction", '\u{2044}'), (165, "yen", '\u{A5}'), (166, "florin", '\u{0192}'),
    (167, "section", '\u{A7}'), (168, "currency", '\u{A4}'), (169, "quotesingle", '\''),
    (170, "quotedblleft", '\u{201C}'), (171, "guillemotleft", '\u{AB}'),
    (172, "guilsinglleft", '\u{2039}'), (173, "guilsinglright", '\u{203A}'),
    (174, "fi", '\u{FB01}'), (175, "fl", '\u{FB02}'), (177, "endash", '\u{2013}'),
    (178, "dagger", '\u{2020}'), (179, "daggerdbl", '\u{2021}'),
    (180, "periodcentered", '\u{B7}'), (182, "paragraph", '\u{B6}'),
    (183, "bullet", '\u{2022}'), (184, "quotesinglbase", '\u{201A}'),
    (185, "quotedblbase", '\u{201E}'), (186, "quotedblright", '\u{201D}'),
    (187, "guillemotright", '\u{BB}'), (188, "ellipsis", '\u{2026}'),
    (189, "perthousand", '\u{2030}'), (191, "questiondown", '\u{BF}'),
    (193, "grave", '`'), (194, "acute", '\u{B4}'), (195, "circumflex", '\u{02C6}'),
    (196, "tilde", '\u{02DC}'), (197, "macron", '\u{AF}'), (198, "breve", '\u{02D8}'),
    (199, "dotaccent", '\u{02D9}'), (200, "dieresis", '\u{A8}'), (202, "ring", '\u{02DA}'),
    (203, "cedilla", '\u{B8}'), (205, "hungarumlaut", '\u{02DD}'), (206, "ogonek", '\u{02DB}'),
    (207, "caron", '\u{02C7}'), (208, "emdash", '\u{2014}'), (225, "AE", '\u{C6}'),
    (227, "ordfeminine", '\u{AA}'), (232, "Lslash", '\u{0141}'), (233, "Oslash", '\u{D8}'),
    (234, "OE", '\u{0152}'), (235, "ordmasculine", '\u{BA}'), (241, "ae", '\u{E6}'),
    (245, "dotlessi", '\u{0131}'), (248, "lslash", '\u{0142}'), (249, "oslash", '\u{F8}'),
    (250, "oe", '\u{0153}'), (251, "germandbls", '\u{DF}'),
];

const DIGIT_NAMES: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

/// Glyph name StandardEncoding assigns to `code`.
pub fn standard_glyph_name(code: u8) -> Option<String> {
    match code {
        b'0'..=b'9' => Some(DIGIT_NAMES[(code - b'0') as usize].to_string()),
        b'A'..=b'Z' | b'a'..=b'z' => Some((code as char).to_string()),
        _ => STANDARD_ENCODING
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, name, _)| name.to_string()),
    }
}

/// Best-effort Unicode value for a glyph name: StandardEncoding names,
/// `uniXXXX`, `uXXXX[XX]`, single ASCII letters.
pub fn glyph_name_to_unicode(name: &str) -> Option<char> {
    if let Some(pos) = DIGIT_NAMES.iter().position(|d| *d == name) {
        return char::from_digit(pos as u32, 10);
    }
    if name.len() == 1 && name.as_bytes()[0].is_ascii_alphabetic() {
        return name.chars().next();
    }
    if let Some((_, _, ch)) = STANDARD_ENCODING.iter().find(|(_, n, _)| *n == name) {
        return Some(*ch);
    }
    let hex = name
        .strip_prefix("uni")
        .filter(|h| h.len() == 4)
        .or_else(|| name.strip_prefix('u').filter(|h| (4..=6).contains(&h.len())))?;
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// A code → (character, glyph name) table with a name.
#[derive(Debug, Clone)]
pub struct SingleByteEncoding {
    name: String,
    chars: Vec<Option<char>>,
    glyph_names: Vec<Option<String>>,
    codes: HashMap<char, u8>,
}

impl SingleByteEncoding {
    pub fn new(name: impl Into<String>, entries: impl IntoIterator<Item = (u8, Option<char>, Option<String>)>) -> Self {
        let mut chars = vec![None; 256];
        let mut glyph_names = vec![None; 256];
        let mut codes = HashMap::new();
        for (code, ch, glyph_name) in entries {
            if let Some(c) = ch {
                codes.entry(c).or_insert(code);
            }
            chars[code as usize] = ch;
            glyph_names[code as usize] = glyph_name;
        }
        SingleByteEncoding {
            name: name.into(),
            chars,
            glyph_names,
            codes,
        }
    }

    pub fn win_ansi() -> Self {
        let entries = (0x20u8..=0xFF).filter_map(|code| {
            let ch = match code {
                0x7F => None,
                0x80..=0x9F => WIN_ANSI_HIGH[(code - 0x80) as usize],
                _ => char::from_u32(code as u32),
            };
            ch.map(|c| (code, Some(c), None))
        });
        Self::new("WinAnsiEncoding", entries)
    }

    pub fn standard() -> Self {
        let entries = (0u8..=0xFF).filter_map(|code| {
            let name = standard_glyph_name(code)?;
            let ch = glyph_name_to_unicode(&name);
            Some((code, ch, Some(name)))
        });
        Self::new("StandardEncoding", entries)
    }

    /// An encoding taken from a font program's `dup <code> /<name> put` lines.
    pub fn from_glyph_names(name: impl Into<String>, names: &[(u8, String)]) -> Self {
        let entries = names
            .iter()
            .map(|(code, glyph)| (*code, glyph_name_to_unicode(glyph), Some(glyph.clone())));
        Self::new(name, entries)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_predefined(&self) -> bool {
        is_predefined_encoding(&self.name)
    }

    pub fn map_char(&self, ch: char) -> Option<u8> {
        self.codes.get(&ch).copied()
    }

    pub fn char_for(&self, code: u8) -> Option<char> {
        self.chars[code as usize]
    }

    pub fn glyph_name(&self, code: u8) -> Option<&str> {
        self.glyph_names[code as usize].as_deref()
    }

    /// `/Differences` runs: consecutive coded glyph names starting at a code.
    pub fn differences(&self) -> Vec<(u8, Vec<String>)> {
        let mut runs: Vec<(u8, Vec<String>)> = Vec::new();
        let mut expected: Option<usize> = None;
        for (code, name) in self.glyph_names.iter().enumerate() {
            let Some(name) = name else {
                expected = None;
                continue;
            };
            match (expected, runs.last_mut()) {
                (Some(next), Some((_, names))) if next == code => names.push(name.clone()),
                _ => runs.push((code as u8, vec![name.clone()])),
            }
            expected = Some(code + 1);
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_ansi_round_trip_specials() {
        let enc = SingleByteEncoding::win_ansi();
        assert_eq!(enc.map_char('A'), Some(0x41));
        assert_eq!(enc.map_char('€'), Some(0x80));
        assert_eq!(enc.map_char('—'), Some(0x97));
        assert_eq!(enc.char_for(0x81), None);
        assert_eq!(enc.map_char('中'), None);
        assert!(enc.is_predefined());
    }

    #[test]
    fn test_standard_encoding_names() {
        assert_eq!(standard_glyph_name(b'7').as_deref(), Some("seven"));
        assert_eq!(standard_glyph_name(39).as_deref(), Some("quoteright"));
        assert_eq!(standard_glyph_name(0xE1).as_deref(), Some("AE"));
        assert_eq!(standard_glyph_name(0x7F), None);

        let enc = SingleByteEncoding::standard();
        assert!(!enc.is_predefined());
        assert_eq!(enc.map_char('\u{2019}'), Some(39));
        assert_eq!(enc.glyph_name(b'g'), Some("g"));
    }

    #[test]
    fn test_glyph_name_to_unicode() {
        assert_eq!(glyph_name_to_unicode("A"), Some('A'));
        assert_eq!(glyph_name_to_unicode("three"), Some('3'));
        assert_eq!(glyph_name_to_unicode("emdash"), Some('\u{2014}'));
        assert_eq!(glyph_name_to_unicode("uni263A"), Some('\u{263A}'));
        assert_eq!(glyph_name_to_unicode("u1F600"), Some('\u{1F600}'));
        assert_eq!(glyph_name_to_unicode("a20"), None);
    }

    #[test]
    fn test_differences_group_consecutive_codes() {
        let enc = SingleByteEncoding::from_glyph_names(
            "Custom",
            &[(65, "A".into()), (66, "B".into()), (70, "F".into())],
        );
        assert_eq!(
            enc.differences(),
            vec![(65, vec!["A".to_string(), "B".to_string()]), (70, vec!["F".to_string()])]
        );
    }
}
