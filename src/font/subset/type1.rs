//! Type1 subsetting: drop every charstring the document doesn't use.
//!
//! Subroutines are kept whole. Accented glyphs built with `seac` keep their
//! base and accent glyphs.

use std::collections::BTreeSet;

use crate::font::encoding::standard_glyph_name;
use crate::font::type1::{encrypt, find, inspect_charstring, CharStrings, PfbSegments, Scanner, EEXEC_KEY};

/// Reduces a PFB program to `.notdef` plus `glyph_names` and renames the
/// font to `prefix` + its name.
pub fn subset_type1(data: &[u8], glyph_names: &BTreeSet<String>, prefix: &str) -> Result<PfbSegments, String> {
    let segments = PfbSegments::parse(data)?;
    let private = segments.private_dict();
    let charstrings = CharStrings::parse(&private)?;
    let len_iv = find(&private, b"/lenIV", 0)
        .and_then(|pos| Scanner::new(&private, pos + b"/lenIV".len()).number())
        .map(|n| n as usize)
        .unwrap_or(4);

    let mut keep: BTreeSet<String> = glyph_names.clone();
    keep.insert(".notdef".to_string());
    loop {
        let components: Vec<String> = charstrings
            .entries
            .iter()
            .filter(|e| keep.contains(&e.name))
            .filter_map(|e| inspect_charstring(&e.data, len_iv).seac)
            .flat_map(|(base, accent)| [standard_glyph_name(base), standard_glyph_name(accent)])
            .flatten()
            .filter(|name| !keep.contains(name))
            .collect();
        if components.is_empty() {
            break;
        }
        keep.extend(components);
    }

    let kept: Vec<_> = charstrings
        .entries
        .iter()
        .filter(|e| keep.contains(&e.name))
        .collect();
    for name in glyph_names {
        if !kept.iter().any(|e| &e.name == name) {
            log::warn!("Type1 font has no charstring for glyph /{}", name);
        }
    }

    let mut new_private = Vec::with_capacity(private.len());
    new_private.extend_from_slice(&private[..charstrings.count_span.0]);
    new_private.extend_from_slice(kept.len().to_string().as_bytes());
    new_private.extend_from_slice(&private[charstrings.count_span.1..charstrings.body_start]);
    new_private.push(b'\n');
    for entry in &kept {
        new_private.extend_from_slice(&private[entry.span.0..entry.span.1]);
        new_private.push(b'\n');
    }
    new_private.extend_from_slice(&private[charstrings.body_end..]);

    Ok(PfbSegments {
        cleartext: rename_font(&segments.cleartext, prefix),
        binary: encrypt(&new_private, EEXEC_KEY),
        trailer: segments.trailer,
    })
}

/// Prefixes the name after `/FontName`.
fn rename_font(cleartext: &[u8], prefix: &str) -> Vec<u8> {
    let Some(key) = find(cleartext, b"/FontName", 0) else {
        return cleartext.to_vec();
    };
    let Some(slash) = find(cleartext, b"/", key + 1) else {
        return cleartext.to_vec();
    };
    let mut out = Vec::with_capacity(cleartext.len() + prefix.len());
    out.extend_from_slice(&cleartext[..=slash]);
    out.extend_from_slice(prefix.as_bytes());
    out.extend_from_slice(&cleartext[slash + 1..]);
    out
}
