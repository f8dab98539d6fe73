//! # TrueType Subsetter
//!
//! Rebuilds a glyf-flavored font with only the glyphs a CID set uses, in
//! the CID set's own order, so the new glyph index of every glyph equals
//! the CID written in content streams (`/CIDToGIDMap /Identity`).
//!
//! Composite glyphs drag their components along. Components that were not
//! already in the set are appended after the requested glyphs and reported
//! back, so the caller can record them in the CID set too.

use std::collections::{BTreeMap, HashMap, HashSet};

/// A subset TrueType program.
#[derive(Debug, Clone)]
pub struct TrueTypeSubset {
    pub data: Vec<u8>,
    /// Original glyphs appended because a composite needs them, in their
    /// new order after the requested glyphs.
    pub added: Vec<u16>,
}

/// Subset `data` (face `index` for collections) to `order`, where
/// `order[i]` is the original glyph that becomes glyph `i`. `chars` maps
/// new glyph indices to characters for the subset's cmap.
pub fn subset_truetype(
    data: &[u8],
    index: u32,
    order: &[u16],
    chars: &BTreeMap<u16, char>,
    font_name: &str,
) -> Result<TrueTypeSubset, String> {
    let font = font_offset(data, index)?;

    let head = find_table(data, font, b"head").ok_or("Missing head table")?;
    let hhea = find_table(data, font, b"hhea").ok_or("Missing hhea table")?;
    let maxp = find_table(data, font, b"maxp").ok_or("Missing maxp table")?;
    let hmtx = find_table(data, font, b"hmtx").ok_or("Missing hmtx table")?;
    let glyf = find_table(data, font, b"glyf").ok_or("Missing glyf table")?;
    let loca = find_table(data, font, b"loca").ok_or("Missing loca table")?;
    if head.len() < 54 || hhea.len() < 36 || maxp.len() < 6 {
        return Err("Truncated head, hhea or maxp table".to_string());
    }

    let num_glyphs = read_u16(maxp, 4);
    let loca_offsets = parse_loca(loca, read_i16(head, 50), num_glyphs);

    // Keep order; the first occurrence of a glyph wins.
    let mut glyphs: Vec<u16> = Vec::with_capacity(order.len());
    let mut seen: HashSet<u16> = HashSet::new();
    for &gid in order {
        if seen.insert(gid) {
            glyphs.push(gid);
        }
    }
    let requested = glyphs.len();

    let mut i = 0;
    while i < glyphs.len() {
        for component in composite_components(glyf, &loca_offsets, glyphs[i]) {
            if seen.insert(component) {
                glyphs.push(component);
            }
        }
        i += 1;
    }
    let added = glyphs[requested..].to_vec();

    let remap: HashMap<u16, u16> = glyphs
        .iter()
        .enumerate()
        .map(|(new, &old)| (old, new as u16))
        .collect();

    let (new_glyf, new_offsets) = rebuild_glyf(glyf, &loca_offsets, &glyphs, &remap);
    let loca_format: i16 = if new_glyf.len() > 0x1FFFE { 1 } else { 0 };
    let new_loca = build_loca(&new_offsets, loca_format);
    let new_hmtx = rebuild_hmtx(hmtx, &glyphs, read_u16(hhea, 34) as usize);

    let cmap_entries: Vec<(u16, u16)> = chars
        .iter()
        .filter_map(|(&gid, &ch)| u16::try_from(ch as u32).ok().map(|code| (code, gid)))
        .filter(|&(code, _)| code != 0xFFFF)
        .collect();

    let mut tables: Vec<(u32, Vec<u8>)> = vec![
        (tag_u32(b"cmap"), build_cmap_format4(&cmap_entries)),
        (tag_u32(b"glyf"), new_glyf),
        (tag_u32(b"head"), rebuild_head(head, loca_format)),
        (tag_u32(b"hhea"), rebuild_hhea(hhea, glyphs.len() as u16)),
        (tag_u32(b"hmtx"), new_hmtx),
        (tag_u32(b"loca"), new_loca),
        (tag_u32(b"maxp"), rebuild_maxp(maxp, glyphs.len() as u16)),
        (
            tag_u32(b"name"),
            find_table(data, font, b"name")
                .map(<[u8]>::to_vec)
                .unwrap_or_else(|| build_minimal_name(font_name)),
        ),
        (tag_u32(b"post"), build_post_format3(find_table(data, font, b"post"))),
    ];
    // Hinting and OS/2 go through untouched.
    for tag in [b"OS/2", b"cvt ", b"fpgm", b"prep"] {
        if let Some(table) = find_table(data, font, tag) {
            tables.push((tag_u32(tag), table.to_vec()));
        }
    }
    tables.sort_by_key(|(tag, _)| *tag);

    Ok(TrueTypeSubset {
        data: write_ttf_file(&mut tables),
        added,
    })
}

// ─── Table Locating ─────────────────────────────────────────────

/// Offset of the table directory for face `index`; collections (`ttcf`)
/// list one per face.
pub(crate) fn font_offset(data: &[u8], index: u32) -> Result<usize, String> {
    if data.len() < 12 {
        return Err("Font data too short".to_string());
    }
    if &data[0..4] != b"ttcf" {
        return Ok(0);
    }
    let num_fonts = read_u32(data, 8);
    if index >= num_fonts {
        return Err(format!("Collection has {} faces, requested face {}", num_fonts, index));
    }
    let entry = 12 + index as usize * 4;
    if entry + 4 > data.len() {
        return Err("Truncated collection header".to_string());
    }
    Ok(read_u32(data, entry) as usize)
}

pub(crate) fn find_table<'a>(data: &'a [u8], font: usize, tag: &[u8; 4]) -> Option<&'a [u8]> {
    if font + 12 > data.len() {
        return None;
    }
    let num_tables = read_u16(data, font + 4) as usize;
    (0..num_tables)
        .map(|i| font + 12 + i * 16)
        .take_while(|&record| record + 16 <= data.len())
        .find(|&record| &data[record..record + 4] == tag)
        .and_then(|record| {
            let offset = read_u32(data, record + 8) as usize;
            let length = read_u32(data, record + 12) as usize;
            data.get(offset..offset.checked_add(length)?)
        })
}

// ─── Glyph Outlines ─────────────────────────────────────────────

fn parse_loca(data: &[u8], format: i16, num_glyphs: u16) -> Vec<u32> {
    let entry_size = if format == 0 { 2 } else { 4 };
    let mut offsets: Vec<u32> = Vec::with_capacity(num_glyphs as usize + 1);
    for i in 0..=num_glyphs as usize {
        let pos = i * entry_size;
        let offset = if pos + entry_size > data.len() {
            offsets.last().copied().unwrap_or(0)
        } else if format == 0 {
            read_u16(data, pos) as u32 * 2
        } else {
            read_u32(data, pos)
        };
        offsets.push(offset);
    }
    offsets
}

fn glyph_data<'a>(glyf: &'a [u8], loca: &[u32], gid: u16) -> Option<&'a [u8]> {
    let idx = gid as usize;
    let start = *loca.get(idx)? as usize;
    let end = (*loca.get(idx + 1)? as usize).min(glyf.len());
    if start >= end {
        return None;
    }
    Some(&glyf[start..end])
}

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// Byte offsets of the glyph-index field of each component record.
fn component_offsets(glyph: &[u8]) -> Vec<usize> {
    let mut offsets = Vec::new();
    if glyph.len() < 10 || read_i16(glyph, 0) >= 0 {
        return offsets;
    }
    let mut pos = 10;
    while pos + 4 <= glyph.len() {
        let flags = read_u16(glyph, pos);
        offsets.push(pos + 2);
        pos += 4;
        pos += if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            pos += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            pos += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            pos += 8;
        }
        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    offsets
}

fn composite_components(glyf: &[u8], loca: &[u32], gid: u16) -> Vec<u16> {
    glyph_data(glyf, loca, gid)
        .map(|glyph| {
            component_offsets(glyph)
                .into_iter()
                .map(|offset| read_u16(glyph, offset))
                .collect()
        })
        .unwrap_or_default()
}

fn rebuild_glyf(glyf: &[u8], loca: &[u32], glyphs: &[u16], remap: &HashMap<u16, u16>) -> (Vec<u8>, Vec<u32>) {
    let mut new_glyf: Vec<u8> = Vec::new();
    let mut offsets: Vec<u32> = Vec::with_capacity(glyphs.len() + 1);

    for &gid in glyphs {
        offsets.push(new_glyf.len() as u32);
        let Some(glyph) = glyph_data(glyf, loca, gid) else {
            continue;
        };
        let mut glyph = glyph.to_vec();
        for offset in component_offsets(&glyph) {
            if let Some(&new_gid) = remap.get(&read_u16(&glyph, offset)) {
                write_u16(&mut glyph, offset, new_gid);
            }
        }
        new_glyf.extend_from_slice(&glyph);
        while new_glyf.len() % 4 != 0 {
            new_glyf.push(0);
        }
    }
    offsets.push(new_glyf.len() as u32);

    (new_glyf, offsets)
}

fn build_loca(offsets: &[u32], format: i16) -> Vec<u8> {
    if format == 0 {
        offsets.iter().flat_map(|&o| ((o / 2) as u16).to_be_bytes()).collect()
    } else {
        offsets.iter().flat_map(|&o| o.to_be_bytes()).collect()
    }
}

// ─── Metrics and Headers ────────────────────────────────────────

/// Every output glyph gets a full longHorMetric.
fn rebuild_hmtx(hmtx: &[u8], glyphs: &[u16], num_h_metrics: usize) -> Vec<u8> {
    let slice2 = |offset: usize| -> [u8; 2] {
        hmtx.get(offset..offset + 2)
            .map(|b| [b[0], b[1]])
            .unwrap_or([0, 0])
    };
    let mut data = Vec::with_capacity(glyphs.len() * 4);
    for &gid in glyphs {
        let idx = gid as usize;
        let (advance, lsb) = if idx < num_h_metrics {
            (slice2(idx * 4), slice2(idx * 4 + 2))
        } else {
            let last = num_h_metrics.saturating_sub(1) * 4;
            (slice2(last), slice2(num_h_metrics * 4 + (idx - num_h_metrics) * 2))
        };
        data.extend_from_slice(&advance);
        data.extend_from_slice(&lsb);
    }
    data
}

fn rebuild_head(head: &[u8], loca_format: i16) -> Vec<u8> {
    let mut new_head = head.to_vec();
    write_u32(&mut new_head, 8, 0); // checkSumAdjustment, fixed up once the file is assembled
    write_i16(&mut new_head, 50, loca_format);
    new_head
}

fn rebuild_hhea(hhea: &[u8], num_glyphs: u16) -> Vec<u8> {
    let mut new_hhea = hhea.to_vec();
    write_u16(&mut new_hhea, 34, num_glyphs);
    new_hhea
}

/// Keeps the original maxima (they still bound the subset) and replaces
/// the glyph count.
fn rebuild_maxp(maxp: &[u8], num_glyphs: u16) -> Vec<u8> {
    let mut new_maxp = maxp.to_vec();
    write_u16(&mut new_maxp, 4, num_glyphs);
    new_maxp
}

/// Version 3.0: no glyph names. Italic angle, underline metrics and
/// fixed-pitch flag are carried over when the original has them.
fn build_post_format3(original: Option<&[u8]>) -> Vec<u8> {
    let mut data = vec![0u8; 32];
    if let Some(post) = original.filter(|p| p.len() >= 16) {
        data[4..16].copy_from_slice(&post[4..16]);
    }
    write_u32(&mut data, 0, 0x00030000);
    data
}

fn build_minimal_name(font_name: &str) -> Vec<u8> {
    let name_bytes: Vec<u8> = font_name.encode_utf16().flat_map(|c| c.to_be_bytes()).collect();

    let mut data = Vec::new();
    data.extend_from_slice(&0u16.to_be_bytes()); // format
    data.extend_from_slice(&1u16.to_be_bytes()); // count
    data.extend_from_slice(&18u16.to_be_bytes()); // stringOffset: header + one record
    // platform 3, encoding 1, en-US, nameID 6 (PostScript name)
    for field in [3u16, 1, 0x0409, 6, name_bytes.len() as u16, 0] {
        data.extend_from_slice(&field.to_be_bytes());
    }
    data.extend_from_slice(&name_bytes);
    data
}

// ─── Character Map ──────────────────────────────────────────────

/// A (3, 1) cmap with one format 4 subtable. Runs where both the code and
/// the glyph advance by one use idDelta; other runs index glyphIdArray.
fn build_cmap_format4(char_to_gid: &[(u16, u16)]) -> Vec<u8> {
    let mut sorted = char_to_gid.to_vec();
    sorted.sort_by_key(|(code, _)| *code);
    sorted.dedup_by_key(|(code, _)| *code);

    // (start, end, glyphs)
    let mut segments: Vec<(u16, u16, Vec<u16>)> = Vec::new();
    for &(code, gid) in &sorted {
        match segments.last_mut() {
            Some(last) if last.1 + 1 == code => {
                last.1 = code;
                last.2.push(gid);
            }
            _ => segments.push((code, code, vec![gid])),
        }
    }
    segments.push((0xFFFF, 0xFFFF, vec![0]));

    let seg_count = segments.len() as u16;
    let entry_selector = 15 - seg_count.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 2;
    let range_shift = (seg_count * 2).saturating_sub(search_range);

    let mut end_codes = Vec::new();
    let mut start_codes = Vec::new();
    let mut id_deltas: Vec<u16> = Vec::new();
    let mut id_range_offsets: Vec<u16> = Vec::new();
    let mut glyph_id_array: Vec<u16> = Vec::new();

    for (i, (start, end, gids)) in segments.iter().enumerate() {
        start_codes.push(*start);
        end_codes.push(*end);
        let sequential = gids.windows(2).all(|w| w[1] == w[0].wrapping_add(1));
        if *start == 0xFFFF {
            id_deltas.push(1);
            id_range_offsets.push(0);
        } else if sequential {
            id_deltas.push(gids[0].wrapping_sub(*start));
            id_range_offsets.push(0);
        } else {
            id_deltas.push(0);
            let remaining = segments.len() - i;
            id_range_offsets.push(((remaining + glyph_id_array.len()) * 2) as u16);
            glyph_id_array.extend_from_slice(gids);
        }
    }

    let length = 16 + seg_count as usize * 8 + glyph_id_array.len() * 2;
    let mut cmap: Vec<u8> = Vec::with_capacity(12 + length);
    for field in [0u16, 1, 3, 1] {
        cmap.extend_from_slice(&field.to_be_bytes()); // version, numTables, platform, encoding
    }
    cmap.extend_from_slice(&12u32.to_be_bytes());

    for field in [4u16, length as u16, 0, seg_count * 2, search_range, entry_selector, range_shift] {
        cmap.extend_from_slice(&field.to_be_bytes());
    }
    end_codes.iter().for_each(|v| cmap.extend_from_slice(&v.to_be_bytes()));
    cmap.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
    start_codes.iter().for_each(|v| cmap.extend_from_slice(&v.to_be_bytes()));
    id_deltas.iter().for_each(|v| cmap.extend_from_slice(&v.to_be_bytes()));
    id_range_offsets.iter().for_each(|v| cmap.extend_from_slice(&v.to_be_bytes()));
    glyph_id_array.iter().for_each(|v| cmap.extend_from_slice(&v.to_be_bytes()));

    cmap
}

// ─── TrueType File Writer ───────────────────────────────────────

fn write_ttf_file(tables: &mut [(u32, Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = 15 - num_tables.max(1).leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = (num_tables * 16).saturating_sub(search_range);

    let mut output: Vec<u8> = Vec::new();
    output.extend_from_slice(&0x00010000u32.to_be_bytes());
    for field in [num_tables, search_range, entry_selector, range_shift] {
        output.extend_from_slice(&field.to_be_bytes());
    }

    for (_, data) in tables.iter_mut() {
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }

    let mut offset = 12 + tables.len() * 16;
    let mut head_offset = None;
    for (tag, data) in tables.iter() {
        if *tag == tag_u32(b"head") {
            head_offset = Some(offset);
        }
        output.extend_from_slice(&tag.to_be_bytes());
        output.extend_from_slice(&calc_table_checksum(data).to_be_bytes());
        output.extend_from_slice(&(offset as u32).to_be_bytes());
        output.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += data.len();
    }
    for (_, data) in tables.iter() {
        output.extend_from_slice(data);
    }

    // head's directory checksum stays the one taken with a zero adjustment.
    if let Some(head) = head_offset {
        let adjustment = 0xB1B0AFBAu32.wrapping_sub(calc_table_checksum(&output));
        write_u32(&mut output, head + 8, adjustment);
    }
    output
}

fn calc_table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

// ─── Byte Helpers ───────────────────────────────────────────────

pub(crate) fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([data[offset], data[offset + 1]])
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

fn write_u16(data: &mut [u8], offset: usize, val: u16) {
    data[offset..offset + 2].copy_from_slice(&val.to_be_bytes());
}

fn write_i16(data: &mut [u8], offset: usize, val: i16) {
    data[offset..offset + 2].copy_from_slice(&val.to_be_bytes());
}

fn write_u32(data: &mut [u8], offset: usize, val: u32) {
    data[offset..offset + 4].copy_from_slice(&val.to_be_bytes());
}

fn tag_u32(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

// ─── Tests ──────────────────────────────────────────────────────
