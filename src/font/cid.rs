//! Which glyphs of a CID-keyed font end up in the document, and under which
//! numbers.
//!
//! [`CidSet::Full`] keeps the original glyph space. [`CidSet::Subset`]
//! renumbers glyphs in the order they are first used, with the three
//! reserved glyphs (`.notdef` and the two after it) pinned to 0, 1 and 2.

use std::collections::{BTreeMap, BTreeSet};

use super::glyph_map::CharGlyphMap;
use super::EmbeddingMode;

const RESERVED_GLYPHS: u16 = 3;

#[derive(Debug, Clone)]
pub enum CidSet {
    Full,
    Subset(CidSubset),
}

/// Used glyphs of a subset font.
#[derive(Debug, Clone)]
pub struct CidSubset {
    /// original glyph index → subset index
    used: BTreeMap<u16, u16>,
    /// subset index → original glyph index
    order: Vec<u16>,
    /// subset index → character it was first used for
    chars: Vec<Option<char>>,
}

impl Default for CidSubset {
    fn default() -> Self {
        let mut subset = CidSubset {
            used: BTreeMap::new(),
            order: Vec::new(),
            chars: Vec::new(),
        };
        for g in 0..RESERVED_GLYPHS {
            subset.push(g, None);
        }
        subset
    }
}

impl CidSubset {
    fn push(&mut self, glyph: u16, ch: Option<char>) -> u16 {
        let index = self.order.len() as u16;
        self.used.insert(glyph, index);
        self.order.push(glyph);
        self.chars.push(ch);
        index
    }

    fn map(&mut self, glyph: u16, ch: Option<char>) -> u16 {
        match self.used.get(&glyph) {
            Some(&index) => {
                let slot = &mut self.chars[index as usize];
                if slot.is_none() {
                    *slot = ch;
                }
                index
            }
            None => self.push(glyph, ch),
        }
    }
}

impl CidSet {
    /// `Full` for FULL embedding, `Subset` otherwise.
    pub fn for_mode(mode: EmbeddingMode) -> Self {
        match mode {
            EmbeddingMode::Full => CidSet::Full,
            EmbeddingMode::Auto | EmbeddingMode::Subset => CidSet::Subset(CidSubset::default()),
        }
    }

    pub fn is_subset(&self) -> bool {
        matches!(self, CidSet::Subset(_))
    }

    /// Records a use of `glyph` for `ch` and returns the index to write in
    /// content streams.
    pub fn map_glyph(&mut self, glyph: u16, ch: char) -> u16 {
        match self {
            CidSet::Full => glyph,
            CidSet::Subset(subset) => subset.map(glyph, Some(ch)),
        }
    }

    /// Records a glyph pulled in by another one (a composite component)
    /// without a character of its own.
    pub fn add_dependency(&mut self, glyph: u16) -> u16 {
        match self {
            CidSet::Full => glyph,
            CidSet::Subset(subset) => subset.map(glyph, None),
        }
    }

    /// Original glyph index behind an output index.
    pub fn original_glyph_index(&self, index: u16) -> u16 {
        match self {
            CidSet::Full => index,
            CidSet::Subset(subset) => subset.order.get(index as usize).copied().unwrap_or(0),
        }
    }

    /// Output index of an original glyph, if it is part of the set.
    pub fn glyph_index(&self, original: u16) -> Option<u16> {
        match self {
            CidSet::Full => Some(original),
            CidSet::Subset(subset) => subset.used.get(&original).copied(),
        }
    }

    /// Original glyph indices in output order. Empty for `Full`, whose
    /// program is embedded untouched.
    pub fn subset_order(&self) -> &[u16] {
        match self {
            CidSet::Full => &[],
            CidSet::Subset(subset) => &subset.order,
        }
    }

    /// original → output index for every glyph in the set.
    pub fn used_glyphs(&self, map: &CharGlyphMap) -> BTreeMap<u16, u16> {
        match self {
            CidSet::Full => map.glyph_indices().into_iter().map(|g| (g, g)).collect(),
            CidSet::Subset(subset) => subset.used.clone(),
        }
    }

    /// Original glyph indices in the set.
    pub fn glyph_indices(&self, map: &CharGlyphMap) -> BTreeSet<u16> {
        match self {
            CidSet::Full => map.glyph_indices(),
            CidSet::Subset(subset) => subset.used.keys().copied().collect(),
        }
    }

    /// output index → character, for the ToUnicode CMap.
    pub fn chars(&self, map: &CharGlyphMap) -> BTreeMap<u16, char> {
        match self {
            CidSet::Full => map.chars_by_glyph(),
            CidSet::Subset(subset) => subset
                .chars
                .iter()
                .enumerate()
                .filter_map(|(i, ch)| ch.map(|c| (i as u16, c)))
                .collect(),
        }
    }

    /// Number of output glyphs (the original count for `Full`).
    pub fn len(&self, num_glyphs: u16) -> usize {
        match self {
            CidSet::Full => num_glyphs as usize,
            CidSet::Subset(subset) => subset.order.len(),
        }
    }

    pub fn is_empty(&self, num_glyphs: u16) -> bool {
        self.len(num_glyphs) == 0
    }

    /// Widths indexed by output index, from widths indexed by original glyph.
    pub fn widths(&self, original_widths: &[i32]) -> Vec<i32> {
        let width_of = |g: u16| original_widths.get(g as usize).copied().unwrap_or(0);
        match self {
            CidSet::Full => original_widths.to_vec(),
            CidSet::Subset(subset) => subset.order.iter().map(|&g| width_of(g)).collect(),
        }
    }

    /// The CIDSet stream: one bit per original glyph index, most
    /// significant bit first, padded with zeros to a whole byte.
    pub fn bitmap(&self, map: &CharGlyphMap) -> Vec<u8> {
        let indices = self.glyph_indices(map);
        let Some(&max) = indices.iter().next_back() else {
            return Vec::new();
        };
        let mut bytes = vec![0u8; max as usize / 8 + 1];
        for g in indices {
            bytes[g as usize / 8] |= 0x80 >> (g % 8);
        }
        bytes
    }
}
