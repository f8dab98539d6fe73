//! Character ↔ glyph mapping for CID-keyed fonts.
//!
//! The map is an ordered list of [`CMapSegment`]s, each an affine run of
//! code points onto glyph indices. Forward lookups go through a small cache
//! for the first 256 code points. Reverse lookups invert the segments.
//!
//! Glyphs with no code point of their own (ligatures, contextual forms) can
//! be given one on demand from the private-use area `[0xE000, 0xF900)`, so
//! that text extraction still has something to report. The allocation
//! cursor belongs to one font, only moves forward, and is never reclaimed.
//! Once it reaches the end of the range, further glyphs stay unmapped: the
//! caller gets `None` and the glyph is counted in [`PrivateUseStats`].
//! Running out is logged but never fails the document.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Mutex, RwLock};

/// First code point handed out for synthesized mappings.
pub const PRIVATE_USE_START: u32 = 0xE000;
/// End (exclusive) of the synthesized range.
pub const PRIVATE_USE_END: u32 = 0xF900;

const CACHE_SIZE: usize = 256;

/// A run of consecutive code points mapped onto consecutive glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CMapSegment {
    pub unicode_start: u32,
    pub unicode_end: u32,
    pub glyph_start: u16,
}

impl CMapSegment {
    pub fn new(unicode_start: u32, unicode_end: u32, glyph_start: u16) -> Self {
        CMapSegment {
            unicode_start,
            unicode_end,
            glyph_start,
        }
    }

    fn glyph_end(&self) -> u32 {
        self.glyph_start as u32 + (self.unicode_end - self.unicode_start)
    }

    fn glyph_for(&self, c: u32) -> Option<u16> {
        if c < self.unicode_start || c > self.unicode_end {
            return None;
        }
        u16::try_from(self.glyph_start as u32 + (c - self.unicode_start)).ok()
    }

    fn char_for(&self, glyph: u16) -> Option<u32> {
        let g = glyph as u32;
        if g < self.glyph_start as u32 || g > self.glyph_end() {
            return None;
        }
        Some(self.unicode_start + (g - self.glyph_start as u32))
    }
}

/// Snapshot of the private-use bookkeeping for one font.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrivateUseStats {
    pub mapped: usize,
    pub first_private: Option<u32>,
    pub last_private: Option<u32>,
    pub unmapped: usize,
    pub first_unmapped: Option<u16>,
    pub last_unmapped: Option<u16>,
}

#[derive(Debug)]
struct PrivateUseState {
    next: u32,
    stats: PrivateUseStats,
}

/// Segment table with a forward cache and on-demand private-use mappings.
///
/// Shared references are enough for every operation, including synthesis,
/// so one map can serve several typesetting threads.
#[derive(Debug)]
pub struct CharGlyphMap {
    font_name: String,
    segments: RwLock<Vec<CMapSegment>>,
    /// Glyph for code points below 256; 0 means "not cached yet".
    cache: [AtomicU16; CACHE_SIZE],
    private_use: Mutex<PrivateUseState>,
}

impl CharGlyphMap {
    pub fn new(font_name: impl Into<String>, segments: Vec<CMapSegment>) -> Self {
        CharGlyphMap {
            font_name: font_name.into(),
            segments: RwLock::new(segments),
            cache: std::array::from_fn(|_| AtomicU16::new(0)),
            private_use: Mutex::new(PrivateUseState {
                next: PRIVATE_USE_START,
                stats: PrivateUseStats::default(),
            }),
        }
    }

    /// Builds segments from `(code point, glyph)` pairs, coalescing runs
    /// where both sides advance by one. Later duplicates of a code point
    /// and mappings to glyph 0 are ignored.
    pub fn from_pairs(font_name: impl Into<String>, pairs: impl IntoIterator<Item = (u32, u16)>) -> Self {
        let mut sorted: BTreeMap<u32, u16> = BTreeMap::new();
        for (c, g) in pairs {
            if g != 0 {
                sorted.entry(c).or_insert(g);
            }
        }

        let mut segments: Vec<CMapSegment> = Vec::new();
        for (c, g) in sorted {
            if let Some(last) = segments.last_mut() {
                if last.unicode_end + 1 == c && last.glyph_end() + 1 == g as u32 {
                    last.unicode_end = c;
                    continue;
                }
            }
            segments.push(CMapSegment::new(c, c, g));
        }
        Self::new(font_name, segments)
    }

    pub fn font_name(&self) -> &str {
        &self.font_name
    }

    /// Glyph index for a code point, if the font maps it.
    pub fn find_glyph_index(&self, c: u32) -> Option<u16> {
        let cached = (c as usize) < CACHE_SIZE;
        if cached {
            let g = self.cache[c as usize].load(Ordering::Relaxed);
            if g != 0 {
                return Some(g);
            }
        }

        let glyph = self
            .read_segments()
            .iter()
            .find_map(|segment| segment.glyph_for(c))?;
        if cached && glyph != 0 {
            self.cache[c as usize].store(glyph, Ordering::Relaxed);
        }
        Some(glyph)
    }

    /// Code point for a glyph. With `augment`, a glyph the segments don't
    /// reach is given a private-use code point if any are left.
    pub fn find_char_from_glyph(&self, glyph: u16, augment: bool) -> Option<u32> {
        if let Some(c) = self.reverse_scan(glyph) {
            return Some(c);
        }
        if !augment {
            return None;
        }
        self.create_private_use_mapping(glyph)
    }

    fn reverse_scan(&self, glyph: u16) -> Option<u32> {
        self.read_segments()
            .iter()
            .find_map(|segment| segment.char_for(glyph))
    }

    fn create_private_use_mapping(&self, glyph: u16) -> Option<u32> {
        let mut state = self
            .private_use
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Another caller may have mapped this glyph while we waited.
        if let Some(c) = self.reverse_scan(glyph) {
            return Some(c);
        }

        while state.next < PRIVATE_USE_END && self.find_glyph_index(state.next).is_some() {
            state.next += 1;
        }

        if state.next < PRIVATE_USE_END {
            let pu = state.next;
            self.write_segments().push(CMapSegment::new(pu, pu, glyph));
            state.next += 1;

            let stats = &mut state.stats;
            stats.first_private.get_or_insert(pu);
            stats.last_private = Some(pu);
            stats.mapped += 1;
            log::debug!(
                "Mapped glyph index {} to private use code point U+{:04X} in font '{}'",
                glyph,
                pu,
                self.font_name
            );
            Some(pu)
        } else {
            let stats = &mut state.stats;
            stats.first_unmapped.get_or_insert(glyph);
            stats.last_unmapped = Some(glyph);
            stats.unmapped += 1;
            log::warn!(
                "Exhausted private use area: unable to map {} glyphs in glyph index range [{}, {}] (reduced text extraction fidelity) in font '{}'",
                stats.unmapped,
                stats.first_unmapped.unwrap_or(glyph),
                glyph,
                self.font_name
            );
            None
        }
    }

    /// Copy of the current segments, synthesized ones included.
    pub fn segments(&self) -> Vec<CMapSegment> {
        self.read_segments().clone()
    }

    pub fn private_use_stats(&self) -> PrivateUseStats {
        self.private_use
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .stats
    }

    /// Glyphs 0, 1, 2 plus every glyph some segment reaches.
    pub fn glyph_indices(&self) -> BTreeSet<u16> {
        let mut indices: BTreeSet<u16> = [0, 1, 2].into_iter().collect();
        for segment in self.read_segments().iter() {
            for c in segment.unicode_start..=segment.unicode_end {
                if let Some(g) = segment.glyph_for(c) {
                    indices.insert(g);
                }
            }
        }
        indices
    }

    /// First character for each mapped glyph.
    pub fn chars_by_glyph(&self) -> BTreeMap<u16, char> {
        let mut chars = BTreeMap::new();
        for segment in self.read_segments().iter() {
            for c in segment.unicode_start..=segment.unicode_end {
                if let (Some(g), Some(ch)) = (segment.glyph_for(c), char::from_u32(c)) {
                    chars.entry(g).or_insert(ch);
                }
            }
        }
        chars
    }

    fn read_segments(&self) -> std::sync::RwLockReadGuard<'_, Vec<CMapSegment>> {
        self.segments
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_segments(&self) -> std::sync::RwLockWriteGuard<'_, Vec<CMapSegment>> {
        self.segments
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clone for CharGlyphMap {
    fn clone(&self) -> Self {
        let state = self
            .private_use
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        CharGlyphMap {
            font_name: self.font_name.clone(),
            segments: RwLock::new(self.segments()),
            cache: std::array::from_fn(|i| AtomicU16::new(self.cache[i].load(Ordering::Relaxed))),
            private_use: Mutex::new(PrivateUseState {
                next: state.next,
                stats: state.stats,
            }),
        }
    }
}
