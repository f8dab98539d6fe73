//! Stream encoding applied when objects are written.

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::config::DocumentConfig;

pub trait StreamFilter {
    /// `/Filter` name, or `None` when the data is written as is.
    fn name(&self) -> Option<&'static str>;
    fn encode(&self, data: &[u8]) -> Vec<u8>;
}

/// zlib/deflate (`/FlateDecode`).
#[derive(Debug, Clone, Copy)]
pub struct FlateFilter {
    level: u8,
}

impl FlateFilter {
    pub fn new(level: u8) -> Self {
        FlateFilter { level: level.min(10) }
    }
}

impl StreamFilter for FlateFilter {
    fn name(&self) -> Option<&'static str> {
        Some("FlateDecode")
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        compress_to_vec_zlib(data, self.level)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IdentityFilter;

impl StreamFilter for IdentityFilter {
    fn name(&self) -> Option<&'static str> {
        None
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }
}

/// The filter the configuration asks for.
pub fn for_config(config: &DocumentConfig) -> Box<dyn StreamFilter> {
    if config.compress_streams {
        Box::new(FlateFilter::new(config.compression_level))
    } else {
        Box::new(IdentityFilter)
    }
}
