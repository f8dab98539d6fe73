//! # Folio
//!
//! The object-graph and font-embedding core of a PDF formatter.
//!
//! Everything written to the file is an indirect object with a number that
//! is handed out once and never reused. Objects that are structurally equal
//! (functions, shadings, patterns, links, destinations, go-to actions, file
//! specifications) are registered only once, however often they are
//! requested. Fonts collect the characters they are used for while content
//! is typeset and are written once, at the end, with their program embedded
//! in full or reduced to the used glyphs.
//!
//! ## Architecture
//!
//! ```text
//! content / layout (callers)
//!       ↓
//!   [font]        glyph maps, CID sets, encodings, loading, shaping
//!       ↓
//!   [font::subset]  TrueType / CFF / Type1 program reduction
//!       ↓
//!   [pdf]         factory → registry (numbering + dedup) → writer
//!       ↑
//!   [gradient]    multi-stop gradients, PDF or PostScript output
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use folio::config::DocumentConfig;
//! use folio::pdf::PdfDocument;
//!
//! let mut doc = PdfDocument::new(DocumentConfig::default());
//! let mut factory = doc.factory();
//! let pages = factory.make_pages();
//! let resources = factory.make_resources();
//! factory.make_root(pages);
//! let page = factory.make_page(resources, 595.0, 842.0)?;
//! factory.make_content_stream(page, b"BT /F1 12 Tf 72 770 Td (Hello) Tj ET".to_vec())?;
//! let name = doc.fonts_mut().resolve("Helvetica", 400, false).resource_name.clone();
//! if let Some(entry) = doc.fonts_mut().get_mut(&name) {
//!     for c in "Hello".chars() {
//!         entry.font.map_char(c);
//!     }
//! }
//! let pdf = doc.close()?;
//! assert!(pdf.starts_with(b"%PDF-1.4"));
//! # Ok::<(), folio::FolioError>(())
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod gradient;
pub mod pdf;
pub mod resource;

pub use config::DocumentConfig;
pub use error::{FolioError, Result};
pub use pdf::{PdfDocument, PdfFactory};
