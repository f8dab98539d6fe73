//! # Object Factory
//!
//! Creates document objects and links them into the structures that point
//! at them. Kinds that can be shared go through the registry's dedup
//! tables; everything else gets a fresh number.
//!
//! External link targets are classified the way a formatter sees them:
//!
//! | target                      | action                                  |
//! |-----------------------------|-----------------------------------------|
//! | `embedded-file:name`        | JavaScript opening the attachment       |
//! | `http://`, `https://`       | URI                                     |
//! | `file://path`               | Launch of a file specification          |
//! | `doc.pdf`                   | GoToR, first page                       |
//! | `doc.pdf#page=3`            | GoToR, page index                       |
//! | `doc.pdf#dest=chapter1`     | GoToR, named destination                |
//! | anything else               | URI                                     |

use std::collections::BTreeMap;

use super::cmap::{build_tounicode_cmap, build_w_array, CodeWidth};
use super::document::PdfDocument;
use super::object::{
    nums, Action, Catalog, Destination, Dict, Encoding, FileSpec, Function, GoTo, GoToRemote, Info, Launch,
    Link, NameTreeNode, Names, Num, ObjRef, Outline, Page, PageLabel, PageLabels, Pages, Pattern, PdfObject,
    PdfValue, RemoteTarget, Resources, Shading, Stream,
};
use super::PdfVersion;
use crate::error::{FolioError, Result};
use crate::font::encoding::SingleByteEncoding;
use crate::font::subset::{embed_program, EmbeddedProgram};
use crate::font::{CidFont, CidFontType, EmbeddingMode, Font, FontMetrics, SimpleFont};
use crate::gradient::pdf::PdfGradientFactory;
use crate::gradient::GradientBuilder;

const EMBEDDED_FILE_PREFIX: &str = "embedded-file:";

/// A font file stream and the descriptor key that references it.
type FontFile = (&'static str, ObjRef);

pub struct PdfFactory<'a> {
    doc: &'a mut PdfDocument,
}

impl<'a> PdfFactory<'a> {
    pub fn new(doc: &'a mut PdfDocument) -> Self {
        PdfFactory { doc }
    }

    pub fn document(&self) -> &PdfDocument {
        self.doc
    }

    fn catalog_mut(&mut self) -> Option<&mut Catalog> {
        let root = self.doc.root?;
        match self.doc.registry.get_mut(root) {
            Some(PdfObject::Catalog(catalog)) => Some(catalog),
            _ => None,
        }
    }

    fn names_mut(&mut self) -> Option<&mut Names> {
        let names = self.doc.names?;
        match self.doc.registry.get_mut(names) {
            Some(PdfObject::Names(names)) => Some(names),
            _ => None,
        }
    }

    // ── Document structure ──────────────────────────────────────

    /// The catalog, linked to whichever of the names dictionary, page
    /// labels and outlines already exist.
    pub fn make_root(&mut self, pages: ObjRef) -> ObjRef {
        let catalog = Catalog {
            pages,
            names: self.doc.names,
            page_labels: self.doc.page_labels,
            outlines: self.doc.outlines,
        };
        let r = self.doc.registry.add_trailer_object(PdfObject::Catalog(catalog));
        self.doc.root = Some(r);
        r
    }

    pub fn make_pages(&mut self) -> ObjRef {
        let r = self.doc.registry.add_trailer_object(PdfObject::Pages(Pages::default()));
        self.doc.pages = Some(r);
        r
    }

    /// The shared resource dictionary. Fonts are added to it as they are
    /// made.
    pub fn make_resources(&mut self) -> ObjRef {
        let mut resources = Resources::default();
        for (name, &font) in &self.doc.font_objects {
            resources.fonts.insert(name.clone(), font);
        }
        let r = self.doc.registry.add_trailer_object(PdfObject::Resources(resources));
        self.doc.resources = Some(r);
        r
    }

    /// The info dictionary; the producer defaults to the configured one.
    pub fn make_info(&mut self, mut info: Info) -> ObjRef {
        if info.producer.is_none() {
            info.producer = Some(self.doc.config.producer.clone());
        }
        let r = self.doc.registry.register(PdfObject::Info(info));
        self.doc.info = Some(r);
        r
    }

    /// A page appended to the page tree.
    pub fn make_page(&mut self, resources: ObjRef, width: f64, height: f64) -> Result<ObjRef> {
        let pages = self.doc.pages.ok_or_else(|| FolioError::MissingStructure {
            structure: "page tree",
            detail: "make_pages must come before make_page".to_string(),
        })?;
        let page = self.doc.registry.register(PdfObject::Page(Page {
            parent: pages,
            media_box: [Num(0.0), Num(0.0), Num(width), Num(height)],
            resources,
            contents: Vec::new(),
            annots: Vec::new(),
        }));
        if let Some(PdfObject::Pages(tree)) = self.doc.registry.get_mut(pages) {
            tree.kids.push(page);
        }
        Ok(page)
    }

    fn page_mut(&mut self, page: ObjRef) -> Result<&mut Page> {
        match self.doc.registry.get_mut(page) {
            Some(PdfObject::Page(p)) => Ok(p),
            _ => Err(FolioError::MissingStructure {
                structure: "page",
                detail: format!("{} is not a page", page),
            }),
        }
    }

    /// A content stream appended to `page`'s contents.
    pub fn make_content_stream(&mut self, page: ObjRef, content: Vec<u8>) -> Result<ObjRef> {
        self.page_mut(page)?;
        let stream = self.make_stream(Dict::new(), content);
        self.page_mut(page)?.contents.push(stream);
        Ok(stream)
    }

    pub fn make_stream(&mut self, dict: Dict, data: Vec<u8>) -> ObjRef {
        self.doc.registry.register(PdfObject::Stream(Stream::new(dict, data)))
    }

    /// Adds an annotation to `page`, once.
    pub fn add_annotation(&mut self, page: ObjRef, annotation: ObjRef) -> Result<()> {
        let page = self.page_mut(page)?;
        if !page.annots.contains(&annotation) {
            page.annots.push(annotation);
        }
        Ok(())
    }

    // ── Functions, shadings, patterns ───────────────────────────

    pub fn make_exponential_function(
        &mut self,
        domain: &[f64],
        range: Option<&[f64]>,
        c0: &[f64],
        c1: &[f64],
        exponent: f64,
    ) -> ObjRef {
        self.doc.registry.find_or_register(PdfObject::Function(Function::Exponential {
            domain: nums(domain),
            range: range.map(nums),
            c0: nums(c0),
            c1: nums(c1),
            n: exponent.into(),
        }))
    }

    pub fn make_stitching_function(
        &mut self,
        domain: &[f64],
        range: Option<&[f64]>,
        functions: &[ObjRef],
        bounds: &[f64],
        encode: &[f64],
    ) -> ObjRef {
        self.doc.registry.find_or_register(PdfObject::Function(Function::Stitching {
            domain: nums(domain),
            range: range.map(nums),
            functions: functions.to_vec(),
            bounds: nums(bounds),
            encode: nums(encode),
        }))
    }

    /// A type 4 function; `code` is the PostScript calculator program
    /// including its outer braces.
    pub fn make_calculator_function(&mut self, domain: &[f64], range: &[f64], code: &str) -> ObjRef {
        self.doc.registry.find_or_register(PdfObject::Function(Function::Calculator {
            domain: nums(domain),
            range: nums(range),
            code: code.to_string(),
        }))
    }

    pub fn make_shading(&mut self, shading: Shading) -> ObjRef {
        self.doc.registry.find_or_register(PdfObject::Shading(shading))
    }

    pub fn make_pattern(&mut self, pattern: Pattern) -> ObjRef {
        self.doc.registry.find_or_register(PdfObject::Pattern(pattern))
    }

    /// Builds a multi-stop gradient and returns its pattern.
    pub fn make_gradient(&mut self, builder: &mut GradientBuilder) -> Result<ObjRef> {
        builder.build(&mut PdfGradientFactory::new(&mut self.doc.registry))
    }

    /// The resource name for `pattern` (`Pa1`, `Pa2`, ...).
    pub fn add_pattern_resource(&mut self, pattern: ObjRef) -> Result<String> {
        self.add_named_resource(pattern, "Pa", |res| &mut res.patterns)
    }

    /// The resource name for `shading` (`Sh1`, `Sh2`, ...).
    pub fn add_shading_resource(&mut self, shading: ObjRef) -> Result<String> {
        self.add_named_resource(shading, "Sh", |res| &mut res.shadings)
    }

    fn add_named_resource(
        &mut self,
        object: ObjRef,
        prefix: &str,
        select: fn(&mut Resources) -> &mut BTreeMap<String, ObjRef>,
    ) -> Result<String> {
        let missing = || FolioError::MissingStructure {
            structure: "resources",
            detail: format!("no resource dictionary to name {} in", object),
        };
        let resources = self.doc.resources.ok_or_else(missing)?;
        let Some(PdfObject::Resources(res)) = self.doc.registry.get_mut(resources) else {
            return Err(missing());
        };
        let table = select(res);
        if let Some((name, _)) = table.iter().find(|&(_, &r)| r == object) {
            return Ok(name.clone());
        }
        let name = format!("{}{}", prefix, table.len() + 1);
        table.insert(name.clone(), object);
        Ok(name)
    }

    // ── Names, destinations, page labels ────────────────────────

    /// A named destination. Equal name, page and position give the same
    /// object.
    pub fn make_destination(&mut self, name: &str, page: ObjRef, x: f64, y: f64) -> ObjRef {
        self.doc.registry.find_or_register(PdfObject::Destination(Destination {
            name: name.to_string(),
            page,
            x: x.into(),
            y: y.into(),
        }))
    }

    /// The catalog's names dictionary, created once.
    pub fn make_names(&mut self) -> ObjRef {
        if let Some(names) = self.doc.names {
            return names;
        }
        let r = self.doc.registry.add_trailer_object(PdfObject::Names(Names::default()));
        self.doc.names = Some(r);
        if let Some(catalog) = self.catalog_mut() {
            catalog.names = Some(r);
        }
        r
    }

    pub fn make_page_labels(&mut self) -> ObjRef {
        if let Some(labels) = self.doc.page_labels {
            return labels;
        }
        let r = self.doc.registry.add_trailer_object(PdfObject::PageLabels(PageLabels::default()));
        self.doc.page_labels = Some(r);
        if let Some(catalog) = self.catalog_mut() {
            catalog.page_labels = Some(r);
        }
        r
    }

    /// Starts a labelling range at zero-based `page_index`.
    pub fn add_page_label(&mut self, page_index: u32, label: PageLabel) -> Result<()> {
        let missing = || FolioError::MissingStructure {
            structure: "page labels",
            detail: format!("make_page_labels must come before labelling page {}", page_index),
        };
        let labels = self.doc.page_labels.ok_or_else(missing)?;
        match self.doc.registry.get_mut(labels) {
            Some(PdfObject::PageLabels(labels)) => {
                labels.nums.insert(page_index, label);
                Ok(())
            }
            _ => Err(missing()),
        }
    }

    /// An empty name tree node.
    pub fn make_name_tree_node(&mut self) -> ObjRef {
        self.doc.registry.register(PdfObject::NameTree(NameTreeNode::default()))
    }

    /// The `/Dests` name tree over `destinations`: one leaf per
    /// destination, sorted by name, under a root holding the kids. Set as
    /// the names dictionary's `/Dests` when that dictionary exists.
    pub fn make_dests(&mut self, destinations: &[ObjRef]) -> Result<ObjRef> {
        let mut entries = Vec::with_capacity(destinations.len());
        for &r in destinations {
            match self.doc.registry.get(r) {
                Some(PdfObject::Destination(dest)) => entries.push((dest.name.clone(), r)),
                _ => {
                    return Err(FolioError::MissingStructure {
                        structure: "destination",
                        detail: format!("{} is not a named destination", r),
                    })
                }
            }
        }
        if entries.is_empty() {
            return Err(FolioError::MissingStructure {
                structure: "destination",
                detail: "a /Dests tree needs at least one destination".to_string(),
            });
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.dedup_by(|a, b| a.0 == b.0);

        let kids = entries
            .into_iter()
            .map(|(name, dest)| {
                self.doc.registry.register(PdfObject::NameTree(NameTreeNode {
                    kids: Vec::new(),
                    limits: Some((name.clone(), name.clone())),
                    names: vec![(name, dest)],
                }))
            })
            .collect();
        let root = self.doc.registry.register(PdfObject::NameTree(NameTreeNode {
            kids,
            ..NameTreeNode::default()
        }));
        if let Some(names) = self.names_mut() {
            names.dests = Some(root);
        }
        Ok(root)
    }

    // ── Links and actions ───────────────────────────────────────

    /// A link annotation. Equal rectangles and actions share one object.
    pub fn make_link(&mut self, rect: [f64; 4], action: ObjRef) -> ObjRef {
        self.doc.registry.find_or_register(PdfObject::Link(Link {
            rect: rect.map(Into::into),
            action,
        }))
    }

    /// A link to a position on a page of this document.
    pub fn make_internal_link(&mut self, rect: [f64; 4], page: ObjRef, x: f64, y: f64) -> ObjRef {
        let goto = self.make_goto(page, x, y);
        self.make_link(rect, goto)
    }

    /// A link to `target`, classified as described in the module docs.
    pub fn make_external_link(&mut self, rect: [f64; 4], target: &str, new_window: bool) -> Result<ObjRef> {
        let action = self.external_action(target, new_window)?;
        Ok(self.make_link(rect, action))
    }

    /// A go-to action, shared between equal targets.
    pub fn make_goto(&mut self, page: ObjRef, x: f64, y: f64) -> ObjRef {
        self.doc.registry.find_or_add_trailer_object(PdfObject::Action(Action::GoTo(GoTo {
            page,
            x: x.into(),
            y: y.into(),
        })))
    }

    /// The action behind an external link target.
    pub fn external_action(&mut self, target: &str, new_window: bool) -> Result<ObjRef> {
        let target = target.trim();
        if let Some(filename) = target.strip_prefix(EMBEDDED_FILE_PREFIX) {
            return self.embedded_file_action(filename);
        }
        let lower = target.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(self.make_uri(target));
        }
        if lower.starts_with("file://") {
            return Ok(self.make_launch(&target["file://".len()..]));
        }
        if lower.ends_with(".pdf") {
            return Ok(self.make_goto_remote(target, RemoteTarget::Document, new_window));
        }
        if let Some(index) = lower.find(".pdf#page=").filter(|&i| i > 0) {
            let file = &target[..index + 4];
            let page = &target[index + ".pdf#page=".len()..];
            return Ok(match page.parse::<u32>() {
                Ok(page) => self.make_goto_remote(file, RemoteTarget::Page(page), new_window),
                Err(_) => {
                    log::warn!("Invalid page number '{}' in link target '{}'", page, target);
                    self.make_uri(target)
                }
            });
        }
        if let Some(index) = lower.find(".pdf#dest=").filter(|&i| i > 0) {
            let file = &target[..index + 4];
            let dest = &target[index + ".pdf#dest=".len()..];
            return Ok(self.make_goto_remote(file, RemoteTarget::Named(dest.to_string()), new_window));
        }
        Ok(self.make_uri(target))
    }

    fn make_uri(&mut self, uri: &str) -> ObjRef {
        self.doc.registry.register(PdfObject::Action(Action::Uri(uri.to_string())))
    }

    fn make_goto_remote(&mut self, file: &str, target: RemoteTarget, new_window: bool) -> ObjRef {
        let file = self.make_file_spec(file);
        self.doc.registry.find_or_register(PdfObject::Action(Action::GoToRemote(GoToRemote {
            file,
            target,
            new_window,
        })))
    }

    fn make_launch(&mut self, path: &str) -> ObjRef {
        let file = self.make_file_spec(path);
        self.doc.registry.find_or_register(PdfObject::Action(Action::Launch(Launch { file })))
    }

    /// A plain file specification naming `file`.
    pub fn make_file_spec(&mut self, file: &str) -> ObjRef {
        self.doc.registry.find_or_register(PdfObject::FileSpec(FileSpec {
            file: file.to_string(),
            embedded: None,
            description: None,
        }))
    }

    fn embedded_file_action(&mut self, filename: &str) -> Result<ObjRef> {
        let names = self.doc.names.ok_or_else(|| FolioError::MissingStructure {
            structure: "names dictionary",
            detail: format!("cannot link to embedded file '{}'", filename),
        })?;
        let tree = match self.doc.registry.get(names) {
            Some(PdfObject::Names(names)) => names.embedded_files,
            _ => None,
        }
        .ok_or_else(|| FolioError::MissingStructure {
            structure: "embedded files tree",
            detail: format!("cannot link to embedded file '{}'", filename),
        })?;
        let known = match self.doc.registry.get(tree) {
            Some(PdfObject::NameTree(node)) => node.names.iter().any(|(name, _)| name == filename),
            _ => false,
        };
        if !known {
            return Err(FolioError::MissingStructure {
                structure: "embedded file",
                detail: format!("no file named '{}' is embedded", filename),
            });
        }
        let script = format!(
            "this.exportDataObject({{cName:\"{}\", nLaunch:2}});",
            script_safe_name(filename)
        );
        Ok(self.doc.registry.register(PdfObject::Action(Action::JavaScript(script))))
    }

    /// Attaches `data` under `filename` in the `/EmbeddedFiles` tree,
    /// creating the tree on first use. Needs the names dictionary.
    pub fn add_embedded_file(&mut self, filename: &str, data: Vec<u8>, description: Option<&str>) -> Result<ObjRef> {
        if self.doc.names.is_none() {
            return Err(FolioError::MissingStructure {
                structure: "names dictionary",
                detail: format!("cannot embed file '{}'", filename),
            });
        }
        let params = Dict::new().with("Size", data.len());
        let stream = self.make_stream(Dict::typed("EmbeddedFile").with("Params", params), data);
        let spec = self.doc.registry.find_or_register(PdfObject::FileSpec(FileSpec {
            file: filename.to_string(),
            embedded: Some(stream),
            description: description.map(str::to_string),
        }));

        let existing = self.names_mut().and_then(|names| names.embedded_files);
        let tree = match existing {
            Some(tree) => tree,
            None => {
                let tree = self.make_name_tree_node();
                if let Some(names) = self.names_mut() {
                    names.embedded_files = Some(tree);
                }
                tree
            }
        };
        if let Some(PdfObject::NameTree(node)) = self.doc.registry.get_mut(tree) {
            node.names.retain(|(name, _)| name != filename);
            let at = node.names.partition_point(|(name, _)| name.as_str() < filename);
            node.names.insert(at, (filename.to_string(), spec));
        }
        log::debug!("Embedded file '{}' as {}", filename, spec);
        Ok(spec)
    }

    // ── Outlines ────────────────────────────────────────────────

    fn outline_root(&mut self) -> ObjRef {
        if let Some(root) = self.doc.outlines {
            return root;
        }
        let r = self.doc.registry.add_trailer_object(PdfObject::Outline(Outline::default()));
        self.doc.outlines = Some(r);
        if let Some(catalog) = self.catalog_mut() {
            catalog.outlines = Some(r);
        }
        r
    }

    /// A bookmark appended under `parent`, or at the top level when
    /// `parent` is `None`.
    pub fn make_outline(
        &mut self,
        parent: Option<ObjRef>,
        title: &str,
        action: Option<ObjRef>,
        open: bool,
    ) -> Result<ObjRef> {
        let parent = match parent {
            Some(parent) => parent,
            None => self.outline_root(),
        };
        let prev = match self.doc.registry.get(parent) {
            Some(PdfObject::Outline(outline)) => outline.last,
            _ => {
                return Err(FolioError::MissingStructure {
                    structure: "outline",
                    detail: format!("{} is not an outline item", parent),
                })
            }
        };
        let item = self.doc.registry.register(PdfObject::Outline(Outline {
            title: Some(title.to_string()),
            action,
            parent: Some(parent),
            prev,
            open,
            ..Outline::default()
        }));
        if let Some(PdfObject::Outline(prev)) = prev.and_then(|p| self.doc.registry.get_mut(p)) {
            prev.next = Some(item);
        }
        if let Some(PdfObject::Outline(parent)) = self.doc.registry.get_mut(parent) {
            parent.first.get_or_insert(item);
            parent.last = Some(item);
            parent.children += 1;
        }
        Ok(item)
    }

    // ── Fonts ───────────────────────────────────────────────────

    /// The next subset tag: `EAAAAA+`, `EAAAAB+`, ...
    pub fn create_subset_font_prefix(&mut self) -> String {
        self.doc.subset_font_counter += 1;
        let digits = format!("{:05}", self.doc.subset_font_counter);
        let mut prefix = String::with_capacity(7);
        prefix.push('E');
        prefix.extend(digits.bytes().map(|d| (b'A' + (d - b'0')) as char));
        prefix.push('+');
        prefix
    }

    /// An `/Encoding` dictionary with the differences of `encoding`.
    pub fn make_encoding(&mut self, encoding: &SingleByteEncoding) -> ObjRef {
        self.doc.registry.register(PdfObject::Encoding(Encoding {
            base: None,
            differences: encoding.differences(),
        }))
    }

    /// Writes the font registered as `resource_name`: the embedded program
    /// first, so subsetting has settled which glyphs exist, then the
    /// descriptor, widths, ToUnicode CMap and font dictionaries. Made once;
    /// later calls return the same object.
    pub fn make_font(&mut self, resource_name: &str) -> Result<ObjRef> {
        if let Some(&font) = self.doc.font_objects.get(resource_name) {
            return Ok(font);
        }
        let mut font = self
            .doc
            .fonts
            .get_mut(resource_name)
            .map(|entry| entry.font.clone())
            .ok_or_else(|| FolioError::MissingStructure {
                structure: "font",
                detail: format!("no font registered as {}", resource_name),
            })?;

        let subset = font.is_embeddable() && font.embedding_mode() == EmbeddingMode::Subset;
        let mut prefix = if subset {
            self.create_subset_font_prefix()
        } else {
            String::new()
        };
        let font_file = if font.is_embeddable() {
            self.make_font_file(&mut font, &prefix)?
        } else {
            None
        };
        if font_file.is_none() && !prefix.is_empty() {
            // nothing was embedded, so the name must not claim a subset
            self.doc.subset_font_counter -= 1;
            prefix.clear();
        }

        let r = match &font {
            Font::Simple(simple) => self.make_simple_font(simple, &prefix, font_file),
            Font::Cid(cid) => self.make_cid_font(cid, &prefix, font_file),
        };
        log::debug!("Made font {} ('{}{}') as {}", resource_name, prefix, font.font_name(), r);

        if let Some(entry) = self.doc.fonts.get_mut(resource_name) {
            entry.font = font;
        }
        self.doc.font_objects.insert(resource_name.to_string(), r);
        if let Some(resources) = self.doc.resources {
            if let Some(PdfObject::Resources(res)) = self.doc.registry.get_mut(resources) {
                res.fonts.insert(resource_name.to_string(), r);
            }
        }
        Ok(r)
    }

    /// Reads and embeds the font's program. An unreadable or unparsable
    /// program is logged and the font is written without one.
    pub fn make_font_file(&mut self, font: &mut Font, prefix: &str) -> Result<Option<FontFile>> {
        let Some(program) = font.program().cloned() else {
            return Ok(None);
        };
        let data = match self.doc.resolver.resolve(&program.locator) {
            Ok(data) => data,
            Err(e) => {
                log::error!("Failed to read font program for '{}': {}", font.font_name(), e);
                return Ok(None);
            }
        };
        let embedded = match embed_program(font, &data, prefix) {
            Ok(embedded) => embedded,
            Err(FolioError::Font(reason)) => {
                log::error!("Failed to embed font '{}': {}", font.font_name(), reason);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if matches!(embedded, EmbeddedProgram::OpenType(_)) {
            self.doc.ensure_version(PdfVersion::V1_6);
        }

        let key = embedded.descriptor_key();
        let mut dict = Dict::new();
        if let Some(subtype) = embedded.subtype() {
            dict.set("Subtype", PdfValue::name(subtype));
        }
        for (length_key, length) in embedded.lengths() {
            dict.set(length_key, length);
        }
        let stream = self.make_stream(dict, embedded.into_bytes());
        Ok(Some((key, stream)))
    }

    pub fn make_font_descriptor(
        &mut self,
        metrics: &FontMetrics,
        font_name: &str,
        font_file: Option<FontFile>,
        cid_set: Option<ObjRef>,
    ) -> ObjRef {
        let [x_min, y_min, x_max, y_max] = metrics.bbox;
        let bbox: Vec<PdfValue> = [x_min, y_min, x_max, y_max].iter().map(|&v| v.into()).collect();
        let mut dict = Dict::typed("FontDescriptor")
            .with("FontName", PdfValue::name(font_name))
            .with("Flags", metrics.flags)
            .with("FontBBox", bbox)
            .with("ItalicAngle", metrics.italic_angle)
            .with("Ascent", metrics.ascender)
            .with("Descent", metrics.descender)
            .with("CapHeight", metrics.cap_height)
            .with("StemV", metrics.stem_v);
        if metrics.x_height != 0 {
            dict.set("XHeight", metrics.x_height);
        }
        if metrics.missing_width != 0 {
            dict.set("MissingWidth", metrics.missing_width);
        }
        if let Some((key, stream)) = font_file {
            dict.set(key, stream);
        }
        if let Some(cid_set) = cid_set {
            dict.set("CIDSet", cid_set);
        }
        self.doc.registry.register(PdfObject::FontDescriptor(dict))
    }

    /// The `/CIDSet` stream: one bit per original glyph, MSB first.
    pub fn build_cid_set(&mut self, font: &CidFont) -> ObjRef {
        let bitmap = font.cid_set().bitmap(font.glyph_map());
        self.make_stream(Dict::new(), bitmap)
    }

    fn make_to_unicode(&mut self, mappings: &BTreeMap<u16, char>, width: CodeWidth) -> ObjRef {
        let cmap = build_tounicode_cmap(mappings, width);
        self.make_stream(Dict::new(), cmap.into_bytes())
    }

    fn make_cid_font(&mut self, font: &CidFont, prefix: &str, font_file: Option<FontFile>) -> ObjRef {
        let base_font = format!("{}{}", prefix, font.metrics.font_name);
        let embedded = font_file.is_some();
        let cid_set = if embedded {
            Some(self.build_cid_set(font))
        } else {
            None
        };
        let descriptor = self.make_font_descriptor(&font.metrics, &base_font, font_file, cid_set);

        let system_info = Dict::new()
            .with("Registry", PdfValue::string("Adobe"))
            .with("Ordering", PdfValue::string("Identity"))
            .with("Supplement", 0);
        let mut descendant = Dict::typed("Font")
            .with("Subtype", PdfValue::name(font.cid_type().subtype()))
            .with("BaseFont", PdfValue::name(base_font.clone()))
            .with("CIDSystemInfo", system_info)
            .with("FontDescriptor", descriptor)
            .with("DW", font.metrics.missing_width)
            .with("W", build_w_array(&font.output_widths()));
        if font.cid_type() == CidFontType::Type2 {
            descendant.set("CIDToGIDMap", self.cid_to_gid_map(font, embedded));
        }
        let descendant = self.doc.registry.register(PdfObject::Font(descendant));

        let to_unicode = self.make_to_unicode(&font.output_chars(), CodeWidth::TwoByte);
        let type0 = Dict::typed("Font")
            .with("Subtype", PdfValue::name("Type0"))
            .with("BaseFont", PdfValue::name(base_font))
            .with("Encoding", PdfValue::name("Identity-H"))
            .with("DescendantFonts", PdfValue::refs(&[descendant]))
            .with("ToUnicode", to_unicode);
        self.doc.registry.register(PdfObject::Font(type0))
    }

    /// Identity when content-stream indices are glyph indices of the
    /// program in the file. A subset font whose program could not be
    /// embedded maps its renumbered indices back to original glyphs.
    fn cid_to_gid_map(&mut self, font: &CidFont, embedded: bool) -> PdfValue {
        if embedded || !font.is_embeddable() || !font.cid_set().is_subset() {
            return PdfValue::name("Identity");
        }
        let data = font
            .cid_set()
            .subset_order()
            .iter()
            .flat_map(|g| g.to_be_bytes())
            .collect();
        PdfValue::Ref(self.make_stream(Dict::new(), data))
    }

    fn make_simple_font(&mut self, font: &SimpleFont, prefix: &str, font_file: Option<FontFile>) -> ObjRef {
        let encoding = font.encoding();
        let wants_to_unicode = !encoding.is_predefined() || self.doc.config.force_to_unicode;

        let mut dict = Dict::typed("Font").with("Subtype", PdfValue::name("Type1"));
        if let Some(standard) = font.standard_font() {
            dict.set("BaseFont", PdfValue::name(standard.pdf_name()));
            if !standard.is_symbolic() {
                dict.set("Encoding", PdfValue::name(encoding.name()));
            }
            if let Some((first, last, widths)) = simple_widths(font) {
                dict.set("FirstChar", first);
                dict.set("LastChar", last);
                dict.set("Widths", widths);
            }
        } else {
            let base_font = format!("{}{}", prefix, font.metrics.font_name);
            let descriptor = self.make_font_descriptor(&font.metrics, &base_font, font_file, None);
            dict.set("BaseFont", PdfValue::name(base_font));
            if let Some((first, last, widths)) = simple_widths(font) {
                dict.set("FirstChar", first);
                dict.set("LastChar", last);
                dict.set("Widths", widths);
            }
            dict.set("FontDescriptor", descriptor);
            if !font.metrics.is_symbolic() {
                if encoding.is_predefined() {
                    dict.set("Encoding", PdfValue::name(encoding.name()));
                } else {
                    dict.set("Encoding", self.make_encoding(encoding));
                }
            }
        }

        let mappings: BTreeMap<u16, char> = (0..=255u8)
            .filter_map(|code| encoding.char_for(code).map(|c| (code as u16, c)))
            .collect();
        if (wants_to_unicode || font.metrics.is_symbolic()) && !mappings.is_empty() {
            dict.set("ToUnicode", self.make_to_unicode(&mappings, CodeWidth::OneByte));
        } else if wants_to_unicode {
            log::debug!("No character mapping for ToUnicode in '{}'", font.metrics.font_name);
        }
        self.doc.registry.register(PdfObject::Font(dict))
    }
}

/// `filename` made safe inside a double-quoted script string.
fn script_safe_name(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '"' | '\\' | '\'' => '_',
            c if c.is_ascii_control() || !c.is_ascii() => '_',
            c => c,
        })
        .collect()
}

/// `FirstChar`, `LastChar` and `Widths` of a simple font. Subset fonts
/// list only the range of used codes, with 0 for codes in between that
/// were not used.
fn simple_widths(font: &SimpleFont) -> Option<(u8, u8, PdfValue)> {
    let used = font.used_codes();
    let subset = font.embedding_mode() == EmbeddingMode::Subset && font.is_embeddable();
    let (first, last) = if subset {
        (*used.keys().next()?, *used.keys().next_back()?)
    } else if font.widths().is_empty() {
        return None;
    } else {
        (font.first_char(), font.last_char())
    };
    let widths = (first..=last)
        .map(|code| {
            if subset && !used.contains_key(&code) {
                PdfValue::Int(0)
            } else {
                PdfValue::Int(font.width_units(code) as i64)
            }
        })
        .collect();
    Some((first, last, PdfValue::Array(widths)))
}
