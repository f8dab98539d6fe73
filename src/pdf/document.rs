//! # Document
//!
//! Owns the object registry, the document's fonts and the handful of
//! structural objects (catalog, page tree, resources, names) the factory
//! links new objects into. [`PdfDocument::write`] validates the object
//! graph and serializes it; [`PdfDocument::close`] first writes every font
//! that was used but not yet made.

use std::collections::HashMap;
use std::io::Write;

use super::factory::PdfFactory;
use super::filter;
use super::registry::ObjectRegistry;
use super::{ObjRef, PdfVersion};
use crate::config::DocumentConfig;
use crate::error::{FolioError, Result};
use crate::font::FontRegistry;
use crate::resource::{DefaultResolver, ResourceResolver};

pub struct PdfDocument {
    pub(crate) registry: ObjectRegistry,
    pub(crate) config: DocumentConfig,
    version: PdfVersion,
    pub(crate) resolver: Box<dyn ResourceResolver>,
    pub(crate) root: Option<ObjRef>,
    pub(crate) pages: Option<ObjRef>,
    pub(crate) resources: Option<ObjRef>,
    pub(crate) names: Option<ObjRef>,
    pub(crate) page_labels: Option<ObjRef>,
    pub(crate) outlines: Option<ObjRef>,
    pub(crate) info: Option<ObjRef>,
    /// Last subset tag number handed out; starts below zero so the first
    /// tag is `EAAAAA+`.
    pub(crate) subset_font_counter: i32,
    pub(crate) fonts: FontRegistry,
    /// Font dictionaries already written, by resource name.
    pub(crate) font_objects: HashMap<String, ObjRef>,
}

impl PdfDocument {
    pub fn new(config: DocumentConfig) -> Self {
        let resolver = match &config.font_base_dir {
            Some(dir) => DefaultResolver::with_base_dir(dir.clone()),
            None => DefaultResolver::new(),
        };
        Self::with_resolver(config, resolver)
    }

    /// A document that reads font programs through `resolver`.
    pub fn with_resolver(config: DocumentConfig, resolver: impl ResourceResolver + 'static) -> Self {
        PdfDocument {
            registry: ObjectRegistry::new(),
            version: config.version,
            config,
            resolver: Box::new(resolver),
            root: None,
            pages: None,
            resources: None,
            names: None,
            page_labels: None,
            outlines: None,
            info: None,
            subset_font_counter: -1,
            fonts: FontRegistry::new(),
            font_objects: HashMap::new(),
        }
    }

    pub fn factory(&mut self) -> PdfFactory<'_> {
        PdfFactory::new(self)
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn version(&self) -> PdfVersion {
        self.version
    }

    /// Raises the header version to at least `min`. Never lowers it.
    pub fn ensure_version(&mut self, min: PdfVersion) {
        if min > self.version {
            log::info!("Raising PDF version from {} to {}", self.version.as_str(), min.as_str());
            self.version = min;
        }
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontRegistry {
        &mut self.fonts
    }

    /// The font dictionary written for `resource_name`, once made.
    pub fn font_object(&self, resource_name: &str) -> Option<ObjRef> {
        self.font_objects.get(resource_name).copied()
    }

    pub fn root(&self) -> Option<ObjRef> {
        self.root
    }

    pub fn pages(&self) -> Option<ObjRef> {
        self.pages
    }

    pub fn resources(&self) -> Option<ObjRef> {
        self.resources
    }

    pub fn names(&self) -> Option<ObjRef> {
        self.names
    }

    /// Makes every used font that has no font dictionary yet, then writes
    /// the document.
    pub fn close(&mut self) -> Result<Vec<u8>> {
        let pending: Vec<String> = self
            .fonts
            .iter()
            .filter(|f| f.font.is_used() && !self.font_objects.contains_key(&f.resource_name))
            .map(|f| f.resource_name.clone())
            .collect();
        log::debug!("Closing document with {} fonts to write", pending.len());
        let mut factory = self.factory();
        for name in &pending {
            factory.make_font(name)?;
        }
        self.write()
    }

    /// Checks the object graph and serializes it.
    pub fn write(&self) -> Result<Vec<u8>> {
        let root = self.root.ok_or_else(|| FolioError::MissingStructure {
            structure: "catalog",
            detail: "the document has no root object".to_string(),
        })?;
        self.validate()?;

        let filter = filter::for_config(&self.config);
        let size = self.registry.len() + 1;
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; size];

        let _ = write!(output, "%PDF-{}\n", self.version.as_str());
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (r, obj) in self.registry.objects() {
            offsets[r.number() as usize] = output.len();
            let _ = write!(output, "{} 0 obj\n", r.number());
            obj.write_body(&mut output, filter.as_ref());
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", size);
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(output, "trailer\n<< /Size {} /Root {}", size, root);
        if let Some(info) = self.info {
            let _ = write!(output, " /Info {}", info);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        log::info!(
            "Wrote PDF {} with {} objects ({} bytes)",
            self.version.as_str(),
            self.registry.len(),
            output.len()
        );
        Ok(output)
    }

    /// Every reserved number is defined and every reference points at a
    /// registered object.
    fn validate(&self) -> Result<()> {
        if let Some(undefined) = self.registry.undefined().next() {
            return Err(FolioError::UndefinedObject(undefined));
        }
        for (r, obj) in self.registry.objects() {
            if let Some(missing) = obj.references().into_iter().find(|&t| !self.registry.contains(t)) {
                return Err(FolioError::UnregisteredObject {
                    referenced: missing,
                    by: r,
                });
            }
        }
        Ok(())
    }
}
