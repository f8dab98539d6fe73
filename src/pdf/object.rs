//! Indirect object payloads and the value tree they serialize through.
//!
//! Kinds that take part in deduplication (functions, shadings, patterns,
//! links, destinations, go-to, go-to-remote and launch actions, file
//! specifications) are plain values with derived `Eq`/`Hash`, so the value
//! itself serves as its structural key.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Write;

use super::filter::StreamFilter;
use super::{name_object, text_string};
use crate::gradient::ColorSpace;

// ─── References and numbers ────────────────────────────────────

/// An indirect object number. Generation is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjRef(u32);

impl ObjRef {
    pub fn new(number: u32) -> Self {
        ObjRef(number)
    }

    pub fn number(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 0 R", self.0)
    }
}

/// A real number that can be hashed. `-0.0` equals `0.0` and all NaNs are
/// one value.
#[derive(Debug, Clone, Copy)]
pub struct Num(pub f64);

impl Num {
    fn bits(&self) -> u64 {
        if self.0 == 0.0 {
            0
        } else if self.0.is_nan() {
            f64::NAN.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Num {}

impl Hash for Num {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl From<f64> for Num {
    fn from(v: f64) -> Self {
        Num(v)
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = if self.0.is_finite() { self.0 } else { 0.0 };
        if v.fract() == 0.0 && v.abs() < 1e15 {
            return write!(f, "{}", v as i64);
        }
        let s = format!("{:.6}", v);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        f.write_str(if s == "-0" { "0" } else { s })
    }
}

pub fn nums(values: &[f64]) -> Vec<Num> {
    values.iter().map(|&v| Num(v)).collect()
}

// ─── Value tree ────────────────────────────────────────────────

/// A direct object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(Num),
    Name(String),
    /// Text string, written literal or UTF-16BE.
    Str(String),
    /// Byte string, written as hex.
    Bytes(Vec<u8>),
    Ref(ObjRef),
    Array(Vec<PdfValue>),
    Dict(Dict),
}

impl PdfValue {
    pub fn name(name: impl Into<String>) -> Self {
        PdfValue::Name(name.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        PdfValue::Str(s.into())
    }

    pub fn reals(values: &[Num]) -> Self {
        PdfValue::Array(values.iter().map(|&n| PdfValue::Real(n)).collect())
    }

    pub fn refs(refs: &[ObjRef]) -> Self {
        PdfValue::Array(refs.iter().map(|&r| PdfValue::Ref(r)).collect())
    }

    fn collect_refs(&self, out: &mut Vec<ObjRef>) {
        match self {
            PdfValue::Ref(r) => out.push(*r),
            PdfValue::Array(items) => items.iter().for_each(|v| v.collect_refs(out)),
            PdfValue::Dict(dict) => dict.0.iter().for_each(|(_, v)| v.collect_refs(out)),
            _ => {}
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            PdfValue::Null => out.extend_from_slice(b"null"),
            PdfValue::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
            PdfValue::Int(i) => out.extend_from_slice(i.to_string().as_bytes()),
            PdfValue::Real(n) => out.extend_from_slice(n.to_string().as_bytes()),
            PdfValue::Name(name) => out.extend_from_slice(name_object(name).as_bytes()),
            PdfValue::Str(s) => out.extend_from_slice(text_string(s).as_bytes()),
            PdfValue::Bytes(bytes) => {
                out.push(b'<');
                for b in bytes {
                    out.extend_from_slice(format!("{:02X}", b).as_bytes());
                }
                out.push(b'>');
            }
            PdfValue::Ref(r) => out.extend_from_slice(r.to_string().as_bytes()),
            PdfValue::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    item.write_to(out);
                }
                out.push(b']');
            }
            PdfValue::Dict(dict) => dict.write_to(out),
        }
    }
}

impl From<ObjRef> for PdfValue {
    fn from(r: ObjRef) -> Self {
        PdfValue::Ref(r)
    }
}

impl From<bool> for PdfValue {
    fn from(b: bool) -> Self {
        PdfValue::Bool(b)
    }
}

impl From<u8> for PdfValue {
    fn from(i: u8) -> Self {
        PdfValue::Int(i64::from(i))
    }
}

impl From<i32> for PdfValue {
    fn from(i: i32) -> Self {
        PdfValue::Int(i as i64)
    }
}

impl From<u32> for PdfValue {
    fn from(i: u32) -> Self {
        PdfValue::Int(i as i64)
    }
}

impl From<usize> for PdfValue {
    fn from(i: usize) -> Self {
        PdfValue::Int(i as i64)
    }
}

impl From<f64> for PdfValue {
    fn from(v: f64) -> Self {
        PdfValue::Real(Num(v))
    }
}

impl From<Num> for PdfValue {
    fn from(n: Num) -> Self {
        PdfValue::Real(n)
    }
}

impl From<Dict> for PdfValue {
    fn from(d: Dict) -> Self {
        PdfValue::Dict(d)
    }
}

impl From<Vec<PdfValue>> for PdfValue {
    fn from(items: Vec<PdfValue>) -> Self {
        PdfValue::Array(items)
    }
}

/// A dictionary that keeps insertion order, so output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Dict(Vec<(String, PdfValue)>);

impl Dict {
    pub fn new() -> Self {
        Dict(Vec::new())
    }

    /// `/Type /<type_name>` followed by whatever is added next.
    pub fn typed(type_name: &str) -> Self {
        Dict::new().with("Type", PdfValue::name(type_name))
    }

    pub fn with(mut self, key: &str, value: impl Into<PdfValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Adds the entry only when `value` is `Some`.
    pub fn with_opt(self, key: &str, value: Option<impl Into<PdfValue>>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Sets `key`, replacing an existing entry in place.
    pub fn set(&mut self, key: &str, value: impl Into<PdfValue>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PdfValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"<<");
        for (key, value) in &self.0 {
            out.push(b' ');
            out.extend_from_slice(name_object(key).as_bytes());
            out.push(b' ');
            value.write_to(out);
        }
        out.extend_from_slice(b" >>");
    }
}

// ─── Document structure ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub pages: ObjRef,
    pub names: Option<ObjRef>,
    pub page_labels: Option<ObjRef>,
    pub outlines: Option<ObjRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pages {
    pub kids: Vec<ObjRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub parent: ObjRef,
    pub media_box: [Num; 4],
    pub resources: ObjRef,
    pub contents: Vec<ObjRef>,
    pub annots: Vec<ObjRef>,
}

/// The shared resource dictionary, by resource name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resources {
    pub fonts: BTreeMap<String, ObjRef>,
    pub patterns: BTreeMap<String, ObjRef>,
    pub shadings: BTreeMap<String, ObjRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    pub producer: Option<String>,
    pub creator: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

/// The catalog's `/Names` dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Names {
    pub dests: Option<ObjRef>,
    pub embedded_files: Option<ObjRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLabelStyle {
    Decimal,
    UpperRoman,
    LowerRoman,
    UpperAlpha,
    LowerAlpha,
}

impl PageLabelStyle {
    fn code(&self) -> &'static str {
        match self {
            PageLabelStyle::Decimal => "D",
            PageLabelStyle::UpperRoman => "R",
            PageLabelStyle::LowerRoman => "r",
            PageLabelStyle::UpperAlpha => "A",
            PageLabelStyle::LowerAlpha => "a",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLabel {
    pub style: Option<PageLabelStyle>,
    pub prefix: Option<String>,
    pub start: Option<u32>,
}

/// Page-label number tree, flat: page index → label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLabels {
    pub nums: BTreeMap<u32, PageLabel>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameTreeNode {
    pub kids: Vec<ObjRef>,
    pub names: Vec<(String, ObjRef)>,
    pub limits: Option<(String, String)>,
}

/// An outline item, or the `/Outlines` root when `title` is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub title: Option<String>,
    pub action: Option<ObjRef>,
    pub parent: Option<ObjRef>,
    pub first: Option<ObjRef>,
    pub last: Option<ObjRef>,
    pub prev: Option<ObjRef>,
    pub next: Option<ObjRef>,
    pub children: u32,
    pub open: bool,
}

// ─── Functions, shadings, patterns ─────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Function {
    /// Type 2.
    Exponential {
        domain: Vec<Num>,
        range: Option<Vec<Num>>,
        c0: Vec<Num>,
        c1: Vec<Num>,
        n: Num,
    },
    /// Type 3.
    Stitching {
        domain: Vec<Num>,
        range: Option<Vec<Num>>,
        functions: Vec<ObjRef>,
        bounds: Vec<Num>,
        encode: Vec<Num>,
    },
    /// Type 4, written as a stream holding the calculator program.
    Calculator {
        domain: Vec<Num>,
        range: Vec<Num>,
        code: String,
    },
}

impl Function {
    pub fn function_type(&self) -> u8 {
        match self {
            Function::Exponential { .. } => 2,
            Function::Stitching { .. } => 3,
            Function::Calculator { .. } => 4,
        }
    }

    fn to_dict(&self) -> Dict {
        let dict = Dict::new().with("FunctionType", self.function_type() as i32);
        match self {
            Function::Exponential { domain, range, c0, c1, n } => dict
                .with("Domain", PdfValue::reals(domain))
                .with_opt("Range", range.as_deref().map(PdfValue::reals))
                .with("C0", PdfValue::reals(c0))
                .with("C1", PdfValue::reals(c1))
                .with("N", *n),
            Function::Stitching { domain, range, functions, bounds, encode } => dict
                .with("Domain", PdfValue::reals(domain))
                .with_opt("Range", range.as_deref().map(PdfValue::reals))
                .with("Functions", PdfValue::refs(functions))
                .with("Bounds", PdfValue::reals(bounds))
                .with("Encode", PdfValue::reals(encode)),
            Function::Calculator { domain, range, .. } => dict
                .with("Domain", PdfValue::reals(domain))
                .with("Range", PdfValue::reals(range)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shading {
    /// 2 axial, 3 radial.
    pub shading_type: u8,
    pub color_space: ColorSpace,
    pub background: Option<Vec<Num>>,
    pub bbox: Option<[Num; 4]>,
    pub anti_alias: bool,
    pub coords: Vec<Num>,
    pub domain: Option<Vec<Num>>,
    pub function: ObjRef,
    pub extend: Option<[bool; 2]>,
}

impl Shading {
    fn to_dict(&self) -> Dict {
        let mut dict = Dict::new()
            .with("ShadingType", self.shading_type as i32)
            .with("ColorSpace", PdfValue::name(self.color_space.pdf_name()))
            .with_opt("Background", self.background.as_deref().map(PdfValue::reals))
            .with_opt("BBox", self.bbox.as_ref().map(|b| PdfValue::reals(b)));
        if self.anti_alias {
            dict.set("AntiAlias", true);
        }
        dict.with("Coords", PdfValue::reals(&self.coords))
            .with_opt("Domain", self.domain.as_deref().map(PdfValue::reals))
            .with("Function", self.function)
            .with_opt(
                "Extend",
                self.extend
                    .map(|[a, b]| PdfValue::Array(vec![PdfValue::Bool(a), PdfValue::Bool(b)])),
            )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    /// 2 for shading patterns.
    pub pattern_type: u8,
    pub shading: ObjRef,
    pub matrix: Option<Vec<Num>>,
    pub ext_g_state: Option<ObjRef>,
}

impl Pattern {
    fn to_dict(&self) -> Dict {
        Dict::typed("Pattern")
            .with("PatternType", self.pattern_type as i32)
            .with("Shading", self.shading)
            .with_opt("Matrix", self.matrix.as_deref().map(PdfValue::reals))
            .with_opt("ExtGState", self.ext_g_state)
    }
}

// ─── Links, destinations, actions ──────────────────────────────

/// A link annotation over `rect` that triggers `action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub rect: [Num; 4],
    pub action: ObjRef,
}

/// A named destination: `page` scrolled to (`x`, `y`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub name: String,
    pub page: ObjRef,
    pub x: Num,
    pub y: Num,
}

fn xyz(page: ObjRef, x: Num, y: Num) -> PdfValue {
    PdfValue::Array(vec![
        PdfValue::Ref(page),
        PdfValue::name("XYZ"),
        PdfValue::Real(x),
        PdfValue::Real(y),
        PdfValue::Null,
    ])
}

/// A page of another document, by index.
fn remote_page(page: u32) -> PdfValue {
    PdfValue::Array(vec![
        PdfValue::Int(page as i64),
        PdfValue::name("XYZ"),
        PdfValue::Null,
        PdfValue::Null,
        PdfValue::Null,
    ])
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GoTo {
    pub page: ObjRef,
    pub x: Num,
    pub y: Num,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RemoteTarget {
    /// The document's first page.
    Document,
    /// Zero-based page index.
    Page(u32),
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GoToRemote {
    pub file: ObjRef,
    pub target: RemoteTarget,
    pub new_window: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Launch {
    pub file: ObjRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    GoTo(GoTo),
    GoToRemote(GoToRemote),
    Launch(Launch),
    Uri(String),
    JavaScript(String),
}

impl Action {
    fn to_dict(&self) -> Dict {
        let dict = Dict::typed("Action");
        match self {
            Action::GoTo(goto) => dict
                .with("S", PdfValue::name("GoTo"))
                .with("D", xyz(goto.page, goto.x, goto.y)),
            Action::GoToRemote(remote) => {
                let dest = match &remote.target {
                    RemoteTarget::Document => remote_page(0),
                    RemoteTarget::Page(page) => remote_page(*page),
                    RemoteTarget::Named(name) => PdfValue::string(name.clone()),
                };
                let dict = dict
                    .with("S", PdfValue::name("GoToR"))
                    .with("F", remote.file)
                    .with("D", dest);
                if remote.new_window {
                    dict.with("NewWindow", true)
                } else {
                    dict
                }
            }
            Action::Launch(launch) => dict.with("S", PdfValue::name("Launch")).with("F", launch.file),
            Action::Uri(uri) => dict.with("S", PdfValue::name("URI")).with("URI", PdfValue::string(uri.clone())),
            Action::JavaScript(script) => dict
                .with("S", PdfValue::name("JavaScript"))
                .with("JS", PdfValue::string(script.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileSpec {
    pub file: String,
    /// Embedded file stream, for attachments.
    pub embedded: Option<ObjRef>,
    pub description: Option<String>,
}

impl FileSpec {
    fn to_dict(&self) -> Dict {
        let dict = Dict::typed("Filespec")
            .with("F", PdfValue::string(self.file.clone()))
            .with("UF", PdfValue::string(self.file.clone()))
            .with_opt(
                "EF",
                self.embedded.map(|ef| Dict::new().with("F", ef).with("UF", ef)),
            );
        dict.with_opt("Desc", self.description.clone().map(PdfValue::Str))
    }
}

// ─── Fonts ─────────────────────────────────────────────────────

/// A simple font's `/Encoding` dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub base: Option<String>,
    pub differences: Vec<(u8, Vec<String>)>,
}

impl Encoding {
    fn to_dict(&self) -> Dict {
        let mut differences = Vec::new();
        for (code, names) in &self.differences {
            differences.push(PdfValue::Int(*code as i64));
            differences.extend(names.iter().map(|n| PdfValue::name(n.clone())));
        }
        Dict::typed("Encoding")
            .with_opt("BaseEncoding", self.base.clone().map(PdfValue::Name))
            .with("Differences", PdfValue::Array(differences))
    }
}

/// A stream whose dictionary is completed with `/Length` and `/Filter`
/// when written.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dict,
    pub data: Vec<u8>,
}

impl Stream {
    pub fn new(dict: Dict, data: Vec<u8>) -> Self {
        Stream { dict, data }
    }
}

// ─── Objects ───────────────────────────────────────────────────

/// What an indirect object holds.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Catalog(Catalog),
    Pages(Pages),
    Page(Page),
    Resources(Resources),
    Info(Info),
    Names(Names),
    PageLabels(PageLabels),
    NameTree(NameTreeNode),
    Outline(Outline),
    Function(Function),
    Shading(Shading),
    Pattern(Pattern),
    Link(Link),
    Destination(Destination),
    Action(Action),
    FileSpec(FileSpec),
    Encoding(Encoding),
    /// Type1, Type0 or CIDFont dictionary.
    Font(Dict),
    FontDescriptor(Dict),
    Stream(Stream),
}

/// Object kinds, for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Catalog,
    Pages,
    Page,
    Resources,
    Info,
    Names,
    PageLabels,
    NameTree,
    Outline,
    Function,
    Shading,
    Pattern,
    Link,
    Destination,
    GoTo,
    GoToRemote,
    Launch,
    Uri,
    JavaScript,
    FileSpec,
    Encoding,
    Font,
    FontDescriptor,
    Stream,
}

/// Canonicalization key: the semantic value of a dedup-eligible object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum StructuralKey {
    Function(Function),
    Shading(Shading),
    Pattern(Pattern),
    Link(Link),
    Destination(Destination),
    GoTo(GoTo),
    GoToRemote(GoToRemote),
    Launch(Launch),
    FileSpec(FileSpec),
}

impl PdfObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            PdfObject::Catalog(_) => ObjectKind::Catalog,
            PdfObject::Pages(_) => ObjectKind::Pages,
            PdfObject::Page(_) => ObjectKind::Page,
            PdfObject::Resources(_) => ObjectKind::Resources,
            PdfObject::Info(_) => ObjectKind::Info,
            PdfObject::Names(_) => ObjectKind::Names,
            PdfObject::PageLabels(_) => ObjectKind::PageLabels,
            PdfObject::NameTree(_) => ObjectKind::NameTree,
            PdfObject::Outline(_) => ObjectKind::Outline,
            PdfObject::Function(_) => ObjectKind::Function,
            PdfObject::Shading(_) => ObjectKind::Shading,
            PdfObject::Pattern(_) => ObjectKind::Pattern,
            PdfObject::Link(_) => ObjectKind::Link,
            PdfObject::Destination(_) => ObjectKind::Destination,
            PdfObject::Action(Action::GoTo(_)) => ObjectKind::GoTo,
            PdfObject::Action(Action::GoToRemote(_)) => ObjectKind::GoToRemote,
            PdfObject::Action(Action::Launch(_)) => ObjectKind::Launch,
            PdfObject::Action(Action::Uri(_)) => ObjectKind::Uri,
            PdfObject::Action(Action::JavaScript(_)) => ObjectKind::JavaScript,
            PdfObject::FileSpec(_) => ObjectKind::FileSpec,
            PdfObject::Encoding(_) => ObjectKind::Encoding,
            PdfObject::Font(_) => ObjectKind::Font,
            PdfObject::FontDescriptor(_) => ObjectKind::FontDescriptor,
            PdfObject::Stream(_) => ObjectKind::Stream,
        }
    }

    pub(crate) fn structural_key(&self) -> Option<StructuralKey> {
        Some(match self {
            PdfObject::Function(f) => StructuralKey::Function(f.clone()),
            PdfObject::Shading(s) => StructuralKey::Shading(s.clone()),
            PdfObject::Pattern(p) => StructuralKey::Pattern(p.clone()),
            PdfObject::Link(l) => StructuralKey::Link(l.clone()),
            PdfObject::Destination(d) => StructuralKey::Destination(d.clone()),
            PdfObject::Action(Action::GoTo(g)) => StructuralKey::GoTo(g.clone()),
            PdfObject::Action(Action::GoToRemote(g)) => StructuralKey::GoToRemote(g.clone()),
            PdfObject::Action(Action::Launch(l)) => StructuralKey::Launch(l.clone()),
            PdfObject::FileSpec(f) => StructuralKey::FileSpec(f.clone()),
            _ => return None,
        })
    }

    /// The object's value, or its stream dictionary for stream objects.
    pub fn to_value(&self) -> PdfValue {
        let dict = match self {
            PdfObject::Catalog(catalog) => Dict::typed("Catalog")
                .with("Pages", catalog.pages)
                .with_opt("Names", catalog.names)
                .with_opt("PageLabels", catalog.page_labels)
                .with_opt("Outlines", catalog.outlines),
            PdfObject::Pages(pages) => Dict::typed("Pages")
                .with("Kids", PdfValue::refs(&pages.kids))
                .with("Count", pages.kids.len()),
            PdfObject::Page(page) => {
                let dict = Dict::typed("Page")
                    .with("Parent", page.parent)
                    .with("MediaBox", PdfValue::reals(&page.media_box))
                    .with("Resources", page.resources);
                let dict = match page.contents.as_slice() {
                    [] => dict,
                    [single] => dict.with("Contents", *single),
                    many => dict.with("Contents", PdfValue::refs(many)),
                };
                if page.annots.is_empty() {
                    dict
                } else {
                    dict.with("Annots", PdfValue::refs(&page.annots))
                }
            }
            PdfObject::Resources(res) => {
                let by_name = |map: &BTreeMap<String, ObjRef>| {
                    map.iter()
                        .fold(Dict::new(), |d, (name, &r)| d.with(name, r))
                };
                let mut dict = Dict::new().with(
                    "ProcSet",
                    PdfValue::Array(vec![PdfValue::name("PDF"), PdfValue::name("Text")]),
                );
                if !res.fonts.is_empty() {
                    dict.set("Font", by_name(&res.fonts));
                }
                if !res.patterns.is_empty() {
                    dict.set("Pattern", by_name(&res.patterns));
                }
                if !res.shadings.is_empty() {
                    dict.set("Shading", by_name(&res.shadings));
                }
                dict
            }
            PdfObject::Info(info) => Dict::new()
                .with_opt("Title", info.title.clone().map(PdfValue::Str))
                .with_opt("Author", info.author.clone().map(PdfValue::Str))
                .with_opt("Subject", info.subject.clone().map(PdfValue::Str))
                .with_opt("Keywords", info.keywords.clone().map(PdfValue::Str))
                .with_opt("Creator", info.creator.clone().map(PdfValue::Str))
                .with_opt("Producer", info.producer.clone().map(PdfValue::Str)),
            PdfObject::Names(names) => Dict::new()
                .with_opt("Dests", names.dests)
                .with_opt("EmbeddedFiles", names.embedded_files),
            PdfObject::PageLabels(labels) => {
                let mut nums = Vec::new();
                for (index, label) in &labels.nums {
                    nums.push(PdfValue::Int(*index as i64));
                    let dict = Dict::typed("PageLabel")
                        .with_opt("S", label.style.map(|s| PdfValue::name(s.code())))
                        .with_opt("P", label.prefix.clone().map(PdfValue::Str))
                        .with_opt("St", label.start);
                    nums.push(PdfValue::Dict(dict));
                }
                Dict::new().with("Nums", PdfValue::Array(nums))
            }
            PdfObject::NameTree(node) => {
                let mut dict = Dict::new();
                if !node.kids.is_empty() {
                    dict.set("Kids", PdfValue::refs(&node.kids));
                }
                if !node.names.is_empty() || node.kids.is_empty() {
                    let mut names = Vec::with_capacity(node.names.len() * 2);
                    for (name, r) in &node.names {
                        names.push(PdfValue::string(name.clone()));
                        names.push(PdfValue::Ref(*r));
                    }
                    dict.set("Names", PdfValue::Array(names));
                }
                if let Some((low, high)) = &node.limits {
                    dict.set(
                        "Limits",
                        PdfValue::Array(vec![PdfValue::string(low.clone()), PdfValue::string(high.clone())]),
                    );
                }
                dict
            }
            PdfObject::Outline(outline) => {
                let count = if outline.open || outline.title.is_none() {
                    outline.children as i32
                } else {
                    -(outline.children as i32)
                };
                let dict = match &outline.title {
                    None => Dict::typed("Outlines"),
                    Some(title) => Dict::new().with("Title", PdfValue::string(title.clone())),
                };
                let dict = dict
                    .with_opt("Parent", outline.parent)
                    .with_opt("Prev", outline.prev)
                    .with_opt("Next", outline.next)
                    .with_opt("First", outline.first)
                    .with_opt("Last", outline.last)
                    .with_opt("A", outline.action);
                if outline.children > 0 {
                    dict.with("Count", count)
                } else {
                    dict
                }
            }
            PdfObject::Function(function) => function.to_dict(),
            PdfObject::Shading(shading) => shading.to_dict(),
            PdfObject::Pattern(pattern) => pattern.to_dict(),
            PdfObject::Link(link) => Dict::typed("Annot")
                .with("Subtype", PdfValue::name("Link"))
                .with("Rect", PdfValue::reals(&link.rect))
                .with("Border", PdfValue::Array(vec![PdfValue::Int(0), PdfValue::Int(0), PdfValue::Int(0)]))
                .with("A", link.action),
            PdfObject::Destination(dest) => return xyz(dest.page, dest.x, dest.y),
            PdfObject::Action(action) => action.to_dict(),
            PdfObject::FileSpec(spec) => spec.to_dict(),
            PdfObject::Encoding(encoding) => encoding.to_dict(),
            PdfObject::Font(dict) | PdfObject::FontDescriptor(dict) => dict.clone(),
            PdfObject::Stream(stream) => stream.dict.clone(),
        };
        PdfValue::Dict(dict)
    }

    /// Payload bytes for objects written as streams.
    fn stream_data(&self) -> Option<&[u8]> {
        match self {
            PdfObject::Stream(stream) => Some(&stream.data),
            PdfObject::Function(Function::Calculator { code, .. }) => Some(code.as_bytes()),
            _ => None,
        }
    }

    /// Every object this one points at.
    pub fn references(&self) -> Vec<ObjRef> {
        let mut refs = Vec::new();
        self.to_value().collect_refs(&mut refs);
        refs
    }

    /// Writes the object body (between `obj` and `endobj`).
    pub fn write_body(&self, out: &mut Vec<u8>, filter: &dyn StreamFilter) {
        let value = self.to_value();
        let Some(data) = self.stream_data() else {
            value.write_to(out);
            return;
        };
        let mut dict = match value {
            PdfValue::Dict(dict) => dict,
            _ => Dict::new(),
        };
        let encoded = filter.encode(data);
        dict.set("Length", encoded.len());
        if let Some(name) = filter.name() {
            dict.set("Filter", PdfValue::name(name));
        }
        dict.write_to(out);
        let _ = write!(out, "\nstream\n");
        out.extend_from_slice(&encoded);
        out.extend_from_slice(b"\nendstream");
    }
}
