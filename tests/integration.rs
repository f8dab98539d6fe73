//! End-to-end tests: documents built through the factory and written to
//! bytes, with fonts synthesized in memory by `common`.

mod common;

use folio::config::DocumentConfig;
use folio::font::glyph_map::{CMapSegment, CharGlyphMap};
use folio::font::loader::load_font;
use folio::font::subset::{embed_program, EmbeddedProgram};
use folio::font::type1::{decrypt, PfbSegments, EEXEC_KEY};
use folio::font::{EmbeddingMode, Font};
use folio::gradient::{Color, GradientBuilder};
use folio::pdf::object::{Info, PageLabel, PageLabelStyle};
use folio::pdf::{ObjRef, ObjectKind, ObjectRegistry, PdfDocument, PdfObject};
use folio::resource::MemoryResolver;
use folio::FolioError;

use common::*;

// ─── Helpers ────────────────────────────────────────────────────

fn uncompressed() -> DocumentConfig {
    DocumentConfig {
        compress_streams: false,
        ..DocumentConfig::default()
    }
}

/// Catalog, page tree, resources and one A4 page.
fn with_page(mut doc: PdfDocument) -> (PdfDocument, ObjRef) {
    let mut factory = doc.factory();
    let pages = factory.make_pages();
    let resources = factory.make_resources();
    factory.make_root(pages);
    let page = factory.make_page(resources, 595.0, 842.0).unwrap();
    (doc, page)
}

fn text(pdf: &[u8]) -> String {
    String::from_utf8_lossy(pdf).into_owned()
}

fn ttf_document(mode: EmbeddingMode) -> (PdfDocument, ObjRef, String) {
    let ttf = build_ttf();
    let font = load_font(&ttf, Some("fonts/test-sans.ttf"), mode, EmbeddingMode::Auto).unwrap();
    let mut resolver = MemoryResolver::new();
    resolver.insert("fonts/test-sans.ttf", ttf);
    let (mut doc, page) = with_page(PdfDocument::with_resolver(uncompressed(), resolver));
    let name = doc.fonts_mut().register("Test Sans", 400, false, font);
    (doc, page, name)
}

fn map_chars(doc: &mut PdfDocument, resource_name: &str, chars: &str) -> Vec<u16> {
    let entry = doc.fonts_mut().get_mut(resource_name).unwrap();
    chars.chars().map(|c| entry.font.map_char(c)).collect()
}

// ─── Object Registry ────────────────────────────────────────────

#[test]
fn test_numbers_are_monotonic_across_trailer_objects() {
    let mut doc = PdfDocument::new(uncompressed());
    let mut factory = doc.factory();
    let pages = factory.make_pages();
    let resources = factory.make_resources();
    let page = factory.make_page(resources, 100.0, 100.0).unwrap();
    let goto = factory.make_goto(page, 0.0, 10.0);
    let link = factory.make_link([0.0, 0.0, 10.0, 10.0], goto);
    let root = factory.make_root(pages);
    let names = factory.make_names();

    let numbers: Vec<u32> = [pages, resources, page, goto, link, root, names]
        .iter()
        .map(|r| r.number())
        .collect();
    assert!(numbers.windows(2).all(|w| w[0] < w[1]), "{:?}", numbers);

    let registry = doc.registry();
    let listed: Vec<u32> = registry.objects().map(|(r, _)| r.number()).collect();
    assert_eq!(listed, (1..=registry.len() as u32).collect::<Vec<_>>());
    assert!(registry.is_trailer_object(goto));
    assert!(registry.is_trailer_object(names));
    assert!(!registry.is_trailer_object(link));
}

#[test]
fn test_destinations_two_equal_one_distinct() {
    let (mut doc, page) = with_page(PdfDocument::new(uncompressed()));
    let mut factory = doc.factory();
    let first = factory.make_destination("chapter-1", page, 72.0, 700.0);
    let distinct = factory.make_destination("chapter-2", page, 72.0, 400.0);
    let again = factory.make_destination("chapter-1", page, 72.0, 700.0);
    assert_eq!(first, again);
    assert_ne!(first, distinct);
    assert_eq!(doc.registry().count(ObjectKind::Destination), 2);
}

#[test]
fn test_dedup_is_order_independent() {
    let mut a = ObjectRegistry::new();
    let mut b = ObjectRegistry::new();
    let spec = |name: &str| {
        PdfObject::FileSpec(folio::pdf::object::FileSpec {
            file: name.to_string(),
            embedded: None,
            description: None,
        })
    };
    for name in ["a.pdf", "b.pdf", "a.pdf", "c.pdf", "b.pdf"] {
        a.find_or_register(spec(name));
    }
    for name in ["c.pdf", "b.pdf", "a.pdf", "a.pdf"] {
        b.find_or_register(spec(name));
    }
    assert_eq!(a.count(ObjectKind::FileSpec), 3);
    assert_eq!(b.count(ObjectKind::FileSpec), 3);
    assert_eq!(a.find(&spec("a.pdf")), Some(ObjRef::new(1)));
    assert_eq!(b.find(&spec("a.pdf")), Some(ObjRef::new(3)));
}

#[test]
fn test_reference_to_unregistered_object_fails_at_write() {
    let (mut doc, page) = with_page(PdfDocument::new(uncompressed()));
    let mut factory = doc.factory();
    let link = factory.make_link([0.0, 0.0, 1.0, 1.0], ObjRef::new(4242));
    factory.add_annotation(page, link).unwrap();
    match doc.write() {
        Err(FolioError::UnregisteredObject { referenced, by }) => {
            assert_eq!(referenced, ObjRef::new(4242));
            assert_eq!(by, link);
        }
        other => panic!("expected an unregistered reference, got {:?}", other.map(|b| b.len())),
    }
}

// ─── Links, Files, Outlines ─────────────────────────────────────

#[test]
fn test_embedded_file_link_needs_names_dictionary() {
    let (mut doc, _) = with_page(PdfDocument::new(uncompressed()));
    let mut factory = doc.factory();
    let err = factory.external_action("embedded-file:data.csv", false).unwrap_err();
    assert!(matches!(err, FolioError::MissingStructure { structure: "names dictionary", .. }));

    factory.make_names();
    let err = factory.external_action("embedded-file:data.csv", false).unwrap_err();
    assert!(matches!(err, FolioError::MissingStructure { structure: "embedded files tree", .. }));

    factory.add_embedded_file("data.csv", b"a,b\n1,2\n".to_vec(), Some("Raw data")).unwrap();
    let action = factory.external_action("embedded-file:data.csv", false).unwrap();
    assert!(matches!(
        doc.registry().get(action),
        Some(PdfObject::Action(folio::pdf::object::Action::JavaScript(script))) if script.contains("data.csv")
    ));
}

#[test]
fn test_document_with_navigation_writes() {
    let (mut doc, page) = with_page(PdfDocument::new(uncompressed()));
    let mut factory = doc.factory();
    factory.make_names();
    let intro = factory.make_destination("intro", page, 72.0, 770.0);
    let outro = factory.make_destination("outro", page, 72.0, 72.0);
    factory.make_dests(&[outro, intro]).unwrap();

    let internal = factory.make_internal_link([72.0, 700.0, 200.0, 712.0], page, 72.0, 72.0);
    let external = factory
        .make_external_link([72.0, 680.0, 200.0, 692.0], "https://example.org/", false)
        .unwrap();
    factory.add_annotation(page, internal).unwrap();
    factory.add_annotation(page, external).unwrap();

    let goto = factory.make_goto(page, 72.0, 770.0);
    let chapter = factory.make_outline(None, "Chapter 1", Some(goto), true).unwrap();
    factory.make_outline(Some(chapter), "Section 1.1", Some(goto), false).unwrap();

    factory.make_page_labels();
    factory
        .add_page_label(
            0,
            PageLabel {
                style: Some(PageLabelStyle::LowerRoman),
                prefix: None,
                start: None,
            },
        )
        .unwrap();
    factory.make_info(Info {
        title: Some("Navigation".to_string()),
        ..Info::default()
    });

    let pdf = doc.close().unwrap();
    let out = text(&pdf);
    assert!(out.contains("/Dests"));
    assert!(out.contains("/Outlines"));
    assert!(out.contains("/PageLabels"));
    assert!(out.contains("/URI (https://example.org/)"));
    assert!(out.contains("/Title (Navigation)"));
    assert!(out.contains("/Info "));
    assert!(out.contains("/Annots ["));
}

// ─── Gradients ──────────────────────────────────────────────────

#[test]
fn test_gradient_objects_and_sharing() {
    let (mut doc, _) = with_page(PdfDocument::new(uncompressed()));
    let colors = vec![
        Color::rgb(1.0, 0.0, 0.0),
        Color::rgb(0.0, 1.0, 0.0),
        Color::rgb(0.0, 0.0, 1.0),
    ];
    let mut factory = doc.factory();
    let mut first = GradientBuilder::axial(colors.clone(), vec![0.5], vec![0.0, 0.0, 200.0, 0.0]);
    let mut second = GradientBuilder::axial(colors, vec![0.5], vec![0.0, 0.0, 200.0, 0.0]);
    let a = factory.make_gradient(&mut first).unwrap();
    let b = factory.make_gradient(&mut second).unwrap();
    assert_eq!(a, b);
    let name = factory.add_pattern_resource(a).unwrap();

    let registry = doc.registry();
    // two exponential functions and the stitching function over them
    assert_eq!(registry.count(ObjectKind::Function), 3);
    assert_eq!(registry.count(ObjectKind::Shading), 1);
    assert_eq!(registry.count(ObjectKind::Pattern), 1);

    let pdf = doc.write().unwrap();
    let out = text(&pdf);
    assert!(out.contains("/FunctionType 3"));
    assert!(out.contains("/Bounds [0.5]"));
    assert!(out.contains(&format!("/{} {}", name, a)));
}

// ─── Glyph Mapping ──────────────────────────────────────────────

#[test]
fn test_glyph_map_round_trips_and_private_use() {
    let map = CharGlyphMap::new(
        "Test",
        vec![CMapSegment::new(0x41, 0x5A, 3), CMapSegment::new(0x61, 0x7A, 29)],
    );
    for c in ['A', 'M', 'z'] {
        let glyph = map.find_glyph_index(c as u32).unwrap();
        assert_eq!(map.find_char_from_glyph(glyph, false), Some(c as u32));
    }

    // a ligature glyph with no character of its own
    let pu = map.find_char_from_glyph(57, true).unwrap();
    assert!((0xE000..0xF900).contains(&pu));
    assert_eq!(map.find_glyph_index(pu), Some(57));
    assert_eq!(map.find_char_from_glyph(57, true), Some(pu));
    assert_eq!(map.private_use_stats().mapped, 1);
}

// ─── Fonts ──────────────────────────────────────────────────────

#[test]
fn test_subset_cid_set_bitmap() {
    let ttf = build_ttf();
    let mut font = load_font(&ttf, Some("sans"), EmbeddingMode::Subset, EmbeddingMode::Auto).unwrap();
    // 'A', 'E' and 'n' are glyphs 3, 7 and 42
    for c in ['A', 'E', 'n'] {
        font.map_char(c);
    }
    let Font::Cid(cid) = &font else {
        panic!("TrueType fonts load as CID fonts");
    };
    let bitmap = cid.cid_set().bitmap(cid.glyph_map());
    let set: Vec<usize> = (0..bitmap.len() * 8)
        .filter(|&bit| bitmap[bit / 8] & (0x80 >> (bit % 8)) != 0)
        .collect();
    assert_eq!(set, vec![0, 1, 2, 3, 7, 42]);
}

#[test]
fn test_truetype_subset_keeps_used_glyphs_and_components() {
    let ttf = build_ttf();
    let mut font = load_font(&ttf, Some("sans"), EmbeddingMode::Subset, EmbeddingMode::Auto).unwrap();
    assert_eq!(font.map_char('A'), 3);
    assert_eq!(font.map_char('H'), 4);

    let program = embed_program(&mut font, &ttf, "EAAAAA+").unwrap();
    let EmbeddedProgram::TrueType(data) = program else {
        panic!("expected a TrueType program");
    };
    let face = ttf_parser::Face::parse(&data, 0).unwrap();
    // 0, 1, 2, 'A', 'H' and the component of 'H'
    assert_eq!(face.number_of_glyphs(), 6);
    assert_eq!(face.glyph_index('A'), Some(ttf_parser::GlyphId(3)));
    assert_eq!(face.glyph_index('H'), Some(ttf_parser::GlyphId(4)));
    assert_eq!(face.glyph_index('B'), None);
    assert_eq!(face.glyph_hor_advance(ttf_parser::GlyphId(5)), Some(ttf_advance(COMPONENT_GLYPH)));

    // the composite now points at the component's new index
    let raw = face.raw_face();
    let loca = raw.table(ttf_parser::Tag::from_bytes(b"loca")).unwrap();
    let glyf = raw.table(ttf_parser::Tag::from_bytes(b"glyf")).unwrap();
    let start = u16::from_be_bytes([loca[8], loca[9]]) as usize * 2;
    assert_eq!(i16::from_be_bytes([glyf[start], glyf[start + 1]]), -1);
    assert_eq!(u16::from_be_bytes([glyf[start + 12], glyf[start + 13]]), 5);

    let Font::Cid(cid) = &font else {
        panic!("TrueType fonts load as CID fonts");
    };
    assert_eq!(cid.cid_set().subset_order(), &[0, 1, 2, 3, COMPOSITE_GLYPH, COMPONENT_GLYPH]);
}

#[test]
fn test_document_with_subset_truetype_font() {
    let (mut doc, page, name) = ttf_document(EmbeddingMode::Auto);
    let codes = map_chars(&mut doc, &name, "HAHA");
    assert_eq!(codes, vec![3, 4, 3, 4]);
    doc.factory()
        .make_content_stream(page, format!("BT /{} 12 Tf <00030004> Tj ET", name).into_bytes())
        .unwrap();

    let pdf = doc.close().unwrap();
    let out = text(&pdf);
    assert!(out.contains("/BaseFont /EAAAAA+TestSans"));
    assert!(out.contains("/Encoding /Identity-H"));
    assert!(out.contains("/Subtype /CIDFontType2"));
    assert!(out.contains("/CIDToGIDMap /Identity"));
    assert!(out.contains("/FontFile2 "));
    assert!(out.contains("/CIDSet "));
    assert!(out.contains("/ToUnicode "));
    assert!(out.contains("<0003> <0048>"));
    assert!(out.contains("<0004> <0041>"));
    // widths of 0, 1, 2, 'H', 'A' and the component
    assert!(out.contains("/W [0 [500 510 520 600 530 610]]"));

    let font = doc.font_object(&name).unwrap();
    assert!(out.contains(&format!("/{} {}", name, font)));
}

#[test]
fn test_full_embedded_cid_font_has_cid_set() {
    let (mut doc, _, name) = ttf_document(EmbeddingMode::Full);
    let codes = map_chars(&mut doc, &name, "HA");
    assert_eq!(codes, vec![COMPOSITE_GLYPH, 3]);

    let pdf = doc.close().unwrap();
    let out = text(&pdf);
    assert!(out.contains("/BaseFont /TestSans"));
    assert!(!out.contains("EAAAAA+"));
    assert!(out.contains("/FontFile2 "));
    assert!(out.contains("/CIDSet "));
    // every glyph reachable through the cmap: 0..=54
    let mut bits = vec![0xFF; 6];
    bits.push(0xFE);
    assert!(doc
        .registry()
        .objects()
        .any(|(_, obj)| matches!(obj, PdfObject::Stream(stream) if stream.data == bits)));
}

#[test]
fn test_unreadable_program_is_referenced_without_embedding() {
    let ttf = build_ttf();
    let font = load_font(&ttf, Some("fonts/missing.ttf"), EmbeddingMode::Subset, EmbeddingMode::Auto).unwrap();
    let (mut doc, _) = with_page(PdfDocument::with_resolver(uncompressed(), MemoryResolver::new()));
    let name = doc.fonts_mut().register("Test Sans", 400, false, font);
    map_chars(&mut doc, &name, "B");

    let pdf = doc.close().unwrap();
    let out = text(&pdf);
    assert!(!out.contains("/FontFile2"));
    assert!(!out.contains("/CIDSet"));
    assert!(out.contains("/BaseFont /TestSans"));
    assert!(!out.contains("EAAAAA+"));
    // content-stream indices stay renumbered, so the map restores glyphs
    let map = doc
        .registry()
        .objects()
        .find_map(|(_, obj)| match obj {
            PdfObject::Stream(stream) if stream.data.len() == 8 => Some(stream.data.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(map, vec![0, 0, 0, 1, 0, 2, 0, 4]);
}

#[test]
fn test_failed_embedding_does_not_use_up_a_subset_tag() {
    let ttf = build_ttf();
    let missing = load_font(&ttf, Some("fonts/missing.ttf"), EmbeddingMode::Subset, EmbeddingMode::Auto).unwrap();
    let present = load_font(&ttf, Some("fonts/test-sans.ttf"), EmbeddingMode::Subset, EmbeddingMode::Auto).unwrap();
    let mut resolver = MemoryResolver::new();
    resolver.insert("fonts/test-sans.ttf", ttf);
    let (mut doc, _) = with_page(PdfDocument::with_resolver(uncompressed(), resolver));
    let first = doc.fonts_mut().register("Missing Sans", 400, false, missing);
    let second = doc.fonts_mut().register("Test Sans", 400, false, present);
    map_chars(&mut doc, &first, "A");
    map_chars(&mut doc, &second, "A");

    let pdf = doc.close().unwrap();
    let out = text(&pdf);
    assert!(out.contains("/BaseFont /EAAAAA+TestSans"));
    assert!(!out.contains("EAAAAB+"));
    assert!(out.contains("/BaseFont /TestSans"));
}

#[test]
fn test_type1_full_embedding() {
    let pfb = build_pfb();
    let font = load_font(&pfb, Some("serif.pfb"), EmbeddingMode::Auto, EmbeddingMode::Auto).unwrap();
    assert_eq!(font.embedding_mode(), EmbeddingMode::Full);
    let mut resolver = MemoryResolver::new();
    resolver.insert("serif.pfb", pfb.clone());
    let (mut doc, _) = with_page(PdfDocument::with_resolver(uncompressed(), resolver));
    let name = doc.fonts_mut().register("Test Serif", 400, false, font);
    assert_eq!(map_chars(&mut doc, &name, "AB"), vec![65, 66]);

    let pdf = doc.close().unwrap();
    let out = text(&pdf);
    let segments = PfbSegments::parse(&pfb).unwrap();
    assert!(out.contains("/BaseFont /TestSerif"));
    assert!(out.contains("/FontFile "));
    assert!(out.contains(&format!("/Length1 {}", segments.cleartext.len())));
    assert!(out.contains(&format!("/Length2 {}", segments.binary.len())));
    assert!(out.contains(&format!("/Length3 {}", segments.trailer.len())));
    assert!(out.contains("/FirstChar 32"));
}

#[test]
fn test_type1_subset_embedding() {
    let pfb = build_pfb();
    let mut font = load_font(&pfb, Some("serif.pfb"), EmbeddingMode::Subset, EmbeddingMode::Auto).unwrap();
    font.map_char('A');
    font.map_char('A');

    let program = embed_program(&mut font, &pfb, "EAAAAB+").unwrap();
    let EmbeddedProgram::Type1(segments) = program else {
        panic!("expected a Type1 program");
    };
    assert!(find_bytes(&segments.cleartext, b"/FontName /EAAAAB+TestSerif").is_some());
    let private = decrypt(&segments.binary, EEXEC_KEY);
    assert!(find_bytes(&private, b"/CharStrings 2 dict").is_some());
    assert!(find_bytes(&private, b"/A ").is_some());
    assert!(find_bytes(&private, b"/B ").is_none());
    assert!(find_bytes(&private, b"/Aacute").is_none());
}

#[test]
fn test_type1_subset_widths_cover_used_range() {
    let pfb = build_pfb();
    let font = load_font(&pfb, Some("serif.pfb"), EmbeddingMode::Subset, EmbeddingMode::Auto).unwrap();
    let mut resolver = MemoryResolver::new();
    resolver.insert("serif.pfb", pfb);
    let (mut doc, _) = with_page(PdfDocument::with_resolver(uncompressed(), resolver));
    let name = doc.fonts_mut().register("Test Serif", 400, false, font);
    map_chars(&mut doc, &name, "A B");

    let pdf = doc.close().unwrap();
    let out = text(&pdf);
    assert!(out.contains("/BaseFont /EAAAAA+TestSerif"));
    assert!(out.contains("/FirstChar 32 /LastChar 66"));
    let widths = out.split("/Widths [").nth(1).unwrap();
    let widths: Vec<&str> = widths[..widths.find(']').unwrap()].split_whitespace().collect();
    assert_eq!(widths.len(), 35);
    assert_eq!(widths[0], "250");
    assert_eq!(widths[1], "0");
    assert_eq!(&widths[33..], &["722", "667"]);
}

#[test]
fn test_base14_font_needs_no_program() {
    let (mut doc, _) = with_page(PdfDocument::new(uncompressed()));
    let name = doc.fonts_mut().resolve("Helvetica", 700, false).resource_name.clone();
    map_chars(&mut doc, &name, "Hi");
    let pdf = doc.close().unwrap();
    let out = text(&pdf);
    assert!(out.contains("/BaseFont /Helvetica-Bold"));
    assert!(out.contains("/Encoding /WinAnsiEncoding"));
    assert!(!out.contains("/FontDescriptor"));
    assert_eq!(doc.font_object("F1"), None);
}
