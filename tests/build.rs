// Copyright 2026 The slabdom Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Building, parsing, mutating and printing documents.

use slabdom::{serialize, to_bytes, Document, Node, NodeKind, SerializeOpts};

fn printed(doc: &Document) -> String {
    String::from_utf8(to_bytes(doc)).expect("test documents are UTF-8")
}

/// Walk the whole tree and check the structural invariants: symmetric
/// sibling links, consistent list heads and tails, exactly one parent.
fn check_links(node: Node<'_>) {
    for list in [
        node.children().collect::<Vec<_>>(),
        node.attributes().collect::<Vec<_>>(),
    ] {
        for (i, entry) in list.iter().enumerate() {
            assert_eq!(entry.parent(), Some(node));
            if i == 0 {
                assert!(entry.prev_sibling().is_none());
            } else {
                assert_eq!(entry.prev_sibling(), Some(list[i - 1]));
            }
            if i == list.len() - 1 {
                assert!(entry.next_sibling().is_none());
            } else {
                assert_eq!(entry.next_sibling(), Some(list[i + 1]));
            }
            check_links(*entry);
        }
    }
    assert_eq!(node.first_child(), node.children().next());
    assert_eq!(node.last_child(), node.children().last());
    assert_eq!(node.first_attr(), node.attributes().next());
    assert_eq!(node.last_attr(), node.attributes().last());
}

fn build_flat(doc: &mut Document, root_value: &[u8], second: &[u8], third: &[u8]) {
    doc.header(None);
    let mut tree = doc.tree_mut();
    let mut root = tree.element(b"", b"root", Some(root_value));
    root.element(b"", b"second", Some(second));
    root.element(b"", b"third", Some(third));
}

#[test]
fn build_and_print() {
    let mut doc = Document::new();
    build_flat(&mut doc, b"123456789", b"second", b"third");
    assert_eq!(
        printed(&doc),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <root>123456789\n\
         \x20 <second>second</second>\n\
         \x20 <third>third</third>\n\
         </root>\n"
    );
    check_links(doc.tree());
}

#[test]
fn reset_rebuilds_without_allocating() {
    let mut doc = Document::new();
    build_flat(&mut doc, b"123456789", b"second", b"third");
    let nodes = doc.node_count();
    let chunks = doc.chunk_count();

    doc.reset();
    doc.header(None);
    {
        let mut tree = doc.tree_mut();
        let mut root = tree.element(b"", b"root", Some(b"12345"));
        root.element(b"", b"one", Some(b"one"));
        root.element(b"", b"two", Some(b"two"));
    }

    assert_eq!(
        printed(&doc),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <root>12345\n\
         \x20 <one>one</one>\n\
         \x20 <two>two</two>\n\
         </root>\n"
    );
    assert_eq!(doc.node_count(), nodes);
    assert_eq!(doc.chunk_count(), chunks);
}

fn build_vast(doc: &mut Document) {
    let mut tree = doc.tree_mut();
    let mut vast = tree.element(b"", b"VAST", None);
    vast.attribute(b"", b"version", b"3.0");
    let mut inline = vast.element(b"", b"InLine", None);
    inline.element(b"", b"AdTitle", Some(b"VAST 3.0 Instream Test"));
    let mut creatives = inline.element(b"", b"Creatives", None);
    let mut creative = creatives.element(b"", b"Creative", None);
    creative
        .attribute(b"", b"id", b"123456")
        .attribute(b"", b"adId", b"654321");
}

const VAST_PRINTED: &str = "<VAST version=\"3.0\">\n\
                            \x20 <InLine>\n\
                            \x20   <AdTitle>VAST 3.0 Instream Test</AdTitle>\n\
                            \x20   <Creatives>\n\
                            \x20     <Creative id=\"123456\" adId=\"654321\"/>\n\
                            \x20   </Creatives>\n\
                            \x20 </InLine>\n\
                            </VAST>\n";

#[test]
fn attributes_and_nesting() {
    let mut doc = Document::new();
    build_vast(&mut doc);
    let out = printed(&doc);
    assert!(out.contains("<VAST version=\"3.0\">"));
    assert!(out.contains("<Creative id=\"123456\" adId=\"654321\"/>"));
    assert_eq!(out, VAST_PRINTED);
    check_links(doc.tree());
}

#[test]
fn parse_print_round_trip() {
    let mut doc = Document::new();
    doc.parse(VAST_PRINTED.as_bytes()).unwrap();
    assert_eq!(printed(&doc), VAST_PRINTED);
    check_links(doc.tree());
}

#[test]
fn reparse_is_idempotent_and_allocation_free() {
    let mut doc = Document::new();
    doc.parse(VAST_PRINTED.as_bytes()).unwrap();
    let first = printed(&doc);
    let nodes = doc.node_count();
    let chunks = doc.chunk_count();

    doc.parse(VAST_PRINTED.as_bytes()).unwrap();
    assert_eq!(printed(&doc), first);
    assert_eq!(doc.node_count(), nodes);
    assert_eq!(doc.chunk_count(), chunks);
}

#[test]
fn parse_copies_text_out_of_the_input() {
    let mut doc = Document::new();
    {
        let input = b"<r a=\"1\">value</r>".to_vec();
        doc.parse(&input).unwrap();
        drop(input);
    }
    let r = doc.elements().unwrap();
    assert_eq!(r.value(), b"value");
    assert_eq!(r.attr(b"a").unwrap().value(), b"1");
}

#[test]
fn mismatched_end_tag_is_an_error() {
    let mut doc = Document::new();
    let err = doc.parse(b"<a></a></b>").unwrap_err();
    assert_eq!(err, slabdom::ParseError::MismatchedEnd(7));
}

#[test]
fn serializer_splices_unmutated_source() {
    let source = b"<a><b  >1</b><c>2</c></a>";
    let mut doc = Document::new();
    doc.parse(source).unwrap();

    let mut out = Vec::new();
    serialize(&mut out, &doc, SerializeOpts::source(source)).unwrap();
    assert_eq!(out, b"<a><b  >1</b><c>2</c></a>\n");

    // Mutating <c> invalidates it and its ancestors, but <b> still
    // prints from the original text, odd spacing included.
    let c = doc.query().descendant(b"c").first().unwrap().id();
    doc.get_mut(c).set_value(b"22");

    let mut out = Vec::new();
    serialize(&mut out, &doc, SerializeOpts::source(source)).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<a>\n  <b  >1</b>\n  <c>22</c>\n</a>\n"
    );
}

#[test]
fn detach_all_four_link_cases() {
    let mut doc = Document::new();
    let (a, b, c, d, only) = {
        let mut tree = doc.tree_mut();
        let mut r = tree.element(b"", b"r", None);
        let a = r.element(b"", b"a", None).id();
        let b = r.element(b"", b"b", None).id();
        let c = r.element(b"", b"c", None).id();
        let d = r.element(b"", b"d", None).id();
        let mut lone = r.element(b"", b"lone", None);
        let only = lone.element(b"", b"only", None).id();
        (a, b, c, d, only)
    };

    // Both siblings present.
    doc.get_mut(b).detach();
    // Head of the list: only a next sibling.
    doc.get_mut(a).detach();
    // Tail of the list: only a prev sibling.
    doc.get_mut(d).detach();
    // Sole child: only a parent.
    doc.get_mut(only).detach();

    for id in [a, b, d, only] {
        let node = doc.get(id);
        assert!(node.parent().is_none());
        assert!(node.prev_sibling().is_none());
        assert!(node.next_sibling().is_none());
    }
    let r = doc.elements().unwrap();
    let names: Vec<_> = r.children().map(|n| n.local_name().to_vec()).collect();
    assert_eq!(names, vec![b"c".to_vec(), b"lone".to_vec()]);
    assert_eq!(doc.get(c).position(), 0);
    check_links(doc.tree());
}

#[test]
fn detach_attribute_updates_the_attribute_list() {
    let mut doc = Document::new();
    doc.tree_mut()
        .element(b"", b"r", None)
        .attribute(b"", b"x", b"1")
        .attribute(b"", b"y", b"2")
        .attribute(b"", b"z", b"3");
    let y = doc.tree().first_child().unwrap().attr(b"y").unwrap().id();
    doc.get_mut(y).detach();

    let r = doc.elements().unwrap();
    let names: Vec<_> = r.attributes().map(|n| n.local_name().to_vec()).collect();
    assert_eq!(names, vec![b"x".to_vec(), b"z".to_vec()]);
    check_links(doc.tree());
    assert_eq!(printed(&doc), "<r x=\"1\" z=\"3\"/>\n");
}

#[test]
fn element_value_reads_first_data_or_cdata_child() {
    let mut doc = Document::new();
    {
        let mut tree = doc.tree_mut();
        let mut r = tree.element(b"", b"r", None);
        r.element(b"", b"plain", Some(b"text"));
        r.element(b"", b"mixed", None).comment(b"c").data(b"later");
        r.element(b"", b"raw", None).cdata(b"<raw>");
        r.element(b"", b"empty", None);
    }
    let r = doc.elements().unwrap();
    let value_of = |name: &[u8]| r.query().child(name).first().unwrap().value().to_vec();
    assert_eq!(value_of(b"plain"), b"text");
    assert_eq!(value_of(b"mixed"), b"later");
    assert_eq!(value_of(b"raw"), b"<raw>");
    assert_eq!(value_of(b"empty"), b"");
}

#[test]
fn set_value_updates_the_data_child_in_place() {
    let mut doc = Document::new();
    let r = doc.tree_mut().element(b"", b"r", Some(b"before")).id();
    doc.get_mut(r).set_value(b"after");
    assert_eq!(doc.get(r).value(), b"after");
    // Still a single data child.
    assert_eq!(doc.get(r).children().count(), 1);

    // An element with no data child keeps the value in its own raw
    // slot, where the element-value accessor does not look.
    let bare = doc.tree_mut().element(b"", b"bare", None).id();
    doc.get_mut(bare).set_value(b"hidden");
    assert_eq!(doc.get(bare).raw_value(), b"hidden");
    assert_eq!(doc.get(bare).value(), b"");
}

#[test]
fn copy_into_another_document_is_isolated() {
    let mut a = Document::new();
    a.tree_mut()
        .element(b"", b"A", None)
        .element(b"", b"B", Some(b"v"));

    let mut b = Document::new();
    b.tree_mut().copy_from(a.query().child(b"A").first().unwrap());

    assert_eq!(
        b.query().child(b"A").child(b"B").first().unwrap().value(),
        b"v"
    );
    check_links(b.tree());

    // Mutating the original leaves the copy alone.
    let src_b = a.query().descendant(b"B").first().unwrap().id();
    a.get_mut(src_b).set_value(b"changed");
    assert_eq!(
        b.query().child(b"A").child(b"B").first().unwrap().value(),
        b"v"
    );

    // And the other way around.
    let copy_b = b.query().descendant(b"B").first().unwrap().id();
    b.get_mut(copy_b).set_value(b"copy");
    assert_eq!(a.query().descendant(b"B").first().unwrap().value(), b"changed");
}

#[test]
fn copy_preserves_attributes_and_order() {
    let mut a = Document::new();
    {
        let mut tree = a.tree_mut();
        let mut src = tree.element(b"", b"src", None);
        src.attribute(b"", b"x", b"1").attribute(b"", b"y", b"2");
        src.element(b"", b"one", Some(b"1"));
        src.element(b"", b"two", Some(b"2"));
    }
    let mut b = Document::new();
    b.tree_mut().copy_from(a.elements().unwrap());

    let copy = b.elements().unwrap();
    let attrs: Vec<_> = copy.attributes().map(|n| n.local_name().to_vec()).collect();
    assert_eq!(attrs, vec![b"x".to_vec(), b"y".to_vec()]);
    let children: Vec<_> = copy.children().map(|n| n.local_name().to_vec()).collect();
    assert_eq!(children, vec![b"one".to_vec(), b"two".to_vec()]);
    check_links(b.tree());
}

#[test]
fn copy_of_an_attribute_lands_on_the_attribute_list() {
    let mut a = Document::new();
    a.tree_mut()
        .element(b"", b"r", None)
        .attribute(b"", b"id", b"7");
    let mut b = Document::new();
    {
        let mut tree = b.tree_mut();
        let mut target = tree.element(b"", b"target", None);
        target.copy_from(a.query().child(b"r").attribute(b"id").first().unwrap());
    }
    assert_eq!(printed(&b), "<target id=\"7\"/>\n");
}

#[test]
fn adopt_moves_a_subtree_within_a_document() {
    let mut doc = Document::new();
    let (b, c) = {
        let mut tree = doc.tree_mut();
        let mut r = tree.element(b"", b"r", None);
        let b = r.element(b"", b"a", None).element(b"", b"b", Some(b"v")).id();
        let c = r.element(b"", b"c", None).id();
        (b, c)
    };
    doc.get_mut(c).adopt(b);

    assert_eq!(doc.query().child(b"r").child(b"a").child(b"b").count(), 0);
    assert_eq!(
        doc.query()
            .child(b"r")
            .child(b"c")
            .child(b"b")
            .first()
            .unwrap()
            .value(),
        b"v"
    );
    check_links(doc.tree());
}

#[test]
fn copy_within_duplicates_a_subtree() {
    let mut doc = Document::new();
    let (src, dest) = {
        let mut tree = doc.tree_mut();
        let mut r = tree.element(b"", b"r", None);
        let src = r.element(b"", b"item", Some(b"v")).id();
        let dest = r.element(b"", b"bucket", None).id();
        (src, dest)
    };
    doc.copy_within(dest, src);

    assert_eq!(doc.query().descendant(b"item").count(), 2);
    assert_eq!(
        doc.query()
            .child(b"r")
            .child(b"bucket")
            .child(b"item")
            .first()
            .unwrap()
            .value(),
        b"v"
    );
    check_links(doc.tree());
}

#[test]
fn header_takes_a_custom_encoding() {
    let mut doc = Document::new();
    doc.tree_mut().element(b"", b"r", None);
    doc.header(Some(b"ISO-8859-1"));
    assert_eq!(
        printed(&doc),
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<r/>\n"
    );
}

#[test]
fn elements_returns_the_most_recent_top_level_element() {
    let mut doc = Document::new();
    {
        let mut tree = doc.tree_mut();
        tree.element(b"", b"first", None);
        tree.element(b"", b"second", None);
        tree.comment(b"trailing");
    }
    assert_eq!(doc.elements().unwrap().local_name(), b"second");
}

#[test]
fn builder_leaves_and_prefixes_print() {
    let mut doc = Document::new();
    {
        let mut tree = doc.tree_mut();
        tree.doctype(b"catalog");
        let mut r = tree.element(b"ns", b"catalog", None);
        r.comment(b"inventory");
        r.element(b"ns", b"item", Some(b"widget"));
        r.cdata(b"a < b");
        r.pi(b"checksum 99");
    }
    assert_eq!(
        printed(&doc),
        "<!DOCTYPE catalog>\n\
         <ns:catalog><![CDATA[a < b]]>\n\
         \x20 <!--inventory-->\n\
         \x20 <ns:item>widget</ns:item>\n\
         \x20 <?checksum 99?>\n\
         </ns:catalog>\n"
    );

    let r = doc.elements().unwrap();
    assert_eq!(r.prefix(), b"ns");
    assert_eq!(r.local_name(), b"catalog");
    let mut buf = slabdom::tendril::ByteTendril::new();
    assert_eq!(r.qualified_name(&mut buf), b"ns:catalog");
}

#[test]
fn node_kinds_and_positions() {
    let mut doc = Document::new();
    let mut input = Vec::new();
    input.extend_from_slice(b"<?xml version=\"1.0\"?><!DOCTYPE r><r>");
    input.extend_from_slice(b"text<!--c--><![CDATA[d]]><e/></r>");
    doc.parse(&input).unwrap();

    let kinds: Vec<_> = doc.tree().children().map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::Pi, NodeKind::Doctype, NodeKind::Element]
    );

    let r = doc.elements().unwrap();
    let kinds: Vec<_> = r.children().map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Data,
            NodeKind::Comment,
            NodeKind::CData,
            NodeKind::Element
        ]
    );
    assert_eq!(r.children().last().unwrap().position(), 3);
    assert_eq!(doc.tree().kind(), NodeKind::Document);
}
