// Copyright 2026 The slabdom Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Serializing a document back to XML text.
//!
//! The printer walks the tree and emits indented output: an element's
//! value (its first `Data` or `CData` child) comes right after the
//! open tag, every other child gets its own line one indent level
//! deeper, and childless elements self-close. Values are written as
//! the raw bytes the nodes hold; nothing is escaped or transcoded.
//!
//! When the caller still has the buffer a document was parsed from,
//! [`SerializeOpts::source`] lets the printer splice the original text
//! of any subtree that has not been mutated since the parse, instead
//! of re-walking it.

use std::io::{self, Write};

use crate::arena::NodeId;
use crate::document::Document;
use crate::node::NodeKind;

/// Options for [`serialize`].
#[derive(Clone, Copy, Default)]
pub struct SerializeOpts<'s> {
    /// The buffer the document was parsed from. Enables verbatim
    /// reuse of unmutated subtrees.
    pub source: Option<&'s [u8]>,
}

impl<'s> SerializeOpts<'s> {
    pub fn source(source: &'s [u8]) -> SerializeOpts<'s> {
        SerializeOpts {
            source: Some(source),
        }
    }
}

/// Print every child of the document root, one top-level node per
/// line.
pub fn serialize<Wr: Write>(writer: Wr, doc: &Document, opts: SerializeOpts<'_>) -> io::Result<()> {
    let mut printer = XmlPrinter {
        writer,
        doc,
        source: opts.source,
    };
    printer.print_document()
}

/// Serialize into a fresh byte vector.
pub fn to_bytes(doc: &Document) -> Vec<u8> {
    let mut buf = Vec::new();
    serialize(&mut buf, doc, SerializeOpts::default()).expect("writing to a Vec cannot fail");
    buf
}

struct XmlPrinter<'d, 's, Wr> {
    writer: Wr,
    doc: &'d Document,
    source: Option<&'s [u8]>,
}

impl<Wr: Write> XmlPrinter<'_, '_, Wr> {
    fn print_document(&mut self) -> io::Result<()> {
        let doc = self.doc;
        let mut cursor = doc.arena.get(doc.root_id()).first_child;
        while let Some(id) = cursor {
            self.print_node(id, 0)?;
            self.writer.write_all(b"\n")?;
            cursor = doc.arena.get(id).next;
        }
        Ok(())
    }

    fn print_node(&mut self, id: NodeId, depth: usize) -> io::Result<()> {
        let doc = self.doc;
        let node = doc.arena.get(id);

        // An intact parse range means nothing under this node changed;
        // splice the original text.
        if let (Some(source), Some(end)) = (self.source, node.slice_end) {
            self.indent(depth)?;
            return self.writer.write_all(&source[node.slice_start..end]);
        }

        match node.kind {
            NodeKind::Element => self.print_element(id, depth),
            NodeKind::Data => {
                self.indent(depth)?;
                self.writer.write_all(&node.value[..])
            }
            NodeKind::CData => {
                self.indent(depth)?;
                self.writer.write_all(b"<![CDATA[")?;
                self.writer.write_all(&node.value[..])?;
                self.writer.write_all(b"]]>")
            }
            NodeKind::Comment => {
                self.indent(depth)?;
                self.writer.write_all(b"<!--")?;
                self.writer.write_all(&node.value[..])?;
                self.writer.write_all(b"-->")
            }
            NodeKind::Pi => {
                self.indent(depth)?;
                self.writer.write_all(b"<?")?;
                self.writer.write_all(&node.value[..])?;
                self.writer.write_all(b"?>")
            }
            NodeKind::Doctype => {
                self.indent(depth)?;
                self.writer.write_all(b"<!DOCTYPE ")?;
                self.writer.write_all(&node.value[..])?;
                self.writer.write_all(b">")
            }
            NodeKind::Document | NodeKind::Attribute => {
                unreachable!("document and attribute nodes never sit in a child list")
            }
        }
    }

    fn print_element(&mut self, id: NodeId, depth: usize) -> io::Result<()> {
        let doc = self.doc;
        self.indent(depth)?;
        self.writer.write_all(b"<")?;
        self.write_qname(id)?;

        let mut cursor = doc.arena.get(id).first_attr;
        while let Some(aid) = cursor {
            let attr = doc.arena.get(aid);
            self.writer.write_all(b" ")?;
            self.write_qname(aid)?;
            self.writer.write_all(b"=\"")?;
            self.writer.write_all(&attr.value[..])?;
            self.writer.write_all(b"\"")?;
            cursor = attr.next;
        }

        if doc.arena.get(id).first_child.is_none() {
            return self.writer.write_all(b"/>");
        }
        self.writer.write_all(b">")?;

        // First Data/CData child is the element's value and stays on
        // the open-tag line.
        let mut value_child = None;
        let mut cursor = doc.arena.get(id).first_child;
        while let Some(cid) = cursor {
            let child = doc.arena.get(cid);
            if matches!(child.kind, NodeKind::Data | NodeKind::CData) {
                value_child = Some(cid);
                break;
            }
            cursor = child.next;
        }
        if let Some(vid) = value_child {
            let value = doc.arena.get(vid);
            if value.kind == NodeKind::CData {
                self.writer.write_all(b"<![CDATA[")?;
                self.writer.write_all(&value.value[..])?;
                self.writer.write_all(b"]]>")?;
            } else {
                self.writer.write_all(&value.value[..])?;
            }
        }

        let mut wrote_block = false;
        let mut cursor = doc.arena.get(id).first_child;
        while let Some(cid) = cursor {
            if Some(cid) != value_child {
                self.writer.write_all(b"\n")?;
                self.print_node(cid, depth + 1)?;
                wrote_block = true;
            }
            cursor = doc.arena.get(cid).next;
        }
        if wrote_block {
            self.writer.write_all(b"\n")?;
            self.indent(depth)?;
        }

        self.writer.write_all(b"</")?;
        self.write_qname(id)?;
        self.writer.write_all(b">")
    }

    fn write_qname(&mut self, id: NodeId) -> io::Result<()> {
        let node = self.doc.arena.get(id);
        if !node.prefix.is_empty() {
            self.writer.write_all(&node.prefix[..])?;
            self.writer.write_all(b":")?;
        }
        self.writer.write_all(&node.local[..])
    }

    fn indent(&mut self, depth: usize) -> io::Result<()> {
        for _ in 0..depth {
            self.writer.write_all(b"  ")?;
        }
        Ok(())
    }
}
