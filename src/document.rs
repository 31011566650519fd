// Copyright 2026 The slabdom Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The document: slab owner, parse driver, query entry point.

use std::cell::RefCell;

use log::{debug, warn};

use crate::arena::{NodeId, Slab, DEFAULT_CHUNK, ROOT};
use crate::node::{Node, NodeKind, NodeMut};
use crate::path::PathEngine;
use crate::tokenizer::{TokenKind, XmlTokenizer};
use crate::ParseError;

/// An XML document: the root node, the slab every node lives in, and
/// the scratch buffer shared by all queries on this document.
///
/// Nodes are created only through a document and live until the next
/// [`Document::reset`] (or [`Document::parse`], which resets first) or
/// until the document is dropped. Reset recycles node slots in place;
/// `NodeId`s handed out earlier must not be used afterwards.
pub struct Document {
    pub(crate) arena: Slab,
    pub(crate) engine: RefCell<PathEngine>,
}

impl Document {
    /// Document with the default slab chunk size (1000 nodes).
    pub fn new() -> Document {
        Document::with_chunk_size(DEFAULT_CHUNK)
    }

    /// Document with a custom chunk size (values below 50 are raised
    /// to 50).
    pub fn with_chunk_size(chunk_size: usize) -> Document {
        let mut arena = Slab::new(chunk_size);
        let root = arena.allocate(NodeKind::Document);
        debug_assert_eq!(root, ROOT);
        Document {
            arena,
            engine: RefCell::new(PathEngine::new()),
        }
    }

    /// Id of the root node.
    pub fn root_id(&self) -> NodeId {
        ROOT
    }

    /// Read handle on the root.
    pub fn tree(&self) -> Node<'_> {
        Node::new(self, ROOT)
    }

    /// Build handle on the root.
    pub fn tree_mut(&mut self) -> NodeMut<'_> {
        NodeMut::new(self, ROOT)
    }

    /// Read handle on an arbitrary node.
    pub fn get(&self, id: NodeId) -> Node<'_> {
        Node::new(self, id)
    }

    /// Mutable handle on an arbitrary node.
    pub fn get_mut(&mut self, id: NodeId) -> NodeMut<'_> {
        NodeMut::new(self, id)
    }

    /// The topmost element under the root, walking the child list
    /// backwards: with several top-level elements this is the most
    /// recently appended one, not the first in document order.
    pub fn elements(&self) -> Option<Node<'_>> {
        let mut cursor = self.arena.get(ROOT).last_child;
        while let Some(id) = cursor {
            let node = self.arena.get(id);
            if node.kind == NodeKind::Element {
                return Some(Node::new(self, id));
            }
            cursor = node.prev;
        }
        None
    }

    /// Drop the tree and rewind the slab to slot 1. Storage is kept:
    /// recycled slots retain their buffer capacity, so rebuilding a
    /// document of similar shape allocates nothing.
    pub fn reset(&mut self) -> &mut Self {
        {
            let root = self.arena.get_mut(ROOT);
            root.first_child = None;
            root.last_child = None;
            root.first_attr = None;
            root.last_attr = None;
            root.slice_start = 0;
            root.slice_end = None;
        }
        self.arena.reset();
        self
    }

    /// Prepend the standard `<?xml version="1.0" encoding="..."?>`
    /// processing instruction; the encoding defaults to UTF-8.
    pub fn header(&mut self, encoding: Option<&[u8]>) -> &mut Self {
        let mut value = Vec::with_capacity(40);
        value.extend_from_slice(b"xml version=\"1.0\" encoding=\"");
        value.extend_from_slice(encoding.unwrap_or(b"UTF-8"));
        value.push(b'"');
        let id = self.new_node(NodeKind::Pi, b"", b"", &value);
        self.prepend_child(ROOT, id);
        self.invalidate(id);
        self
    }

    /// Reset, then build the tree from `input`.
    ///
    /// The driver keeps a cursor at the current parent and applies
    /// each token from the tokenizer top-down. Text is copied into
    /// node-owned buffers, so `input` may be dropped afterwards.
    /// Tokenizer errors and end tags with no open element abort the
    /// parse, leaving a structurally valid partial tree.
    pub fn parse(&mut self, input: &[u8]) -> Result<(), ParseError> {
        self.reset();
        let mut tokenizer = XmlTokenizer::new(input);
        let mut cursor = ROOT;
        loop {
            let token = tokenizer.next_token()?;
            match token.kind {
                TokenKind::StartElement => {
                    let id = self.new_node(NodeKind::Element, token.prefix, token.local, b"");
                    self.arena.get_mut(id).slice_start = token.start;
                    self.append_child(cursor, id);
                    cursor = id;
                }
                TokenKind::EndElement | TokenKind::EndEmptyElement => {
                    if cursor == ROOT {
                        return Err(ParseError::MismatchedEnd(token.start));
                    }
                    if token.kind == TokenKind::EndElement {
                        let open = self.arena.get(cursor);
                        if &open.local[..] != token.local {
                            warn!(
                                "end tag </{}> closes <{}>",
                                String::from_utf8_lossy(token.local),
                                String::from_utf8_lossy(&open.local[..]),
                            );
                        }
                    }
                    let node = self.arena.get_mut(cursor);
                    node.slice_end = Some(token.end);
                    cursor = node.parent.expect("non-root cursor has a parent");
                }
                TokenKind::Attribute => {
                    let id =
                        self.new_node(NodeKind::Attribute, token.prefix, token.local, token.value);
                    self.append_attr(cursor, id);
                }
                TokenKind::Data => {
                    let id = self.new_node(NodeKind::Data, b"", b"", token.value);
                    self.append_child(cursor, id);
                }
                TokenKind::CData => {
                    let id = self.new_node(NodeKind::CData, b"", b"", token.value);
                    self.append_child(cursor, id);
                }
                TokenKind::Comment => {
                    let id = self.new_node(NodeKind::Comment, b"", b"", token.value);
                    self.append_child(cursor, id);
                }
                TokenKind::Pi => {
                    let id = self.new_node(NodeKind::Pi, b"", b"", token.value);
                    let node = self.arena.get_mut(id);
                    node.slice_start = token.start;
                    node.slice_end = Some(token.end);
                    self.append_child(cursor, id);
                }
                TokenKind::Doctype => {
                    let id = self.new_node(NodeKind::Doctype, b"", b"", token.value);
                    self.append_child(cursor, id);
                }
                TokenKind::Done => break,
            }
        }
        if cursor != ROOT {
            let open = self.arena.get(cursor);
            warn!(
                "input ended with <{}> still open",
                String::from_utf8_lossy(&open.local[..])
            );
        }
        debug!(
            "parsed {} bytes into {} nodes ({} chunks)",
            input.len(),
            self.arena.allocated(),
            self.arena.chunk_count(),
        );
        Ok(())
    }

    /// Live node count, root included. Together with
    /// [`Document::chunk_count`] this makes the reuse guarantee of
    /// [`Document::reset`] observable.
    pub fn node_count(&self) -> usize {
        self.arena.allocated()
    }

    /// Slab chunks allocated so far. Never shrinks.
    pub fn chunk_count(&self) -> usize {
        self.arena.chunk_count()
    }
}

impl Default for Document {
    fn default() -> Document {
        Document::new()
    }
}
