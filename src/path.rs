// Copyright 2026 The slabdom Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The path query engine.
//!
//! Every query on a document allocates its results out of one shared
//! scratch buffer (the freelist). A [`NodeSet`] is a window over the
//! run of that buffer filled while the operation ran; chaining an
//! axis fills a fresh run and hands back a new window. Nothing is
//! copied and nothing is freed: a top-level query rewinds the buffer
//! cursor to zero and overwrites.
//!
//! That gives the engine its one non-obvious rule: **a `NodeSet` is
//! valid until the next top-level query on the same document.** Use
//! [`NodeSet::dup`] to keep results alive past that point.
//!
//! Filter callbacks may query freely, including on the nodes under
//! test. Around every callback the engine saves the buffer cursor and
//! bumps its recursion depth, so the nested queries allocate above the
//! outer run and are discarded wholesale when the callback returns;
//! `depth > 0` also keeps the nested query from rewinding the buffer.
//!
//! A name or value argument on an axis filters the visited nodes; an
//! empty slice matches everything.

use crate::arena::{NodeId, ROOT};
use crate::document::Document;
use crate::node::{Node, NodeData, NodeKind};

/// The shared freelist: result storage for every query on a document.
pub(crate) struct PathEngine {
    list: Vec<NodeId>,
    /// Allocation cursor. Entries at and above it are recycled
    /// capacity from earlier queries.
    free: usize,
    /// Non-zero while a filter callback is running.
    depth: usize,
}

impl PathEngine {
    pub fn new() -> PathEngine {
        PathEngine {
            list: Vec::new(),
            free: 0,
            depth: 0,
        }
    }

    fn push(&mut self, id: NodeId) {
        if self.free < self.list.len() {
            self.list[self.free] = id;
        } else {
            self.list.push(id);
        }
        self.free += 1;
    }
}

// Freelist access. Borrows of the engine cell are scoped to single
// calls so user callbacks can re-enter the engine.
impl Document {
    fn query_begin(&self) -> usize {
        let mut engine = self.engine.borrow_mut();
        if engine.depth == 0 {
            engine.free = 0;
        }
        engine.free
    }

    fn query_mark(&self) -> usize {
        self.engine.borrow().free
    }

    fn query_push(&self, id: NodeId) {
        self.engine.borrow_mut().push(id);
    }

    fn query_get(&self, index: usize) -> NodeId {
        self.engine.borrow().list[index]
    }

    /// Save the cursor and enter a callback frame.
    fn query_enter(&self) -> usize {
        let mut engine = self.engine.borrow_mut();
        engine.depth += 1;
        engine.free
    }

    /// Leave a callback frame: everything the callback allocated is
    /// discarded by rewinding to the saved cursor.
    fn query_exit(&self, saved: usize) {
        let mut engine = self.engine.borrow_mut();
        engine.free = saved;
        engine.depth -= 1;
    }

    fn query_window_contains(&self, from: usize, id: NodeId) -> bool {
        let engine = self.engine.borrow();
        engine.list[from..engine.free].contains(&id)
    }

    /// Start a query at the document root.
    pub fn query(&self) -> NodeSet<'_> {
        NodeSet::seeded(self, ROOT)
    }
}

impl<'a> Node<'a> {
    /// Start a query at this node. Safe to call from inside a filter
    /// callback; such queries nest instead of clobbering outer
    /// results.
    pub fn query(&self) -> NodeSet<'a> {
        NodeSet::seeded(self.doc(), self.id())
    }
}

fn name_matches(data: &NodeData, name: &[u8]) -> bool {
    name.is_empty() || &data.local[..] == name
}

fn value_matches(data: &NodeData, value: &[u8]) -> bool {
    value.is_empty() || &data.value[..] == value
}

/// A transient set of nodes produced by a query.
///
/// Axis methods return a fresh `NodeSet`; the receiver stays usable,
/// so several axes can fan out from one intermediate result within
/// the same top-level query. See the module docs for the lifetime
/// rule, and [`NodeSet::dup`] for escaping it.
#[derive(Clone)]
pub struct NodeSet<'a> {
    doc: &'a Document,
    rows: Rows,
}

#[derive(Clone)]
enum Rows {
    /// Window into the shared freelist.
    Window { start: usize, len: usize },
    /// Heap copy made by `dup`.
    Owned(Vec<NodeId>),
}

impl<'a> NodeSet<'a> {
    fn seeded(doc: &'a Document, id: NodeId) -> NodeSet<'a> {
        let mark = doc.query_begin();
        doc.query_push(id);
        NodeSet {
            doc,
            rows: Rows::Window { start: mark, len: 1 },
        }
    }

    fn window(&self, mark: usize) -> NodeSet<'a> {
        NodeSet {
            doc: self.doc,
            rows: Rows::Window {
                start: mark,
                len: self.doc.query_mark() - mark,
            },
        }
    }

    fn len(&self) -> usize {
        match &self.rows {
            Rows::Window { len, .. } => *len,
            Rows::Owned(ids) => ids.len(),
        }
    }

    fn get(&self, index: usize) -> NodeId {
        match &self.rows {
            Rows::Window { start, .. } => self.doc.query_get(start + index),
            Rows::Owned(ids) => ids[index],
        }
    }

    /// Number of nodes selected.
    pub fn count(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nth selected node, if the set is that large.
    pub fn nth(&self, index: usize) -> Option<Node<'a>> {
        if index < self.len() {
            Some(Node::new(self.doc, self.get(index)))
        } else {
            None
        }
    }

    pub fn first(&self) -> Option<Node<'a>> {
        self.nth(0)
    }

    pub fn last(&self) -> Option<Node<'a>> {
        self.len().checked_sub(1).and_then(|i| self.nth(i))
    }

    pub fn iter(&self) -> Iter<'_, 'a> {
        Iter {
            set: self,
            index: 0,
        }
    }

    /// Copy the selection out of the shared freelist. The copy is
    /// immune to later top-level queries on the document.
    pub fn dup(&self) -> NodeSet<'a> {
        NodeSet {
            doc: self.doc,
            rows: Rows::Owned((0..self.len()).map(|i| self.get(i)).collect()),
        }
    }

    /// Element children, optionally by name.
    pub fn child(&self, name: &[u8]) -> NodeSet<'a> {
        let doc = self.doc;
        let mark = doc.query_mark();
        for i in 0..self.len() {
            let mut cursor = doc.arena.get(self.get(i)).first_child;
            while let Some(id) = cursor {
                let data = doc.arena.get(id);
                if data.kind == NodeKind::Element && name_matches(data, name) {
                    doc.query_push(id);
                }
                cursor = data.next;
            }
        }
        self.window(mark)
    }

    /// Attributes, optionally by name.
    pub fn attribute(&self, name: &[u8]) -> NodeSet<'a> {
        let doc = self.doc;
        let mark = doc.query_mark();
        for i in 0..self.len() {
            let mut cursor = doc.arena.get(self.get(i)).first_attr;
            while let Some(id) = cursor {
                let data = doc.arena.get(id);
                if name_matches(data, name) {
                    doc.query_push(id);
                }
                cursor = data.next;
            }
        }
        self.window(mark)
    }

    /// Character-data children, optionally by exact raw value.
    pub fn data(&self, value: &[u8]) -> NodeSet<'a> {
        self.typed_children(NodeKind::Data, value)
    }

    /// CDATA children, optionally by exact raw value.
    pub fn cdata(&self, value: &[u8]) -> NodeSet<'a> {
        self.typed_children(NodeKind::CData, value)
    }

    fn typed_children(&self, kind: NodeKind, value: &[u8]) -> NodeSet<'a> {
        let doc = self.doc;
        let mark = doc.query_mark();
        for i in 0..self.len() {
            let mut cursor = doc.arena.get(self.get(i)).first_child;
            while let Some(id) = cursor {
                let data = doc.arena.get(id);
                if data.kind == kind && value_matches(data, value) {
                    doc.query_push(id);
                }
                cursor = data.next;
            }
        }
        self.window(mark)
    }

    /// Parents, optionally by name. The document root is skipped and
    /// shared parents appear once.
    pub fn parent(&self, name: &[u8]) -> NodeSet<'a> {
        let doc = self.doc;
        let mark = doc.query_mark();
        for i in 0..self.len() {
            if let Some(id) = doc.arena.get(self.get(i)).parent {
                let data = doc.arena.get(id);
                if data.kind == NodeKind::Document {
                    continue;
                }
                if name_matches(data, name) && !doc.query_window_contains(mark, id) {
                    doc.query_push(id);
                }
            }
        }
        self.window(mark)
    }

    /// Ancestors bottom-up, optionally by name. The document root is
    /// skipped and shared ancestors appear once.
    pub fn ancestor(&self, name: &[u8]) -> NodeSet<'a> {
        let doc = self.doc;
        let mark = doc.query_mark();
        for i in 0..self.len() {
            let mut cursor = doc.arena.get(self.get(i)).parent;
            while let Some(id) = cursor {
                let data = doc.arena.get(id);
                if data.kind != NodeKind::Document
                    && name_matches(data, name)
                    && !doc.query_window_contains(mark, id)
                {
                    doc.query_push(id);
                }
                cursor = data.parent;
            }
        }
        self.window(mark)
    }

    /// Element descendants in document order, optionally by name.
    pub fn descendant(&self, name: &[u8]) -> NodeSet<'a> {
        fn descend(doc: &Document, id: NodeId, name: &[u8]) {
            let mut cursor = doc.arena.get(id).first_child;
            while let Some(id) = cursor {
                let data = doc.arena.get(id);
                if data.kind == NodeKind::Element {
                    if name_matches(data, name) {
                        doc.query_push(id);
                    }
                    descend(doc, id, name);
                }
                cursor = data.next;
            }
        }

        let doc = self.doc;
        let mark = doc.query_mark();
        for i in 0..self.len() {
            descend(doc, self.get(i), name);
        }
        self.window(mark)
    }

    /// Preceding element siblings, nearest first, optionally by name.
    pub fn prev(&self, name: &[u8]) -> NodeSet<'a> {
        self.siblings(name, |data| data.prev)
    }

    /// Following element siblings, nearest first, optionally by name.
    pub fn next(&self, name: &[u8]) -> NodeSet<'a> {
        self.siblings(name, |data| data.next)
    }

    fn siblings(&self, name: &[u8], step: fn(&NodeData) -> Option<NodeId>) -> NodeSet<'a> {
        let doc = self.doc;
        let mark = doc.query_mark();
        for i in 0..self.len() {
            let mut cursor = step(doc.arena.get(self.get(i)));
            while let Some(id) = cursor {
                let data = doc.arena.get(id);
                if data.kind == NodeKind::Element && name_matches(data, name) {
                    doc.query_push(id);
                }
                cursor = step(data);
            }
        }
        self.window(mark)
    }

    /// Keep the nodes the callback approves. The callback may run
    /// queries of its own, including on the node under test.
    pub fn filter<F>(&self, mut keep: F) -> NodeSet<'a>
    where
        F: FnMut(Node<'a>) -> bool,
    {
        let doc = self.doc;
        let mark = doc.query_mark();
        for i in 0..self.len() {
            let id = self.get(i);
            let saved = doc.query_enter();
            let verdict = keep(Node::new(doc, id));
            doc.query_exit(saved);
            if verdict {
                doc.query_push(id);
            }
        }
        self.window(mark)
    }
}

impl<'s, 'a> IntoIterator for &'s NodeSet<'a> {
    type Item = Node<'a>;
    type IntoIter = Iter<'s, 'a>;

    fn into_iter(self) -> Iter<'s, 'a> {
        self.iter()
    }
}

pub struct Iter<'s, 'a> {
    set: &'s NodeSet<'a>,
    index: usize,
}

impl<'a> Iterator for Iter<'_, 'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Node<'a>> {
        let node = self.set.nth(self.index)?;
        self.index += 1;
        Some(node)
    }
}
