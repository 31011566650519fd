// Copyright 2026 The slabdom Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Nodes: storage, traversal handles, and the fluent builder.
//!
//! A node records its kind, its name split into raw prefix and local
//! parts, its raw value, and its place in the pointer graph: parent,
//! doubly-linked siblings, child list head/tail, attribute list
//! head/tail. All text is held in node-owned [`ByteTendril`] buffers
//! so the parse input does not need to outlive the document.
//!
//! Two handle types wrap a [`NodeId`]: [`Node`] borrows the document
//! shared and exposes traversal and accessors; [`NodeMut`] borrows it
//! mutably and exposes the builder surface, detach, value updates and
//! grafting. `NodeMut::element` hands back the new child by mutable
//! reborrow, which is what lets deep builds chain without touching
//! raw ids.

use mac::unwrap_or_return;
use tendril::ByteTendril;

use crate::arena::NodeId;
use crate::document::Document;

/// Discriminator for what a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The document root; exactly one per document, always slot 0.
    Document,
    Element,
    Attribute,
    /// Character data.
    Data,
    /// A `<![CDATA[...]]>` section.
    CData,
    Comment,
    /// A processing instruction.
    Pi,
    Doctype,
}

/// Raw node storage inside the slab.
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub prefix: ByteTendril,
    pub local: ByteTendril,
    pub value: ByteTendril,
    pub parent: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub first_attr: Option<NodeId>,
    pub last_attr: Option<NodeId>,
    /// Extent of this node in the original parse input, kept so the
    /// serializer can re-emit unmodified subtrees verbatim. `slice_end`
    /// is cleared by any mutation under or beside this node.
    pub slice_start: usize,
    pub slice_end: Option<usize>,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> NodeData {
        NodeData {
            kind,
            prefix: ByteTendril::new(),
            local: ByteTendril::new(),
            value: ByteTendril::new(),
            parent: None,
            prev: None,
            next: None,
            first_child: None,
            last_child: None,
            first_attr: None,
            last_attr: None,
            slice_start: 0,
            slice_end: None,
        }
    }

    /// Re-initialize a recycled slot. Buffers keep their capacity;
    /// only the logical length is dropped.
    pub fn recycle(&mut self, kind: NodeKind) {
        self.kind = kind;
        self.prefix.clear();
        self.local.clear();
        self.value.clear();
        self.parent = None;
        self.prev = None;
        self.next = None;
        self.first_child = None;
        self.last_child = None;
        self.first_attr = None;
        self.last_attr = None;
        self.slice_start = 0;
        self.slice_end = None;
    }
}

// Link surgery. Every list operation below preserves the structural
// invariants: sibling links stay symmetric, a node sits in exactly one
// parent list, attribute nodes go on the attribute list and nothing
// else does.
impl Document {
    pub(crate) fn new_node(
        &mut self,
        kind: NodeKind,
        prefix: &[u8],
        local: &[u8],
        value: &[u8],
    ) -> NodeId {
        let id = self.arena.allocate(kind);
        let node = self.arena.get_mut(id);
        if !prefix.is_empty() {
            node.prefix.push_slice(prefix);
        }
        if !local.is_empty() {
            node.local.push_slice(local);
        }
        if !value.is_empty() {
            node.value.push_slice(value);
        }
        id
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.pre_link(parent, child);
        let old_last = self.arena.get(parent).last_child;
        {
            let node = self.arena.get_mut(child);
            node.parent = Some(parent);
            node.prev = old_last;
            node.next = None;
        }
        match old_last {
            Some(last) => self.arena.get_mut(last).next = Some(child),
            None => self.arena.get_mut(parent).first_child = Some(child),
        }
        self.arena.get_mut(parent).last_child = Some(child);
    }

    pub(crate) fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.pre_link(parent, child);
        let old_first = self.arena.get(parent).first_child;
        {
            let node = self.arena.get_mut(child);
            node.parent = Some(parent);
            node.prev = None;
            node.next = old_first;
        }
        match old_first {
            Some(first) => self.arena.get_mut(first).prev = Some(child),
            None => self.arena.get_mut(parent).last_child = Some(child),
        }
        self.arena.get_mut(parent).first_child = Some(child);
    }

    pub(crate) fn append_attr(&mut self, parent: NodeId, attr: NodeId) {
        self.pre_link(parent, attr);
        assert_eq!(
            self.arena.get(attr).kind,
            NodeKind::Attribute,
            "only attribute nodes belong on the attribute list"
        );
        let old_last = self.arena.get(parent).last_attr;
        {
            let node = self.arena.get_mut(attr);
            node.parent = Some(parent);
            node.prev = old_last;
            node.next = None;
        }
        match old_last {
            Some(last) => self.arena.get_mut(last).next = Some(attr),
            None => self.arena.get_mut(parent).first_attr = Some(attr),
        }
        self.arena.get_mut(parent).last_attr = Some(attr);
    }

    fn pre_link(&self, parent: NodeId, child: NodeId) {
        // Invariant: child cannot have an existing parent.
        assert!(
            self.arena.get(child).parent.is_none(),
            "node is already attached"
        );
        assert_ne!(
            self.arena.get(parent).kind,
            NodeKind::Attribute,
            "attribute nodes cannot have children"
        );
    }

    /// Unlink `node` from its parent's child or attribute list. A
    /// detached node is a no-op.
    pub(crate) fn detach_node(&mut self, node: NodeId) {
        let (parent, prev, next, is_attr) = {
            let n = self.arena.get(node);
            (n.parent, n.prev, n.next, n.kind == NodeKind::Attribute)
        };
        let parent = unwrap_or_return!(parent, ());
        match prev {
            Some(prev) => self.arena.get_mut(prev).next = next,
            None => {
                let p = self.arena.get_mut(parent);
                if is_attr {
                    p.first_attr = next;
                } else {
                    p.first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.arena.get_mut(next).prev = prev,
            None => {
                let p = self.arena.get_mut(parent);
                if is_attr {
                    p.last_attr = prev;
                } else {
                    p.last_child = prev;
                }
            }
        }
        {
            let n = self.arena.get_mut(node);
            n.parent = None;
            n.prev = None;
            n.next = None;
        }
        self.invalidate(parent);
    }

    /// Clear the cached serialization range on `id` and every ancestor
    /// up to and including the root.
    pub(crate) fn invalidate(&mut self, id: NodeId) {
        let mut cursor = Some(id);
        while let Some(id) = cursor {
            let node = self.arena.get_mut(id);
            node.slice_end = None;
            cursor = node.parent;
        }
    }

    /// Deep-clone a subtree inside this document, without attaching
    /// the clone anywhere.
    fn clone_local(&mut self, src: NodeId) -> NodeId {
        let (kind, prefix, local, value) = {
            let s = self.arena.get(src);
            (s.kind, s.prefix.clone(), s.local.clone(), s.value.clone())
        };
        let id = self.arena.allocate(kind);
        {
            let node = self.arena.get_mut(id);
            node.prefix = prefix;
            node.local = local;
            node.value = value;
        }
        let mut attr = self.arena.get(src).first_attr;
        while let Some(aid) = attr {
            let next = self.arena.get(aid).next;
            let clone = self.clone_local(aid);
            self.append_attr(id, clone);
            attr = next;
        }
        let mut child = self.arena.get(src).first_child;
        while let Some(cid) = child {
            let next = self.arena.get(cid).next;
            let clone = self.clone_local(cid);
            self.append_child(id, clone);
            child = next;
        }
        id
    }

    /// Deep-clone `src` and attach the clone under `dest` (attribute
    /// roots go on the attribute list). Returns the clone.
    pub fn copy_within(&mut self, dest: NodeId, src: NodeId) -> NodeId {
        let id = self.clone_local(src);
        if self.arena.get(id).kind == NodeKind::Attribute {
            self.append_attr(dest, id);
        } else {
            self.append_child(dest, id);
        }
        self.invalidate(dest);
        id
    }
}

/// Deep-clone `src` (from another document) into `dest`, copying every
/// buffer so the clone owns its text. The clone is homed in `dest` by
/// construction.
fn clone_foreign(dest: &mut Document, src_doc: &Document, src: NodeId) -> NodeId {
    let s = src_doc.arena.get(src);
    let id = dest.new_node(s.kind, &s.prefix[..], &s.local[..], &s.value[..]);
    let mut attr = s.first_attr;
    while let Some(aid) = attr {
        let clone = clone_foreign(dest, src_doc, aid);
        dest.append_attr(id, clone);
        attr = src_doc.arena.get(aid).next;
    }
    let mut child = s.first_child;
    while let Some(cid) = child {
        let clone = clone_foreign(dest, src_doc, cid);
        dest.append_child(id, clone);
        child = src_doc.arena.get(cid).next;
    }
    id
}

/// Shared read handle: traversal and accessors.
///
/// Copies freely; it is a document reference plus an id.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> Node<'a> {
    pub(crate) fn new(doc: &'a Document, id: NodeId) -> Node<'a> {
        Node { doc, id }
    }

    #[inline]
    pub(crate) fn data(&self) -> &'a NodeData {
        self.doc.arena.get(self.id)
    }

    #[inline]
    pub(crate) fn doc(&self) -> &'a Document {
        self.doc
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    /// Raw namespace prefix; empty when the name has none.
    pub fn prefix(&self) -> &'a [u8] {
        &self.data().prefix[..]
    }

    pub fn local_name(&self) -> &'a [u8] {
        &self.data().local[..]
    }

    /// The node's own raw value, untranscoded. For elements prefer
    /// [`Node::value`].
    pub fn raw_value(&self) -> &'a [u8] {
        &self.data().value[..]
    }

    /// Element value semantics: for an element, the raw value of its
    /// first `Data` or `CData` child (empty if none); for every other
    /// kind, the node's own raw value.
    pub fn value(&self) -> &'a [u8] {
        let data = self.data();
        if data.kind != NodeKind::Element {
            return &data.value[..];
        }
        let mut child = data.first_child;
        while let Some(id) = child {
            let c = self.doc.arena.get(id);
            if matches!(c.kind, NodeKind::Data | NodeKind::CData) {
                return &c.value[..];
            }
            child = c.next;
        }
        b""
    }

    /// Compose `prefix:local` into `buf` and return it. When there is
    /// no prefix the local name is returned directly without copying.
    pub fn qualified_name<'b>(&'b self, buf: &'b mut ByteTendril) -> &'b [u8] {
        let data = self.data();
        if data.prefix.is_empty() {
            return &data.local[..];
        }
        buf.clear();
        buf.push_slice(&data.prefix[..]);
        buf.push_slice(b":");
        buf.push_slice(&data.local[..]);
        &buf[..]
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.data().parent.map(|id| Node::new(self.doc, id))
    }

    pub fn prev_sibling(&self) -> Option<Node<'a>> {
        self.data().prev.map(|id| Node::new(self.doc, id))
    }

    pub fn next_sibling(&self) -> Option<Node<'a>> {
        self.data().next.map(|id| Node::new(self.doc, id))
    }

    pub fn first_child(&self) -> Option<Node<'a>> {
        self.data().first_child.map(|id| Node::new(self.doc, id))
    }

    pub fn last_child(&self) -> Option<Node<'a>> {
        self.data().last_child.map(|id| Node::new(self.doc, id))
    }

    pub fn first_attr(&self) -> Option<Node<'a>> {
        self.data().first_attr.map(|id| Node::new(self.doc, id))
    }

    pub fn last_attr(&self) -> Option<Node<'a>> {
        self.data().last_attr.map(|id| Node::new(self.doc, id))
    }

    /// Child nodes in list order, every kind included.
    pub fn children(&self) -> Siblings<'a> {
        Siblings {
            doc: self.doc,
            cursor: self.data().first_child,
        }
    }

    /// Attribute nodes in list order.
    pub fn attributes(&self) -> Siblings<'a> {
        Siblings {
            doc: self.doc,
            cursor: self.data().first_attr,
        }
    }

    /// First attribute whose local name matches, if any.
    pub fn attr(&self, local: &[u8]) -> Option<Node<'a>> {
        self.attributes().find(|a| a.local_name() == local)
    }

    /// Number of siblings before this node. O(n) in list position.
    pub fn position(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.data().prev;
        while let Some(id) = cursor {
            count += 1;
            cursor = self.doc.arena.get(id).prev;
        }
        count
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Node<'_>) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("local", &String::from_utf8_lossy(self.local_name()))
            .finish()
    }
}

/// Iterator over a sibling chain (children or attributes).
pub struct Siblings<'a> {
    doc: &'a Document,
    cursor: Option<NodeId>,
}

impl<'a> Iterator for Siblings<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Node<'a>> {
        let id = self.cursor?;
        self.cursor = self.doc.arena.get(id).next;
        Some(Node::new(self.doc, id))
    }
}

/// Mutable handle: the fluent builder surface plus structural edits.
///
/// Builder methods that create non-element children return `&mut Self`
/// so calls chain on the same node; [`NodeMut::element`] returns a
/// handle to the new element instead, reborrowed from this one, so the
/// build can descend.
pub struct NodeMut<'a> {
    doc: &'a mut Document,
    id: NodeId,
}

impl<'a> NodeMut<'a> {
    pub(crate) fn new(doc: &'a mut Document, id: NodeId) -> NodeMut<'a> {
        NodeMut { doc, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Shared view of the same node.
    pub fn as_node(&self) -> Node<'_> {
        Node::new(self.doc, self.id)
    }

    /// Append an element child. With `value`, a `Data` grandchild
    /// holding it is created as well. Returns the new element.
    pub fn element(&mut self, prefix: &[u8], local: &[u8], value: Option<&[u8]>) -> NodeMut<'_> {
        let id = self.doc.new_node(NodeKind::Element, prefix, local, b"");
        self.doc.append_child(self.id, id);
        if let Some(value) = value {
            let data = self.doc.new_node(NodeKind::Data, b"", b"", value);
            self.doc.append_child(id, data);
        }
        self.doc.invalidate(id);
        NodeMut {
            doc: &mut *self.doc,
            id,
        }
    }

    /// Append an attribute to this node's attribute list.
    pub fn attribute(&mut self, prefix: &[u8], local: &[u8], value: &[u8]) -> &mut Self {
        let id = self.doc.new_node(NodeKind::Attribute, prefix, local, value);
        self.doc.append_attr(self.id, id);
        self.doc.invalidate(self.id);
        self
    }

    /// Append a character-data child.
    pub fn data(&mut self, value: &[u8]) -> &mut Self {
        self.leaf(NodeKind::Data, value)
    }

    /// Append a CDATA child.
    pub fn cdata(&mut self, value: &[u8]) -> &mut Self {
        self.leaf(NodeKind::CData, value)
    }

    /// Append a comment child.
    pub fn comment(&mut self, value: &[u8]) -> &mut Self {
        self.leaf(NodeKind::Comment, value)
    }

    /// Append a processing-instruction child.
    pub fn pi(&mut self, value: &[u8]) -> &mut Self {
        self.leaf(NodeKind::Pi, value)
    }

    /// Append a doctype child.
    pub fn doctype(&mut self, value: &[u8]) -> &mut Self {
        self.leaf(NodeKind::Doctype, value)
    }

    fn leaf(&mut self, kind: NodeKind, value: &[u8]) -> &mut Self {
        let id = self.doc.new_node(kind, b"", b"", value);
        self.doc.append_child(self.id, id);
        self.doc.invalidate(id);
        self
    }

    /// Set this node's value. On an element the first `Data` child is
    /// updated when one exists; otherwise the node's own raw value is
    /// written.
    pub fn set_value(&mut self, value: &[u8]) -> &mut Self {
        let target = {
            let data = self.doc.arena.get(self.id);
            if data.kind == NodeKind::Element {
                let mut found = None;
                let mut child = data.first_child;
                while let Some(id) = child {
                    let c = self.doc.arena.get(id);
                    if c.kind == NodeKind::Data {
                        found = Some(id);
                        break;
                    }
                    child = c.next;
                }
                found.unwrap_or(self.id)
            } else {
                self.id
            }
        };
        {
            let node = self.doc.arena.get_mut(target);
            node.value.clear();
            node.value.push_slice(value);
        }
        self.doc.invalidate(self.id);
        self
    }

    /// Unlink this node from its parent. A node with no parent is left
    /// untouched.
    pub fn detach(&mut self) -> &mut Self {
        self.doc.detach_node(self.id);
        self
    }

    /// Graft a subtree from another document: deep-clone `src` into
    /// this document and attach the clone here. The borrow split
    /// (`&mut` destination, `&` source) means the source document is
    /// necessarily a different one; use [`Document::copy_within`] to
    /// clone inside a single document.
    pub fn copy_from(&mut self, src: Node<'_>) -> &mut Self {
        let id = clone_foreign(self.doc, src.doc(), src.id());
        if self.doc.arena.get(id).kind == NodeKind::Attribute {
            self.doc.append_attr(self.id, id);
        } else {
            self.doc.append_child(self.id, id);
        }
        self.doc.invalidate(self.id);
        self
    }

    /// Move a node of this document under this one: detach, then
    /// re-attach. Moving across documents is a clone; see
    /// [`NodeMut::copy_from`].
    pub fn adopt(&mut self, node: NodeId) -> &mut Self {
        // Refuse to link a node under its own subtree.
        let mut cursor = Some(self.id);
        while let Some(id) = cursor {
            assert!(id != node, "cannot move a node into its own subtree");
            cursor = self.doc.arena.get(id).parent;
        }
        self.doc.detach_node(node);
        if self.doc.arena.get(node).kind == NodeKind::Attribute {
            self.doc.append_attr(self.id, node);
        } else {
            self.doc.append_child(self.id, node);
        }
        self.doc.invalidate(self.id);
        self
    }
}
