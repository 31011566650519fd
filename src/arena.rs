// Copyright 2026 The slabdom Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The chunked node slab.
//!
//! Nodes live in fixed-size chunks that are never moved or released
//! while the document is alive, so a [`NodeId`] stays valid across
//! growth and across [`Slab::reset`]. Reset rewinds the bump cursor
//! instead of freeing: recycled slots keep their byte buffers (only
//! the logical length is cleared), which is what makes a reparse of a
//! similar document allocation-free.

use log::debug;

use crate::node::{NodeData, NodeKind};

/// Stable handle to a node inside one document's slab.
///
/// Ids are meaningful only for the document that allocated them, and
/// only until that document's next `reset` or `parse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// Slot 0 is reserved for the document root.
pub(crate) const ROOT: NodeId = NodeId(0);

impl NodeId {
    #[inline]
    pub(crate) fn from_index(index: usize) -> NodeId {
        debug_assert!(index < u32::MAX as usize);
        NodeId(index as u32)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

pub(crate) const DEFAULT_CHUNK: usize = 1000;
const MIN_CHUNK: usize = 50;

pub(crate) struct Slab {
    chunks: Vec<Vec<NodeData>>,
    chunk_size: usize,
    /// Slots ever constructed; never shrinks.
    len: usize,
    /// Bump cursor; slots below it are live, slots in `next_free..len`
    /// are recycled storage waiting for reuse.
    next_free: usize,
}

impl Slab {
    pub fn new(chunk_size: usize) -> Slab {
        Slab {
            chunks: Vec::new(),
            chunk_size: chunk_size.max(MIN_CHUNK),
            len: 0,
            next_free: 0,
        }
    }

    /// Hand out a cleared node slot, recycling before growing.
    pub fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let index = self.next_free;
        if index < self.len {
            self.slot_mut(index).recycle(kind);
        } else {
            if self.len % self.chunk_size == 0 {
                debug!("slab: growing to chunk {}", self.chunks.len() + 1);
                self.chunks.push(Vec::with_capacity(self.chunk_size));
            }
            self.chunks
                .last_mut()
                .expect("chunk list cannot be empty after growth")
                .push(NodeData::new(kind));
            self.len += 1;
        }
        self.next_free += 1;
        NodeId::from_index(index)
    }

    /// Rewind to slot 1. Slot 0 (the root) stays live; every other
    /// slot becomes recyclable storage.
    pub fn reset(&mut self) {
        debug_assert!(self.len > 0, "reset before the root was allocated");
        self.next_free = 1;
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &NodeData {
        debug_assert!(id.index() < self.next_free, "stale node id");
        &self.chunks[id.index() / self.chunk_size][id.index() % self.chunk_size]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        debug_assert!(id.index() < self.next_free, "stale node id");
        self.slot_mut(id.index())
    }

    #[inline]
    fn slot_mut(&mut self, index: usize) -> &mut NodeData {
        &mut self.chunks[index / self.chunk_size][index % self.chunk_size]
    }

    /// Live node count (the bump cursor).
    pub fn allocated(&self) -> usize {
        self.next_free
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_has_a_floor() {
        let mut slab = Slab::new(1);
        for _ in 0..MIN_CHUNK {
            slab.allocate(NodeKind::Element);
        }
        assert_eq!(slab.chunk_count(), 1);
        slab.allocate(NodeKind::Element);
        assert_eq!(slab.chunk_count(), 2);
    }

    #[test]
    fn growth_appends_chunks_without_moving_slots() {
        let mut slab = Slab::new(MIN_CHUNK);
        let first = slab.allocate(NodeKind::Document);
        for _ in 0..(2 * MIN_CHUNK) {
            slab.allocate(NodeKind::Element);
        }
        assert_eq!(slab.chunk_count(), 3);
        assert_eq!(slab.get(first).kind, NodeKind::Document);
    }

    #[test]
    fn reset_recycles_slots_instead_of_growing() {
        let mut slab = Slab::new(MIN_CHUNK);
        slab.allocate(NodeKind::Document);
        for _ in 0..10 {
            let id = slab.allocate(NodeKind::Element);
            slab.get_mut(id).value.push_slice(b"payload");
        }
        let chunks = slab.chunk_count();
        slab.reset();
        assert_eq!(slab.allocated(), 1);
        for _ in 0..10 {
            let id = slab.allocate(NodeKind::Comment);
            let node = slab.get(id);
            assert_eq!(node.kind, NodeKind::Comment);
            assert!(node.value.is_empty());
            assert!(node.parent.is_none());
        }
        assert_eq!(slab.chunk_count(), chunks);
    }
}
