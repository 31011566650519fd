// Copyright 2026 The slabdom Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An in-memory XML document model backed by a slab allocator, plus a
//! fluent path-query engine.
//!
//! A [`Document`] owns every node it ever creates in a chunked slab;
//! nodes are addressed by stable [`NodeId`] handles and linked into a
//! tree of doubly-linked sibling chains with separate child and
//! attribute lists. Documents are built either by [`Document::parse`],
//! which drives the pull tokenizer in [`tokenizer`], or through the
//! fluent builder surface on [`NodeMut`]:
//!
//! ```text
//! let mut doc = Document::new();
//! doc.header(None);
//! let mut tree = doc.tree_mut();
//! let mut root = tree.element(b"", b"root", Some(b"123456789"));
//! root.element(b"", b"second", Some(b"second"));
//! ```
//!
//! [`Document::reset`] rewinds the slab without releasing storage, so
//! parsing a stream of similarly-sized documents settles into a steady
//! state that performs no heap allocation at all.
//!
//! # Query lifetime contract
//!
//! Queries traverse the tree through [`NodeSet`] values, which are
//! windows over a scratch buffer shared by every query on the same
//! document. The central rule of the engine: **a `NodeSet` is valid
//! only until the next top-level query on its document.** Queries
//! issued from inside a [`NodeSet::filter`] callback are nested, not
//! top-level, and do not disturb outer results. Call [`NodeSet::dup`]
//! to copy a result out of the shared buffer when it has to survive
//! longer.
//!
//! Entity and character references are never transcoded; every name
//! and value is stored and returned as the raw bytes that were parsed
//! or supplied.

pub use tendril;

mod arena;
pub mod document;
pub mod node;
pub mod path;
pub mod serialize;
pub mod tokenizer;

pub use crate::arena::NodeId;
pub use crate::document::Document;
pub use crate::node::{Node, NodeKind, NodeMut};
pub use crate::path::NodeSet;
pub use crate::serialize::{serialize, to_bytes, SerializeOpts};
pub use crate::tokenizer::{Token, TokenKind, XmlTokenizer};

use thiserror::Error;

/// Errors surfaced while tokenizing or building a tree from input.
///
/// Structural preconditions of the tree itself (attaching a node that
/// already has a parent, giving an attribute node children) are
/// programming errors and assert instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The tokenizer found a malformed construct at the given offset.
    #[error("malformed XML at byte {0}: {1}")]
    Syntax(usize, &'static str),
    /// Input ended in the middle of a token.
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),
    /// An end tag arrived while the cursor was already at the root.
    #[error("end tag at byte {0} has no matching start tag")]
    MismatchedEnd(usize),
}
