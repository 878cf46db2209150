// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document node data model.
//!
//! A *node* is either an element or a text run. Each node has:
//!
//! - An identity ([`NodeId`]): a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: parent, first/last child and sibling links forming an
//!   ordered tree.
//! - A [`Tag`] (text nodes carry [`Tag::Text`]), a source offset, and either
//!   an attribute list or a text payload.
//! - A [`Lifecycle`] state and a document-order sequence number that is only
//!   meaningful while [`NodeStore::sequence_ok`] holds.
//!
//! Nodes live in struct-of-arrays storage. Detached subtrees are tracked in
//! an orphan registry so that every live node belongs to exactly one tree.

mod id;
mod store;
mod tag;
mod traverse;

pub use id::{INVALID, Lifecycle, NodeId};
pub use store::{Attribute, NodeStore};
pub use tag::{Atom, Tag, TagTable};
pub use traverse::{Ancestors, Children, Descendants};
