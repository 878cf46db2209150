// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity.

use core::fmt;

/// Sentinel value meaning "no node" in topology index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a node in a [`NodeStore`](super::NodeStore).
///
/// Pairs a slot index with a generation counter. Destroying a node bumps the
/// slot's generation, so a handle kept across the destruction no longer
/// validates even after the slot is recycled for a new node.
///
/// Collaborators that cache per-node data (computed style, geometry) key
/// their caches by `NodeId`; the generation keeps entries for a destroyed node
/// distinct from entries for whatever node later reuses its slot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the raw slot index (for diagnostics and trace output).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// Where a node is in its life.
///
/// This is the state of the node's own slot, not of the tree it sits in.
/// Descendants of a detached subtree stay [`Live`](Self::Live) because they
/// still have a parent; only the subtree root becomes
/// [`Orphan`](Self::Orphan). Ask [`NodeStore::is_orphan`] whether a node is
/// part of the document.
///
/// [`NodeStore::is_orphan`]: super::NodeStore::is_orphan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Attached to a parent, or the document root.
    Live,
    /// A parentless subtree root held in the orphan registry.
    Orphan,
    /// Freed. Only observable through raw slot queries.
    Destroyed,
}
