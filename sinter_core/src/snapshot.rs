// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display-list snapshots and their diff.
//!
//! The canvas describes what it last painted as a [`DisplayList`]: one
//! [`Primitive`] per drawn item, each with a stable key, its bounds in
//! document coordinates, and a fingerprint of everything else that affects
//! its pixels. Diffing two lists yields exactly the areas that need a
//! repaint.
//!
//! [`SnapshotBuffer`] holds two generations: the list currently on screen and,
//! once a restyle or relayout is scheduled, a pinned copy of it that the
//! repair phase diffs against the fresh list before discarding.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use kurbo::Rect;

/// One painted item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Primitive {
    /// Identity that stays stable across repaints (usually derived from the
    /// node and the item's index within it).
    pub key: u64,
    /// Painted bounds in document coordinates.
    pub bounds: Rect,
    /// Hash of every other paint-relevant property (color, text, image).
    pub fingerprint: u64,
}

/// The primitives painted for one frame, in paint order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayList {
    /// Primitives in paint order.
    pub primitives: Vec<Primitive>,
}

impl DisplayList {
    /// Creates a display list from primitives in paint order.
    #[must_use]
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self { primitives }
    }

    /// Returns `true` if nothing was painted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

/// Returns the bounds that differ between `old` and `new`.
///
/// Primitives are matched by key. A primitive present in only one list
/// contributes its bounds; one whose bounds or fingerprint changed
/// contributes both its old and its new bounds. Output order follows `new`,
/// then removed primitives in key order.
#[must_use]
pub fn diff(old: &DisplayList, new: &DisplayList) -> Vec<Rect> {
    let mut previous: BTreeMap<u64, &Primitive> =
        old.primitives.iter().map(|p| (p.key, p)).collect();
    let mut out = Vec::new();

    for prim in &new.primitives {
        match previous.remove(&prim.key) {
            Some(before) if before.bounds == prim.bounds => {
                if before.fingerprint != prim.fingerprint {
                    out.push(prim.bounds);
                }
            }
            Some(before) => {
                out.push(before.bounds);
                out.push(prim.bounds);
            }
            None => out.push(prim.bounds),
        }
    }
    out.extend(previous.values().map(|p| p.bounds));
    out.retain(|r| r.width() > 0.0 && r.height() > 0.0);
    out
}

/// Two-generation snapshot storage.
#[derive(Clone, Debug, Default)]
pub struct SnapshotBuffer {
    current: DisplayList,
    pinned: Option<DisplayList>,
}

impl SnapshotBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the on-screen list as the "before" generation, unless one is
    /// already pinned.
    ///
    /// Returns whether a new snapshot was taken.
    pub fn pin(&mut self) -> bool {
        if self.pinned.is_some() {
            return false;
        }
        self.pinned = Some(self.current.clone());
        true
    }

    /// Whether a "before" generation is held.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.pinned.is_some()
    }

    /// The list currently on screen.
    #[must_use]
    pub fn current(&self) -> &DisplayList {
        &self.current
    }

    /// Installs a freshly painted list and returns the pinned generation for
    /// diffing, if any. The pinned slot is empty afterwards.
    pub fn commit(&mut self, fresh: DisplayList) -> Option<DisplayList> {
        self.current = fresh;
        self.pinned.take()
    }

    /// Drops the pinned generation without committing anything.
    pub fn discard(&mut self) {
        self.pinned = None;
    }

    /// Forgets both generations.
    pub fn clear(&mut self) {
        self.current = DisplayList::default();
        self.pinned = None;
    }
}
