// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coalescing invalidation scheduler.
//!
//! Every mutation that affects the rendered view is reported here instead of
//! being acted on immediately. The [`Scheduler`] folds requests into a small
//! amount of pending state:
//!
//! - a [`Pending`] bit per phase,
//! - one restyle root and one dynamic-check root, each grown with
//!   [`NodeStore::upgrade_root`] so that any number of requests collapse into
//!   a single subtree,
//! - the set of nodes whose geometry is stale (an `understory_dirty` channel),
//! - viewport damage rectangles and requested scroll offsets,
//! - a pinned display-list snapshot for diffing after relayout.
//!
//! The first request after an idle period *arms* the idle callback; the host
//! is expected to call [`Document::run_idle`] when its event loop goes idle.
//! A run consumes the pending state phase by phase (see [`pipeline`]).
//! Requests made from inside a run are merged into the same state and, if
//! their phase already ran, re-arm the callback for the next run.
//!
//! [`Document::run_idle`]: crate::Document::run_idle
//! [`pipeline`]: crate::pipeline

use alloc::vec::Vec;

use kurbo::{Rect, Size, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker};

use crate::damage::DamageTracker;
use crate::dirty;
use crate::node::{NodeId, NodeStore};
use crate::snapshot::SnapshotBuffer;

bitflags::bitflags! {
    /// Phases with outstanding work.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Pending: u8 {
        /// Dynamic conditions need re-evaluation under the dynamic root.
        const DYNAMIC = 1 << 0;
        /// Style needs recomputing under the restyle root.
        const RESTYLE = 1 << 1;
        /// Cached geometry is stale.
        const LAYOUT = 1 << 2;
        /// Part of the viewport needs repainting.
        const DAMAGE = 1 << 3;
        /// The scroll position needs clamping and reporting.
        const SCROLL = 1 << 4;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct ScrollRequest {
    x: Option<f64>,
    y: Option<f64>,
}

/// Per-document invalidation state.
#[derive(Debug)]
pub struct Scheduler {
    pending: Pending,
    restyle_root: Option<NodeId>,
    dynamic_root: Option<NodeId>,
    layout_dirty: DirtyTracker<u32>,
    discarded: Vec<NodeId>,

    damage: DamageTracker,
    snapshot: SnapshotBuffer,

    scroll_request: ScrollRequest,
    scroll: Vec2,
    viewport: Size,
    document_size: Size,

    in_progress: bool,
    armed: bool,
    reset_requested: bool,
    cycle: u64,
}

impl Scheduler {
    /// Creates an idle scheduler for a viewport of the given size.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        Self {
            pending: Pending::empty(),
            restyle_root: None,
            dynamic_root: None,
            layout_dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            discarded: Vec::new(),
            damage: DamageTracker::new(viewport),
            snapshot: SnapshotBuffer::new(),
            scroll_request: ScrollRequest::default(),
            scroll: Vec2::ZERO,
            viewport,
            document_size: Size::ZERO,
            in_progress: false,
            armed: false,
            reset_requested: false,
            cycle: 0,
        }
    }

    // -- Queries --

    /// Phases with outstanding work.
    #[must_use]
    pub fn pending(&self) -> Pending {
        self.pending
    }

    /// Whether the idle callback is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether a pipeline run is executing.
    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// The subtree (plus right siblings) awaiting restyle.
    #[must_use]
    pub fn restyle_root(&self) -> Option<NodeId> {
        self.restyle_root
    }

    /// The subtree awaiting dynamic-condition checks.
    #[must_use]
    pub fn dynamic_root(&self) -> Option<NodeId> {
        self.dynamic_root
    }

    /// Pending damage rectangles, viewport-relative.
    #[must_use]
    pub fn damage(&self) -> &[Rect] {
        self.damage.rects()
    }

    /// Whether a pre-change snapshot is pinned for diffing.
    #[must_use]
    pub fn snapshot_held(&self) -> bool {
        self.snapshot.is_held()
    }

    /// The display list last committed by the repair phase.
    #[must_use]
    pub fn snapshot(&self) -> &SnapshotBuffer {
        &self.snapshot
    }

    /// Current clamped scroll offset.
    #[must_use]
    pub fn scroll_offset(&self) -> Vec2 {
        self.scroll
    }

    /// Viewport size.
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Document extent reported by the last successful layout.
    #[must_use]
    pub fn document_size(&self) -> Size {
        self.document_size
    }

    /// Number of pipeline runs started so far.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    // -- Scheduling --

    /// Requests a dynamic-condition check under `node`.
    ///
    /// Nodes outside the document tree are ignored.
    pub fn schedule_dynamic(&mut self, tree: &NodeStore, node: NodeId) {
        if tree.is_orphan(node) {
            return;
        }
        self.dynamic_root = Some(tree.upgrade_root(self.dynamic_root, node));
        self.pending |= Pending::DYNAMIC;
        self.arm();
    }

    /// Requests a restyle of `node`'s subtree.
    ///
    /// Pins a snapshot of the current display list if none is held. Nodes
    /// outside the document tree are ignored.
    pub fn schedule_restyle(&mut self, tree: &NodeStore, node: NodeId) {
        if tree.is_orphan(node) {
            return;
        }
        self.snapshot.pin();
        self.restyle_root = Some(tree.upgrade_root(self.restyle_root, node));
        self.pending |= Pending::RESTYLE;
        self.arm();
    }

    /// Requests relayout of `node`.
    ///
    /// `node` and all of its ancestors have their cached geometry
    /// invalidated when the layout phase runs. Pins a snapshot if none is
    /// held. Nodes outside the document tree are ignored.
    pub fn schedule_layout(&mut self, tree: &NodeStore, node: NodeId) {
        if tree.is_orphan(node) {
            return;
        }
        self.snapshot.pin();
        for ancestor in tree.ancestors(node) {
            self.layout_dirty.mark(ancestor.index(), dirty::LAYOUT);
        }
        self.pending |= Pending::LAYOUT;
        self.arm();
    }

    /// Records viewport damage.
    ///
    /// Returns whether the rectangle added new area (see
    /// [`DamageTracker::add_rect`]).
    pub fn schedule_damage(&mut self, rect: Rect) -> bool {
        if !self.damage.add_rect(rect) {
            return false;
        }
        self.pending |= Pending::DAMAGE;
        self.arm();
        true
    }

    /// Requests a horizontal scroll offset in document coordinates.
    pub fn schedule_scroll_x(&mut self, offset: f64) {
        self.scroll_request.x = Some(offset);
        self.pending |= Pending::SCROLL;
        self.arm();
    }

    /// Requests a vertical scroll offset in document coordinates.
    pub fn schedule_scroll_y(&mut self, offset: f64) {
        self.scroll_request.y = Some(offset);
        self.pending |= Pending::SCROLL;
        self.arm();
    }

    /// Changes the viewport size. The whole document is relaid and the new
    /// viewport repainted.
    pub fn set_viewport(&mut self, tree: &NodeStore, viewport: Size) {
        self.viewport = viewport;
        self.damage.set_viewport(viewport);
        if let Some(root) = tree.root() {
            self.schedule_layout(tree, root);
        }
        self.damage.add_full();
        self.pending |= Pending::DAMAGE;
        self.arm();
    }

    /// Records that `node` is being destroyed so collaborator caches are
    /// dropped at the start of the next run.
    ///
    /// Call this for every node of a doomed subtree, top-down, before it is
    /// unlinked.
    pub fn note_destroyed(&mut self, node: NodeId) {
        self.layout_dirty.remove_key(node.index());
        self.discarded.push(node);
    }

    /// Moves the restyle and dynamic roots off a subtree that is about to
    /// leave the document, onto its former parent.
    pub fn retarget_roots(&mut self, tree: &NodeStore, leaving: NodeId, parent: Option<NodeId>) {
        let inside = |root: Option<NodeId>| {
            root.is_some_and(|r| tree.ancestors(r).any(|a| a == leaving))
        };
        if inside(self.restyle_root) {
            self.restyle_root = parent;
            if parent.is_none() {
                self.pending.remove(Pending::RESTYLE);
                self.release_unused_pin();
            }
        }
        if inside(self.dynamic_root) {
            self.dynamic_root = parent;
            if parent.is_none() {
                self.pending.remove(Pending::DYNAMIC);
            }
        }
    }

    /// Asks for a reset. Deferred until the current run ends, if any.
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    /// Clears all pending state: bits, roots, damage, scroll requests,
    /// snapshots and stale-geometry marks.
    ///
    /// Nodes noted as destroyed stay queued so collaborators still drop their
    /// caches on the next run.
    pub fn reset(&mut self) {
        self.pending = Pending::empty();
        self.restyle_root = None;
        self.dynamic_root = None;
        self.layout_dirty = DirtyTracker::with_cycle_handling(CycleHandling::Error);
        self.damage.clear();
        self.snapshot.clear();
        self.scroll_request = ScrollRequest::default();
        self.scroll = Vec2::ZERO;
        self.document_size = Size::ZERO;
        self.armed = false;
        self.reset_requested = false;
    }

    // -- Run bookkeeping (used by the pipeline) --

    fn arm(&mut self) {
        if !self.armed {
            log::trace!("idle callback armed (pending {:?})", self.pending);
            self.armed = true;
        }
    }

    /// Drops a pinned snapshot that no pending phase will ever diff against.
    fn release_unused_pin(&mut self) {
        let repaints = Pending::RESTYLE | Pending::LAYOUT | Pending::DAMAGE;
        if self.snapshot.is_held() && !self.pending.intersects(repaints) {
            log::trace!("dropping snapshot pin, nothing left to repaint");
            self.snapshot.discard();
        }
    }

    /// Starts a run. Returns the bits pending at the start, or `None` when
    /// there is nothing to do.
    ///
    /// # Panics
    ///
    /// Panics if a run is already in progress.
    pub(crate) fn begin_run(&mut self) -> Option<Pending> {
        assert!(!self.in_progress, "pipeline re-entered while in progress");
        self.armed = false;
        if self.pending.is_empty() && self.discarded.is_empty() {
            return None;
        }
        self.in_progress = true;
        self.cycle += 1;
        Some(self.pending)
    }

    /// Ends a run. Whatever is still pending re-arms the callback.
    ///
    /// Returns whether the callback was re-armed and whether a reset was
    /// requested during the run.
    pub(crate) fn end_run(&mut self) -> (bool, bool) {
        self.in_progress = false;
        self.release_unused_pin();
        self.armed = !self.pending.is_empty();
        (self.armed, core::mem::take(&mut self.reset_requested))
    }

    pub(crate) fn take_discarded(&mut self) -> Vec<NodeId> {
        core::mem::take(&mut self.discarded)
    }

    pub(crate) fn take_phase(&mut self, bit: Pending) -> bool {
        let set = self.pending.contains(bit);
        self.pending.remove(bit);
        set
    }

    pub(crate) fn mark_pending(&mut self, bits: Pending) {
        self.pending |= bits;
    }

    pub(crate) fn take_dynamic_root(&mut self) -> Option<NodeId> {
        self.dynamic_root.take()
    }

    pub(crate) fn take_restyle_root(&mut self) -> Option<NodeId> {
        self.restyle_root.take()
    }

    /// Drains the stale-geometry set, skipping slots freed since marking.
    pub(crate) fn take_layout_dirty(&mut self, tree: &NodeStore) -> Vec<NodeId> {
        let stale: Vec<u32> = self
            .layout_dirty
            .drain(dirty::LAYOUT)
            .deterministic()
            .run()
            .collect();
        stale
            .into_iter()
            .map(|idx| tree.id_at(idx))
            .filter(|&id| tree.is_alive(id))
            .collect()
    }

    pub(crate) fn set_document_size(&mut self, size: Size) {
        self.document_size = size;
    }

    pub(crate) fn snapshot_mut(&mut self) -> &mut SnapshotBuffer {
        &mut self.snapshot
    }

    pub(crate) fn damage_mut(&mut self) -> &mut DamageTracker {
        &mut self.damage
    }

    pub(crate) fn take_scroll_request(&mut self) -> (Option<f64>, Option<f64>) {
        let ScrollRequest { x, y } = core::mem::take(&mut self.scroll_request);
        (x, y)
    }

    pub(crate) fn set_scroll_offset(&mut self, offset: Vec2) {
        self.scroll = offset;
    }
}
