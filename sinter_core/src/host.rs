// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator traits implemented by the embedding host.
//!
//! The pipeline owns no styling, geometry or pixels. Each phase calls out to
//! one of these traits:
//!
//! | Phase   | Collaborator                                   |
//! |---------|------------------------------------------------|
//! | Dynamic | [`StyleResolver::check_dynamic`]               |
//! | Restyle | [`StyleResolver::apply`]                       |
//! | Layout  | [`LayoutEngine::invalidate_cache`], [`LayoutEngine::layout`] |
//! | Repair  | [`Canvas::snapshot`], [`Canvas::diff`], [`Canvas::repair`] |
//! | Scroll  | [`Viewport::set_scroll`], [`Viewport::on_scroll_update`] |
//!
//! Calls that may re-enter the scheduler receive a [`PhaseContext`]. Work
//! scheduled through it is merged into the pending state; if its phase has
//! already run, it is served by the next run rather than looping.
//!
//! Every fallible call returns `Result<_, CollaboratorError>`. Failures are
//! caught at the call site and the rest of the run continues.

use alloc::vec::Vec;

use kurbo::{Rect, Size, Vec2};

use crate::damage::DamageRegion;
use crate::error::CollaboratorError;
use crate::node::{NodeId, NodeStore};
use crate::scheduler::Scheduler;
use crate::snapshot::{self, DisplayList};
use crate::time::{Clock, HostTime};
use crate::trace::{PhaseKind, Tracer};

/// Result of laying out the document.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    /// Extent of the laid-out document, used to clamp scrolling.
    pub document_size: Size,
}

/// A scroll axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis.
    Horizontal,
    /// The y axis.
    Vertical,
}

/// Computes and caches style.
pub trait StyleResolver {
    /// Applies the cascade to one node, caching the computed values.
    fn apply(&mut self, cx: &mut PhaseContext<'_>, node: NodeId) -> Result<(), CollaboratorError>;

    /// Re-evaluates dynamic conditions (hover, focus, ...) under `root`,
    /// scheduling restyles through `cx` where they changed.
    fn check_dynamic(
        &mut self,
        cx: &mut PhaseContext<'_>,
        root: NodeId,
    ) -> Result<(), CollaboratorError> {
        _ = (cx, root);
        Ok(())
    }

    /// Drops anything cached for a destroyed node.
    fn discard(&mut self, node: NodeId) {
        _ = node;
    }
}

/// Computes and caches geometry.
pub trait LayoutEngine {
    /// Forgets cached geometry for `node`. Called for every node whose layout
    /// was invalidated and for every destroyed node.
    fn invalidate_cache(&mut self, node: NodeId);

    /// Lays out the document rooted at `root` into a viewport of `viewport`
    /// size.
    fn layout(
        &mut self,
        cx: &mut PhaseContext<'_>,
        root: NodeId,
        viewport: Size,
    ) -> Result<Geometry, CollaboratorError>;
}

/// Paints the document.
pub trait Canvas {
    /// Describes what would be painted for the current tree.
    fn snapshot(&mut self, tree: &NodeStore) -> DisplayList;

    /// Areas (in document coordinates) that differ between two snapshots.
    fn diff(&self, old: &DisplayList, new: &DisplayList) -> Vec<Rect> {
        snapshot::diff(old, new)
    }

    /// Repaints `region`.
    fn repair(
        &mut self,
        cx: &mut PhaseContext<'_>,
        region: &DamageRegion,
    ) -> Result<(), CollaboratorError>;
}

/// The scrollable window onto the document.
pub trait Viewport {
    /// Moves the visible window to `offset` (already clamped).
    fn set_scroll(&mut self, offset: Vec2) -> Result<(), CollaboratorError>;

    /// Reports the visible fraction `[first, last]` of the document along
    /// `axis`, for scrollbars.
    fn on_scroll_update(
        &mut self,
        axis: Axis,
        first: f64,
        last: f64,
    ) -> Result<(), CollaboratorError> {
        _ = (axis, first, last);
        Ok(())
    }
}

/// Everything a pipeline run calls out to.
pub struct Collaborators<'a> {
    /// Style resolver.
    pub style: &'a mut dyn StyleResolver,
    /// Layout engine.
    pub layout: &'a mut dyn LayoutEngine,
    /// Canvas.
    pub canvas: &'a mut dyn Canvas,
    /// Viewport.
    pub viewport: &'a mut dyn Viewport,
    /// Timestamp source for trace events. Without one every timestamp is 0.
    pub clock: Option<&'a dyn Clock>,
    /// Trace output.
    pub tracer: Tracer<'a>,
}

impl core::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collaborators")
            .field("tracer", &self.tracer)
            .finish_non_exhaustive()
    }
}

impl<'a> Collaborators<'a> {
    /// Bundles the four collaborators with no clock and no tracing.
    #[must_use]
    pub fn new(
        style: &'a mut dyn StyleResolver,
        layout: &'a mut dyn LayoutEngine,
        canvas: &'a mut dyn Canvas,
        viewport: &'a mut dyn Viewport,
    ) -> Self {
        Self {
            style,
            layout,
            canvas,
            viewport,
            clock: None,
            tracer: Tracer::none(),
        }
    }

    /// Uses `clock` for trace timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sends trace events to `tracer`.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer<'a>) -> Self {
        self.tracer = tracer;
        self
    }

    pub(crate) fn now(&self) -> HostTime {
        self.clock.map_or(HostTime(0), |c| c.now())
    }
}

/// Handed to collaborators during a phase.
///
/// Gives read access to the tree and lets the collaborator schedule more
/// work. Nothing scheduled here runs synchronously.
#[derive(Debug)]
pub struct PhaseContext<'a> {
    tree: &'a NodeStore,
    scheduler: &'a mut Scheduler,
    phase: PhaseKind,
}

impl<'a> PhaseContext<'a> {
    pub(crate) fn new(tree: &'a NodeStore, scheduler: &'a mut Scheduler, phase: PhaseKind) -> Self {
        Self {
            tree,
            scheduler,
            phase,
        }
    }

    /// The document being rendered.
    ///
    /// The borrow outlives `self`, so the tree can be walked while scheduling.
    #[must_use]
    pub fn tree(&self) -> &'a NodeStore {
        self.tree
    }

    /// The phase currently running.
    #[must_use]
    pub fn phase(&self) -> PhaseKind {
        self.phase
    }

    /// The current pipeline run counter.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.scheduler.cycle()
    }

    /// Current clamped scroll offset.
    #[must_use]
    pub fn scroll_offset(&self) -> Vec2 {
        self.scheduler.scroll_offset()
    }

    /// See [`Scheduler::schedule_dynamic`].
    pub fn schedule_dynamic(&mut self, node: NodeId) {
        self.scheduler.schedule_dynamic(self.tree, node);
    }

    /// See [`Scheduler::schedule_restyle`].
    pub fn schedule_restyle(&mut self, node: NodeId) {
        self.scheduler.schedule_restyle(self.tree, node);
    }

    /// See [`Scheduler::schedule_layout`].
    pub fn schedule_layout(&mut self, node: NodeId) {
        self.scheduler.schedule_layout(self.tree, node);
    }

    /// See [`Scheduler::schedule_damage`].
    pub fn schedule_damage(&mut self, rect: Rect) -> bool {
        self.scheduler.schedule_damage(rect)
    }

    /// See [`Scheduler::schedule_scroll_x`].
    pub fn schedule_scroll_x(&mut self, offset: f64) {
        self.scheduler.schedule_scroll_x(offset);
    }

    /// See [`Scheduler::schedule_scroll_y`].
    pub fn schedule_scroll_y(&mut self, offset: f64) {
        self.scheduler.schedule_scroll_y(offset);
    }

    /// Asks for the document to be reset once the current run finishes.
    pub fn request_reset(&mut self) {
        self.scheduler.request_reset();
    }
}
