// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The idle-time render pipeline.
//!
//! One run consumes the scheduler's pending state in a fixed order, calling
//! only the phases whose bit is set:
//!
//! ```text
//!   discards ─► Dynamic ─► Restyle ─► Layout ─► Repair ─► Scroll
//!                  │          │          │
//!                  └─restyle─►└─layout──►└─scroll, damage─► ...
//! ```
//!
//! Earlier phases feed later ones within the same run: a dynamic check that
//! schedules a restyle gets it now, a restyle schedules layout of what it
//! touched, and layout always asks for a scroll update (and a repair when a
//! snapshot is pinned). Work scheduled for a phase that already ran stays
//! pending and re-arms the idle callback when the run ends.
//!
//! Collaborator failures are logged, traced and queued; they never abort
//! the run.

use alloc::vec::Vec;

use kurbo::Vec2;

use crate::damage::DamageRegion;
use crate::error::{CollaboratorError, PhaseError};
use crate::host::{Axis, Collaborators, PhaseContext};
use crate::node::{NodeId, NodeStore};
use crate::scheduler::{Pending, Scheduler};
use crate::trace::{
    CollaboratorErrorEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, PipelineBeginEvent,
    PipelineSummary, PipelineSummaryBuilder,
};

/// What a pipeline run did.
#[derive(Clone, Copy, Debug)]
pub struct RunReport {
    /// Run counter.
    pub cycle: u64,
    /// Phases that executed.
    pub phases: Pending,
    /// Whether work was left pending and the idle callback re-armed.
    pub rearmed: bool,
    /// Whether a collaborator asked for a reset during the run.
    pub reset_requested: bool,
    /// Counters and timings for the run.
    pub summary: PipelineSummary,
}

struct Run<'e> {
    cycle: u64,
    ran: Pending,
    summary: PipelineSummaryBuilder,
    errors: &'e mut Vec<PhaseError>,
}

impl Run<'_> {
    fn begin(&mut self, cx: &mut Collaborators<'_>, phase: PhaseKind, bit: Pending) {
        let timestamp = cx.now();
        self.ran |= bit;
        self.summary.phase_begin(phase, timestamp);
        cx.tracer.phase_begin(&PhaseBeginEvent {
            cycle: self.cycle,
            phase,
            timestamp,
        });
    }

    fn end(&mut self, cx: &mut Collaborators<'_>, phase: PhaseKind) {
        let timestamp = cx.now();
        self.summary.phase_end(phase, timestamp);
        cx.tracer.phase_end(&PhaseEndEvent {
            cycle: self.cycle,
            phase,
            timestamp,
        });
    }

    fn fail(
        &mut self,
        cx: &mut Collaborators<'_>,
        phase: PhaseKind,
        node: Option<NodeId>,
        error: CollaboratorError,
    ) {
        log::warn!(
            "{} phase of run {} failed (node {node:?}): {error}",
            phase.name(),
            self.cycle
        );
        cx.tracer.collaborator_error(&CollaboratorErrorEvent {
            cycle: self.cycle,
            phase,
            node_index: node.map(NodeId::index),
        });
        self.summary.add_error();
        self.errors.push(PhaseError {
            cycle: self.cycle,
            phase,
            node,
            error,
        });
    }
}

impl Scheduler {
    /// Executes one pipeline run.
    ///
    /// Returns `None` without touching any collaborator when nothing is
    /// pending. Caught collaborator failures are appended to `errors`.
    ///
    /// # Panics
    ///
    /// Panics if a run is already in progress.
    pub(crate) fn run(
        &mut self,
        tree: &NodeStore,
        cx: &mut Collaborators<'_>,
        forced: bool,
        errors: &mut Vec<PhaseError>,
    ) -> Option<RunReport> {
        let pending = self.begin_run()?;
        let begin = PipelineBeginEvent {
            cycle: self.cycle(),
            pending: pending.bits(),
            forced,
            timestamp: cx.now(),
        };
        log::debug!(
            "pipeline run {} starting (pending {pending:?}, forced {forced})",
            begin.cycle
        );
        cx.tracer.pipeline_begin(&begin);
        let mut run = Run {
            cycle: begin.cycle,
            ran: Pending::empty(),
            summary: PipelineSummaryBuilder::new(&begin),
            errors,
        };

        for node in self.take_discarded() {
            cx.style.discard(node);
            cx.layout.invalidate_cache(node);
        }

        if self.take_phase(Pending::DYNAMIC) {
            self.dynamic_phase(tree, cx, &mut run);
        }
        if self.take_phase(Pending::RESTYLE) {
            self.restyle_phase(tree, cx, &mut run);
        }
        if self.take_phase(Pending::LAYOUT) {
            self.layout_phase(tree, cx, &mut run);
        }
        if self.take_phase(Pending::DAMAGE) {
            self.repair_phase(tree, cx, &mut run);
        }
        if self.take_phase(Pending::SCROLL) {
            self.scroll_phase(cx, &mut run);
        }

        let (rearmed, reset_requested) = self.end_run();
        run.summary.set_rearmed(rearmed);
        let summary = run.summary.finish();
        cx.tracer.pipeline_summary(&summary);
        log::debug!(
            "pipeline run {} done: phases {:?}, {} restyled, {} invalidated, {} errors{}",
            run.cycle,
            run.ran,
            summary.restyled_nodes,
            summary.invalidated_nodes,
            summary.errors,
            if rearmed { ", re-armed" } else { "" }
        );

        Some(RunReport {
            cycle: run.cycle,
            phases: run.ran,
            rearmed,
            reset_requested,
            summary,
        })
    }

    // -- Phases --

    fn dynamic_phase(&mut self, tree: &NodeStore, cx: &mut Collaborators<'_>, run: &mut Run<'_>) {
        let Some(root) = self.take_dynamic_root() else {
            return;
        };
        run.begin(cx, PhaseKind::Dynamic, Pending::DYNAMIC);
        if renderable(tree, root) {
            let mut pcx = PhaseContext::new(tree, self, PhaseKind::Dynamic);
            if let Err(e) = cx.style.check_dynamic(&mut pcx, root) {
                run.fail(cx, PhaseKind::Dynamic, Some(root), e);
            }
        }
        run.end(cx, PhaseKind::Dynamic);
    }

    fn restyle_phase(&mut self, tree: &NodeStore, cx: &mut Collaborators<'_>, run: &mut Run<'_>) {
        let Some(root) = self.take_restyle_root() else {
            return;
        };
        run.begin(cx, PhaseKind::Restyle, Pending::RESTYLE);
        if renderable(tree, root) {
            let tops: Vec<NodeId> =
                core::iter::successors(Some(root), |&n| tree.next_sibling(n)).collect();
            let mut restyled = 0_u32;
            for &top in &tops {
                for node in tree.descendants(top) {
                    restyled += 1;
                    let mut pcx = PhaseContext::new(tree, self, PhaseKind::Restyle);
                    if let Err(e) = cx.style.apply(&mut pcx, node) {
                        run.fail(cx, PhaseKind::Restyle, Some(node), e);
                    }
                }
            }
            for &top in &tops {
                self.schedule_layout(tree, top);
            }
            run.summary.add_restyled(restyled);
        }
        run.end(cx, PhaseKind::Restyle);
    }

    fn layout_phase(&mut self, tree: &NodeStore, cx: &mut Collaborators<'_>, run: &mut Run<'_>) {
        run.begin(cx, PhaseKind::Layout, Pending::LAYOUT);
        let stale = self.take_layout_dirty(tree);
        for &node in &stale {
            cx.layout.invalidate_cache(node);
        }
        run.summary
            .add_invalidated(u32::try_from(stale.len()).unwrap_or(u32::MAX));
        #[cfg(feature = "trace-rich")]
        {
            let slots: Vec<u32> = stale.iter().map(|n| n.index()).collect();
            cx.tracer.layout_invalidations(run.cycle, &slots);
        }

        if let Some(root) = tree.root() {
            let viewport = self.viewport();
            let mut pcx = PhaseContext::new(tree, self, PhaseKind::Layout);
            match cx.layout.layout(&mut pcx, root, viewport) {
                Ok(geometry) => self.set_document_size(geometry.document_size),
                Err(e) => run.fail(cx, PhaseKind::Layout, None, e),
            }
        }

        self.mark_pending(Pending::SCROLL);
        if self.snapshot_held() {
            self.mark_pending(Pending::DAMAGE);
        }
        run.end(cx, PhaseKind::Layout);
    }

    fn repair_phase(&mut self, tree: &NodeStore, cx: &mut Collaborators<'_>, run: &mut Run<'_>) {
        run.begin(cx, PhaseKind::Repair, Pending::DAMAGE);
        if self.snapshot_held() {
            let fresh = cx.canvas.snapshot(tree);
            if let Some(old) = self.snapshot_mut().commit(fresh) {
                let changed = cx.canvas.diff(&old, self.snapshot().current());
                let scroll = self.scroll_offset();
                for rect in changed {
                    self.damage_mut().add_rect(rect - scroll);
                }
            }
        }

        let region = self.damage_mut().take_region();
        match &region {
            DamageRegion::Full => run.summary.set_damage(0, true),
            DamageRegion::Rects(rects) => run
                .summary
                .set_damage(u32::try_from(rects.len()).unwrap_or(u32::MAX), false),
            DamageRegion::None => {}
        }
        #[cfg(feature = "trace-rich")]
        {
            use crate::trace::DamageRect;
            let rects: Vec<DamageRect> = match &region {
                DamageRegion::Full => {
                    alloc::vec![kurbo::Rect::from_origin_size((0.0, 0.0), self.viewport()).into()]
                }
                DamageRegion::Rects(rects) => rects.iter().map(|&r| r.into()).collect(),
                DamageRegion::None => Vec::new(),
            };
            cx.tracer.damage_rects(run.cycle, &rects);
        }

        if !region.is_empty() {
            let mut pcx = PhaseContext::new(tree, self, PhaseKind::Repair);
            if let Err(e) = cx.canvas.repair(&mut pcx, &region) {
                run.fail(cx, PhaseKind::Repair, None, e);
            }
        }
        run.end(cx, PhaseKind::Repair);
    }

    fn scroll_phase(&mut self, cx: &mut Collaborators<'_>, run: &mut Run<'_>) {
        run.begin(cx, PhaseKind::Scroll, Pending::SCROLL);
        let (x, y) = self.take_scroll_request();
        let previous = self.scroll_offset();
        let document = self.document_size();
        let viewport = self.viewport();
        let offset = Vec2::new(
            clamp_axis(x.unwrap_or(previous.x), document.width, viewport.width),
            clamp_axis(y.unwrap_or(previous.y), document.height, viewport.height),
        );
        self.set_scroll_offset(offset);

        if let Err(e) = cx.viewport.set_scroll(offset) {
            run.fail(cx, PhaseKind::Scroll, None, e);
        }
        for (axis, at, doc, view) in [
            (Axis::Horizontal, offset.x, document.width, viewport.width),
            (Axis::Vertical, offset.y, document.height, viewport.height),
        ] {
            let (first, last) = fractions(at, doc, view);
            if let Err(e) = cx.viewport.on_scroll_update(axis, first, last) {
                run.fail(cx, PhaseKind::Scroll, None, e);
            }
        }

        if offset != previous {
            log::trace!("scroll moved from {previous:?} to {offset:?}; repainting viewport");
            if self.damage_mut().add_full() {
                self.mark_pending(Pending::DAMAGE);
            }
        }
        run.end(cx, PhaseKind::Scroll);
    }
}

/// Whether `node` still exists and is part of the document tree.
fn renderable(tree: &NodeStore, node: NodeId) -> bool {
    tree.is_alive(node) && !tree.is_orphan(node)
}

/// Clamps a requested offset along one axis to `[0, document - viewport]`.
fn clamp_axis(requested: f64, document: f64, viewport: f64) -> f64 {
    let max = (document - viewport).max(0.0);
    if requested.is_nan() {
        return 0.0;
    }
    requested.clamp(0.0, max)
}

/// Visible fraction `[first, last]` of the document along one axis.
fn fractions(offset: f64, document: f64, viewport: f64) -> (f64, f64) {
    if document <= 0.0 {
        return (0.0, 1.0);
    }
    let first = (offset / document).clamp(0.0, 1.0);
    let last = ((offset + viewport) / document).clamp(0.0, 1.0);
    (first, last)
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;

    #[test]
    fn clamp_keeps_offsets_inside_document() {
        assert_eq!(clamp_axis(50.0, 300.0, 100.0), 50.0);
        assert_eq!(clamp_axis(500.0, 300.0, 100.0), 200.0);
        assert_eq!(clamp_axis(-10.0, 300.0, 100.0), 0.0);
        assert_eq!(clamp_axis(10.0, 80.0, 100.0), 0.0, "document smaller than viewport");
        assert_eq!(clamp_axis(f64::NAN, 300.0, 100.0), 0.0);
    }

    #[test]
    fn fractions_cover_visible_window() {
        assert_eq!(fractions(0.0, 400.0, 100.0), (0.0, 0.25));
        assert_eq!(fractions(300.0, 400.0, 100.0), (0.75, 1.0));
        assert_eq!(fractions(0.0, 50.0, 100.0), (0.0, 1.0));
        assert_eq!(fractions(0.0, 0.0, 100.0), (0.0, 1.0));
    }

    #[test]
    fn damage_rect_conversion_to_viewport() {
        let doc = Rect::new(10.0, 120.0, 30.0, 140.0);
        let shifted = doc - Vec2::new(0.0, 100.0);
        assert_eq!(shifted, Rect::new(10.0, 20.0, 30.0, 40.0));
    }
}
