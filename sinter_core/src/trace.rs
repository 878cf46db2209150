// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the render pipeline.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! pipeline calls as each run progresses. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`PipelineSummaryBuilder`] collects phase timestamps and counters during a
//! run and produces a [`PipelineSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`DamageRect`] events and the
//!   per-node layout invalidation list.

use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the pipeline is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Re-evaluation of dynamic conditions (hover, focus, ...).
    Dynamic,
    /// Style cascade over the restyle root and its right siblings.
    Restyle,
    /// Geometry invalidation and relayout.
    Layout,
    /// Snapshot diff and repaint.
    Repair,
    /// Scroll offset clamping and scrollbar updates.
    Scroll,
}

impl PhaseKind {
    /// Every phase in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::Dynamic,
        Self::Restyle,
        Self::Layout,
        Self::Repair,
        Self::Scroll,
    ];

    /// Short lowercase name, for logs and trace exports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dynamic => "dynamic",
            Self::Restyle => "restyle",
            Self::Layout => "layout",
            Self::Repair => "repair",
            Self::Scroll => "scroll",
        }
    }

    /// Position in pipeline order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Dynamic => 0,
            Self::Restyle => 1,
            Self::Layout => 2,
            Self::Repair => 3,
            Self::Scroll => 4,
        }
    }

    /// Inverse of [`index`](Self::index).
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Dynamic),
            1 => Some(Self::Restyle),
            2 => Some(Self::Layout),
            3 => Some(Self::Repair),
            4 => Some(Self::Scroll),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a pipeline run starts.
#[derive(Clone, Copy, Debug)]
pub struct PipelineBeginEvent {
    /// Monotonic run counter.
    pub cycle: u64,
    /// Raw [`Pending`](crate::scheduler::Pending) bits at the start of the run.
    pub pending: u8,
    /// Whether the run was forced rather than idle-driven.
    pub forced: bool,
    /// Host time at the start of the run.
    pub timestamp: HostTime,
}

/// Marks the beginning of a pipeline phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Run counter.
    pub cycle: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a pipeline phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Run counter.
    pub cycle: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted when a collaborator call fails.
#[derive(Clone, Copy, Debug)]
pub struct CollaboratorErrorEvent {
    /// Run counter.
    pub cycle: u64,
    /// Phase in which the failure happened.
    pub phase: PhaseKind,
    /// Slot index of the node being processed, if the call was per-node.
    pub node_index: Option<u32>,
}

/// Per-run summary produced by [`PipelineSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct PipelineSummary {
    /// Run counter.
    pub cycle: u64,
    /// Whether the run was forced.
    pub forced: bool,
    /// Host time at the start of the run.
    pub began: HostTime,
    /// Dynamic phase duration in ticks (0 if it did not run).
    pub dynamic_ticks: u64,
    /// Restyle phase duration in ticks (0 if it did not run).
    pub restyle_ticks: u64,
    /// Layout phase duration in ticks (0 if it did not run).
    pub layout_ticks: u64,
    /// Repair phase duration in ticks (0 if it did not run).
    pub repair_ticks: u64,
    /// Scroll phase duration in ticks (0 if it did not run).
    pub scroll_ticks: u64,
    /// Nodes handed to the style resolver.
    pub restyled_nodes: u32,
    /// Nodes whose cached geometry was invalidated.
    pub invalidated_nodes: u32,
    /// Rectangles repainted (0 for a full repaint).
    pub damage_rects: u32,
    /// Whether the repaint covered the whole viewport.
    pub full_repaint: bool,
    /// Collaborator failures caught during the run.
    pub errors: u32,
    /// Whether work was left pending and the idle callback re-armed.
    pub rearmed: bool,
}

/// A repainted rectangle in viewport coordinates.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

#[cfg(feature = "trace-rich")]
impl From<kurbo::Rect> for DamageRect {
    fn from(r: kurbo::Rect) -> Self {
        Self {
            x: r.x0,
            y: r.y0,
            width: r.width(),
            height: r.height(),
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the pipeline.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a pipeline run starts.
    fn on_pipeline_begin(&mut self, e: &PipelineBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a collaborator reports a failure.
    fn on_collaborator_error(&mut self, e: &CollaboratorErrorEvent) {
        _ = e;
    }

    /// Called with the summary of a finished run.
    fn on_pipeline_summary(&mut self, s: &PipelineSummary) {
        _ = s;
    }

    /// Called with the rectangles repainted in a run (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, cycle: u64, rects: &[DamageRect]) {
        _ = (cycle, rects);
    }

    /// Called with the slot indices whose geometry was invalidated
    /// (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_layout_invalidations(&mut self, cycle: u64, nodes: &[u32]) {
        _ = (cycle, nodes);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Default for Tracer<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PipelineBeginEvent`].
    #[inline]
    pub fn pipeline_begin(&mut self, e: &PipelineBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pipeline_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CollaboratorErrorEvent`].
    #[inline]
    pub fn collaborator_error(&mut self, e: &CollaboratorErrorEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_collaborator_error(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PipelineSummary`].
    #[inline]
    pub fn pipeline_summary(&mut self, s: &PipelineSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_pipeline_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits repainted rectangles (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, cycle: u64, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(cycle, rects);
        }
    }

    /// Emits invalidated layout slots (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn layout_invalidations(&mut self, cycle: u64, nodes: &[u32]) {
        if let Some(s) = &mut self.sink {
            s.on_layout_invalidations(cycle, nodes);
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps and counters during a run and produces a
/// [`PipelineSummary`].
#[derive(Debug)]
pub struct PipelineSummaryBuilder {
    begin: PipelineBeginEvent,
    phase_starts: [Option<HostTime>; 5],
    phase_ends: [Option<HostTime>; 5],
    restyled_nodes: u32,
    invalidated_nodes: u32,
    damage_rects: u32,
    full_repaint: bool,
    errors: u32,
    rearmed: bool,
}

impl PipelineSummaryBuilder {
    /// Starts building a summary for the given run.
    #[must_use]
    pub fn new(begin: &PipelineBeginEvent) -> Self {
        Self {
            begin: *begin,
            phase_starts: [None; 5],
            phase_ends: [None; 5],
            restyled_nodes: 0,
            invalidated_nodes: 0,
            damage_rects: 0,
            full_repaint: false,
            errors: 0,
            rearmed: false,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_starts[phase.index()] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase.index()] = Some(t);
    }

    /// Adds to the restyled node count.
    pub fn add_restyled(&mut self, n: u32) {
        self.restyled_nodes = self.restyled_nodes.saturating_add(n);
    }

    /// Adds to the invalidated node count.
    pub fn add_invalidated(&mut self, n: u32) {
        self.invalidated_nodes = self.invalidated_nodes.saturating_add(n);
    }

    /// Records the shape of the repaint.
    pub fn set_damage(&mut self, rects: u32, full: bool) {
        self.damage_rects = rects;
        self.full_repaint = full;
    }

    /// Counts one collaborator failure.
    pub fn add_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
    }

    /// Records whether the idle callback was re-armed.
    pub fn set_rearmed(&mut self, rearmed: bool) {
        self.rearmed = rearmed;
    }

    /// Consumes the builder and produces the final [`PipelineSummary`].
    #[must_use]
    pub fn finish(self) -> PipelineSummary {
        PipelineSummary {
            cycle: self.begin.cycle,
            forced: self.begin.forced,
            began: self.begin.timestamp,
            dynamic_ticks: self.phase_duration(PhaseKind::Dynamic),
            restyle_ticks: self.phase_duration(PhaseKind::Restyle),
            layout_ticks: self.phase_duration(PhaseKind::Layout),
            repair_ticks: self.phase_duration(PhaseKind::Repair),
            scroll_ticks: self.phase_duration(PhaseKind::Scroll),
            restyled_nodes: self.restyled_nodes,
            invalidated_nodes: self.invalidated_nodes,
            damage_rects: self.damage_rects,
            full_repaint: self.full_repaint,
            errors: self.errors,
            rearmed: self.rearmed,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase.index();
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_ticks_since(start),
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> PipelineBeginEvent {
        PipelineBeginEvent {
            cycle: 9,
            pending: 0b0_0110,
            forced: true,
            timestamp: HostTime(1_000),
        }
    }

    #[test]
    fn phase_index_round_trips() {
        for phase in PhaseKind::ALL {
            assert_eq!(PhaseKind::from_index(phase.index()), Some(phase));
        }
        assert_eq!(PhaseKind::from_index(5), None);
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.pipeline_begin(&sample_begin());
        tracer.phase_begin(&PhaseBeginEvent {
            cycle: 9,
            phase: PhaseKind::Layout,
            timestamp: HostTime(0),
        });
    }

    #[test]
    fn summary_builder_computes_durations() {
        let mut builder = PipelineSummaryBuilder::new(&sample_begin());
        builder.phase_begin(PhaseKind::Restyle, HostTime(1_000));
        builder.phase_end(PhaseKind::Restyle, HostTime(1_040));
        builder.phase_begin(PhaseKind::Layout, HostTime(1_040));
        builder.phase_end(PhaseKind::Layout, HostTime(1_300));
        builder.add_restyled(12);
        builder.set_damage(0, true);
        builder.add_error();

        let summary = builder.finish();
        assert_eq!(summary.cycle, 9);
        assert!(summary.forced);
        assert_eq!(summary.restyle_ticks, 40);
        assert_eq!(summary.layout_ticks, 260);
        assert_eq!(summary.dynamic_ticks, 0, "phase that did not run");
        assert_eq!(summary.restyled_nodes, 12);
        assert!(summary.full_repaint);
        assert_eq!(summary.errors, 1);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            phases: Vec<PhaseKind>,
        }
        impl TraceSink for RecordingSink {
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                self.phases.push(e.phase);
            }
        }

        let mut sink = RecordingSink { phases: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.phase_begin(&PhaseBeginEvent {
            cycle: 1,
            phase: PhaseKind::Repair,
            timestamp: HostTime(0),
        });
        drop(tracer);
        assert_eq!(sink.phases, &[PhaseKind::Repair]);
    }
}
