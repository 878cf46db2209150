// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use sinter_core::scheduler::Pending;
use sinter_core::time::{HostTime, Timebase};
use sinter_core::trace::{
    CollaboratorErrorEvent, DamageRect, PhaseBeginEvent, PhaseEndEvent, PipelineBeginEvent,
    PipelineSummary, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pipeline_begin(&mut self, e: &PipelineBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[run] cycle={} pending={:?} forced={} at {:.1}µs",
            e.cycle,
            Pending::from_bits_truncate(e.pending),
            e.forced,
            self.host_us(e.timestamp),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] cycle={} {} at {:.1}µs",
            e.cycle,
            e.phase.name(),
            self.host_us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] cycle={} {} at {:.1}µs",
            e.cycle,
            e.phase.name(),
            self.host_us(e.timestamp),
        );
    }

    fn on_collaborator_error(&mut self, e: &CollaboratorErrorEvent) {
        let node = e
            .node_index
            .map_or_else(|| "-".to_owned(), |i| i.to_string());
        let _ = writeln!(
            self.writer,
            "[error] cycle={} phase={} node={node}",
            e.cycle,
            e.phase.name(),
        );
    }

    fn on_pipeline_summary(&mut self, s: &PipelineSummary) {
        let damage = if s.full_repaint {
            "full".to_owned()
        } else {
            s.damage_rects.to_string()
        };
        let _ = writeln!(
            self.writer,
            "[summary] cycle={} dynamic={:.1}µs restyle={:.1}µs layout={:.1}µs \
             repair={:.1}µs scroll={:.1}µs restyled={} invalidated={} damage={damage} \
             errors={}{}",
            s.cycle,
            self.ticks_to_us(s.dynamic_ticks),
            self.ticks_to_us(s.restyle_ticks),
            self.ticks_to_us(s.layout_ticks),
            self.ticks_to_us(s.repair_ticks),
            self.ticks_to_us(s.scroll_ticks),
            s.restyled_nodes,
            s.invalidated_nodes,
            s.errors,
            if s.rearmed { " rearmed" } else { "" },
        );
    }

    fn on_damage_rects(&mut self, cycle: u64, rects: &[DamageRect]) {
        let _ = writeln!(self.writer, "[damage] cycle={cycle} rects={}", rects.len());
    }

    fn on_layout_invalidations(&mut self, cycle: u64, nodes: &[u32]) {
        let _ = writeln!(self.writer, "[layout] cycle={cycle} nodes={}", nodes.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinter_core::trace::PhaseKind;

    #[test]
    fn pretty_print_phase() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_phase_begin(&PhaseBeginEvent {
            cycle: 3,
            phase: PhaseKind::Layout,
            timestamp: HostTime(2_000),
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert_eq!(output, "[phase:begin] cycle=3 layout at 2.0µs\n");
    }

    #[test]
    fn pretty_print_error_without_node() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_collaborator_error(&CollaboratorErrorEvent {
            cycle: 1,
            phase: PhaseKind::Repair,
            node_index: None,
        });
        sink.on_collaborator_error(&CollaboratorErrorEvent {
            cycle: 1,
            phase: PhaseKind::Restyle,
            node_index: Some(12),
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("phase=repair node=-"), "got: {output}");
        assert!(output.contains("phase=restyle node=12"), "got: {output}");
    }

    #[test]
    fn pretty_print_pending_bits() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_pipeline_begin(&PipelineBeginEvent {
            cycle: 1,
            pending: (Pending::RESTYLE | Pending::LAYOUT).bits(),
            forced: true,
            timestamp: HostTime(0),
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("RESTYLE | LAYOUT"), "got: {output}");
        assert!(output.contains("forced=true"), "got: {output}");
    }
}
