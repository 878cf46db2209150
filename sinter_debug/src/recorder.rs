// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Rich events ([`on_damage_rects`](TraceSink::on_damage_rects),
//! [`on_layout_invalidations`](TraceSink::on_layout_invalidations)) store
//! only the count.

use sinter_core::time::HostTime;
use sinter_core::trace::{
    CollaboratorErrorEvent, DamageRect, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    PipelineBeginEvent, PipelineSummary, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PIPELINE_BEGIN: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_COLLABORATOR_ERROR: u8 = 4;
const TAG_PIPELINE_SUMMARY: u8 = 5;
const TAG_DAMAGE_RECTS_COUNT: u8 = 6;
const TAG_LAYOUT_INVALIDATIONS_COUNT: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_u32(&mut self, v: Option<u32>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u32(val);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
            }
        }
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(u8::try_from(p.index()).unwrap_or(u8::MAX));
    }

    fn write_count(&mut self, tag: u8, cycle: u64, len: usize) {
        self.write_u8(tag);
        self.write_u64(cycle);
        self.write_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }
}

impl TraceSink for RecorderSink {
    fn on_pipeline_begin(&mut self, e: &PipelineBeginEvent) {
        self.write_u8(TAG_PIPELINE_BEGIN);
        self.write_u64(e.cycle);
        self.write_u8(e.pending);
        self.write_bool(e.forced);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.cycle);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.cycle);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_collaborator_error(&mut self, e: &CollaboratorErrorEvent) {
        self.write_u8(TAG_COLLABORATOR_ERROR);
        self.write_u64(e.cycle);
        self.write_phase(e.phase);
        self.write_option_u32(e.node_index);
    }

    fn on_pipeline_summary(&mut self, s: &PipelineSummary) {
        self.write_u8(TAG_PIPELINE_SUMMARY);
        self.write_u64(s.cycle);
        self.write_bool(s.forced);
        self.write_u64(s.began.ticks());
        self.write_u64(s.dynamic_ticks);
        self.write_u64(s.restyle_ticks);
        self.write_u64(s.layout_ticks);
        self.write_u64(s.repair_ticks);
        self.write_u64(s.scroll_ticks);
        self.write_u32(s.restyled_nodes);
        self.write_u32(s.invalidated_nodes);
        self.write_u32(s.damage_rects);
        self.write_bool(s.full_repaint);
        self.write_u32(s.errors);
        self.write_bool(s.rearmed);
    }

    fn on_damage_rects(&mut self, cycle: u64, rects: &[DamageRect]) {
        self.write_count(TAG_DAMAGE_RECTS_COUNT, cycle, rects.len());
    }

    fn on_layout_invalidations(&mut self, cycle: u64, nodes: &[u32]) {
        self.write_count(TAG_LAYOUT_INVALIDATIONS_COUNT, cycle, nodes.len());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PipelineBeginEvent`].
    PipelineBegin(PipelineBeginEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`CollaboratorErrorEvent`].
    CollaboratorError(CollaboratorErrorEvent),
    /// A [`PipelineSummary`].
    PipelineSummary(PipelineSummary),
    /// Repainted rectangle count for a run.
    DamageRectsCount {
        /// Run counter.
        cycle: u64,
        /// Number of damage rects.
        count: u32,
    },
    /// Invalidated layout slot count for a run.
    LayoutInvalidationsCount {
        /// Run counter.
        cycle: u64,
        /// Number of invalidated nodes.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|b| b != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_option_u32(&mut self) -> Option<Option<u32>> {
        let present = self.read_u8()?;
        let val = self.read_u32()?;
        Some((present != 0).then_some(val))
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        PhaseKind::from_index(usize::from(self.read_u8()?))
    }

    fn decode_pipeline_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PipelineBegin(PipelineBeginEvent {
            cycle: self.read_u64()?,
            pending: self.read_u8()?,
            forced: self.read_bool()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            cycle: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            cycle: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_collaborator_error(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CollaboratorError(CollaboratorErrorEvent {
            cycle: self.read_u64()?,
            phase: self.read_phase()?,
            node_index: self.read_option_u32()?,
        }))
    }

    fn decode_pipeline_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PipelineSummary(PipelineSummary {
            cycle: self.read_u64()?,
            forced: self.read_bool()?,
            began: HostTime(self.read_u64()?),
            dynamic_ticks: self.read_u64()?,
            restyle_ticks: self.read_u64()?,
            layout_ticks: self.read_u64()?,
            repair_ticks: self.read_u64()?,
            scroll_ticks: self.read_u64()?,
            restyled_nodes: self.read_u32()?,
            invalidated_nodes: self.read_u32()?,
            damage_rects: self.read_u32()?,
            full_repaint: self.read_bool()?,
            errors: self.read_u32()?,
            rearmed: self.read_bool()?,
        }))
    }

    fn decode_count(&mut self) -> Option<(u64, u32)> {
        Some((self.read_u64()?, self.read_u32()?))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_PIPELINE_BEGIN => self.decode_pipeline_begin(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_COLLABORATOR_ERROR => self.decode_collaborator_error(),
            TAG_PIPELINE_SUMMARY => self.decode_pipeline_summary(),
            TAG_DAMAGE_RECTS_COUNT => {
                let (cycle, count) = self.decode_count()?;
                Some(RecordedEvent::DamageRectsCount { cycle, count })
            }
            TAG_LAYOUT_INVALIDATIONS_COUNT => {
                let (cycle, count) = self.decode_count()?;
                Some(RecordedEvent::LayoutInvalidationsCount { cycle, count })
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> PipelineSummary {
        PipelineSummary {
            cycle: 9,
            forced: false,
            began: HostTime(1_000),
            dynamic_ticks: 0,
            restyle_ticks: 400,
            layout_ticks: 1_500,
            repair_ticks: 250,
            scroll_ticks: 10,
            restyled_nodes: 12,
            invalidated_nodes: 5,
            damage_rects: 0,
            full_repaint: true,
            errors: 1,
            rearmed: true,
        }
    }

    #[test]
    fn phase_events_keep_order_and_fields() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            cycle: 5,
            phase: PhaseKind::Repair,
            timestamp: HostTime(2000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            cycle: 5,
            phase: PhaseKind::Repair,
            timestamp: HostTime(3000),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::PhaseBegin(e) => {
                assert_eq!(e.cycle, 5);
                assert_eq!(e.phase, PhaseKind::Repair);
                assert_eq!(e.timestamp, HostTime(2000));
            }
            other => panic!("expected PhaseBegin, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::PhaseEnd(e) => {
                assert_eq!(e.phase, PhaseKind::Repair);
                assert_eq!(e.timestamp, HostTime(3000));
            }
            other => panic!("expected PhaseEnd, got {other:?}"),
        }
    }

    #[test]
    fn summary_survives_recording() {
        let mut rec = RecorderSink::new();
        let orig = sample_summary();
        rec.on_pipeline_summary(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match events.as_slice() {
            [RecordedEvent::PipelineSummary(s)] => {
                assert_eq!(s.cycle, orig.cycle);
                assert_eq!(s.layout_ticks, orig.layout_ticks);
                assert_eq!(s.restyled_nodes, orig.restyled_nodes);
                assert!(s.full_repaint);
                assert_eq!(s.errors, 1);
                assert!(s.rearmed);
            }
            other => panic!("expected one PipelineSummary, got {other:?}"),
        }
    }

    #[test]
    fn error_without_node() {
        let mut rec = RecorderSink::new();
        rec.on_collaborator_error(&CollaboratorErrorEvent {
            cycle: 2,
            phase: PhaseKind::Layout,
            node_index: None,
        });
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match events.as_slice() {
            [RecordedEvent::CollaboratorError(e)] => {
                assert_eq!(e.phase, PhaseKind::Layout);
                assert_eq!(e.node_index, None);
            }
            other => panic!("expected one CollaboratorError, got {other:?}"),
        }
    }

    #[test]
    fn rich_events_store_counts() {
        let mut rec = RecorderSink::new();
        rec.on_damage_rects(
            4,
            &[DamageRect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            }],
        );
        rec.on_layout_invalidations(4, &[1, 2, 3]);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert!(matches!(
            events.as_slice(),
            [
                RecordedEvent::DamageRectsCount { cycle: 4, count: 1 },
                RecordedEvent::LayoutInvalidationsCount { cycle: 4, count: 3 },
            ]
        ));
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_pipeline_begin(&PipelineBeginEvent {
            cycle: 1,
            pending: 0b10,
            forced: false,
            timestamp: HostTime(0),
        });
        rec.on_pipeline_summary(&sample_summary());
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];
        let events: Vec<_> = decode(cut).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecordedEvent::PipelineBegin(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0);
    }
}
