// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use sinter_core::time::Timebase;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Phases become duration slices; everything else is an instant event.
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Count-only events carry no timestamp; pin them to the latest one seen.
    let mut last_ts = 0.0;

    for recorded in decode(bytes) {
        let event = match recorded {
            RecordedEvent::PipelineBegin(e) => {
                last_ts = ticks_to_us(e.timestamp.ticks(), timebase);
                json!({
                    "ph": "i",
                    "name": "PipelineBegin",
                    "cat": "Scheduler",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "cycle": e.cycle,
                        "pending": e.pending,
                        "forced": e.forced,
                    }
                })
            }
            RecordedEvent::PhaseBegin(e) => {
                last_ts = ticks_to_us(e.timestamp.ticks(), timebase);
                json!({
                    "ph": "B",
                    "name": e.phase.name(),
                    "cat": "Pipeline",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "args": { "cycle": e.cycle }
                })
            }
            RecordedEvent::PhaseEnd(e) => {
                last_ts = ticks_to_us(e.timestamp.ticks(), timebase);
                json!({
                    "ph": "E",
                    "name": e.phase.name(),
                    "cat": "Pipeline",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": 0,
                    "args": { "cycle": e.cycle }
                })
            }
            RecordedEvent::CollaboratorError(e) => json!({
                "ph": "i",
                "name": "CollaboratorError",
                "cat": "Pipeline",
                "ts": last_ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "cycle": e.cycle,
                    "phase": e.phase.name(),
                    "node": e.node_index,
                }
            }),
            RecordedEvent::PipelineSummary(s) => json!({
                "ph": "i",
                "name": "PipelineSummary",
                "cat": "Summary",
                "ts": last_ts,
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": {
                    "cycle": s.cycle,
                    "forced": s.forced,
                    "dynamic_us": ticks_to_us(s.dynamic_ticks, timebase),
                    "restyle_us": ticks_to_us(s.restyle_ticks, timebase),
                    "layout_us": ticks_to_us(s.layout_ticks, timebase),
                    "repair_us": ticks_to_us(s.repair_ticks, timebase),
                    "scroll_us": ticks_to_us(s.scroll_ticks, timebase),
                    "restyled_nodes": s.restyled_nodes,
                    "invalidated_nodes": s.invalidated_nodes,
                    "damage_rects": s.damage_rects,
                    "full_repaint": s.full_repaint,
                    "errors": s.errors,
                    "rearmed": s.rearmed,
                }
            }),
            RecordedEvent::DamageRectsCount { cycle, count } => {
                rich_event("DamageRects", last_ts, cycle, count)
            }
            RecordedEvent::LayoutInvalidationsCount { cycle, count } => {
                rich_event("LayoutInvalidations", last_ts, cycle, count)
            }
        };
        events.push(event);
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn rich_event(name: &str, ts: f64, cycle: u64, count: u32) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": "Rich",
        "ts": ts,
        "pid": 0,
        "tid": 0,
        "s": "p",
        "args": {
            "cycle": cycle,
            "count": count,
        }
    })
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use sinter_core::time::HostTime;
    use sinter_core::trace::{
        CollaboratorErrorEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, PipelineBeginEvent,
        TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_pipeline_begin(&PipelineBeginEvent {
            cycle: 1,
            pending: 0b110,
            forced: false,
            timestamp: HostTime(1_000_000),
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            cycle: 1,
            phase: PhaseKind::Restyle,
            timestamp: HostTime(1_000_000),
        });
        rec.on_collaborator_error(&CollaboratorErrorEvent {
            cycle: 1,
            phase: PhaseKind::Restyle,
            node_index: Some(4),
        });
        rec.on_phase_end(&PhaseEndEvent {
            cycle: 1,
            phase: PhaseKind::Restyle,
            timestamp: HostTime(1_000_500),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::NANOS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "PipelineBegin");
        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "restyle");
        assert_eq!(parsed[2]["name"], "CollaboratorError");
        assert_eq!(parsed[2]["args"]["node"], 4);
        assert_eq!(parsed[2]["ts"], 1000.0, "pinned to the phase start");
        assert_eq!(parsed[3]["ph"], "E");
        assert_eq!(parsed[3]["ts"], 1000.5);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
