// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior of `Document` with recording collaborators.

use kurbo::{Rect, Size, Vec2};
use sinter_core::damage::DamageRegion;
use sinter_core::host::{
    Axis, Canvas, Collaborators, Geometry, LayoutEngine, PhaseContext, StyleResolver, Viewport,
};
use sinter_core::node::{NodeStore, Tag};
use sinter_core::scheduler::Pending;
use sinter_core::snapshot::{DisplayList, Primitive};
use sinter_core::trace::PhaseKind;
use sinter_core::tree::Token;
use sinter_core::{CollaboratorError, Document, DocumentConfig, Error, NodeId};

// ---------------------------------------------------------------------------
// Recording collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Style {
    applied: Vec<NodeId>,
    discarded: Vec<NodeId>,
    dynamic_roots: Vec<NodeId>,
    restyle_on_dynamic: Option<NodeId>,
    fail_on: Option<NodeId>,
    reset_on_apply: bool,
}

impl StyleResolver for Style {
    fn apply(&mut self, cx: &mut PhaseContext<'_>, node: NodeId) -> Result<(), CollaboratorError> {
        self.applied.push(node);
        if self.reset_on_apply {
            cx.request_reset();
        }
        if self.fail_on == Some(node) {
            return Err(CollaboratorError::new("bad selector"));
        }
        Ok(())
    }

    fn check_dynamic(
        &mut self,
        cx: &mut PhaseContext<'_>,
        root: NodeId,
    ) -> Result<(), CollaboratorError> {
        self.dynamic_roots.push(root);
        if let Some(node) = self.restyle_on_dynamic.take() {
            cx.schedule_restyle(node);
        }
        Ok(())
    }

    fn discard(&mut self, node: NodeId) {
        self.discarded.push(node);
    }
}

#[derive(Default)]
struct Layout {
    invalidated: Vec<NodeId>,
    runs: u32,
    size: Size,
    fail: bool,
    relayout_forever: bool,
}

impl LayoutEngine for Layout {
    fn invalidate_cache(&mut self, node: NodeId) {
        self.invalidated.push(node);
    }

    fn layout(
        &mut self,
        cx: &mut PhaseContext<'_>,
        root: NodeId,
        _viewport: Size,
    ) -> Result<Geometry, CollaboratorError> {
        self.runs += 1;
        if self.relayout_forever {
            cx.schedule_layout(root);
        }
        if self.fail {
            return Err(CollaboratorError::new("no fonts"));
        }
        Ok(Geometry {
            document_size: self.size,
        })
    }
}

#[derive(Default)]
struct Paint {
    list: DisplayList,
    repairs: Vec<DamageRegion>,
    restyle_during_repair: Option<NodeId>,
}

impl Canvas for Paint {
    fn snapshot(&mut self, _tree: &NodeStore) -> DisplayList {
        self.list.clone()
    }

    fn repair(
        &mut self,
        cx: &mut PhaseContext<'_>,
        region: &DamageRegion,
    ) -> Result<(), CollaboratorError> {
        self.repairs.push(region.clone());
        if let Some(node) = self.restyle_during_repair.take() {
            cx.schedule_restyle(node);
        }
        Ok(())
    }
}

#[derive(Default)]
struct Port {
    offsets: Vec<Vec2>,
    updates: Vec<(Axis, f64, f64)>,
}

impl Viewport for Port {
    fn set_scroll(&mut self, offset: Vec2) -> Result<(), CollaboratorError> {
        self.offsets.push(offset);
        Ok(())
    }

    fn on_scroll_update(
        &mut self,
        axis: Axis,
        first: f64,
        last: f64,
    ) -> Result<(), CollaboratorError> {
        self.updates.push((axis, first, last));
        Ok(())
    }
}

#[derive(Default)]
struct Host {
    style: Style,
    layout: Layout,
    paint: Paint,
    port: Port,
}

impl Host {
    fn collaborators(&mut self) -> Collaborators<'_> {
        Collaborators::new(
            &mut self.style,
            &mut self.layout,
            &mut self.paint,
            &mut self.port,
        )
    }

    fn settle(&mut self, doc: &mut Document) {
        doc.run_until_idle(&mut self.collaborators())
            .expect("pipeline settles");
    }

    fn clear(&mut self) {
        self.style.applied.clear();
        self.style.discarded.clear();
        self.layout.invalidated.clear();
        self.paint.repairs.clear();
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn doc() -> Document {
    Document::new(DocumentConfig::new(Size::new(800.0, 600.0)))
}

/// `<div><p>a</p><p>b</p></div>`, returning the div and both paragraphs.
fn page(doc: &mut Document) -> (NodeId, NodeId, NodeId) {
    let div = doc.open_tag("div", Vec::new(), false, 0);
    let p1 = doc.open_tag("p", Vec::new(), false, 5);
    doc.text("a", 8);
    doc.close_tag("p", 9);
    let p2 = doc.open_tag("p", Vec::new(), false, 13);
    doc.text("b", 16);
    doc.close_tag("p", 17);
    doc.close_tag("div", 21);
    (div, p1, p2)
}

fn body(doc: &Document) -> NodeId {
    doc.builder().state().body.expect("skeleton built")
}

// ---------------------------------------------------------------------------
// Tree construction
// ---------------------------------------------------------------------------

#[test]
fn table_content_is_fostered_before_table() {
    let mut doc = doc();
    doc.feed_all([
        Token::open("table"),
        Token::open("b"),
        Token::text("x"),
        Token::close("b"),
        Token::open("tr"),
        Token::open("td"),
        Token::text("1"),
        Token::close("td"),
        Token::close("tr"),
        Token::close("table"),
    ]);
    let tree = doc.tree();
    let kids: Vec<Tag> = tree.children(body(&doc)).map(|n| tree.tag(n)).collect();
    assert_eq!(kids, [Tag::B, Tag::Table]);

    let b = tree.first_child(body(&doc)).expect("b");
    assert_eq!(tree.text(tree.first_child(b).expect("text")), Some("x"));

    let table = tree.next_sibling(b).expect("table");
    let tr = tree.first_child(table).expect("tr");
    let td = tree.first_child(tr).expect("td");
    assert_eq!(tree.tag(td), Tag::Td);
    assert_eq!(tree.text(tree.first_child(td).expect("text")), Some("1"));
}

#[test]
fn stray_close_tag_changes_nothing() {
    let mut doc = doc();
    doc.feed_all([Token::open("span"), Token::text("a")]);
    let live = doc.tree().live_count();
    let current = doc.builder().state().current;
    assert_eq!(doc.close_tag("div", 10), 0);
    assert_eq!(doc.tree().live_count(), live);
    assert_eq!(doc.builder().state().current, current);
}

#[test]
fn stray_close_on_empty_document_builds_nothing() {
    let mut doc = doc();
    assert_eq!(doc.close_tag("div", 0), 0);
    assert_eq!(doc.text("  \n", 6), None);
    assert_eq!(doc.root(), None);
    assert_eq!(doc.tree().live_count(), 0);
    assert!(doc.pending().is_empty());
    assert!(!doc.is_armed());
}

#[test]
fn fragments_are_orphans_until_attached() {
    let mut doc = doc();
    let ul = doc.open_tag("ul", Vec::new(), false, 0);
    let mut host = Host::default();
    host.settle(&mut doc);

    let items = doc.parse_fragment([
        Token::open("li"),
        Token::text("one"),
        Token::open("li"),
        Token::text("two"),
    ]);
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|&li| doc.is_orphan(li)));
    assert!(doc.pending().is_empty(), "orphans are not scheduled");

    for &li in &items {
        doc.append_child(ul, li);
    }
    assert!(!doc.is_orphan(items[0]));
    assert!(doc.pending().contains(Pending::RESTYLE));
    assert_eq!(doc.restyle_root(), Some(ul));
}

#[test]
fn sequence_numbers_follow_document_order() {
    let mut doc = doc();
    let (div, p1, p2) = page(&mut doc);
    assert!(doc.sequence_of(div) < doc.sequence_of(p1));
    assert!(doc.sequence_of(p1) < doc.sequence_of(p2));

    let early = doc.create_element("p", Vec::new());
    doc.insert_before(early, p1);
    assert!(!doc.tree().sequence_ok());
    assert!(doc.sequence_of(early) < doc.sequence_of(p1));
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

#[test]
fn restyle_requests_coalesce_to_common_ancestor() {
    let mut doc = doc();
    let (div, p1, p2) = page(&mut doc);
    let mut host = Host::default();
    host.settle(&mut doc);

    doc.schedule_restyle(p1);
    doc.schedule_restyle(p2);
    let root = doc.restyle_root().expect("root");
    assert_eq!(root, div);
    for node in [p1, p2] {
        assert!(doc.tree().ancestors(node).any(|a| a == root));
    }
}

#[test]
fn detached_nodes_are_not_scheduled() {
    let mut doc = doc();
    page(&mut doc);
    let mut host = Host::default();
    host.settle(&mut doc);

    let loose = doc.create_element("div", Vec::new());
    doc.schedule_restyle(loose);
    doc.schedule_layout(loose);
    doc.schedule_dynamic(loose);
    assert!(doc.pending().is_empty());
    assert!(!doc.is_armed());
}

#[test]
fn contained_damage_is_dropped() {
    let mut doc = doc();
    assert!(doc.schedule_damage(Rect::new(0.0, 0.0, 100.0, 100.0)));
    assert!(!doc.schedule_damage(Rect::new(10.0, 10.0, 20.0, 20.0)));
    assert_eq!(doc.damage(), [Rect::new(0.0, 0.0, 100.0, 100.0)]);
}

#[test]
fn covering_damage_keeps_pending_rects() {
    let mut doc = doc();
    assert!(doc.schedule_damage(Rect::new(10.0, 10.0, 20.0, 20.0)));
    assert!(doc.schedule_damage(Rect::new(0.0, 0.0, 100.0, 100.0)));
    assert_eq!(
        doc.damage(),
        [
            Rect::new(10.0, 10.0, 20.0, 20.0),
            Rect::new(0.0, 0.0, 100.0, 100.0)
        ]
    );
}

#[test]
fn removal_moves_restyle_root_to_parent() {
    let mut doc = doc();
    let (div, p1, _) = page(&mut doc);
    let mut host = Host::default();
    host.settle(&mut doc);

    let text = doc.tree().first_child(p1).expect("text");
    doc.schedule_restyle(text);
    assert_eq!(doc.remove(p1), Some(div));
    assert!(doc.is_orphan(p1));
    assert!(doc.is_orphan(text));
    assert_eq!(doc.restyle_root(), Some(div));
}

#[test]
fn moving_attached_node_reparents() {
    let mut doc = doc();
    let (div, p1, p2) = page(&mut doc);
    let mut host = Host::default();
    host.settle(&mut doc);

    doc.insert_after(p1, p2);
    let tree = doc.tree();
    assert_eq!(tree.children(div).collect::<Vec<_>>(), [p2, p1]);
    tree.check_invariants();
    assert!(!doc.is_orphan(p1));
    assert_eq!(doc.restyle_root(), Some(div));
    assert!(doc.pending().contains(Pending::LAYOUT));

    doc.append_child(body(&doc), p2);
    assert_eq!(doc.tree().children(div).collect::<Vec<_>>(), [p1]);
    assert_eq!(doc.tree().parent(p2), Some(body(&doc)));
    doc.tree().check_invariants();
    assert_eq!(doc.restyle_root(), Some(body(&doc)));

    doc.insert_before(p1, p1);
    assert_eq!(doc.tree().parent(p1), Some(div));
}

#[test]
fn reset_returns_to_empty_state() {
    let mut doc = doc();
    let (_, p1, _) = page(&mut doc);
    let loose = doc.create_element("span", Vec::new());
    doc.schedule_dynamic(p1);
    doc.schedule_damage(Rect::new(0.0, 0.0, 10.0, 10.0));
    doc.schedule_scroll_y(50.0);

    doc.reset();
    assert!(doc.pending().is_empty());
    assert!(!doc.is_armed());
    assert_eq!(doc.root(), None);
    assert_eq!(doc.restyle_root(), None);
    assert_eq!(doc.dynamic_root(), None);
    assert!(doc.damage().is_empty());
    assert!(!doc.tree().is_alive(loose));
    assert_eq!(doc.tree().live_count(), 0);
    assert_eq!(doc.tree().orphans().count(), 0);
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[test]
fn first_run_restyles_whole_document_in_order() {
    let mut doc = doc();
    page(&mut doc);
    let mut host = Host::default();
    let report = doc.run_idle(&mut host.collaborators()).expect("armed");

    let root = doc.root().expect("root");
    let expected: Vec<NodeId> = doc.tree().descendants(root).collect();
    assert_eq!(host.style.applied, expected);
    assert_eq!(host.layout.runs, 1);
    assert!(report.phases.contains(Pending::RESTYLE | Pending::LAYOUT | Pending::SCROLL));
    assert!(!report.rearmed);
    assert!(!doc.is_armed());
}

#[test]
fn restyle_covers_right_siblings() {
    let mut doc = doc();
    let (div, p1, p2) = page(&mut doc);
    let mut host = Host::default();
    host.settle(&mut doc);
    host.clear();

    doc.schedule_restyle(p1);
    doc.run_idle(&mut host.collaborators()).expect("armed");
    let a = doc.tree().first_child(p1).expect("a");
    let b = doc.tree().first_child(p2).expect("b");
    assert_eq!(host.style.applied, [p1, a, p2, b]);
    assert!(!host.style.applied.contains(&div));
}

#[test]
fn layout_invalidates_node_and_ancestors() {
    let mut doc = doc();
    let (div, p1, p2) = page(&mut doc);
    let mut host = Host::default();
    host.settle(&mut doc);
    host.clear();

    doc.schedule_layout(p1);
    doc.run_idle(&mut host.collaborators()).expect("armed");
    let invalidated = &host.layout.invalidated;
    for node in [p1, div, body(&doc), doc.root().expect("root")] {
        assert!(invalidated.contains(&node), "{node:?} not invalidated");
    }
    assert!(!invalidated.contains(&p2));
}

#[test]
fn force_twice_does_work_once() {
    let mut doc = doc();
    page(&mut doc);
    let mut host = Host::default();
    assert!(doc.force(&mut host.collaborators()).is_some());
    let applied = host.style.applied.len();
    assert!(doc.force(&mut host.collaborators()).is_none());
    assert_eq!(host.style.applied.len(), applied);
    assert_eq!(host.layout.runs, 1);
}

#[test]
fn idle_callback_only_runs_when_armed() {
    let mut doc = doc();
    let mut host = Host::default();
    assert!(doc.run_idle(&mut host.collaborators()).is_none());
    assert_eq!(host.layout.runs, 0);
}

#[test]
fn changed_primitive_is_repaired() {
    let mut doc = doc();
    let (_, p1, _) = page(&mut doc);
    let mut host = Host::default();
    let bounds = Rect::new(0.0, 0.0, 50.0, 20.0);
    host.paint.list = DisplayList::new(vec![Primitive {
        key: 1,
        bounds,
        fingerprint: 1,
    }]);
    host.settle(&mut doc);
    assert_eq!(host.paint.repairs, [DamageRegion::Rects(vec![bounds])]);
    host.clear();

    host.paint.list.primitives[0].fingerprint = 2;
    doc.schedule_restyle(p1);
    host.settle(&mut doc);
    assert_eq!(host.paint.repairs, [DamageRegion::Rects(vec![bounds])]);
}

#[test]
fn unchanged_display_list_repaints_nothing() {
    let mut doc = doc();
    let (_, p1, _) = page(&mut doc);
    let mut host = Host::default();
    host.paint.list = DisplayList::new(vec![Primitive {
        key: 1,
        bounds: Rect::new(0.0, 0.0, 50.0, 20.0),
        fingerprint: 1,
    }]);
    host.settle(&mut doc);
    host.clear();

    doc.schedule_restyle(p1);
    host.settle(&mut doc);
    assert!(host.paint.repairs.is_empty());
}

#[test]
fn damage_covering_viewport_repairs_full() {
    let mut doc = doc();
    page(&mut doc);
    let mut host = Host::default();
    host.paint.list = DisplayList::new(vec![Primitive {
        key: 7,
        bounds: Rect::new(-10.0, -10.0, 900.0, 700.0),
        fingerprint: 0,
    }]);
    host.settle(&mut doc);
    assert_eq!(host.paint.repairs, [DamageRegion::Full]);
}

#[test]
fn scroll_is_clamped_and_reported() {
    let mut doc = doc();
    page(&mut doc);
    let mut host = Host::default();
    host.layout.size = Size::new(800.0, 2000.0);
    host.settle(&mut doc);
    host.clear();
    host.port.updates.clear();

    doc.schedule_scroll_y(5000.0);
    let report = doc.run_idle(&mut host.collaborators()).expect("armed");
    assert_eq!(host.port.offsets.last(), Some(&Vec2::new(0.0, 1400.0)));
    assert_eq!(
        host.port.updates,
        [(Axis::Horizontal, 0.0, 1.0), (Axis::Vertical, 0.7, 1.0)]
    );
    assert_eq!(doc.scroll_offset(), Vec2::new(0.0, 1400.0));
    assert!(report.rearmed, "moved viewport needs a repaint");

    doc.run_idle(&mut host.collaborators()).expect("armed");
    assert_eq!(host.paint.repairs, [DamageRegion::Full]);
    assert!(!doc.is_armed());
}

#[test]
fn collaborator_failure_does_not_stop_the_run() {
    let mut doc = doc();
    let (_, p1, _) = page(&mut doc);
    let mut host = Host::default();
    host.layout.fail = true;
    host.style.fail_on = Some(p1);

    let report = doc.run_idle(&mut host.collaborators()).expect("armed");
    assert!(report.phases.contains(Pending::LAYOUT | Pending::DAMAGE | Pending::SCROLL));
    assert_eq!(report.summary.errors, 2);

    let errors = doc.take_errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].phase, PhaseKind::Restyle);
    assert_eq!(errors[0].node, Some(p1));
    assert_eq!(errors[1].phase, PhaseKind::Layout);
    assert_eq!(errors[1].error.message(), "no fonts");
    assert!(doc.take_errors().is_empty());
    assert_eq!(host.port.offsets.len(), 1, "scroll phase still ran");
}

#[test]
fn dynamic_check_feeds_restyle_in_same_run() {
    let mut doc = doc();
    let (div, p1, _) = page(&mut doc);
    let mut host = Host::default();
    host.settle(&mut doc);
    host.clear();

    host.style.restyle_on_dynamic = Some(p1);
    doc.schedule_dynamic(div);
    let report = doc.run_idle(&mut host.collaborators()).expect("armed");
    assert_eq!(host.style.dynamic_roots, [div]);
    assert!(host.style.applied.contains(&p1));
    assert!(report.phases.contains(Pending::DYNAMIC | Pending::RESTYLE));
    assert!(!report.rearmed);
}

#[test]
fn late_requests_rearm_instead_of_looping() {
    let mut doc = doc();
    let (_, p1, _) = page(&mut doc);
    let mut host = Host::default();
    host.paint.list = DisplayList::new(vec![Primitive {
        key: 1,
        bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
        fingerprint: 0,
    }]);
    host.paint.restyle_during_repair = Some(p1);

    let report = doc.run_idle(&mut host.collaborators()).expect("armed");
    assert!(report.rearmed);
    assert!(doc.is_armed());
    assert_eq!(doc.restyle_root(), Some(p1));
    host.clear();

    doc.run_idle(&mut host.collaborators()).expect("armed");
    assert_eq!(host.style.applied.first(), Some(&p1));
}

#[test]
fn runaway_reentrancy_is_reported() {
    let config = DocumentConfig::new(Size::new(100.0, 100.0)).with_max_idle_cycles(4);
    let mut doc = Document::new(config);
    page(&mut doc);
    let mut host = Host::default();
    host.layout.relayout_forever = true;

    let err = doc.run_until_idle(&mut host.collaborators());
    assert_eq!(err, Err(Error::RunawayReentrancy { cycles: 4 }));
    assert_eq!(host.layout.runs, 4);
    assert!(doc.is_armed());
}

#[test]
fn destroyed_nodes_are_discarded_next_run() {
    let mut doc = doc();
    let (_, p1, _) = page(&mut doc);
    let mut host = Host::default();
    host.settle(&mut doc);
    host.clear();

    let text = doc.tree().first_child(p1).expect("text");
    doc.destroy(p1);
    assert!(!doc.tree().is_alive(p1));
    doc.run_idle(&mut host.collaborators()).expect("armed");
    assert_eq!(host.style.discarded, [p1, text]);
    assert!(host.layout.invalidated.starts_with(&[p1, text]));
}

#[test]
fn collaborator_can_request_reset() {
    let mut doc = doc();
    page(&mut doc);
    let mut host = Host::default();
    host.style.reset_on_apply = true;

    let report = doc.run_idle(&mut host.collaborators()).expect("armed");
    assert!(report.reset_requested);
    assert_eq!(doc.root(), None);
    assert!(doc.pending().is_empty());
}

#[test]
fn viewport_resize_relays_and_repaints() {
    let mut doc = doc();
    page(&mut doc);
    let mut host = Host::default();
    host.settle(&mut doc);
    host.clear();

    doc.set_viewport(Size::new(400.0, 300.0));
    host.settle(&mut doc);
    assert_eq!(host.layout.runs, 2);
    assert_eq!(host.paint.repairs, [DamageRegion::Full]);
}

#[test]
fn summary_is_stamped_with_host_clock() {
    use sinter_core::time::{HostTime, ManualClock};

    let mut doc = doc();
    page(&mut doc);
    let mut host = Host::default();
    let clock = ManualClock::new(HostTime(500));
    let report = {
        let mut cx = host.collaborators().with_clock(&clock);
        doc.run_idle(&mut cx).expect("armed")
    };
    assert_eq!(report.summary.began, HostTime(500));
    assert_eq!(report.summary.layout_ticks, 0, "clock did not move");
    assert_eq!(report.summary.restyled_nodes, 8);
}

#[cfg(feature = "trace")]
#[test]
fn tracer_sees_phases_in_order() {
    use sinter_core::trace::{PhaseBeginEvent, PipelineSummary, TraceSink, Tracer};

    #[derive(Default)]
    struct Phases {
        begun: Vec<PhaseKind>,
        summaries: u32,
    }
    impl TraceSink for Phases {
        fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
            self.begun.push(e.phase);
        }
        fn on_pipeline_summary(&mut self, _s: &PipelineSummary) {
            self.summaries += 1;
        }
    }

    let mut doc = doc();
    page(&mut doc);
    let mut host = Host::default();
    let mut sink = Phases::default();
    {
        let mut cx = Collaborators::new(
            &mut host.style,
            &mut host.layout,
            &mut host.paint,
            &mut host.port,
        )
        .with_tracer(Tracer::new(&mut sink));
        doc.run_idle(&mut cx).expect("armed");
    }
    assert_eq!(
        sink.begun,
        [PhaseKind::Restyle, PhaseKind::Layout, PhaseKind::Repair, PhaseKind::Scroll]
    );
    assert_eq!(sink.summaries, 1);
}
