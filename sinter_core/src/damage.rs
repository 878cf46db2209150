// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport damage tracking for partial repaints.
//!
//! [`DamageTracker`] accumulates viewport-relative rectangles between
//! pipeline runs. Rectangles are clipped to the viewport on entry, and a
//! rectangle already covered by an accepted one is dropped, so the list only
//! grows when genuinely new area is damaged. Overlapping rectangles are kept
//! distinct; no merging into bounding boxes.
//!
//! When the repair phase runs, [`DamageTracker::take_region`] converts the
//! list into a [`DamageRegion`], collapsing to [`DamageRegion::Full`] when the
//! rectangles jointly cover every pixel of the viewport.

use alloc::vec::Vec;

use kurbo::{Rect, Size};

/// A region of the viewport that needs repainting.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire viewport needs repainting.
    Full,
    /// Viewport-relative rectangles that need repainting.
    Rects(Vec<Rect>),
    /// Nothing changed.
    #[default]
    None,
}

impl DamageRegion {
    /// Returns `true` if nothing needs repainting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Accumulates damage rectangles for the next repaint.
#[derive(Clone, Debug)]
pub struct DamageTracker {
    viewport: Rect,
    rects: Vec<Rect>,
}

impl DamageTracker {
    /// Creates an empty tracker for a viewport of the given size.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport: Rect::from_origin_size((0.0, 0.0), viewport),
            rects: Vec::new(),
        }
    }

    /// Changes the viewport size. Pending rectangles are re-clipped.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = Rect::from_origin_size((0.0, 0.0), viewport);
        let pending = core::mem::take(&mut self.rects);
        for rect in pending {
            self.add_rect(rect);
        }
    }

    /// The viewport bounds, always anchored at the origin.
    #[must_use]
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Records a damaged rectangle.
    ///
    /// The rectangle is clipped to the viewport. Degenerate results and
    /// rectangles already covered by a pending one are dropped. Pending
    /// rectangles are never evicted or merged, even when the new one covers
    /// them.
    ///
    /// Returns whether the rectangle was accepted.
    pub fn add_rect(&mut self, rect: Rect) -> bool {
        if !(rect.width() > 0.0 && rect.height() > 0.0) {
            return false;
        }
        let clipped = rect.intersect(self.viewport);
        if !(clipped.width() > 0.0 && clipped.height() > 0.0) {
            return false;
        }
        if self.rects.iter().any(|r| contains(*r, clipped)) {
            return false;
        }
        self.rects.push(clipped);
        true
    }

    /// Marks the whole viewport damaged.
    pub fn add_full(&mut self) -> bool {
        let viewport = self.viewport;
        self.add_rect(viewport)
    }

    /// Pending rectangles in insertion order.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Whether the pending rectangles cover every point of the viewport.
    #[must_use]
    pub fn covers_viewport(&self) -> bool {
        covers(self.viewport, &self.rects)
    }

    /// Drains pending damage into a repaint request.
    pub fn take_region(&mut self) -> DamageRegion {
        if self.rects.is_empty() {
            return DamageRegion::None;
        }
        let region = if self.covers_viewport() {
            DamageRegion::Full
        } else {
            DamageRegion::Rects(self.rects.clone())
        };
        self.rects.clear();
        region
    }

    /// Drops all pending damage.
    pub fn clear(&mut self) {
        self.rects.clear();
    }
}

fn contains(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

/// Exact coverage test on the grid induced by every rectangle edge.
fn covers(area: Rect, rects: &[Rect]) -> bool {
    if rects.iter().any(|r| contains(*r, area)) {
        return true;
    }
    let mut xs: Vec<f64> = Vec::with_capacity(rects.len() * 2 + 2);
    let mut ys: Vec<f64> = Vec::with_capacity(rects.len() * 2 + 2);
    xs.extend([area.x0, area.x1]);
    ys.extend([area.y0, area.y1]);
    for r in rects {
        xs.extend([r.x0.clamp(area.x0, area.x1), r.x1.clamp(area.x0, area.x1)]);
        ys.extend([r.y0.clamp(area.y0, area.y1), r.y1.clamp(area.y0, area.y1)]);
    }
    xs.sort_by(f64::total_cmp);
    xs.dedup();
    ys.sort_by(f64::total_cmp);
    ys.dedup();

    for xw in xs.windows(2) {
        for yw in ys.windows(2) {
            let cx = (xw[0] + xw[1]) * 0.5;
            let cy = (yw[0] + yw[1]) * 0.5;
            let hit = rects
                .iter()
                .any(|r| r.x0 <= cx && cx <= r.x1 && r.y0 <= cy && cy <= r.y1);
            if !hit {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn tracker() -> DamageTracker {
        DamageTracker::new(Size::new(200.0, 100.0))
    }

    #[test]
    fn contained_rect_is_rejected() {
        let mut damage = tracker();
        assert!(damage.add_rect(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert!(!damage.add_rect(Rect::new(10.0, 10.0, 30.0, 30.0)));
        assert_eq!(damage.rects(), &[Rect::new(0.0, 0.0, 100.0, 100.0)]);
    }

    #[test]
    fn add_rect_is_idempotent() {
        let mut damage = tracker();
        let r = Rect::new(5.0, 5.0, 50.0, 40.0);
        assert!(damage.add_rect(r));
        assert!(!damage.add_rect(r));
        assert_eq!(damage.rects().len(), 1);
    }

    #[test]
    fn covering_rect_keeps_earlier_ones() {
        let mut damage = tracker();
        assert!(damage.add_rect(Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(damage.add_rect(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(
            damage.rects(),
            &[
                Rect::new(10.0, 10.0, 20.0, 20.0),
                Rect::new(0.0, 0.0, 100.0, 100.0)
            ]
        );
    }

    #[test]
    fn overlapping_rects_stay_distinct() {
        let mut damage = tracker();
        damage.add_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
        damage.add_rect(Rect::new(25.0, 25.0, 75.0, 75.0));
        assert_eq!(damage.rects().len(), 2);
    }

    #[test]
    fn rects_are_clipped_and_degenerates_dropped() {
        let mut damage = tracker();
        assert!(damage.add_rect(Rect::new(-10.0, -10.0, 10.0, 10.0)));
        assert_eq!(damage.rects(), &[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        assert!(!damage.add_rect(Rect::new(300.0, 0.0, 400.0, 10.0)), "fully outside");
        assert!(!damage.add_rect(Rect::new(20.0, 20.0, 20.0, 40.0)), "zero width");
        assert!(!damage.add_rect(Rect::new(40.0, 40.0, 30.0, 50.0)), "negative width");
    }

    #[test]
    fn full_coverage_collapses_to_full() {
        let mut damage = tracker();
        damage.add_rect(Rect::new(0.0, 0.0, 120.0, 100.0));
        damage.add_rect(Rect::new(100.0, 0.0, 200.0, 60.0));
        assert!(!damage.covers_viewport(), "bottom-right corner still clean");
        damage.add_rect(Rect::new(100.0, 50.0, 200.0, 100.0));
        assert!(damage.covers_viewport());
        assert_eq!(damage.take_region(), DamageRegion::Full);
        assert!(damage.is_empty());
    }

    #[test]
    fn partial_damage_keeps_rects() {
        let mut damage = tracker();
        damage.add_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            damage.take_region(),
            DamageRegion::Rects(vec![Rect::new(0.0, 0.0, 10.0, 10.0)])
        );
        assert_eq!(damage.take_region(), DamageRegion::None);
    }

    #[test]
    fn shrinking_viewport_reclips() {
        let mut damage = tracker();
        damage.add_rect(Rect::new(150.0, 0.0, 200.0, 10.0));
        damage.add_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        damage.set_viewport(Size::new(100.0, 100.0));
        assert_eq!(damage.rects(), &[Rect::new(0.0, 0.0, 10.0, 10.0)]);
    }
}
