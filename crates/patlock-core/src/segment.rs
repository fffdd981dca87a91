#![forbid(unsafe_code)]

//! Connecting-line segments derived from gesture progress.
//!
//! [`SegmentBuilder`] is driven exclusively by the gesture tracker. It keeps
//! one segment per committed node; the last one is *live* while a gesture is
//! active (its end follows the pointer) and every earlier one is frozen with
//! its end exactly on the center of the node that followed it.
//!
//! # Invariants
//!
//! 1. At most one segment is live, and it is always the last one.
//! 2. Frozen segments end on node centers, never on raw pointer positions.
//! 3. Segments are value objects; callers receive snapshots, never handles
//!    into builder state.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::node_field::NodeIndex;

/// A directed connecting line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Node the segment is anchored at.
    pub from: NodeIndex,
    /// Anchor position (center of `from`).
    pub start: Point,
    /// End position: the next node's center, or the pointer while live.
    pub end: Point,
    /// Whether `end` currently tracks the pointer.
    pub live: bool,
}

impl Segment {
    /// Line thickness in canvas units.
    pub const THICKNESS: f32 = 5.0;

    /// Center of the segment; where a host anchors its line visual.
    #[inline]
    #[must_use]
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Orientation of `start -> end` in radians, counter-clockwise from +x.
    #[inline]
    #[must_use]
    pub fn angle(&self) -> f32 {
        let (dx, dy) = self.start.delta_to(self.end);
        dy.atan2(dx)
    }

    /// Orientation in degrees.
    #[inline]
    #[must_use]
    pub fn angle_degrees(&self) -> f32 {
        self.angle().to_degrees()
    }

    /// Visual extent as `(length, thickness)`.
    #[inline]
    #[must_use]
    pub fn size(&self) -> (f32, f32) {
        (self.length(), Self::THICKNESS)
    }
}

/// Builds the segment list for the current gesture.
#[derive(Debug, Clone, Default)]
pub struct SegmentBuilder {
    segments: Vec<Segment>,
}

impl SegmentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current segments, oldest first.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The live segment, if any.
    #[must_use]
    pub fn live(&self) -> Option<&Segment> {
        self.segments.last().filter(|s| s.live)
    }

    /// Drop every segment.
    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// A node was committed: freeze the previous live segment on the node's
    /// center, then open a new live segment anchored there.
    pub fn commit_node(&mut self, node: NodeIndex, center: Point) {
        if let Some(last) = self.segments.last_mut()
            && last.live
        {
            last.end = center;
            last.live = false;
        }
        self.segments.push(Segment {
            from: node,
            start: center,
            end: center,
            live: true,
        });
    }

    /// Move the live segment's end to `pointer`. Returns whether a live
    /// segment existed.
    pub fn track(&mut self, pointer: Point) -> bool {
        match self.segments.last_mut() {
            Some(last) if last.live => {
                last.end = pointer;
                true
            }
            _ => false,
        }
    }

    /// Discard the live trailing segment. Frozen segments are untouched.
    ///
    /// Returns the removed segment.
    pub fn drop_live(&mut self) -> Option<Segment> {
        if self.segments.last().is_some_and(|s| s.live) {
            self.segments.pop()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Point = Point::new(0.0, 0.0);
    const B: Point = Point::new(100.0, 0.0);

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    // --- Geometry ---

    #[test]
    fn horizontal_geometry() {
        let s = Segment {
            from: n(0),
            start: A,
            end: B,
            live: false,
        };
        assert_eq!(s.midpoint(), Point::new(50.0, 0.0));
        assert_eq!(s.length(), 100.0);
        assert_eq!(s.angle_degrees(), 0.0);
        assert_eq!(s.size(), (100.0, Segment::THICKNESS));
    }

    #[test]
    fn angle_follows_direction() {
        let up = Segment {
            from: n(0),
            start: A,
            end: Point::new(0.0, 10.0),
            live: true,
        };
        assert!((up.angle_degrees() - 90.0).abs() < 1e-4);

        let back = Segment {
            from: n(1),
            start: B,
            end: A,
            live: true,
        };
        assert!((back.angle_degrees().abs() - 180.0).abs() < 1e-4);

        let diag = Segment {
            from: n(0),
            start: A,
            end: Point::new(-10.0, -10.0),
            live: true,
        };
        assert!((diag.angle_degrees() + 135.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_segment_has_zero_length() {
        let s = Segment {
            from: n(0),
            start: B,
            end: B,
            live: true,
        };
        assert_eq!(s.length(), 0.0);
        assert_eq!(s.midpoint(), B);
    }

    // --- Builder ---

    #[test]
    fn commit_opens_live_segment() {
        let mut b = SegmentBuilder::new();
        b.commit_node(n(0), A);
        assert_eq!(b.len(), 1);
        let live = b.live().copied().unwrap();
        assert_eq!(live.start, A);
        assert_eq!(live.end, A);
    }

    #[test]
    fn commit_freezes_previous_on_node_center() {
        let mut b = SegmentBuilder::new();
        b.commit_node(n(0), A);
        b.track(Point::new(93.0, 4.0));
        b.commit_node(n(1), B);

        let segs = b.segments();
        assert_eq!(segs.len(), 2);
        assert!(!segs[0].live);
        assert_eq!(segs[0].end, B);
        assert!(segs[1].live);
        assert_eq!(segs[1].start, B);
    }

    #[test]
    fn track_moves_only_live_end() {
        let mut b = SegmentBuilder::new();
        assert!(!b.track(A));
        b.commit_node(n(0), A);
        b.commit_node(n(1), B);
        assert!(b.track(Point::new(150.0, 20.0)));
        assert_eq!(b.segments()[0].end, B);
        assert_eq!(b.segments()[1].end, Point::new(150.0, 20.0));
    }

    #[test]
    fn drop_live_removes_exactly_one() {
        let mut b = SegmentBuilder::new();
        b.commit_node(n(0), A);
        b.commit_node(n(1), B);
        let dropped = b.drop_live().unwrap();
        assert_eq!(dropped.from, n(1));
        assert_eq!(b.len(), 1);
        assert!(b.live().is_none());
        // Frozen segment survives a second drop.
        assert!(b.drop_live().is_none());
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn clear_empties() {
        let mut b = SegmentBuilder::new();
        b.commit_node(n(0), A);
        b.clear();
        assert!(b.is_empty());
        assert!(b.live().is_none());
    }
}
