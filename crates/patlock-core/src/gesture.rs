#![forbid(unsafe_code)]

//! Gesture tracking: turns pointer events into a node sequence.
//!
//! [`GestureTracker`] consumes pointer-down/move/up events, resolves each
//! move to a node through the shared [`NodeField`], and records the ordered
//! sequence of visited nodes together with the connecting segments.
//!
//! # State Machine
//!
//! ```text
//! Idle --down--> Active --up--> Idle
//!                  |  ^
//!                  +--+ down (forced reset)
//! ```
//!
//! # Invariants
//!
//! 1. The live sequence never holds two equal consecutive entries. Only the
//!    immediately preceding entry is compared: returning to a node after
//!    touching a different one is a new entry, while jittering inside one
//!    node's hit circle (or wandering off into empty space and back) is not.
//! 2. `pointer_down` always clears the sequence and every segment,
//!    whatever the prior state.
//! 3. `pointer_up` removes exactly the live segment when one exists and
//!    never removes a frozen one. Segments otherwise persist until the next
//!    `pointer_down`.
//! 4. Move and up events while `Idle` are no-ops.
//!
//! # Failure Modes
//!
//! - A pointer-down while already `Active` means the host lost an up event.
//!   The tracker restarts the gesture rather than merging the two.
//! - A pointer-up with no node touched yields an empty sequence; validation
//!   decides what that means.

use std::sync::Arc;

use crate::event::{PointerEvent, PointerEventKind};
use crate::geometry::Point;
use crate::node_field::{NodeField, NodeIndex};
use crate::segment::{Segment, SegmentBuilder};
use crate::sequence::Sequence;

/// Lifecycle state of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Active,
}

/// Why an event changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureNoopReason {
    /// Move or up delivered without a preceding down.
    IdleWithoutGesture,
}

/// Result of one pointer-move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// A node was appended to the sequence.
    Appended(NodeIndex),
    /// Only the live segment end moved (or nothing to move yet).
    Tracked,
    Ignored(GestureNoopReason),
}

/// Effect of processing one [`PointerEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEffect {
    /// A gesture started. `restarted` is true when one was already active.
    Started { restarted: bool },
    Moved(MoveOutcome),
    /// The gesture ended with the given finalized sequence.
    Finished(Sequence),
    Ignored(GestureNoopReason),
}

/// Stateful pointer-to-sequence tracker.
pub struct GestureTracker {
    field: Arc<NodeField>,
    state: GestureState,
    sequence: Sequence,
    segments: SegmentBuilder,
}

impl std::fmt::Debug for GestureTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureTracker")
            .field("state", &self.state)
            .field("sequence", &self.sequence)
            .field("segments", &self.segments.len())
            .finish()
    }
}

impl GestureTracker {
    /// Create an idle tracker over a node field.
    #[must_use]
    pub fn new(field: Arc<NodeField>) -> Self {
        Self {
            field,
            state: GestureState::Idle,
            sequence: Sequence::new(),
            segments: SegmentBuilder::new(),
        }
    }

    /// Process a pointer event of any kind.
    pub fn process(&mut self, event: &PointerEvent) -> GestureEffect {
        match event.kind {
            PointerEventKind::Down => GestureEffect::Started {
                restarted: self.pointer_down(),
            },
            PointerEventKind::Move => GestureEffect::Moved(self.pointer_move(event.position)),
            PointerEventKind::Up => match self.pointer_up() {
                Some(sequence) => GestureEffect::Finished(sequence),
                None => GestureEffect::Ignored(GestureNoopReason::IdleWithoutGesture),
            },
        }
    }

    /// Start a gesture, discarding any previous sequence and segments.
    ///
    /// Returns true if a gesture was already active (forced restart).
    pub fn pointer_down(&mut self) -> bool {
        let restarted = self.state == GestureState::Active;
        if restarted {
            tracing::debug!(
                target: "patlock.gesture",
                dropped_len = self.sequence.len(),
                "pointer down during active gesture; restarting"
            );
        }
        self.sequence.clear();
        self.segments.clear();
        self.state = GestureState::Active;
        restarted
    }

    /// Handle a drag to `point`.
    pub fn pointer_move(&mut self, point: Point) -> MoveOutcome {
        if self.state != GestureState::Active {
            tracing::trace!(target: "patlock.gesture", "move ignored while idle");
            return MoveOutcome::Ignored(GestureNoopReason::IdleWithoutGesture);
        }

        let mut outcome = MoveOutcome::Tracked;
        if let Some(index) = self.field.hit_test(point)
            && self.sequence.push_distinct(index)
        {
            if let Some(node) = self.field.node(index) {
                self.segments.commit_node(index, node.position);
            }
            tracing::debug!(
                target: "patlock.gesture",
                node = index.get(),
                len = self.sequence.len(),
                "node appended"
            );
            outcome = MoveOutcome::Appended(index);
        }

        self.segments.track(point);
        outcome
    }

    /// End the gesture. Drops the live segment and returns a copy of the
    /// finalized sequence, or `None` if no gesture was active.
    pub fn pointer_up(&mut self) -> Option<Sequence> {
        if self.state != GestureState::Active {
            tracing::trace!(target: "patlock.gesture", "up ignored while idle");
            return None;
        }
        self.segments.drop_live();
        self.state = GestureState::Idle;
        tracing::debug!(
            target: "patlock.gesture",
            len = self.sequence.len(),
            segments = self.segments.len(),
            "gesture finished"
        );
        Some(self.sequence.clone())
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> GestureState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == GestureState::Active
    }

    /// The sequence recorded so far (live while active, final after up).
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        self.segments.segments()
    }

    #[inline]
    #[must_use]
    pub fn field(&self) -> &Arc<NodeField> {
        &self.field
    }
}
