#![forbid(unsafe_code)]

//! Pointer input events in local canvas space.
//!
//! The host input layer delivers events for one gesture strictly in
//! temporal order: a `Down`, zero or more `Move`s, then an `Up`. Stray
//! `Move`/`Up` events outside a gesture are tolerated and ignored by the
//! tracker.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// A single pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// The type of pointer event.
    pub kind: PointerEventKind,

    /// Pointer position in local canvas coordinates.
    pub position: Point,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(kind: PointerEventKind, position: Point) -> Self {
        Self { kind, position }
    }

    #[must_use]
    pub const fn down(position: Point) -> Self {
        Self::new(PointerEventKind::Down, position)
    }

    #[must_use]
    pub const fn moved(position: Point) -> Self {
        Self::new(PointerEventKind::Move, position)
    }

    #[must_use]
    pub const fn up(position: Point) -> Self {
        Self::new(PointerEventKind::Up, position)
    }
}

/// The type of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    /// Pointer pressed; starts a gesture.
    Down,
    /// Pointer dragged while pressed.
    Move,
    /// Pointer released; ends the gesture.
    Up,
}
