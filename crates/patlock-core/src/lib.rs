#![forbid(unsafe_code)]

//! Core: node layout, gesture tracking, segments, and sequence validation.
//!
//! # Role in patlock
//! `patlock-core` is the input layer of a pattern-lock widget. It turns
//! pointer-down/move/up events delivered by a host UI into an ordered,
//! duplicate-suppressed sequence of node indices and decides whether that
//! sequence matches a configured reference.
//!
//! # Primary responsibilities
//! - **NodeField**: immutable node layout and strict-radius hit testing.
//! - **GestureTracker**: the `Idle`/`Active` gesture state machine.
//! - **SegmentBuilder**: connecting-line geometry for the host renderer.
//! - **SequenceValidator**: injectable rule evaluation, exact by default.
//! - **LockConfig**: load-time configuration with fail-fast validation.
//!
//! # How it fits in the system
//! `patlock-runtime` owns the feedback lifecycle and wires these pieces into
//! a single widget core. Rendering, animation playback, and coordinate
//! conversion stay with the host.

pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod gesture;
pub mod node_field;
pub mod segment;
pub mod sequence;
pub mod validate;

pub use config::LockConfig;
pub use error::{ConfigError, RuleError};
pub use event::{PointerEvent, PointerEventKind};
pub use geometry::Point;
pub use gesture::{GestureEffect, GestureState, GestureTracker, MoveOutcome};
pub use node_field::{Node, NodeField, NodeIndex};
pub use segment::{Segment, SegmentBuilder};
pub use sequence::Sequence;
pub use validate::{ExactMatch, FnRule, RuleProgram, SequenceRule, SequenceValidator};
