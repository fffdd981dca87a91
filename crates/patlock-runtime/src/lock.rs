#![forbid(unsafe_code)]

//! The pattern-lock widget core.
//!
//! [`PatternLock`] wires a [`GestureTracker`], a validation strategy, and a
//! [`FeedbackController`] together behind three host entry points
//! (`pointer_down`, `pointer_move`, `pointer_up`) plus a `tick` for the
//! feedback clock. Every call returns the outbound [`LockSignal`]s it caused,
//! in emission order, for the host's rendering collaborators.
//!
//! # Flow
//!
//! ```text
//! down  -> clear sequence + segments            -> SegmentsChanged([])
//! move  -> maybe append node, move live segment -> NodeTouched?, SegmentsChanged
//! up    -> drop live segment, validate          -> SegmentsChanged, GestureResult,
//!                                                  FeedbackCycleCancelled?, FeedbackCycleStarted
//! tick  -> (background results), advance cycle  -> ..., FeedbackCycleFinished?
//! ```
//!
//! Stray move/up events while idle produce no signals.

use std::sync::Arc;
use std::time::Duration;

use patlock_core::{
    ConfigError, GestureTracker, LockConfig, MoveOutcome, NodeField, NodeIndex, Point,
    PointerEvent, PointerEventKind, Segment, Sequence, SequenceRule, SequenceValidator,
};

use crate::evaluator::BackgroundEvaluator;
use crate::feedback::{FeedbackController, FeedbackFrame, FeedbackSignal, FeedbackTiming};

/// Outbound notification for rendering and host collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum LockSignal {
    /// Full snapshot of the segment list after a change.
    SegmentsChanged(Vec<Segment>),
    /// A node was appended to the live sequence.
    NodeTouched(NodeIndex),
    /// Validation outcome for a completed gesture.
    GestureResult { gesture_id: u64, matched: bool },
    FeedbackCycleStarted { cycle_id: u64, matched: bool },
    FeedbackCycleCancelled { cycle_id: u64 },
    FeedbackCycleFinished { cycle_id: u64 },
}

impl From<FeedbackSignal> for LockSignal {
    fn from(signal: FeedbackSignal) -> Self {
        match signal {
            FeedbackSignal::Started { cycle_id, matched } => {
                Self::FeedbackCycleStarted { cycle_id, matched }
            }
            FeedbackSignal::Cancelled { cycle_id } => Self::FeedbackCycleCancelled { cycle_id },
            FeedbackSignal::Finished { cycle_id } => Self::FeedbackCycleFinished { cycle_id },
        }
    }
}

/// Where completed sequences are evaluated.
#[derive(Debug)]
enum Validation {
    /// On the dispatch thread, during `pointer_up`.
    Inline(SequenceValidator),
    /// On a worker thread; results arrive via `tick`.
    Background(BackgroundEvaluator),
}

/// Pattern-lock widget core.
#[derive(Debug)]
pub struct PatternLock {
    tracker: GestureTracker,
    reference: Sequence,
    validation: Validation,
    feedback: FeedbackController,
    gesture_id: u64,
}

impl PatternLock {
    /// Build from a configuration using exact positional matching.
    pub fn from_config(config: &LockConfig) -> Result<Self, ConfigError> {
        Self::with_validator(config, SequenceValidator::default())
    }

    /// Build with a custom inline validator.
    pub fn with_validator(
        config: &LockConfig,
        validator: SequenceValidator,
    ) -> Result<Self, ConfigError> {
        Self::build(config, Validation::Inline(validator))
    }

    /// Build with a rule evaluated on worker threads. Results are applied
    /// during [`tick`](Self::tick).
    pub fn with_background_rule(
        config: &LockConfig,
        rule: Arc<dyn SequenceRule>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, Validation::Background(BackgroundEvaluator::new(rule)))
    }

    fn build(config: &LockConfig, validation: Validation) -> Result<Self, ConfigError> {
        config.validate()?;
        let field = Arc::new(config.node_field()?);
        tracing::debug!(
            target: "patlock.lock",
            nodes = field.len(),
            reference_len = config.reference_sequence.len(),
            "pattern lock initialized"
        );
        Ok(Self {
            tracker: GestureTracker::new(field),
            reference: config.reference_sequence.clone(),
            validation,
            feedback: FeedbackController::new(FeedbackTiming::new(config.fade(), config.hold())),
            gesture_id: 0,
        })
    }

    /// Dispatch any pointer event.
    pub fn handle(&mut self, event: &PointerEvent) -> Vec<LockSignal> {
        match event.kind {
            PointerEventKind::Down => self.pointer_down(event.position),
            PointerEventKind::Move => self.pointer_move(event.position),
            PointerEventKind::Up => self.pointer_up(event.position),
        }
    }

    /// Start a gesture. The position is not used for hit testing; nodes are
    /// only touched by moves.
    pub fn pointer_down(&mut self, _position: Point) -> Vec<LockSignal> {
        self.tracker.pointer_down();
        self.gesture_id += 1;
        if let Validation::Background(evaluator) = &mut self.validation {
            evaluator.begin_gesture(self.gesture_id);
        }
        vec![LockSignal::SegmentsChanged(Vec::new())]
    }

    pub fn pointer_move(&mut self, position: Point) -> Vec<LockSignal> {
        match self.tracker.pointer_move(position) {
            MoveOutcome::Ignored(_) => Vec::new(),
            MoveOutcome::Appended(node) => vec![
                LockSignal::NodeTouched(node),
                LockSignal::SegmentsChanged(self.tracker.segments().to_vec()),
            ],
            MoveOutcome::Tracked if self.tracker.segments().is_empty() => Vec::new(),
            MoveOutcome::Tracked => vec![LockSignal::SegmentsChanged(
                self.tracker.segments().to_vec(),
            )],
        }
    }

    /// End the gesture. The release position does not affect the sequence.
    pub fn pointer_up(&mut self, _position: Point) -> Vec<LockSignal> {
        let had_live = self.tracker.segments().last().is_some_and(|s| s.live);
        let Some(sequence) = self.tracker.pointer_up() else {
            return Vec::new();
        };
        let _span = tracing::debug_span!(
            "patlock.gesture",
            gesture_id = self.gesture_id,
            len = sequence.len(),
        )
        .entered();

        let mut out = Vec::with_capacity(4);
        if had_live {
            out.push(LockSignal::SegmentsChanged(self.tracker.segments().to_vec()));
        }

        match &mut self.validation {
            Validation::Inline(validator) => {
                let matched = validator.validate(&sequence, &self.reference);
                self.apply_result(self.gesture_id, matched, &mut out);
            }
            Validation::Background(evaluator) => {
                evaluator.submit(self.gesture_id, sequence, self.reference.clone());
            }
        }
        out
    }

    /// Advance the feedback clock by `dt`, first applying any background
    /// result that arrived for the current gesture.
    pub fn tick(&mut self, dt: Duration) -> Vec<LockSignal> {
        let mut out = Vec::new();
        if let Validation::Background(evaluator) = &mut self.validation
            && let Some(outcome) = evaluator.poll()
        {
            self.apply_result(outcome.gesture_id, outcome.matched(), &mut out);
        }
        if let Some(signal) = self.feedback.tick(dt) {
            out.push(signal.into());
        }
        out
    }

    fn apply_result(&mut self, gesture_id: u64, matched: bool, out: &mut Vec<LockSignal>) {
        tracing::debug!(target: "patlock.lock", gesture_id, matched, "gesture result");
        out.push(LockSignal::GestureResult {
            gesture_id,
            matched,
        });
        out.extend(
            self.feedback
                .on_gesture_complete(matched)
                .into_iter()
                .map(LockSignal::from),
        );
    }

    #[must_use]
    pub fn field(&self) -> &Arc<NodeField> {
        self.tracker.field()
    }

    #[must_use]
    pub fn reference(&self) -> &Sequence {
        &self.reference
    }

    #[must_use]
    pub fn sequence(&self) -> &Sequence {
        self.tracker.sequence()
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        self.tracker.segments()
    }

    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.tracker.is_active()
    }

    /// Id of the most recently started gesture (0 before the first).
    #[must_use]
    pub fn gesture_id(&self) -> u64 {
        self.gesture_id
    }

    #[must_use]
    pub fn feedback(&self) -> &FeedbackController {
        &self.feedback
    }

    #[must_use]
    pub fn feedback_frame(&self) -> Option<FeedbackFrame> {
        self.feedback.frame()
    }

    /// Whether a background evaluation for the current gesture is outstanding.
    #[must_use]
    pub fn is_evaluating(&self) -> bool {
        match &self.validation {
            Validation::Inline(_) => false,
            Validation::Background(evaluator) => evaluator.is_pending(),
        }
    }
}
