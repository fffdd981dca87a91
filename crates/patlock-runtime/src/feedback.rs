#![forbid(unsafe_code)]

//! Result feedback lifecycle with cancel-and-replace semantics.
//!
//! [`FeedbackController`] presents the outcome of each completed gesture as
//! one *presentation cycle*: fade in, hold, fade out. The host renders the
//! banner from [`FeedbackFrame`] values and advances the cycle with
//! [`tick`](FeedbackController::tick).
//!
//! # State Machine
//!
//! ```text
//! Quiescent --result--> Presenting --finished--> Quiescent
//!                          |   ^
//!                          +---+ result (cancel previous, start new)
//! ```
//!
//! # Invariants
//!
//! 1. At most one cycle is ever active. A new result cancels the running
//!    cycle before the next one starts; nothing is queued.
//! 2. Cancellation is synchronous: the cancelled cycle's token reports
//!    cancellation and its state is gone before `on_gesture_complete`
//!    returns. No frame mixes two cycles.
//! 3. Cycle ids increase strictly.
//!
//! # Failure Modes
//!
//! - Zero fade duration: fade phases complete instantly.
//! - Zero total duration: the cycle finishes on its first tick.

use std::time::Duration;

use crate::cancellation::{CancellationSource, CancellationToken};

/// Banner label for a matching gesture.
pub const LABEL_CORRECT: &str = "Correct";
/// Banner label for a failed gesture.
pub const LABEL_ERROR: &str = "Error";

/// An RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Fully transparent black.
    pub const CLEAR: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    /// Banner color for a match.
    pub const SUCCESS: Self = Self::new(0.0, 0.7, 0.0, 1.0);
    /// Banner color for a mismatch.
    pub const FAILURE: Self = Self::new(0.75, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Linear interpolation; `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(self, to: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Rgba::new(
            mix(self.r, to.r),
            mix(self.g, to.g),
            mix(self.b, to.b),
            mix(self.a, to.a),
        )
    }
}

/// Durations of the presentation phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackTiming {
    /// Length of each of the fade-in and fade-out phases.
    pub fade: Duration,
    /// Time the banner stays fully visible.
    pub hold: Duration,
}

impl Default for FeedbackTiming {
    fn default() -> Self {
        Self {
            fade: Duration::from_millis(500),
            hold: Duration::from_secs(2),
        }
    }
}

impl FeedbackTiming {
    #[must_use]
    pub const fn new(fade: Duration, hold: Duration) -> Self {
        Self { fade, hold }
    }

    /// Length of a full cycle.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.fade.saturating_mul(2).saturating_add(self.hold)
    }
}

/// Phase within a presentation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackPhase {
    FadeIn,
    Hold,
    FadeOut,
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackState {
    Quiescent,
    Presenting { cycle_id: u64, matched: bool },
}

/// Lifecycle notifications for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackSignal {
    Started { cycle_id: u64, matched: bool },
    Cancelled { cycle_id: u64 },
    Finished { cycle_id: u64 },
}

/// What the host should draw right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackFrame {
    pub cycle_id: u64,
    pub matched: bool,
    pub label: &'static str,
    pub phase: FeedbackPhase,
    /// Progress through the current phase in `[0, 1]`.
    pub phase_progress: f32,
    /// Fully opaque banner color for this result.
    pub target_color: Rgba,
    /// Color to draw, interpolated from transparent.
    pub color: Rgba,
}

/// One running presentation cycle.
#[derive(Debug)]
struct PresentationCycle {
    matched: bool,
    elapsed: Duration,
    source: CancellationSource,
}

impl PresentationCycle {
    fn id(&self) -> u64 {
        self.source.id()
    }

    fn frame(&self, timing: &FeedbackTiming) -> FeedbackFrame {
        let (phase, phase_progress) = phase_at(self.elapsed, timing);
        let target_color = if self.matched {
            Rgba::SUCCESS
        } else {
            Rgba::FAILURE
        };
        let color = match phase {
            FeedbackPhase::FadeIn => Rgba::CLEAR.lerp(target_color, phase_progress),
            FeedbackPhase::Hold => target_color,
            FeedbackPhase::FadeOut => target_color.lerp(Rgba::CLEAR, phase_progress),
        };
        FeedbackFrame {
            cycle_id: self.id(),
            matched: self.matched,
            label: if self.matched { LABEL_CORRECT } else { LABEL_ERROR },
            phase,
            phase_progress,
            target_color,
            color,
        }
    }
}

/// Phase and in-phase progress at `elapsed`. Past the end, reports the
/// final fade-out instant.
fn phase_at(elapsed: Duration, timing: &FeedbackTiming) -> (FeedbackPhase, f32) {
    let fade_in_end = timing.fade;
    let hold_end = fade_in_end.saturating_add(timing.hold);
    if elapsed < fade_in_end {
        (FeedbackPhase::FadeIn, ratio(elapsed, timing.fade))
    } else if elapsed < hold_end {
        (FeedbackPhase::Hold, ratio(elapsed - fade_in_end, timing.hold))
    } else {
        (FeedbackPhase::FadeOut, ratio(elapsed - hold_end, timing.fade))
    }
}

fn ratio(part: Duration, whole: Duration) -> f32 {
    if whole.is_zero() {
        return 1.0;
    }
    ((part.as_secs_f64() / whole.as_secs_f64()) as f32).clamp(0.0, 1.0)
}

/// Drives result presentation cycles.
#[derive(Debug)]
pub struct FeedbackController {
    timing: FeedbackTiming,
    current: Option<PresentationCycle>,
    next_id: u64,
}

impl Default for FeedbackController {
    fn default() -> Self {
        Self::new(FeedbackTiming::default())
    }
}

impl FeedbackController {
    #[must_use]
    pub fn new(timing: FeedbackTiming) -> Self {
        Self {
            timing,
            current: None,
            next_id: 1,
        }
    }

    /// Present a new result, cancelling any cycle in progress first.
    ///
    /// Returns `[Cancelled, Started]` when a cycle was replaced, otherwise
    /// just `[Started]`.
    pub fn on_gesture_complete(&mut self, matched: bool) -> Vec<FeedbackSignal> {
        let mut out = Vec::with_capacity(2);
        if let Some(signal) = self.cancel() {
            out.push(signal);
        }

        let cycle_id = self.next_id;
        self.next_id += 1;
        self.current = Some(PresentationCycle {
            matched,
            elapsed: Duration::ZERO,
            source: CancellationSource::new(cycle_id),
        });
        tracing::debug!(
            target: "patlock.feedback",
            cycle_id,
            matched,
            "feedback cycle started"
        );
        out.push(FeedbackSignal::Started { cycle_id, matched });
        out
    }

    /// Cancel the running cycle, if any.
    pub fn cancel(&mut self) -> Option<FeedbackSignal> {
        let cycle = self.current.take()?;
        cycle.source.cancel();
        tracing::debug!(
            target: "patlock.feedback",
            cycle_id = cycle.id(),
            elapsed_ms = cycle.elapsed.as_millis() as u64,
            "feedback cycle cancelled"
        );
        Some(FeedbackSignal::Cancelled {
            cycle_id: cycle.id(),
        })
    }

    /// Advance the running cycle by `dt`. Returns `Finished` when the cycle
    /// completes during this tick.
    pub fn tick(&mut self, dt: Duration) -> Option<FeedbackSignal> {
        let total = self.timing.total();
        let cycle = self.current.as_mut()?;
        cycle.elapsed = cycle.elapsed.saturating_add(dt);
        if cycle.elapsed < total {
            return None;
        }
        let cycle_id = cycle.id();
        self.current = None;
        tracing::debug!(target: "patlock.feedback", cycle_id, "feedback cycle finished");
        Some(FeedbackSignal::Finished { cycle_id })
    }

    #[must_use]
    pub fn state(&self) -> FeedbackState {
        match &self.current {
            None => FeedbackState::Quiescent,
            Some(cycle) => FeedbackState::Presenting {
                cycle_id: cycle.id(),
                matched: cycle.matched,
            },
        }
    }

    #[must_use]
    pub fn is_presenting(&self) -> bool {
        self.current.is_some()
    }

    /// Frame for the running cycle; `None` while quiescent.
    #[must_use]
    pub fn frame(&self) -> Option<FeedbackFrame> {
        self.current.as_ref().map(|c| c.frame(&self.timing))
    }

    /// Token for the running cycle, for host-side timers.
    #[must_use]
    pub fn token(&self) -> Option<CancellationToken> {
        self.current.as_ref().map(|c| c.source.token())
    }

    #[must_use]
    pub fn timing(&self) -> FeedbackTiming {
        self.timing
    }
}
