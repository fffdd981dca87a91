#![forbid(unsafe_code)]

//! Runtime: feedback lifecycle, background evaluation, and the widget core.
//!
//! # Role in patlock
//! `patlock-runtime` sits on top of `patlock-core`. It owns everything that
//! outlives a single pointer event: the timed Correct/Error presentation
//! cycle, cancellation of superseded work, and optional off-thread rule
//! evaluation.
//!
//! # Primary responsibilities
//! - **PatternLock**: single entry point for pointer events and clock ticks;
//!   returns [`LockSignal`]s for the host's renderer.
//! - **FeedbackController**: fade-in, hold, and fade-out of the result
//!   banner, cancel-and-replace on a new result.
//! - **BackgroundEvaluator**: worker-thread rule evaluation with stale
//!   result discard.
//! - **CancellationSource/Token**: synchronous cancellation handles.
//!
//! # Threading
//! All widget state is mutated on the caller's thread. Only rule evaluation
//! may run elsewhere, and its results are applied during
//! [`PatternLock::tick`].

pub mod cancellation;
pub mod evaluator;
pub mod feedback;
pub mod lock;

pub use cancellation::{CancellationSource, CancellationToken};
pub use evaluator::{BackgroundEvaluator, EvalError, EvalOutcome};
pub use feedback::{
    FeedbackController, FeedbackFrame, FeedbackPhase, FeedbackSignal, FeedbackState,
    FeedbackTiming, Rgba,
};
pub use lock::{LockSignal, PatternLock};
