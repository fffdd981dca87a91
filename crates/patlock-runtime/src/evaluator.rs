#![forbid(unsafe_code)]

//! Off-thread rule evaluation with stale-result discard.
//!
//! Some rule backends are slow (an interpreter, an external call). The
//! [`BackgroundEvaluator`] runs each evaluation on a worker thread and hands
//! the outcome back through a channel that the dispatch thread drains with
//! [`poll`](BackgroundEvaluator::poll). Widget state is only ever mutated on
//! the dispatch thread.
//!
//! # Invariants
//!
//! 1. Only the outcome for the most recently begun gesture is delivered.
//!    Once [`begin_gesture`](BackgroundEvaluator::begin_gesture) is called
//!    for a newer gesture, older outcomes are discarded.
//! 2. A worker whose evaluation was superseded does not send at all.
//! 3. Rule errors and rule panics are delivered as a failed match.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use patlock_core::Sequence;
use patlock_core::validate::{SequenceRule, evaluate_rule};
use web_time::Instant;

use crate::cancellation::{CancellationSource, CancellationToken};

/// Why an evaluation produced no rule outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The worker thread could not be spawned.
    SpawnFailed(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpawnFailed(reason) => write!(f, "failed to spawn evaluation worker: {reason}"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Outcome of one background evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalOutcome {
    pub gesture_id: u64,
    pub result: Result<bool, EvalError>,
}

impl EvalOutcome {
    /// The match decision; errors count as a mismatch.
    #[must_use]
    pub fn matched(&self) -> bool {
        matches!(self.result, Ok(true))
    }
}

/// Runs a [`SequenceRule`] on worker threads.
pub struct BackgroundEvaluator {
    rule: Arc<dyn SequenceRule>,
    tx: Sender<EvalOutcome>,
    rx: Receiver<EvalOutcome>,
    latest_gesture: u64,
    pending: Option<CancellationSource>,
}

impl fmt::Debug for BackgroundEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundEvaluator")
            .field("rule", &self.rule.name())
            .field("latest_gesture", &self.latest_gesture)
            .field("pending", &self.pending.as_ref().map(CancellationSource::id))
            .finish()
    }
}

impl BackgroundEvaluator {
    pub fn new(rule: Arc<dyn SequenceRule>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            rule,
            tx,
            rx,
            latest_gesture: 0,
            pending: None,
        }
    }

    /// Mark `gesture_id` as the newest gesture, superseding any pending
    /// evaluation.
    pub fn begin_gesture(&mut self, gesture_id: u64) {
        self.latest_gesture = self.latest_gesture.max(gesture_id);
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.id() < self.latest_gesture)
            && let Some(pending) = self.pending.take()
        {
            pending.cancel();
            tracing::debug!(
                target: "patlock.eval",
                gesture_id = pending.id(),
                superseded_by = self.latest_gesture,
                "pending evaluation superseded"
            );
        }
    }

    /// Start evaluating `candidate` against `reference` for `gesture_id`.
    ///
    /// If the worker cannot be spawned, a failed outcome is queued so the
    /// gesture still gets a result.
    pub fn submit(&mut self, gesture_id: u64, candidate: Sequence, reference: Sequence) {
        self.begin_gesture(gesture_id);
        let source = CancellationSource::new(gesture_id);
        let token = source.token();
        self.pending = Some(source);

        let rule = Arc::clone(&self.rule);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("patlock-eval-{gesture_id}"))
            .spawn(move || run_worker(rule.as_ref(), &candidate, &reference, &token, &tx));

        if let Err(err) = spawned {
            tracing::warn!(
                target: "patlock.eval",
                gesture_id,
                error = %err,
                "could not spawn evaluation worker"
            );
            // Receiver is owned by self, so this send cannot fail.
            let _ = self.tx.send(EvalOutcome {
                gesture_id,
                result: Err(EvalError::SpawnFailed(err.to_string())),
            });
        }
    }

    /// Drain delivered outcomes, returning the freshest outcome for the
    /// latest gesture and discarding stale ones.
    pub fn poll(&mut self) -> Option<EvalOutcome> {
        let mut fresh = None;
        loop {
            match self.rx.try_recv() {
                Ok(outcome) if outcome.gesture_id == self.latest_gesture => {
                    if self.pending.as_ref().map(CancellationSource::id) == Some(outcome.gesture_id)
                    {
                        self.pending = None;
                    }
                    fresh = Some(outcome);
                }
                Ok(outcome) => {
                    tracing::warn!(
                        target: "patlock.eval",
                        gesture_id = outcome.gesture_id,
                        latest = self.latest_gesture,
                        "discarding stale evaluation result"
                    );
                }
                // Sender half lives in self, so Disconnected never happens.
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        fresh
    }

    /// Whether an evaluation for the latest gesture is still outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn latest_gesture(&self) -> u64 {
        self.latest_gesture
    }
}

fn run_worker(
    rule: &dyn SequenceRule,
    candidate: &Sequence,
    reference: &Sequence,
    token: &CancellationToken,
    tx: &Sender<EvalOutcome>,
) {
    let started = Instant::now();
    let matched = evaluate_rule(rule, candidate, reference);

    if token.is_cancelled() {
        tracing::debug!(
            target: "patlock.eval",
            gesture_id = token.id(),
            "evaluation finished after cancellation; not delivering"
        );
        return;
    }
    tracing::debug!(
        target: "patlock.eval",
        gesture_id = token.id(),
        matched,
        duration_us = started.elapsed().as_micros() as u64,
        "evaluation delivered"
    );
    // The evaluator may have been dropped; nothing left to deliver to.
    let _ = tx.send(EvalOutcome {
        gesture_id: token.id(),
        result: Ok(matched),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use patlock_core::validate::{ExactMatch, FnRule};
    use patlock_core::{NodeIndex, RuleError};
    use std::sync::Mutex;
    use std::time::Duration;

    fn seq(v: &[usize]) -> Sequence {
        Sequence::from(v)
    }

    /// Poll until an outcome arrives or the deadline passes.
    fn wait_for(ev: &mut BackgroundEvaluator) -> Option<EvalOutcome> {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while std::time::Instant::now() < deadline {
            if let Some(outcome) = ev.poll() {
                return Some(outcome);
            }
            thread::sleep(Duration::from_millis(2));
        }
        None
    }

    #[test]
    fn delivers_match() {
        let mut ev = BackgroundEvaluator::new(Arc::new(ExactMatch));
        ev.submit(1, seq(&[0, 1, 2]), seq(&[0, 1, 2]));
        let outcome = wait_for(&mut ev).expect("outcome delivered");
        assert_eq!(outcome.gesture_id, 1);
        assert!(outcome.matched());
        assert!(!ev.is_pending());
    }

    #[test]
    fn delivers_mismatch() {
        let mut ev = BackgroundEvaluator::new(Arc::new(ExactMatch));
        ev.submit(1, seq(&[0, 2]), seq(&[0, 1, 2]));
        let outcome = wait_for(&mut ev).expect("outcome delivered");
        assert_eq!(outcome.result, Ok(false));
    }

    #[test]
    fn rule_error_is_a_mismatch() {
        let rule = FnRule::new("broken", |_: &[NodeIndex], _: &[NodeIndex]| {
            Err(RuleError::Evaluation {
                reason: "backend offline".into(),
            })
        });
        let mut ev = BackgroundEvaluator::new(Arc::new(rule));
        ev.submit(1, seq(&[0]), seq(&[0]));
        let outcome = wait_for(&mut ev).expect("outcome delivered");
        assert!(!outcome.matched());
        assert_eq!(outcome.result, Ok(false));
    }

    #[test]
    fn panicking_rule_is_a_mismatch() {
        let rule = FnRule::new("panics", |_: &[NodeIndex], _: &[NodeIndex]| -> Result<bool, RuleError> {
            panic!("interpreter blew up")
        });
        let mut ev = BackgroundEvaluator::new(Arc::new(rule));
        ev.submit(1, seq(&[0]), seq(&[0]));
        let outcome = wait_for(&mut ev).expect("outcome delivered");
        assert_eq!(outcome.result, Ok(false));
    }

    #[test]
    fn stale_outcome_is_discarded() {
        // The rule blocks until released, so gesture 2 begins while
        // gesture 1's evaluation is still running.
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let rule = FnRule::new("gated", move |c: &[NodeIndex], r: &[NodeIndex]| {
            let rx = release_rx.lock().map_err(|_| RuleError::Evaluation {
                reason: "gate poisoned".into(),
            })?;
            // Proceed on release or after a generous timeout.
            let _ = rx.recv_timeout(Duration::from_secs(5));
            Ok(c == r)
        });
        let mut ev = BackgroundEvaluator::new(Arc::new(rule));
        ev.submit(1, seq(&[0, 1, 2]), seq(&[0, 1, 2]));
        ev.begin_gesture(2);
        release_tx.send(()).unwrap();

        thread::sleep(Duration::from_millis(50));
        assert!(ev.poll().is_none());

        ev.submit(2, seq(&[5]), seq(&[0, 1, 2]));
        release_tx.send(()).unwrap();
        let outcome = wait_for(&mut ev).expect("outcome delivered");
        assert_eq!(outcome.gesture_id, 2);
        assert!(!outcome.matched());
    }

    #[test]
    fn begin_gesture_never_moves_backwards() {
        let mut ev = BackgroundEvaluator::new(Arc::new(ExactMatch));
        ev.begin_gesture(5);
        ev.begin_gesture(3);
        assert_eq!(ev.latest_gesture(), 5);
    }
}
