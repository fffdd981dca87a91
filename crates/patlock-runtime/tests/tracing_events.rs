#![forbid(unsafe_code)]

//! Structured logging contract for the pattern lock.
//!
//! Captures spans and events with a registry layer and checks the targets,
//! span nesting, and fields that hosts filter on.
//!
//! Run:
//!   cargo test -p patlock-runtime --test tracing_events

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use patlock_core::validate::FnRule;
use patlock_core::{LockConfig, NodeIndex, Point, RuleError, SequenceValidator};
use patlock_runtime::PatternLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Capture infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    parent_name: Option<String>,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    message: String,
    fields: HashMap<String, String>,
    span_stack: Vec<String>,
}

#[derive(Clone, Default)]
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl Capture {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn event(&self, message: &str) -> CapturedEvent {
        self.events()
            .into_iter()
            .find(|e| e.message == message)
            .unwrap_or_else(|| panic!("no event {message:?} captured"))
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|pid| ctx.span(pid))
            .map(|span| span.name().to_string());
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            parent_name,
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.get("message").cloned().unwrap_or_default();
        let span_stack = ctx
            .event_scope(event)
            .map(|scope| scope.from_root().map(|s| s.name().to_string()).collect())
            .unwrap_or_default();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message,
            fields,
            span_stack,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Capture {
    let layer = Capture::default();
    let handle = layer.clone();
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, f);
    handle
}

fn lock() -> PatternLock {
    PatternLock::from_config(&LockConfig::grid(3, 3, 100.0, 30.0, vec![0usize, 1, 2]))
        .expect("valid config")
}

fn center(i: usize) -> Point {
    Point::new((i % 3) as f32 * 100.0, (i / 3) as f32 * 100.0)
}

fn top_row(l: &mut PatternLock) {
    l.pointer_down(center(0));
    for i in [0, 1, 2] {
        l.pointer_move(center(i));
    }
    l.pointer_up(center(2));
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn node_appends_are_logged_with_index() {
    let cap = capture(|| {
        let mut l = lock();
        top_row(&mut l);
    });
    let appends: Vec<_> = cap
        .events()
        .into_iter()
        .filter(|e| e.message == "node appended")
        .collect();
    assert_eq!(appends.len(), 3);
    assert!(appends.iter().all(|e| e.target == "patlock.gesture"));
    let nodes: Vec<_> = appends.iter().map(|e| e.fields["node"].clone()).collect();
    assert_eq!(nodes, vec!["0", "1", "2"]);
}

#[test]
fn validation_nests_inside_gesture_span() {
    let cap = capture(|| {
        let mut l = lock();
        top_row(&mut l);
    });

    let validate = cap
        .spans()
        .into_iter()
        .find(|s| s.name == "patlock.validate")
        .expect("validate span");
    assert_eq!(validate.parent_name.as_deref(), Some("patlock.gesture"));
    assert_eq!(validate.fields["rule"], "exact");
    assert_eq!(validate.fields["candidate_len"], "3");

    let gesture = cap
        .spans()
        .into_iter()
        .find(|s| s.name == "patlock.gesture")
        .expect("gesture span");
    assert_eq!(gesture.fields["gesture_id"], "1");

    let result = cap.event("gesture result");
    assert_eq!(result.target, "patlock.lock");
    assert_eq!(result.fields["matched"], "true");
    assert_eq!(result.span_stack, vec!["patlock.gesture".to_string()]);
}

#[test]
fn feedback_lifecycle_is_logged() {
    let cap = capture(|| {
        let mut l = lock();
        top_row(&mut l);
        top_row(&mut l);
        l.tick(Duration::from_secs(3));
    });
    let started = cap.event("feedback cycle started");
    assert_eq!(started.target, "patlock.feedback");
    assert_eq!(started.fields["cycle_id"], "1");

    let cancelled = cap.event("feedback cycle cancelled");
    assert_eq!(cancelled.fields["cycle_id"], "1");

    let finished = cap.event("feedback cycle finished");
    assert_eq!(finished.fields["cycle_id"], "2");
}

#[test]
fn rule_failure_is_a_warning() {
    let cap = capture(|| {
        let rule = FnRule::new("offline", |_: &[NodeIndex], _: &[NodeIndex]| {
            Err(RuleError::Evaluation {
                reason: "backend unavailable".into(),
            })
        });
        let cfg = LockConfig::grid(3, 3, 100.0, 30.0, vec![0usize, 1, 2]);
        let mut l = PatternLock::with_validator(&cfg, SequenceValidator::new(rule))
            .expect("valid config");
        top_row(&mut l);
    });
    let warning = cap
        .events()
        .into_iter()
        .find(|e| e.level == tracing::Level::WARN)
        .expect("warning emitted");
    assert_eq!(warning.target, "patlock.validate");
    assert_eq!(warning.fields["rule"], "offline");
    assert!(warning.fields["error"].contains("backend unavailable"));
}

#[test]
fn stray_events_log_at_trace_only() {
    let cap = capture(|| {
        let mut l = lock();
        l.pointer_move(center(0));
        l.pointer_up(center(0));
    });
    let events: Vec<_> = cap
        .events()
        .into_iter()
        .filter(|e| e.target == "patlock.gesture")
        .collect();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.level == tracing::Level::TRACE));
}

#[test]
fn panicking_inline_rule_is_a_warning() {
    let cap = capture(|| {
        let rule = FnRule::new(
            "panics",
            |_: &[NodeIndex], _: &[NodeIndex]| -> Result<bool, RuleError> {
                panic!("interpreter blew up")
            },
        );
        let cfg = LockConfig::grid(3, 3, 100.0, 30.0, vec![0usize, 1, 2]);
        let mut l = PatternLock::with_validator(&cfg, SequenceValidator::new(rule))
            .expect("valid config");
        top_row(&mut l);
    });
    let warning = cap.event("rule panicked; treating as mismatch");
    assert_eq!(warning.level, tracing::Level::WARN);
    assert_eq!(warning.target, "patlock.validate");
    assert_eq!(cap.event("gesture result").fields["matched"], "false");
}

#[test]
fn superseded_background_result_is_logged_and_discarded() {
    let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
    let done_tx = Mutex::new(done_tx);
    let cap = capture(move || {
        let rule = FnRule::new("signals", move |c: &[NodeIndex], r: &[NodeIndex]| {
            if let Ok(tx) = done_tx.lock() {
                let _ = tx.send(());
            }
            Ok(c == r)
        });
        let cfg = LockConfig::grid(3, 3, 100.0, 30.0, vec![0usize, 1, 2]);
        let mut l =
            PatternLock::with_background_rule(&cfg, Arc::new(rule)).expect("valid config");

        top_row(&mut l);
        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker evaluated");
        // Let the worker deliver before the next gesture begins.
        std::thread::sleep(Duration::from_millis(100));

        l.pointer_down(center(4));
        assert!(l.tick(Duration::ZERO).is_empty());
        assert!(!l.feedback().is_presenting());
    });

    let superseded = cap.event("pending evaluation superseded");
    assert_eq!(superseded.level, tracing::Level::DEBUG);
    assert_eq!(superseded.target, "patlock.eval");
    assert_eq!(superseded.fields["gesture_id"], "1");
    assert_eq!(superseded.fields["superseded_by"], "2");

    let stale = cap.event("discarding stale evaluation result");
    assert_eq!(stale.level, tracing::Level::WARN);
    assert_eq!(stale.target, "patlock.eval");
    assert_eq!(stale.fields["gesture_id"], "1");
    assert_eq!(stale.fields["latest"], "2");
}
