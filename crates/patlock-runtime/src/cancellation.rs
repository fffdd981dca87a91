//! Cancellation handles for presentation cycles and background evaluations.
//!
//! A [`CancellationSource`] is owned by whoever started a piece of deferred
//! work (a feedback cycle, a rule evaluation). Every [`CancellationToken`]
//! derived from it observes cancellation immediately and synchronously:
//! once `cancel()` returns, every token reports `is_cancelled() == true`.
//!
//! Hosts that drive feedback animations with their own timers hold a token
//! and stop applying visual state as soon as it reports cancellation, so a
//! replaced cycle never leaves partial state behind.
//!
//! # Example
//!
//! ```
//! use patlock_runtime::cancellation::CancellationSource;
//!
//! let source = CancellationSource::new(7);
//! let token = source.token();
//! assert_eq!(token.id(), 7);
//!
//! source.cancel();
//! assert!(token.is_cancelled());
//! ```

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Observes cancellation of one piece of deferred work.
///
/// Cheap to clone and `Send + Sync`, so it can accompany work onto a
/// worker thread or into a host timer callback.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationInner>,
}

/// Control handle that triggers cancellation.
///
/// Dropping the source does **not** cancel its tokens; call
/// [`cancel`](Self::cancel) explicitly.
pub struct CancellationSource {
    inner: Arc<CancellationInner>,
}

struct CancellationInner {
    id: u64,
    cancelled: AtomicBool,
}

impl CancellationSource {
    /// Create an uncancelled source for the work identified by `id`.
    pub fn new(id: u64) -> Self {
        Self {
            inner: Arc::new(CancellationInner {
                id,
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    /// Obtain a token observing this source.
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Signal cancellation. Returns `true` if this call performed it, `false`
    /// if the source was already cancelled.
    pub fn cancel(&self) -> bool {
        !self.inner.cancelled.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Identifier of the guarded work.
    pub fn id(&self) -> u64 {
        self.inner.id
    }
}

impl std::fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationSource")
            .field("id", &self.id())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancellationToken {
    /// Returns `true` once the owning source has been cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Identifier of the guarded work.
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("id", &self.id())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn token_starts_uncancelled() {
        let source = CancellationSource::new(1);
        let token = source.token();
        assert!(!token.is_cancelled());
        assert!(!source.is_cancelled());
    }

    #[test]
    fn cancel_propagates_to_all_tokens() {
        let source = CancellationSource::new(1);
        let t1 = source.token();
        let t2 = t1.clone();
        assert!(source.cancel());
        assert!(t1.is_cancelled());
        assert!(t2.is_cancelled());
    }

    #[test]
    fn second_cancel_reports_false() {
        let source = CancellationSource::new(1);
        assert!(source.cancel());
        assert!(!source.cancel());
        assert!(source.is_cancelled());
    }

    #[test]
    fn drop_source_does_not_cancel() {
        let source = CancellationSource::new(1);
        let token = source.token();
        drop(source);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn ids_are_carried() {
        let source = CancellationSource::new(42);
        assert_eq!(source.id(), 42);
        assert_eq!(source.token().id(), 42);
    }

    #[test]
    fn cancel_visible_across_threads() {
        let source = CancellationSource::new(3);
        let token = source.token();
        source.cancel();
        let seen = thread::spawn(move || token.is_cancelled())
            .join()
            .expect("thread panicked");
        assert!(seen);
    }
}
