//! Tracking Context - Dependency capture for computations.
//!
//! A computation pushes a fresh collector frame, runs its body, and pops the
//! frame to learn which signals were read. Signal reads consult only the top
//! frame. `untracked` pushes a paused frame so reads inside it are invisible.

use std::cell::RefCell;
use std::rc::Rc;

use super::signal::{subscribe_to, Callback, SharedSubscribers, SignalId, Subscription};

// =============================================================================
// Source
// =============================================================================

/// A signal read during a tracked run, type-erased down to its subscriber list.
pub(crate) struct Source {
    id: SignalId,
    subscribers: SharedSubscribers,
}

impl Source {
    pub(crate) fn id(&self) -> SignalId {
        self.id
    }

    pub(crate) fn subscribe(&self, callback: Callback) -> Subscription {
        subscribe_to(&self.subscribers, callback)
    }
}

// =============================================================================
// Frame Stack
// =============================================================================

thread_local! {
    /// `Some(frame)` collects reads, `None` is an untracked region.
    static FRAMES: RefCell<Vec<Option<Vec<Source>>>> = const { RefCell::new(Vec::new()) };
}

/// Record a read of the signal `id` in the innermost frame, once per frame.
pub(crate) fn track(id: SignalId, subscribers: &SharedSubscribers) {
    FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        if let Some(Some(frame)) = frames.last_mut() {
            if !frame.iter().any(|source| source.id == id) {
                frame.push(Source {
                    id,
                    subscribers: Rc::clone(subscribers),
                });
            }
        }
    });
}

/// Whether a signal read right now would be recorded.
pub fn is_tracking() -> bool {
    FRAMES.with(|frames| matches!(frames.borrow().last(), Some(Some(_))))
}

/// Pops its frame on drop so a panicking body leaves the stack balanced.
struct FrameGuard {
    armed: bool,
}

impl FrameGuard {
    fn push(frame: Option<Vec<Source>>) -> Self {
        FRAMES.with(|frames| frames.borrow_mut().push(frame));
        Self { armed: true }
    }

    fn finish(mut self) -> Vec<Source> {
        self.armed = false;
        FRAMES
            .with(|frames| frames.borrow_mut().pop())
            .flatten()
            .unwrap_or_default()
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if self.armed {
            FRAMES.with(|frames| {
                frames.borrow_mut().pop();
            });
        }
    }
}

/// Run `f` inside a fresh collector frame, returning its result and every
/// distinct signal it read, in first-read order.
pub(crate) fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Source>) {
    let guard = FrameGuard::push(Some(Vec::new()));
    let result = f();
    let sources = guard.finish();
    (result, sources)
}

/// Run `f` without recording any signal reads.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let guard = FrameGuard::push(None);
    let result = f();
    drop(guard);
    result
}

/// Current frame depth (for tests).
#[cfg(test)]
pub(crate) fn depth() -> usize {
    FRAMES.with(|frames| frames.borrow().len())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::signal;

    #[test]
    fn test_read_outside_frame_is_untracked() {
        let s = signal(1);
        assert!(!is_tracking());
        let _ = s.get();
        assert_eq!(depth(), 0);
    }

    #[test]
    fn test_capture_dedupes_reads() {
        let a = signal(1);
        let b = signal(2);

        let (sum, sources) = capture(|| a.get() + b.get() + a.get());

        assert_eq!(sum, 4);
        let ids: Vec<SignalId> = sources.iter().map(Source::id).collect();
        assert_eq!(ids, vec![a.id(), b.id()]);
    }

    #[test]
    fn test_nested_frames_are_independent() {
        let outer = signal(1);
        let inner = signal(2);

        let ((_, inner_sources), outer_sources) = {
            let (value, sources) = capture(|| {
                let _ = outer.get();
                capture(|| inner.get())
            });
            (value, sources)
        };

        assert_eq!(inner_sources.len(), 1);
        assert_eq!(inner_sources[0].id(), inner.id());
        assert_eq!(outer_sources.len(), 1);
        assert_eq!(outer_sources[0].id(), outer.id());
    }

    #[test]
    fn test_untracked_hides_reads() {
        let a = signal(1);
        let b = signal(2);

        let (_, sources) = capture(|| {
            let _ = a.get();
            untracked(|| {
                assert!(!is_tracking());
                b.get()
            })
        });

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id(), a.id());
    }

    #[test]
    fn test_panicking_body_restores_stack() {
        let result = std::panic::catch_unwind(|| {
            capture(|| -> i32 { panic!("boom") });
        });
        assert!(result.is_err());
        assert_eq!(depth(), 0);
    }
}
