//! Signal - A mutable reactive cell.
//!
//! Reads inside a tracking frame register the signal as a dependency of the
//! running computation. Writes replace the value and synchronously call every
//! current subscriber. There is no equality guard: every `set` notifies.
//!
//! # Example
//!
//! ```
//! use spark_css_interop::signals::signal;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let hovered = signal(false);
//! let calls = Rc::new(Cell::new(0));
//!
//! let calls_clone = calls.clone();
//! let sub = hovered.subscribe(move || calls_clone.set(calls_clone.get() + 1));
//!
//! hovered.set(true);
//! hovered.set(true);
//! assert_eq!(calls.get(), 2);
//!
//! drop(sub);
//! hovered.set(false);
//! assert_eq!(calls.get(), 2);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::tracking;

// =============================================================================
// Identity
// =============================================================================

/// Unique identity of a signal within the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u64);

thread_local! {
    static NEXT_SIGNAL_ID: Cell<u64> = const { Cell::new(0) };
}

fn next_signal_id() -> SignalId {
    NEXT_SIGNAL_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        SignalId(id)
    })
}

// =============================================================================
// Subscriber List
// =============================================================================

pub(crate) type Callback = Rc<dyn Fn()>;

/// Subscribers of one signal, in registration order.
#[derive(Default)]
pub(crate) struct SubscriberList {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

impl SubscriberList {
    fn insert(&mut self, callback: Callback) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    fn remove(&mut self, id: u64) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }
}

pub(crate) type SharedSubscribers = Rc<RefCell<SubscriberList>>;

/// Add a callback to a subscriber list, returning its RAII guard.
pub(crate) fn subscribe_to(list: &SharedSubscribers, callback: Callback) -> Subscription {
    let id = list.borrow_mut().insert(callback);
    Subscription {
        list: Rc::downgrade(list),
        id,
    }
}

/// Call every subscriber present when notification starts.
///
/// The list is snapshotted so callbacks may subscribe or unsubscribe freely;
/// a callback removed mid-pass is skipped.
fn notify(list: &SharedSubscribers) {
    let snapshot: Vec<(u64, Callback)> = list
        .borrow()
        .entries
        .iter()
        .map(|(id, callback)| (*id, Rc::clone(callback)))
        .collect();

    for (id, callback) in snapshot {
        let still_subscribed = list.borrow().contains(id);
        if still_subscribed {
            callback();
        }
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// RAII guard for a signal subscription. Dropping it unsubscribes.
pub struct Subscription {
    list: Weak<RefCell<SubscriberList>>,
    id: u64,
}

impl Subscription {
    /// Whether the signal this subscription points at is still alive.
    pub fn is_active(&self) -> bool {
        self.list
            .upgrade()
            .is_some_and(|list| list.borrow().contains(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(list) = self.list.upgrade() {
            list.borrow_mut().remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// Signal
// =============================================================================

struct SignalInner<T> {
    id: SignalId,
    value: RefCell<T>,
    subscribers: SharedSubscribers,
}

/// A mutable reactive cell.
///
/// Cloning a `Signal` creates another handle to the **same** cell.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

/// Create a new signal holding `value`.
pub fn signal<T: 'static>(value: T) -> Signal<T> {
    Signal::new(value)
}

impl<T: 'static> Signal<T> {
    /// Create a new signal holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: next_signal_id(),
                value: RefCell::new(value),
                subscribers: Rc::new(RefCell::new(SubscriberList::default())),
            }),
        }
    }

    /// Identity of this signal.
    pub fn id(&self) -> SignalId {
        self.inner.id
    }

    /// Borrow the value (tracked).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.borrow())
    }

    /// Replace the value and notify every subscriber before returning.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        notify(&self.inner.subscribers);
    }

    /// Mutate the value in place, then notify.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        notify(&self.inner.subscribers);
    }

    /// Subscribe to changes. The callback runs after every `set`.
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        subscribe_to(&self.inner.subscribers, Rc::new(callback))
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().entries.len()
    }

    /// Whether two handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn track(&self) {
        tracking::track(self.inner.id, &self.inner.subscribers);
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Read the value. Registers a dependency when called inside a computation.
    pub fn get(&self) -> T {
        self.track();
        self.inner.value.borrow().clone()
    }

    /// Read the value without tracking.
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().entries.len())
            .finish()
    }
}

impl<T: Default + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
