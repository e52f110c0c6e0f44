//! Computation - Reactive memoization.
//!
//! A `Computation<T, D>` caches the result of a thunk. It re-executes when:
//! - it has never run,
//! - the explicit dependency value `D` differs from the previous run's, or
//! - a signal read during the previous run has been set since.
//!
//! The explicit deps capture intentional inputs (props, inherited scopes);
//! the tracking frame captures implicit ones (stylesheet version, interaction
//! state, color scheme) without the caller enumerating them.
//!
//! # Invariants
//!
//! 1. Subscriptions from the previous run are dropped before the thunk runs again.
//! 2. Each signal read during a run gets exactly one subscription.
//! 3. `rerun` is called once per invalidation, however many signals fire.
//!
//! # Example
//!
//! ```
//! use spark_css_interop::signals::{signal, Computation, Rerun};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let scheme = signal("light");
//! let renders = Rc::new(Cell::new(0));
//! let renders_clone = renders.clone();
//! let rerun: Rerun = Rc::new(move || renders_clone.set(renders_clone.get() + 1));
//!
//! let computation: Computation<String, &str> = Computation::new();
//! let value = computation.run("text-primary", || format!("{}-color", scheme.get()), &rerun);
//! assert_eq!(value, "light-color");
//!
//! scheme.set("dark");
//! assert_eq!(renders.get(), 1);
//! let value = computation.run("text-primary", || format!("{}-color", scheme.get()), &rerun);
//! assert_eq!(value, "dark-color");
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::signal::{SignalId, Subscription};
use super::tracking;

/// Callback that asks the host to schedule a new render pass.
pub type Rerun = Rc<dyn Fn()>;

struct LastRun<T, D> {
    deps: D,
    value: T,
}

/// Memoized, dependency-tracked computation.
pub struct Computation<T, D> {
    last: RefCell<Option<LastRun<T, D>>>,
    subscriptions: RefCell<Vec<Subscription>>,
    dependencies: RefCell<Vec<SignalId>>,
    dirty: Rc<Cell<bool>>,
    runs: Cell<u64>,
}

impl<T: Clone, D: PartialEq> Computation<T, D> {
    /// Create a computation that has never run.
    pub fn new() -> Self {
        Self {
            last: RefCell::new(None),
            subscriptions: RefCell::new(Vec::new()),
            dependencies: RefCell::new(Vec::new()),
            dirty: Rc::new(Cell::new(false)),
            runs: Cell::new(0),
        }
    }

    /// Return the memoized value, re-executing `thunk` if it is stale.
    ///
    /// A panic inside `thunk` propagates; the computation stays stale and the
    /// next call retries.
    pub fn run(&self, deps: D, thunk: impl FnOnce() -> T, rerun: &Rerun) -> T {
        if !self.is_stale(&deps) {
            if let Some(last) = self.last.borrow().as_ref() {
                return last.value.clone();
            }
        }

        // Teardown before setup.
        self.subscriptions.borrow_mut().clear();
        self.dependencies.borrow_mut().clear();
        self.last.borrow_mut().take();
        self.dirty.set(false);

        let (value, sources) = tracking::capture(thunk);

        let mut subscriptions = Vec::with_capacity(sources.len());
        let mut dependencies = Vec::with_capacity(sources.len());
        for source in sources {
            dependencies.push(source.id());
            subscriptions.push(source.subscribe(self.invalidator(rerun)));
        }

        let run = self.runs.get() + 1;
        self.runs.set(run);
        tracing::trace!(run, tracked = dependencies.len(), "computation executed");

        *self.subscriptions.borrow_mut() = subscriptions;
        *self.dependencies.borrow_mut() = dependencies;
        *self.last.borrow_mut() = Some(LastRun {
            deps,
            value: value.clone(),
        });

        value
    }

    /// Whether the next `run` with `deps` would re-execute.
    pub fn is_stale(&self, deps: &D) -> bool {
        if self.dirty.get() {
            return true;
        }
        match self.last.borrow().as_ref() {
            Some(last) => last.deps != *deps,
            None => true,
        }
    }
}

impl<T, D> Computation<T, D> {
    /// Mark the computation stale and call `rerun`, unless an invalidation is
    /// already pending. Lets an outside source share the single-rerun guard.
    pub fn invalidator(&self, rerun: &Rerun) -> Rerun {
        let dirty = Rc::clone(&self.dirty);
        let rerun = Rc::clone(rerun);
        Rc::new(move || {
            if !dirty.replace(true) {
                rerun();
            }
        })
    }

    /// Whether a tracked signal changed since the last run.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// How many times the thunk has executed.
    pub fn run_count(&self) -> u64 {
        self.runs.get()
    }

    /// Signals read during the last run.
    pub fn tracked_signals(&self) -> Vec<SignalId> {
        self.dependencies.borrow().clone()
    }

    /// Drop all subscriptions and the cached value.
    pub fn dispose(&self) {
        self.subscriptions.borrow_mut().clear();
        self.dependencies.borrow_mut().clear();
        self.last.borrow_mut().take();
        self.dirty.set(false);
    }
}

impl<T: Clone, D: PartialEq> Default for Computation<T, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, D> fmt::Debug for Computation<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("runs", &self.runs.get())
            .field("dirty", &self.dirty.get())
            .field("tracked", &self.dependencies.borrow().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
