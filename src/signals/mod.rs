//! Reactive primitives - Signal, tracking context, memoized computation.
//!
//! This is the small reactive runtime the style engine runs on:
//! - `Signal<T>`: mutable cell with synchronous subscriber notification
//! - `tracking`: a stack of dependency collectors ("which signals did this read?")
//! - `Computation<T, D>`: memoized recompute keyed on explicit deps plus tracked reads
//!
//! # Architecture
//!
//! ```text
//! Computation::run ─push frame─► thunk ─Signal::get()─► frame records signal
//!        │                                                      │
//!        └─────pop frame, install one Subscription per signal◄──┘
//! ```
//!
//! Everything is single-threaded (`Rc`/`RefCell`). A `set` fully drains its
//! subscriber chain before returning, so nested sets resolve depth-first.

pub mod computation;
pub mod signal;
pub mod tracking;

pub use computation::{Computation, Rerun};
pub use signal::{signal, Signal, SignalId, Subscription};
pub use tracking::{is_tracking, untracked};
