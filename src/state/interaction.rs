//! Interaction State - Per-instance hover/active/focus/layout signals.
//!
//! A wrapped component owns one `InteractionSignals`. Host event handlers write
//! to it; style resolution reads only the signals its pseudo-class
//! requirements name, so a component that styles `:hover` does not re-render
//! on focus changes.
//!
//! Handlers are only attached for states the resolved styles actually need,
//! and always call the author's own handler first.

use std::cell::Cell;
use std::rc::Rc;

use crate::primitives::{Handler, HostEvent, PropValue, Props};
use crate::signals::Signal;
use crate::types::{Layout, PseudoClasses};

// =============================================================================
// Allocation Counter
// =============================================================================

thread_local! {
    static ALLOCATIONS: Cell<u64> = const { Cell::new(0) };
}

/// How many `InteractionSignals` have been created on this thread.
pub fn allocation_count() -> u64 {
    ALLOCATIONS.with(Cell::get)
}

/// Reset the allocation counter (for testing).
pub fn reset_interaction_state() {
    ALLOCATIONS.with(|count| count.set(0));
}

// =============================================================================
// InteractionSignals
// =============================================================================

/// Interaction state of one component instance.
///
/// Cloning shares the same signals.
#[derive(Debug, Clone)]
pub struct InteractionSignals {
    pub hover: Signal<bool>,
    pub active: Signal<bool>,
    pub focus: Signal<bool>,
    pub layout: Signal<Option<Layout>>,
}

impl InteractionSignals {
    pub fn new() -> Self {
        ALLOCATIONS.with(|count| count.set(count.get() + 1));
        Self {
            hover: Signal::new(false),
            active: Signal::new(false),
            focus: Signal::new(false),
            layout: Signal::new(None),
        }
    }

    /// Whether every state in `required` is active. Tracks only those signals.
    pub fn matches(&self, required: PseudoClasses) -> bool {
        (!required.contains(PseudoClasses::HOVER) || self.hover.get())
            && (!required.contains(PseudoClasses::ACTIVE) || self.active.get())
            && (!required.contains(PseudoClasses::FOCUS) || self.focus.get())
    }

    /// Last measured layout. Tracked.
    pub fn layout(&self) -> Option<Layout> {
        self.layout.get()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.hover.ptr_eq(&other.hover)
    }

    /// Apply a host event to the matching signal.
    pub fn handle(&self, event: &HostEvent) {
        match *event {
            HostEvent::HoverIn => write(&self.hover, true),
            HostEvent::HoverOut => write(&self.hover, false),
            HostEvent::PressIn => write(&self.active, true),
            HostEvent::PressOut => write(&self.active, false),
            HostEvent::Focus => write(&self.focus, true),
            HostEvent::Blur => write(&self.focus, false),
            HostEvent::Layout(layout) => write(&self.layout, Some(layout)),
        }
    }
}

impl Default for InteractionSignals {
    fn default() -> Self {
        Self::new()
    }
}

fn write<T: Clone + PartialEq + 'static>(signal: &Signal<T>, value: T) {
    if signal.peek() != value {
        signal.set(value);
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Event prop names needed for the required states.
fn handler_props(pseudo: PseudoClasses, requires_layout: bool) -> Vec<&'static str> {
    let mut names = Vec::new();
    if pseudo.contains(PseudoClasses::HOVER) {
        names.extend(["onHoverIn", "onHoverOut"]);
    }
    if pseudo.contains(PseudoClasses::ACTIVE) {
        names.extend(["onPressIn", "onPressOut"]);
    }
    if pseudo.contains(PseudoClasses::FOCUS) {
        names.extend(["onFocus", "onBlur"]);
    }
    if requires_layout {
        names.push("onLayout");
    }
    names
}

/// Install handlers feeding `signals` for the required states.
///
/// An existing handler under the same prop name is chained: it runs first,
/// then the interaction state updates.
pub fn attach_handlers(
    props: &mut Props,
    signals: &InteractionSignals,
    pseudo: PseudoClasses,
    requires_layout: bool,
) {
    for name in handler_props(pseudo, requires_layout) {
        let user: Option<Handler> = props.handler(name).cloned();
        let signals = signals.clone();
        let handler: Handler = Rc::new(move |event: &HostEvent| {
            if let Some(user) = &user {
                user(event);
            }
            signals.handle(event);
        });
        props.insert(name, PropValue::Handler(handler));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{Computation, Rerun};

    fn fire(props: &Props, name: &str, event: HostEvent) {
        let handler = props.handler(name).unwrap().clone();
        handler(&event);
    }

    #[test]
    fn test_allocation_count() {
        reset_interaction_state();
        let _a = InteractionSignals::new();
        let b = InteractionSignals::new();
        let c = b.clone();
        assert_eq!(allocation_count(), 2);
        assert!(b.ptr_eq(&c));
    }

    #[test]
    fn test_matches_tracks_only_required() {
        let signals = InteractionSignals::new();
        let reruns = Rc::new(Cell::new(0));
        let counter = reruns.clone();
        let rerun: Rerun = Rc::new(move || counter.set(counter.get() + 1));

        let computation: Computation<bool, ()> = Computation::new();
        let check = signals.clone();
        assert!(!computation.run((), || check.matches(PseudoClasses::HOVER), &rerun));

        signals.focus.set(true);
        assert_eq!(reruns.get(), 0);

        signals.hover.set(true);
        assert_eq!(reruns.get(), 1);
        assert!(computation.run((), || check.matches(PseudoClasses::HOVER), &rerun));
    }

    #[test]
    fn test_empty_requirement_always_matches() {
        let signals = InteractionSignals::new();
        assert!(signals.matches(PseudoClasses::empty()));
    }

    #[test]
    fn test_attach_only_required_handlers() {
        let signals = InteractionSignals::new();
        let mut props = Props::new();
        attach_handlers(&mut props, &signals, PseudoClasses::ACTIVE, false);

        assert!(props.contains("onPressIn"));
        assert!(props.contains("onPressOut"));
        assert!(!props.contains("onHoverIn"));
        assert!(!props.contains("onFocus"));
        assert!(!props.contains("onLayout"));

        fire(&props, "onPressIn", HostEvent::PressIn);
        assert!(signals.active.peek());
        fire(&props, "onPressOut", HostEvent::PressOut);
        assert!(!signals.active.peek());
    }

    #[test]
    fn test_user_handler_is_chained() {
        let signals = InteractionSignals::new();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let user: Handler = Rc::new(move |_: &HostEvent| counter.set(counter.get() + 1));

        let mut props = Props::new().with("onFocus", user);
        attach_handlers(&mut props, &signals, PseudoClasses::FOCUS, false);

        fire(&props, "onFocus", HostEvent::Focus);
        assert_eq!(calls.get(), 1);
        assert!(signals.focus.peek());
    }

    #[test]
    fn test_layout_handler() {
        let signals = InteractionSignals::new();
        let mut props = Props::new();
        attach_handlers(&mut props, &signals, PseudoClasses::empty(), true);

        let layout = Layout {
            width: 320.0,
            height: 40.0,
        };
        fire(&props, "onLayout", HostEvent::Layout(layout));
        assert_eq!(signals.layout.peek(), Some(layout));
    }

    #[test]
    fn test_repeated_event_does_not_notify() {
        let signals = InteractionSignals::new();
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let _sub = signals.hover.subscribe(move || counter.set(counter.get() + 1));

        signals.handle(&HostEvent::HoverIn);
        signals.handle(&HostEvent::HoverIn);
        assert_eq!(fired.get(), 1);
    }
}
