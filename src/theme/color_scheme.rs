//! Color Scheme Store - light/dark state and the OS appearance bridge.
//!
//! One per-thread store holds the effective scheme as a signal plus an
//! `is_system` flag. While `is_system` is set, appearance changes reported by
//! the bridge are applied; an explicit `set(Light | Dark)` turns following
//! off until `set(System)` or `reset` turns it back on.
//!
//! Every transition re-derives root and universal variables so
//! scheme-dependent values update without descendants re-subscribing.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use spark_css_interop::theme::{color_scheme, ManualAppearance};
//! use spark_css_interop::{ColorScheme, SchemeSetting};
//!
//! let os = Rc::new(ManualAppearance::new(Some(ColorScheme::Light)));
//! color_scheme::reset(os.clone());
//!
//! color_scheme::set(SchemeSetting::Dark);
//! assert_eq!(color_scheme::get(), ColorScheme::Dark);
//! assert!(!color_scheme::is_system());
//! assert_eq!(os.requests(), vec![ColorScheme::Dark]);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::Result;
use crate::primitives::Cleanup;
use crate::signals::{Signal, Subscription};
use crate::types::{ColorScheme, SchemeSetting};

use super::variables::apply_color_scheme;

// =============================================================================
// Appearance Bridge
// =============================================================================

/// Receives `None` when the OS has no preference.
pub type SchemeListener = Rc<dyn Fn(Option<ColorScheme>)>;

/// The host's view of the OS appearance setting.
pub trait AppearanceBridge {
    /// Current OS scheme, if any.
    fn color_scheme(&self) -> Option<ColorScheme>;

    /// Ask the OS to render the app in `scheme`.
    fn set_color_scheme(&self, scheme: ColorScheme);

    /// Listen for OS appearance changes. The returned cleanup removes the listener.
    fn add_change_listener(&self, listener: SchemeListener) -> Cleanup;
}

type ListenerList = RefCell<Vec<(u64, SchemeListener)>>;

/// Bridge driven by hand: for hosts without OS integration, and for tests.
///
/// `emit` plays the role of the OS changing appearance. `set_color_scheme`
/// only records the request; it does not change what the "OS" reports.
#[derive(Default)]
pub struct ManualAppearance {
    scheme: Cell<Option<ColorScheme>>,
    listeners: Rc<ListenerList>,
    next_listener: Cell<u64>,
    requests: RefCell<Vec<ColorScheme>>,
}

impl ManualAppearance {
    pub fn new(scheme: Option<ColorScheme>) -> Self {
        Self {
            scheme: Cell::new(scheme),
            ..Self::default()
        }
    }

    /// Simulate an OS appearance change.
    pub fn emit(&self, scheme: Option<ColorScheme>) {
        self.scheme.set(scheme);
        let listeners: Vec<SchemeListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(scheme);
        }
    }

    /// Every scheme passed to `set_color_scheme`, oldest first.
    pub fn requests(&self) -> Vec<ColorScheme> {
        self.requests.borrow().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl AppearanceBridge for ManualAppearance {
    fn color_scheme(&self) -> Option<ColorScheme> {
        self.scheme.get()
    }

    fn set_color_scheme(&self, scheme: ColorScheme) {
        self.requests.borrow_mut().push(scheme);
    }

    fn add_change_listener(&self, listener: SchemeListener) -> Cleanup {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));

        let listeners: Weak<ListenerList> = Rc::downgrade(&self.listeners);
        Box::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(entry, _)| *entry != id);
            }
        })
    }
}

// =============================================================================
// Store
// =============================================================================

struct ColorSchemeStore {
    scheme: Signal<ColorScheme>,
    is_system: Rc<Cell<bool>>,
    bridge: RefCell<Rc<dyn AppearanceBridge>>,
    listener: RefCell<Option<Cleanup>>,
}

impl ColorSchemeStore {
    fn new(bridge: Rc<dyn AppearanceBridge>) -> Self {
        let initial = bridge.color_scheme().unwrap_or_default();
        let store = Self {
            scheme: Signal::new(initial),
            is_system: Rc::new(Cell::new(true)),
            bridge: RefCell::new(bridge),
            listener: RefCell::new(None),
        };
        store.listen();
        apply_color_scheme(initial);
        store
    }

    /// Install a listener on the current bridge, removing the previous one first.
    fn listen(&self) {
        if let Some(remove) = self.listener.borrow_mut().take() {
            remove();
        }

        let scheme = self.scheme.clone();
        let is_system = Rc::clone(&self.is_system);
        let listener: SchemeListener = Rc::new(move |reported: Option<ColorScheme>| {
            if !is_system.get() {
                tracing::debug!(?reported, "ignored OS appearance change");
                return;
            }
            let next = reported.unwrap_or_default();
            tracing::debug!(scheme = next.as_str(), "applied OS appearance change");
            apply_color_scheme(next);
            scheme.set(next);
        });

        let bridge = self.bridge.borrow().clone();
        *self.listener.borrow_mut() = Some(bridge.add_change_listener(listener));
    }

    fn bridge(&self) -> Rc<dyn AppearanceBridge> {
        self.bridge.borrow().clone()
    }
}

thread_local! {
    static STORE: ColorSchemeStore =
        ColorSchemeStore::new(Rc::new(ManualAppearance::default()));
}

// =============================================================================
// Public API
// =============================================================================

/// Effective scheme. Tracked.
pub fn get() -> ColorScheme {
    STORE.with(|store| store.scheme.get())
}

/// Effective scheme without tracking.
pub fn peek() -> ColorScheme {
    STORE.with(|store| store.scheme.peek())
}

/// Whether OS appearance changes are followed.
pub fn is_system() -> bool {
    STORE.with(|store| store.is_system.get())
}

/// Fix the scheme, or go back to following the OS.
pub fn set(setting: SchemeSetting) {
    let next = STORE.with(|store| {
        let bridge = store.bridge();
        match setting {
            SchemeSetting::System => {
                store.is_system.set(true);
                bridge.color_scheme().unwrap_or_default()
            }
            SchemeSetting::Light | SchemeSetting::Dark => {
                let scheme = if setting == SchemeSetting::Dark {
                    ColorScheme::Dark
                } else {
                    ColorScheme::Light
                };
                store.is_system.set(false);
                bridge.set_color_scheme(scheme);
                scheme
            }
        }
    });

    tracing::debug!(?setting, scheme = next.as_str(), "set color scheme");
    apply_color_scheme(next);
    STORE.with(|store| store.scheme.set(next));
}

/// `set` from a string (`"light"`, `"dark"` or `"system"`).
pub fn set_named(value: &str) -> Result<()> {
    set(value.parse()?);
    Ok(())
}

/// Flip light ↔ dark. Always stops following the OS.
pub fn toggle() {
    set(peek().toggled().into());
}

/// Call `callback` after every scheme write.
pub fn subscribe(callback: impl Fn() + 'static) -> Subscription {
    STORE.with(|store| store.scheme.subscribe(callback))
}

/// Swap the appearance bridge and follow it again.
///
/// Removes the listener on the old bridge before installing one on the new
/// bridge, then re-syncs the scheme from it.
pub fn reset(bridge: Rc<dyn AppearanceBridge>) {
    let next = STORE.with(|store| {
        *store.bridge.borrow_mut() = bridge;
        store.listen();
        store.is_system.set(true);
        store.bridge().color_scheme().unwrap_or_default()
    });

    tracing::debug!(scheme = next.as_str(), "reset color scheme bridge");
    apply_color_scheme(next);
    STORE.with(|store| store.scheme.set(next));
}
