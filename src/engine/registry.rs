//! Style Registry - Class name to style fragment mapping.
//!
//! Manages the global stylesheet:
//! - Class name → fragment list, replaced wholesale on registration
//! - StyleMeta derived once per fragment and stored by identity
//! - A version signal bumped on every write so tracked computations invalidate
//!
//! Lookups read the version signal, so any computation that resolved a class
//! re-runs when the stylesheet changes, even if that class was unknown before.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::signals::{Signal, Subscription};

use super::fragment::{CompiledStyle, StyleFragment};
use super::meta::{prune_style_meta, reset_style_meta, set_style_meta};

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Class name to its fragments, in rule order.
    static GLOBAL_STYLES: RefCell<HashMap<String, Vec<Rc<StyleFragment>>>> =
        RefCell::new(HashMap::new());

    /// Bumped after every registry write.
    static STYLESHEET_VERSION: Signal<u64> = Signal::new(0);
}

fn bump_version() -> u64 {
    STYLESHEET_VERSION.with(|version| {
        let next = version.peek() + 1;
        version.set(next);
        next
    })
}

fn freeze(styles: impl IntoIterator<Item = CompiledStyle>) -> Vec<Rc<StyleFragment>> {
    styles
        .into_iter()
        .map(|style| {
            let (fragment, meta) = style.into_parts();
            let fragment = Rc::new(fragment);
            set_style_meta(&fragment, meta);
            fragment
        })
        .collect()
}

// =============================================================================
// Registration
// =============================================================================

/// Insert or replace the styles for a class name.
///
/// Replaced fragments keep their metadata only as long as someone still holds
/// them; new lookups see the new fragments.
pub fn register(class_name: impl Into<String>, styles: impl IntoIterator<Item = CompiledStyle>) {
    let class_name = class_name.into();
    let fragments = freeze(styles);
    let count = fragments.len();

    GLOBAL_STYLES.with(|map| {
        map.borrow_mut().insert(class_name.clone(), fragments);
    });
    prune_style_meta();

    let version = bump_version();
    tracing::debug!(class = %class_name, fragments = count, version, "registered style");
}

/// Register a whole stylesheet with a single version bump.
pub fn register_all<K, S>(entries: impl IntoIterator<Item = (K, S)>)
where
    K: Into<String>,
    S: IntoIterator<Item = CompiledStyle>,
{
    let frozen: Vec<(String, Vec<Rc<StyleFragment>>)> = entries
        .into_iter()
        .map(|(class_name, styles)| (class_name.into(), freeze(styles)))
        .collect();
    let count = frozen.len();

    GLOBAL_STYLES.with(|map| {
        map.borrow_mut().extend(frozen);
    });
    prune_style_meta();

    let version = bump_version();
    tracing::debug!(classes = count, version, "registered stylesheet");
}

/// Clear every class and its metadata.
pub fn reset_all() {
    GLOBAL_STYLES.with(|map| map.borrow_mut().clear());
    reset_style_meta();

    let version = bump_version();
    tracing::debug!(version, "stylesheet reset");
}

// =============================================================================
// Lookup
// =============================================================================

/// Fragments for one class name, or empty if it is unknown. Tracked.
pub fn lookup(class_name: &str) -> Vec<Rc<StyleFragment>> {
    STYLESHEET_VERSION.with(|version| version.with(|_| ()));
    GLOBAL_STYLES.with(|map| map.borrow().get(class_name).cloned().unwrap_or_default())
}

/// Fragments for a whitespace-separated class list, in class order. Tracked.
pub fn lookup_class_names(class_names: &str) -> Vec<Rc<StyleFragment>> {
    class_names.split_whitespace().flat_map(lookup).collect()
}

/// Whether a class name is registered. Untracked.
pub fn is_registered(class_name: &str) -> bool {
    GLOBAL_STYLES.with(|map| map.borrow().contains_key(class_name))
}

/// Number of registered class names.
pub fn registered_class_count() -> usize {
    GLOBAL_STYLES.with(|map| map.borrow().len())
}

// =============================================================================
// Versioning
// =============================================================================

/// Current stylesheet version. Tracked.
pub fn version() -> u64 {
    STYLESHEET_VERSION.with(Signal::get)
}

/// Call `callback` after every stylesheet write.
pub fn subscribe_stylesheet(callback: impl Fn() + 'static) -> Subscription {
    STYLESHEET_VERSION.with(|version| version.subscribe(callback))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::meta::{get_style_meta, style_meta_table_len};
    use crate::signals::{Computation, Rerun};
    use crate::types::{Rgba, StyleValue};
    use std::cell::Cell;

    fn setup() {
        reset_all();
    }

    fn red() -> CompiledStyle {
        CompiledStyle::new().set("color", Rgba::rgb(255, 0, 0).into())
    }

    #[test]
    fn test_register_and_lookup() {
        setup();

        register("text-red", [red()]);

        let fragments = lookup("text-red");
        assert_eq!(fragments.len(), 1);
        assert_eq!(
            fragments[0].get("color"),
            Some(&StyleValue::Color(Rgba::rgb(255, 0, 0)))
        );
        assert!(is_registered("text-red"));
        assert_eq!(registered_class_count(), 1);
    }

    #[test]
    fn test_unknown_class_contributes_nothing() {
        setup();
        assert!(lookup("nope").is_empty());
        assert!(lookup_class_names("  nope   also-nope ").is_empty());
    }

    #[test]
    fn test_lookup_class_names_preserves_order() {
        setup();
        register("a", [CompiledStyle::new().set("opacity", StyleValue::Number(0.1))]);
        register("b", [CompiledStyle::new().set("opacity", StyleValue::Number(0.2))]);

        let fragments = lookup_class_names("b a");
        assert_eq!(fragments[0].get("opacity"), Some(&StyleValue::Number(0.2)));
        assert_eq!(fragments[1].get("opacity"), Some(&StyleValue::Number(0.1)));
    }

    #[test]
    fn test_register_stores_meta_by_identity() {
        setup();
        register("hover:bg", [red().hover()]);

        let fragment = &lookup("hover:bg")[0];
        let meta = get_style_meta(fragment).unwrap();
        assert!(!meta.pseudo_classes.is_empty());
    }

    #[test]
    fn test_replace_bumps_version() {
        setup();
        let before = version();
        register("text-red", [red()]);
        register("text-red", [CompiledStyle::new().set("color", Rgba::BLACK.into())]);

        assert_eq!(version(), before + 2);
        assert_eq!(
            lookup("text-red")[0].get("color"),
            Some(&StyleValue::Color(Rgba::BLACK))
        );
    }

    #[test]
    fn test_register_all_bumps_once() {
        setup();
        let before = version();
        register_all([("a", vec![red()]), ("b", vec![red()])]);
        assert_eq!(version(), before + 1);
        assert_eq!(registered_class_count(), 2);
    }

    #[test]
    fn test_replaced_fragments_leave_meta_table() {
        setup();
        register("text-red", [red()]);
        register("text-red", [red().hover()]);
        assert_eq!(style_meta_table_len(), 1);

        register_all([("a", vec![red()]), ("a", vec![red(), red()]), ("b", vec![red()])]);
        assert_eq!(style_meta_table_len(), 4);
    }

    #[test]
    fn test_reset_all_clears_and_notifies() {
        setup();
        register("text-red", [red()]);

        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let _sub = subscribe_stylesheet(move || counter.set(counter.get() + 1));

        reset_all();
        assert_eq!(fired.get(), 1);
        assert!(lookup("text-red").is_empty());
    }

    #[test]
    fn test_lookup_is_tracked() {
        setup();

        let reruns = Rc::new(Cell::new(0));
        let counter = reruns.clone();
        let rerun: Rerun = Rc::new(move || counter.set(counter.get() + 1));

        let computation: Computation<usize, ()> = Computation::new();
        assert_eq!(computation.run((), || lookup("later").len(), &rerun), 0);

        register("later", [red()]);
        assert_eq!(reruns.get(), 1);
        assert_eq!(computation.run((), || lookup("later").len(), &rerun), 1);
    }
}
