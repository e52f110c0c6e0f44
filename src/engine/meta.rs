//! Style Metadata Table - Identity-keyed side table.
//!
//! Associates a `StyleFragment` allocation with its `StyleMeta`. Lookups are
//! by `Rc` identity, never by value: two structurally equal fragments can carry
//! different metadata. Entries hold a `Weak` to their fragment so a recycled
//! address is never mistaken for the original allocation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::fragment::{StyleFragment, StyleMeta};

struct MetaEntry {
    fragment: Weak<StyleFragment>,
    meta: Rc<StyleMeta>,
}

thread_local! {
    static STYLE_META: RefCell<HashMap<usize, MetaEntry>> = RefCell::new(HashMap::new());
}

fn identity(fragment: &Rc<StyleFragment>) -> usize {
    Rc::as_ptr(fragment) as usize
}

/// Attach metadata to a fragment allocation, replacing any previous entry.
///
/// Entries of dropped fragments stay until [`prune_style_meta`] runs.
pub fn set_style_meta(fragment: &Rc<StyleFragment>, meta: StyleMeta) {
    STYLE_META.with(|table| {
        table.borrow_mut().insert(
            identity(fragment),
            MetaEntry {
                fragment: Rc::downgrade(fragment),
                meta: Rc::new(meta),
            },
        );
    });
}

/// Metadata for this exact allocation, if any was registered.
pub fn get_style_meta(fragment: &Rc<StyleFragment>) -> Option<Rc<StyleMeta>> {
    STYLE_META.with(|table| {
        table
            .borrow()
            .get(&identity(fragment))
            .filter(|entry| {
                entry
                    .fragment
                    .upgrade()
                    .is_some_and(|live| Rc::ptr_eq(&live, fragment))
            })
            .map(|entry| Rc::clone(&entry.meta))
    })
}

/// Metadata for this allocation, or empty metadata when none is known.
pub fn style_meta_or_default(fragment: &Rc<StyleFragment>) -> Rc<StyleMeta> {
    get_style_meta(fragment).unwrap_or_default()
}

/// Whether the fragment carries any non-empty metadata.
pub fn has_style_meta(fragment: &Rc<StyleFragment>) -> bool {
    get_style_meta(fragment).is_some_and(|meta| !meta.is_empty())
}

/// Drop entries whose fragment is gone. The registry calls this once per write.
pub fn prune_style_meta() {
    STYLE_META.with(|table| {
        table
            .borrow_mut()
            .retain(|_, entry| entry.fragment.strong_count() > 0);
    });
}

#[cfg(test)]
pub(crate) fn style_meta_table_len() -> usize {
    STYLE_META.with(|table| table.borrow().len())
}

/// Number of live entries.
pub fn style_meta_count() -> usize {
    STYLE_META.with(|table| {
        table
            .borrow()
            .values()
            .filter(|entry| entry.fragment.strong_count() > 0)
            .count()
    })
}

/// Clear the table (for testing and registry resets).
pub fn reset_style_meta() {
    STYLE_META.with(|table| table.borrow_mut().clear());
}
