//! Runtime configuration.
//!
//! Per-thread settings read by the interop wrapper. Development mode makes
//! every wrapper subscribe to stylesheet changes so a hot-reloaded registry
//! re-renders mounted components.

use std::cell::Cell;

thread_local! {
    static DEV_MODE: Cell<bool> = const { Cell::new(cfg!(debug_assertions)) };
}

/// Separator used to join slot names into the animation interop key.
pub const ANIMATION_KEY_SEPARATOR: &str = ":";

/// Whether wrappers subscribe to stylesheet hot reloads.
pub fn is_dev_mode() -> bool {
    DEV_MODE.with(Cell::get)
}

/// Enable or disable development mode for wrappers created afterwards.
pub fn set_dev_mode(enabled: bool) {
    DEV_MODE.with(|mode| mode.set(enabled));
}

/// Restore defaults (for testing).
pub fn reset_config() {
    set_dev_mode(cfg!(debug_assertions));
}
