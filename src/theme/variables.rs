//! Root and universal variables.
//!
//! Stylesheets can declare variables on `:root` (root) and on `*`
//! (universal), optionally with a different value in dark mode. Each variable
//! is a signal holding the value for the applied color scheme, so a component
//! that resolved one re-renders when the scheme flips.
//!
//! Lookups of unknown names read a version signal instead, so a computation
//! that missed a variable re-runs once it is defined.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::signals::Signal;
use crate::types::{ColorScheme, StyleValue};

// =============================================================================
// ThemedValue
// =============================================================================

/// A variable value, optionally different in dark mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemedValue {
    pub light: StyleValue,
    pub dark: Option<StyleValue>,
}

impl ThemedValue {
    pub fn new(light: StyleValue, dark: StyleValue) -> Self {
        Self {
            light,
            dark: Some(dark),
        }
    }

    /// Same value in both schemes.
    pub fn fixed(value: StyleValue) -> Self {
        Self {
            light: value,
            dark: None,
        }
    }

    pub fn for_scheme(&self, scheme: ColorScheme) -> &StyleValue {
        match (scheme, &self.dark) {
            (ColorScheme::Dark, Some(dark)) => dark,
            _ => &self.light,
        }
    }

    pub fn is_scheme_dependent(&self) -> bool {
        self.dark.as_ref().is_some_and(|dark| *dark != self.light)
    }
}

impl From<StyleValue> for ThemedValue {
    fn from(value: StyleValue) -> Self {
        Self::fixed(value)
    }
}

// =============================================================================
// State
// =============================================================================

struct VariableEntry {
    themed: ThemedValue,
    current: Signal<StyleValue>,
}

type VariableTable = RefCell<HashMap<String, VariableEntry>>;

thread_local! {
    static ROOT_VARIABLES: VariableTable = RefCell::new(HashMap::new());
    static UNIVERSAL_VARIABLES: VariableTable = RefCell::new(HashMap::new());

    /// Bumped when a name is first defined or the tables are cleared.
    static VARIABLES_VERSION: Signal<u64> = Signal::new(0);

    /// Scheme the stored values currently reflect.
    static APPLIED_SCHEME: Cell<ColorScheme> = const { Cell::new(ColorScheme::Light) };
}

fn bump_version() {
    VARIABLES_VERSION.with(|version| version.set(version.peek() + 1));
}

fn define(table: &'static std::thread::LocalKey<VariableTable>, name: String, themed: ThemedValue) {
    let scheme = APPLIED_SCHEME.with(Cell::get);
    let value = themed.for_scheme(scheme).clone();

    let existing = table.with(|table| {
        let mut table = table.borrow_mut();
        match table.get_mut(&name) {
            Some(entry) => {
                entry.themed = themed;
                Some(entry.current.clone())
            }
            None => {
                table.insert(
                    name.clone(),
                    VariableEntry {
                        themed,
                        current: Signal::new(value.clone()),
                    },
                );
                None
            }
        }
    });

    match existing {
        Some(current) => current.set(value),
        None => bump_version(),
    }
}

fn read(table: &'static std::thread::LocalKey<VariableTable>, name: &str) -> Option<StyleValue> {
    let current = table.with(|table| table.borrow().get(name).map(|entry| entry.current.clone()));
    match current {
        Some(current) => Some(current.get()),
        None => {
            VARIABLES_VERSION.with(|version| version.with(|_| ()));
            None
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Define or replace a `:root` variable.
///
/// ```
/// use spark_css_interop::theme::{root_variable, set_root_variable, ThemedValue};
/// use spark_css_interop::{Rgba, StyleValue};
///
/// set_root_variable(
///     "--color-primary",
///     ThemedValue::new(Rgba::rgb(255, 115, 179).into(), Rgba::rgb(155, 100, 255).into()),
/// );
/// assert_eq!(
///     root_variable("--color-primary"),
///     Some(StyleValue::Color(Rgba::rgb(255, 115, 179)))
/// );
/// ```
pub fn set_root_variable(name: impl Into<String>, value: impl Into<ThemedValue>) {
    let name = name.into();
    tracing::debug!(variable = %name, "set root variable");
    define(&ROOT_VARIABLES, name, value.into());
}

/// Define or replace a universal (`*`) variable.
pub fn set_universal_variable(name: impl Into<String>, value: impl Into<ThemedValue>) {
    let name = name.into();
    tracing::debug!(variable = %name, "set universal variable");
    define(&UNIVERSAL_VARIABLES, name, value.into());
}

/// Current value of a root variable. Tracked.
pub fn root_variable(name: &str) -> Option<StyleValue> {
    read(&ROOT_VARIABLES, name)
}

/// Current value of a universal variable. Tracked.
pub fn universal_variable(name: &str) -> Option<StyleValue> {
    read(&UNIVERSAL_VARIABLES, name)
}

/// Re-derive every variable for `scheme`. Only variables whose value changes notify.
pub(crate) fn apply_color_scheme(scheme: ColorScheme) {
    APPLIED_SCHEME.with(|applied| applied.set(scheme));

    let mut changed = Vec::new();
    for table in [&ROOT_VARIABLES, &UNIVERSAL_VARIABLES] {
        table.with(|table| {
            for entry in table.borrow().values() {
                let next = entry.themed.for_scheme(scheme);
                if entry.current.peek() != *next {
                    changed.push((entry.current.clone(), next.clone()));
                }
            }
        });
    }

    tracing::debug!(scheme = scheme.as_str(), changed = changed.len(), "applied color scheme to variables");
    for (current, next) in changed {
        current.set(next);
    }
}

/// Clear all root and universal variables (for testing).
///
/// The applied scheme stays in sync with the color scheme store, so variables
/// defined afterwards start with the value for the scheme in effect.
pub fn reset_variables() {
    let scheme = super::color_scheme::peek();
    ROOT_VARIABLES.with(|table| table.borrow_mut().clear());
    UNIVERSAL_VARIABLES.with(|table| table.borrow_mut().clear());
    APPLIED_SCHEME.with(|applied| applied.set(scheme));
    bump_version();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{Computation, Rerun};
    use crate::types::Rgba;
    use std::rc::Rc;

    fn primary() -> ThemedValue {
        ThemedValue::new(
            Rgba::rgb(255, 115, 179).into(),
            Rgba::rgb(155, 100, 255).into(),
        )
    }

    #[test]
    fn test_themed_value_for_scheme() {
        let themed = primary();
        assert_eq!(
            themed.for_scheme(ColorScheme::Dark),
            &StyleValue::Color(Rgba::rgb(155, 100, 255))
        );
        assert!(themed.is_scheme_dependent());

        let fixed = ThemedValue::fixed(StyleValue::Number(4.0));
        assert_eq!(fixed.for_scheme(ColorScheme::Dark), &StyleValue::Number(4.0));
        assert!(!fixed.is_scheme_dependent());
    }

    #[test]
    fn test_apply_color_scheme_switches_values() {
        reset_variables();
        set_root_variable("--color-primary", primary());

        apply_color_scheme(ColorScheme::Dark);
        assert_eq!(
            root_variable("--color-primary"),
            Some(StyleValue::Color(Rgba::rgb(155, 100, 255)))
        );

        apply_color_scheme(ColorScheme::Light);
        assert_eq!(
            root_variable("--color-primary"),
            Some(StyleValue::Color(Rgba::rgb(255, 115, 179)))
        );
    }

    #[test]
    fn test_define_uses_applied_scheme() {
        reset_variables();
        apply_color_scheme(ColorScheme::Dark);
        set_universal_variable("--tw-ring", primary());
        assert_eq!(
            universal_variable("--tw-ring"),
            Some(StyleValue::Color(Rgba::rgb(155, 100, 255)))
        );
    }

    #[test]
    fn test_scheme_change_invalidates_readers() {
        reset_variables();
        set_root_variable("--color-primary", primary());
        set_root_variable("--spacing", StyleValue::Number(4.0));

        let reruns = Rc::new(Cell::new(0));
        let counter = reruns.clone();
        let rerun: Rerun = Rc::new(move || counter.set(counter.get() + 1));

        let primary_reader: Computation<Option<StyleValue>, ()> = Computation::new();
        primary_reader.run((), || root_variable("--color-primary"), &rerun);

        apply_color_scheme(ColorScheme::Dark);
        assert_eq!(reruns.get(), 1);

        let spacing_reader: Computation<Option<StyleValue>, ()> = Computation::new();
        spacing_reader.run((), || root_variable("--spacing"), &rerun);
        apply_color_scheme(ColorScheme::Light);
        assert!(!spacing_reader.is_dirty());
    }

    #[test]
    fn test_missing_variable_tracks_definition() {
        reset_variables();

        let reruns = Rc::new(Cell::new(0));
        let counter = reruns.clone();
        let rerun: Rerun = Rc::new(move || counter.set(counter.get() + 1));

        let reader: Computation<Option<StyleValue>, ()> = Computation::new();
        assert_eq!(reader.run((), || root_variable("--late"), &rerun), None);

        set_root_variable("--late", StyleValue::Number(1.0));
        assert_eq!(reruns.get(), 1);
        assert_eq!(
            reader.run((), || root_variable("--late"), &rerun),
            Some(StyleValue::Number(1.0))
        );
    }
}
