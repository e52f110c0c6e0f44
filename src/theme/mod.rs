//! Theme System - color scheme and global variables.
//!
//! - [`color_scheme`] - light/dark store that follows or overrides the OS
//! - [`variables`] - `:root` and `*` variables with per-scheme values
//!
//! # Example
//!
//! ```rust
//! use spark_css_interop::theme::{color_scheme, root_variable, set_root_variable, ThemedValue};
//! use spark_css_interop::{Rgba, SchemeSetting, StyleValue};
//!
//! set_root_variable(
//!     "--color-primary",
//!     ThemedValue::new(Rgba::rgb(255, 115, 179).into(), Rgba::rgb(155, 100, 255).into()),
//! );
//!
//! color_scheme::set(SchemeSetting::Dark);
//! assert_eq!(
//!     root_variable("--color-primary"),
//!     Some(StyleValue::Color(Rgba::rgb(155, 100, 255)))
//! );
//! ```

pub mod color_scheme;
pub mod variables;

pub use color_scheme::{AppearanceBridge, ManualAppearance, SchemeListener};
pub use variables::{
    reset_variables, root_variable, set_root_variable, set_universal_variable,
    universal_variable, ThemedValue,
};
