//! # spark-css-interop
//!
//! Reactive utility-class style resolution for component trees.
//!
//! Components carry string class names (`"p-4 hover:bg-red dark:text-white"`).
//! At render time those are resolved against a global stylesheet registry into
//! native style objects, with the CSS features a plain style object lacks:
//! custom variables, light/dark themes, named containers, hover/active/focus
//! states and animated or transitioning properties.
//!
//! ## Architecture
//!
//! Everything is single-threaded and synchronous. A small signal runtime
//! ([`signals`]) tracks which global inputs a resolution read, so a
//! component's styles are recomputed only when one of them changes:
//!
//! ```text
//! registry version ─┐
//! color scheme     ─┼→ Computation(flatten) → InteropMeta → host element
//! interaction      ─┤
//! inherited scopes ─┘ (explicit dependency)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Colors, style values, schemes, pseudo-classes, component types
//! - [`signals`] - Signals, tracking frames and memoized computations
//! - [`engine`] - Style registry, fragment metadata and prop mappings
//! - [`theme`] - Color-scheme store and root/universal variables
//! - [`state`] - Interaction signals and inherited scopes
//! - [`primitives`] - Props, elements and host events
//! - [`pipeline`] - Flatten, the interop boundary and a tree renderer

pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod signals;
pub mod state;
pub mod theme;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{InteropError, Result};

pub use signals::{signal, Computation, Rerun, Signal, Subscription};

pub use engine::{
    lookup, register, register_all, reset_all, CompiledStyle, ContainerQuery, ContainerType,
    PropMapping, StyleFragment, StyleMeta,
};

pub use theme::{color_scheme, AppearanceBridge, ManualAppearance, ThemedValue};

pub use state::{InheritedContext, InteractionSignals};

pub use primitives::{Element, HostEvent, PropValue, Props};

pub use pipeline::{css_interop, Interop, InteropMeta, InteropWrapper, Renderer};
