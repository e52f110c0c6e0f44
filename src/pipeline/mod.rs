//! Resolution Pipeline
//!
//! Connects the style registry to host elements.
//!
//! # Pipeline Architecture
//!
//! ```text
//! Element (className props) → css_interop → Static ─────────────────→ host
//!                                        └→ Wrapped → InteropWrapper → host
//!                                                      └ Computation(flatten)
//! ```
//!
//! ## Data Flow
//!
//! 1. **css_interop** - Splits class-name props into slots, picks fast path or wrapper
//! 2. **flatten** - Resolves slots against interaction state and inherited scopes
//! 3. **InteropWrapper** - Memoizes flatten, attaches handlers, provides scopes
//! 4. **Renderer** - Keeps wrappers alive across passes for a whole tree

pub mod flatten;
pub mod interop;
pub mod render;

pub use flatten::{
    flatten_style_props, slots_have_meta, FlattenContext, InteropMeta, SlotMeta, StyledSlot,
};
pub use interop::{
    css_interop, css_interop_cached, Interop, InteropDecision, InteropWrapper, WrappedElement,
};
pub use render::Renderer;
