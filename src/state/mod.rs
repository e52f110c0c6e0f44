//! State Module - Per-instance and inherited runtime state.
//!
//! - **Interaction** - hover/active/focus/layout signals and their handlers
//! - **Inheritance** - variable and container scopes provided to descendants

pub mod inheritance;
pub mod interaction;

pub use inheritance::{
    current, provide, reset_inheritance, ContainerRuntime, ContainerScope, InheritedContext,
    Scope, VariableScope, DEFAULT_CONTAINER,
};
pub use interaction::{
    allocation_count, attach_handlers, reset_interaction_state, InteractionSignals,
};
