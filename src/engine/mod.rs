//! Style Engine - Registry, fragments and their metadata.
//!
//! The engine owns the process-wide stylesheet state:
//! - Fragments: immutable compiled style payloads shared by `Rc`
//! - Meta: identity-keyed side table of what each fragment needs
//! - Registry: class name → fragments, with a version signal
//! - Mapping: which component prop each class-name prop feeds
//!
//! # Identity
//!
//! Metadata is looked up by fragment allocation, not by value:
//!
//! ```text
//! "hover:bg-red" → [Rc<Fragment#1>]   meta#1 = { hover }
//! "bg-red"       → [Rc<Fragment#2>]   meta#2 = {}
//! ```
//!
//! Fragment#1 and Fragment#2 hold the same declarations, but only the first
//! requires interaction tracking.

mod fragment;
mod mapping;
mod meta;
mod registry;

pub use fragment::*;
pub use mapping::*;
pub use meta::*;
pub use registry::*;
