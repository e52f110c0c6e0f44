//! Host Primitives - Elements, props and events.
//!
//! The interop layer does not render anything itself. It turns an author's
//! element (class-name props, inline styles, handlers) into an element the
//! host can render directly:
//!
//! ```text
//! Element { View, className: "p-4 hover:bg-red" }
//!     → Element { Pressable, style: Resolved(..), onHoverIn, onHoverOut }
//! ```

mod types;

pub use types::*;
