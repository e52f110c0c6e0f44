//! Inheritance - Variables and containers flowing down the component tree.
//!
//! Both channels are persistent linked scopes: a component that declares
//! variables or containers extends its inherited scope with one node and
//! provides the result to its descendants. Lookup walks from the nearest node
//! outwards, so a nearer declaration shadows a farther one of the same name
//! while unrelated names still fall through to the farther scope.
//!
//! ```text
//! root ← { --accent: red } ← { --accent: blue, --gap: 4 }
//!                             ↑ descendant sees --accent = blue
//! ```
//!
//! Scopes compare by identity. Two scopes are equal only if they are the same
//! node, which is what memoized computations keyed on them need.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::engine::ContainerType;
use crate::types::{Style, StyleValue};

use super::interaction::InteractionSignals;

// =============================================================================
// Scope
// =============================================================================

struct ScopeNode<V> {
    bindings: BTreeMap<String, V>,
    parent: Scope<V>,
}

/// A persistent chain of name → value layers.
pub struct Scope<V> {
    head: Option<Rc<ScopeNode<V>>>,
}

impl<V> Scope<V> {
    /// The empty scope.
    pub fn root() -> Self {
        Self { head: None }
    }

    pub fn is_root(&self) -> bool {
        self.head.is_none()
    }

    /// A new scope with `bindings` layered over this one.
    pub fn extend(&self, bindings: BTreeMap<String, V>) -> Self {
        Self {
            head: Some(Rc::new(ScopeNode {
                bindings,
                parent: self.clone(),
            })),
        }
    }

    /// Nearest binding of `name`.
    pub fn get(&self, name: &str) -> Option<&V> {
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            if let Some(value) = current.bindings.get(name) {
                return Some(value);
            }
            node = current.parent.head.as_deref();
        }
        None
    }

    /// Number of layers.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            depth += 1;
            node = current.parent.head.as_deref();
        }
        depth
    }

    /// Names bound in the nearest layer only.
    pub fn own_names(&self) -> impl Iterator<Item = &String> {
        self.head.iter().flat_map(|node| node.bindings.keys())
    }
}

impl<V> Clone for Scope<V> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
        }
    }
}

impl<V> Default for Scope<V> {
    fn default() -> Self {
        Self::root()
    }
}

impl<V> PartialEq for Scope<V> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<V> fmt::Debug for Scope<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("depth", &self.depth())
            .field("own", &self.own_names().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Containers
// =============================================================================

/// Name every container is also published under.
pub const DEFAULT_CONTAINER: &str = "__default";

/// What a container publishes for descendants to query against.
#[derive(Debug, Clone)]
pub struct ContainerRuntime {
    pub kind: ContainerType,
    /// The publishing slot's resolved style.
    pub style: Rc<Style>,
    /// The publishing instance's interaction state.
    pub interaction: InteractionSignals,
}

pub type VariableScope = Scope<StyleValue>;
pub type ContainerScope = Scope<Rc<ContainerRuntime>>;

// =============================================================================
// InheritedContext
// =============================================================================

/// Everything a component inherits from its ancestors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InheritedContext {
    pub variables: VariableScope,
    pub containers: ContainerScope,
}

thread_local! {
    static PROVIDED: RefCell<Vec<InheritedContext>> = const { RefCell::new(Vec::new()) };
}

/// The context provided by the nearest enclosing `provide`, or the root context.
pub fn current() -> InheritedContext {
    PROVIDED.with(|stack| stack.borrow().last().cloned().unwrap_or_default())
}

struct ProvideGuard;

impl Drop for ProvideGuard {
    fn drop(&mut self) {
        PROVIDED.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Run `f` with `context` as the current inherited context.
///
/// The previous context is restored when `f` returns or unwinds.
pub fn provide<R>(context: InheritedContext, f: impl FnOnce() -> R) -> R {
    PROVIDED.with(|stack| stack.borrow_mut().push(context));
    let _guard = ProvideGuard;
    f()
}

/// Clear the provider stack (for testing).
pub fn reset_inheritance() {
    PROVIDED.with(|stack| stack.borrow_mut().clear());
}
