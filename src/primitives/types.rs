//! Primitive types - Props, elements and host callbacks.
//!
//! These types describe what the interop layer hands to the host rendering
//! system: a component type, its props (with resolved styles), children and
//! the scopes it provides to descendants.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use crate::engine::StyleFragment;
use crate::state::InheritedContext;
use crate::types::{ComponentType, Layout, Style, StyleValue};

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by listeners and subscriptions.
///
/// Call this to remove the listener.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Host Events
// =============================================================================

/// Events the host delivers to interaction handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    PressIn,
    PressOut,
    HoverIn,
    HoverOut,
    Focus,
    Blur,
    Layout(Layout),
}

/// Event handler prop (Rc for shared ownership in closures).
pub type Handler = Rc<dyn Fn(&HostEvent)>;

/// Opaque reference to the rendered host element, forwarded untouched.
pub type HostRef = Rc<dyn Any>;

fn same_allocation<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

// =============================================================================
// Prop Value
// =============================================================================

/// One prop as supplied by the author or produced by the interop layer.
#[derive(Clone)]
pub enum PropValue {
    /// String prop. Class names are whitespace-separated strings.
    Str(Rc<str>),
    Number(f32),
    Bool(bool),
    /// Inline style fragments, applied after any class-derived fragments.
    Style(Vec<Rc<StyleFragment>>),
    /// A style resolved by the interop layer.
    Resolved(Style),
    /// Any resolved style value lifted into a plain prop.
    Value(StyleValue),
    Handler(Handler),
    Ref(HostRef),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_fragments(&self) -> Option<&[Rc<StyleFragment>]> {
        match self {
            Self::Style(fragments) => Some(fragments.as_slice()),
            _ => None,
        }
    }

    pub fn as_resolved(&self) -> Option<&Style> {
        match self {
            Self::Resolved(style) => Some(style),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Self::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn as_host_ref(&self) -> Option<&HostRef> {
        match self {
            Self::Ref(host) => Some(host),
            _ => None,
        }
    }
}

/// Strings, numbers and resolved styles compare by value; fragments, handlers
/// and refs compare by allocation.
impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Style(a), Self::Style(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| Rc::ptr_eq(a, b))
            }
            (Self::Resolved(a), Self::Resolved(b)) => a == b,
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => same_allocation(a, b),
            (Self::Ref(a), Self::Ref(b)) => same_allocation(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Style(fragments) => f.debug_tuple("Style").field(fragments).finish(),
            Self::Resolved(style) => f.debug_tuple("Resolved").field(style).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Ref(_) => f.write_str("Ref(..)"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<f32> for PropValue {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Style> for PropValue {
    fn from(value: Style) -> Self {
        Self::Resolved(value)
    }
}

impl From<Rc<StyleFragment>> for PropValue {
    fn from(value: Rc<StyleFragment>) -> Self {
        Self::Style(vec![value])
    }
}

impl From<Vec<Rc<StyleFragment>>> for PropValue {
    fn from(value: Vec<Rc<StyleFragment>>) -> Self {
        Self::Style(value)
    }
}

impl From<HostRef> for PropValue {
    fn from(value: HostRef) -> Self {
        Self::Ref(value)
    }
}

impl From<Handler> for PropValue {
    fn from(value: Handler) -> Self {
        Self::Handler(value)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Named props of one element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Props {
    values: BTreeMap<String, PropValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropValue)> {
        self.values.iter()
    }

    /// Resolved style in `slot`, if the interop layer produced one.
    pub fn resolved(&self, slot: &str) -> Option<&Style> {
        self.get(slot).and_then(PropValue::as_resolved)
    }

    pub fn handler(&self, name: &str) -> Option<&Handler> {
        self.get(name).and_then(PropValue::as_handler)
    }
}

// =============================================================================
// Element
// =============================================================================

/// What the animation executor needs to animate a component.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimationInterop {
    /// Changes only when the set of animated or transitioning slots changes.
    pub key: String,
    pub animated_props: BTreeSet<String>,
    pub transition_props: BTreeSet<String>,
}

/// A host element description.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub component: ComponentType,
    pub props: Props,
    pub children: Vec<Element>,
    pub key: Option<String>,
    /// Scopes this element provides to its descendants.
    pub provides: Option<InheritedContext>,
    /// Present when the element must render inside an animation wrapper.
    pub animation: Option<AnimationInterop>,
}

impl Element {
    pub fn new(component: ComponentType) -> Self {
        Self {
            component,
            props: Props::new(),
            children: Vec::new(),
            key: None,
            provides: None,
            animation: None,
        }
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name, value);
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Resolved style in `slot`.
    pub fn style(&self, slot: &str) -> Option<&Style> {
        self.props.resolved(slot)
    }
}
