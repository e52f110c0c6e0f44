//! Interop Boundary - Turn class-name props into host-ready elements.
//!
//! `css_interop` inspects an element's class-name props before any reactive
//! machinery is engaged. With an `InteropDecision` kept per element position,
//! the inspection runs once per distinct class-name prop set:
//!
//! - **Fast path**: no fragment carries metadata or a `var()` reference.
//!   Styles are flattened statically and the element goes straight to the host.
//! - **Wrapped**: something needs runtime state (variables, containers,
//!   pseudo-classes, color scheme, animation, layout). The element is rendered through a
//!   long-lived `InteropWrapper`, which owns interaction signals and a
//!   memoized computation keyed on the raw class-name/style props and the
//!   inherited scopes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::config::is_dev_mode;
use crate::engine::{subscribe_stylesheet, version as stylesheet_version, PropMapping};
use crate::primitives::{Element, PropValue, Props};
use crate::signals::{untracked, Computation, Rerun, Subscription};
use crate::state::{attach_handlers, InheritedContext, InteractionSignals};
use crate::types::ComponentType;

use super::flatten::{flatten_style_props, slots_have_meta, FlattenContext, InteropMeta, StyledSlot};

// =============================================================================
// Classification
// =============================================================================

/// An element whose styles need runtime state.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedElement {
    pub component: ComponentType,
    /// Props with class-name and inline style props removed.
    pub props: Props,
    pub slots: Vec<(String, StyledSlot)>,
    /// Raw class-name and style prop values, in mapping order.
    pub dependencies: Vec<Option<PropValue>>,
    pub mapping: Rc<PropMapping>,
    pub children: Vec<Element>,
    pub key: Option<String>,
}

/// Result of `css_interop`.
#[derive(Debug, Clone, PartialEq)]
pub enum Interop {
    /// Fast path: already resolved.
    Static(Element),
    /// Must be rendered through an `InteropWrapper`.
    Wrapped(WrappedElement),
}

#[derive(Debug)]
struct DecisionInputs {
    dependencies: Vec<Option<PropValue>>,
    version: u64,
    wrapped: bool,
}

/// Memo of the fast-path decision for one element position.
///
/// Re-evaluated only when the raw class-name/style props or the stylesheet
/// version differ from the previous call.
#[derive(Debug, Default)]
pub struct InteropDecision {
    last: RefCell<Option<DecisionInputs>>,
    evaluations: Cell<u64>,
}

impl InteropDecision {
    pub fn new() -> Self {
        Self::default()
    }

    fn needs_wrapper(
        &self,
        slots: &[(String, StyledSlot)],
        dependencies: &[Option<PropValue>],
    ) -> bool {
        let version = untracked(stylesheet_version);
        if let Some(last) = self.last.borrow().as_ref() {
            if last.version == version && last.dependencies.as_slice() == dependencies {
                return last.wrapped;
            }
        }

        let wrapped = slots_have_meta(slots);
        self.evaluations.set(self.evaluations.get() + 1);
        *self.last.borrow_mut() = Some(DecisionInputs {
            dependencies: dependencies.to_vec(),
            version,
            wrapped,
        });
        wrapped
    }

    /// How many times the decision rule actually ran.
    pub fn evaluation_count(&self) -> u64 {
        self.evaluations.get()
    }
}

/// Pull class-name props (and the inline styles of their targets) out of `props`.
fn collect_slots(
    props: &mut Props,
    mapping: &PropMapping,
) -> (Vec<(String, StyledSlot)>, Vec<Option<PropValue>>) {
    let mut slots = Vec::new();
    let mut dependencies = Vec::new();

    for (class_prop, slot) in mapping.slots() {
        let class_names = props.remove(class_prop);
        dependencies.push(class_names.clone());

        let inline = if slot != class_prop {
            let inline = props.remove(slot);
            dependencies.push(inline.clone());
            inline
        } else {
            None
        };

        let styled = StyledSlot {
            class_names: class_names
                .as_ref()
                .and_then(PropValue::as_str)
                .filter(|names| !names.trim().is_empty())
                .map(Rc::from),
            inline: inline
                .as_ref()
                .and_then(PropValue::as_fragments)
                .map(<[_]>::to_vec)
                .unwrap_or_default(),
        };

        if styled.is_empty() {
            // Not ours: hand any non-fragment value back untouched.
            if let Some(inline) = inline.filter(|value| value.as_fragments().is_none()) {
                props.insert(slot, inline);
            }
            continue;
        }
        slots.push((slot.to_string(), styled));
    }

    (slots, dependencies)
}

/// Write resolved styles into `props`, then lift native style props.
fn apply_styles(props: &mut Props, meta: &InteropMeta, mapping: &PropMapping) {
    for (slot, style) in &meta.styled_props {
        props.insert(slot.clone(), PropValue::Resolved((**style).clone()));
    }

    for extract in mapping.native_style_to_prop() {
        let value = meta
            .styled_props
            .get(&extract.slot)
            .and_then(|style| style.get(&extract.style_prop))
            .cloned();
        let Some(value) = value else {
            continue;
        };
        if let Some(PropValue::Resolved(mut style)) = props.remove(&extract.slot) {
            style.remove(&extract.style_prop);
            props.insert(extract.slot.clone(), style);
        }
        props.insert(extract.target_prop.clone(), PropValue::Value(value));
    }
}

/// Decide how an element's class names are applied.
///
/// ```
/// use spark_css_interop::engine::{register, CompiledStyle, PropMapping};
/// use spark_css_interop::pipeline::{css_interop, Interop};
/// use spark_css_interop::primitives::Element;
/// use spark_css_interop::{ComponentType, Rgba, StyleValue};
///
/// register("bg-black", [CompiledStyle::new().set("backgroundColor", Rgba::BLACK.into())]);
///
/// let element = Element::new(ComponentType::View).prop("className", "bg-black");
/// let mapping = PropMapping::for_component(ComponentType::View);
///
/// let Interop::Static(resolved) = css_interop(element, &mapping) else {
///     panic!("plain styles take the fast path");
/// };
/// assert_eq!(
///     resolved.style("style").and_then(|s| s.get("backgroundColor")),
///     Some(&StyleValue::Color(Rgba::BLACK))
/// );
/// ```
pub fn css_interop(element: Element, mapping: &PropMapping) -> Interop {
    css_interop_cached(element, mapping, &InteropDecision::new())
}

/// `css_interop` reusing the previous decision for this element position
/// while its class-name props and the stylesheet are unchanged.
pub fn css_interop_cached(
    element: Element,
    mapping: &PropMapping,
    decision: &InteropDecision,
) -> Interop {
    let Element {
        component,
        mut props,
        children,
        key,
        ..
    } = element;

    let (slots, dependencies) = collect_slots(&mut props, mapping);

    if !decision.needs_wrapper(&slots, &dependencies) {
        let inherited = InheritedContext::default();
        let meta = untracked(|| {
            flatten_style_props(
                &slots,
                &FlattenContext {
                    interaction: None,
                    inherited: &inherited,
                },
            )
        });
        apply_styles(&mut props, &meta, mapping);
        return Interop::Static(Element {
            component,
            props,
            children,
            key,
            provides: None,
            animation: None,
        });
    }

    Interop::Wrapped(WrappedElement {
        component,
        props,
        slots,
        dependencies,
        mapping: Rc::new(mapping.clone()),
        children,
        key,
    })
}

// =============================================================================
// Wrapper
// =============================================================================

#[derive(PartialEq)]
struct InteropDeps {
    inherited: InheritedContext,
    props: Vec<Option<PropValue>>,
}

struct ProvidedScopes {
    inherited: InheritedContext,
    meta: Rc<InteropMeta>,
    context: InheritedContext,
}

/// Per-instance runtime of a wrapped element.
///
/// Keep one wrapper per mounted component and call `render` on every host
/// render pass. `rerender` is invoked when a tracked input changes.
pub struct InteropWrapper {
    interaction: InteractionSignals,
    computation: Computation<Rc<InteropMeta>, InteropDeps>,
    rerender: Rerun,
    provided: RefCell<Option<ProvidedScopes>>,
    last_meta: RefCell<Option<Rc<InteropMeta>>>,
    _stylesheet: Option<Subscription>,
}

impl InteropWrapper {
    pub fn new(rerender: impl Fn() + 'static) -> Self {
        let rerender: Rerun = Rc::new(rerender);
        let computation = Computation::new();
        // Shares the computation's pending flag, so a stylesheet write that
        // also invalidates a tracked lookup schedules one rerender.
        let stylesheet = is_dev_mode().then(|| {
            let invalidate = computation.invalidator(&rerender);
            subscribe_stylesheet(move || invalidate())
        });

        Self {
            interaction: InteractionSignals::new(),
            computation,
            rerender,
            provided: RefCell::new(None),
            last_meta: RefCell::new(None),
            _stylesheet: stylesheet,
        }
    }

    /// Resolve `element` against `inherited` and produce the host element.
    pub fn render(&self, element: &WrappedElement, inherited: &InheritedContext) -> Element {
        let deps = InteropDeps {
            inherited: inherited.clone(),
            props: element.dependencies.clone(),
        };
        let meta = self.computation.run(
            deps,
            || {
                tracing::debug!(component = ?element.component, "resolving styles");
                Rc::new(flatten_style_props(
                    &element.slots,
                    &FlattenContext {
                        interaction: Some(&self.interaction),
                        inherited,
                    },
                ))
            },
            &self.rerender,
        );
        *self.last_meta.borrow_mut() = Some(Rc::clone(&meta));

        let component = element.component.with_variant(meta.render_variant());

        let mut props = element.props.clone();
        apply_styles(&mut props, &meta, &element.mapping);
        attach_handlers(
            &mut props,
            &self.interaction,
            meta.pseudo_classes(),
            meta.requires_layout,
        );

        let provides = (meta.has_inline_variables || meta.has_inline_containers)
            .then(|| self.provided_scopes(inherited, &meta));

        Element {
            component,
            props,
            children: element.children.clone(),
            key: element.key.clone(),
            provides,
            animation: meta.animation_interop(),
        }
    }

    /// Scopes for descendants, reused while the inherited scopes and meta are unchanged.
    fn provided_scopes(&self, inherited: &InheritedContext, meta: &Rc<InteropMeta>) -> InheritedContext {
        if let Some(provided) = self.provided.borrow().as_ref() {
            if provided.inherited == *inherited && Rc::ptr_eq(&provided.meta, meta) {
                return provided.context.clone();
            }
        }

        let variables = if meta.has_inline_variables {
            inherited.variables.extend(meta.variables.clone())
        } else {
            inherited.variables.clone()
        };
        let containers = if meta.has_inline_containers {
            inherited.containers.extend(meta.containers.clone())
        } else {
            inherited.containers.clone()
        };
        let context = InheritedContext {
            variables,
            containers,
        };

        *self.provided.borrow_mut() = Some(ProvidedScopes {
            inherited: inherited.clone(),
            meta: Rc::clone(meta),
            context: context.clone(),
        });
        context
    }

    pub fn interaction(&self) -> &InteractionSignals {
        &self.interaction
    }

    /// Metadata from the last `render`.
    pub fn last_meta(&self) -> Option<Rc<InteropMeta>> {
        self.last_meta.borrow().clone()
    }

    /// How many times styles were resolved.
    pub fn resolve_count(&self) -> u64 {
        self.computation.run_count()
    }
}

impl fmt::Debug for InteropWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteropWrapper")
            .field("resolves", &self.computation.run_count())
            .field("dirty", &self.computation.is_dirty())
            .field("dev_subscription", &self._stylesheet.is_some())
            .finish()
    }
}
