//! Flatten - Resolve style slots into final styles and interop metadata.
//!
//! For each slot, fragments are taken in class order followed by inline
//! fragments; later declarations win. Metadata flags are OR-reduced over every
//! fragment touching the slot, but a fragment's declarations only apply while
//! its pseudo-class and container-query conditions hold.
//!
//! ```text
//! "style": "p-4 hover:bg-red" + inline
//!   p-4          → { padding: 16 }                       always
//!   hover:bg-red → { backgroundColor: red }   meta: hover   when hovered
//!   inline       → { opacity: 0.5 }                      always
//! ```
//!
//! Everything read here that can change (registry version, interaction state,
//! root variables, container layouts) is a tracked signal, so running this
//! inside a `Computation` is enough to keep the result current.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::config::ANIMATION_KEY_SEPARATOR;
use crate::engine::{
    lookup_class_names, style_meta_or_default, ContainerDeclaration, ContainerQuery, StyleFragment,
    StyleMeta,
};
use crate::error::InteropError;
use crate::primitives::AnimationInterop;
use crate::state::{
    ContainerRuntime, ContainerScope, InheritedContext, InteractionSignals, DEFAULT_CONTAINER,
};
use crate::theme::{color_scheme, root_variable, universal_variable};
use crate::types::{PseudoClasses, RenderVariant, Style, StyleValue};

// =============================================================================
// Inputs
// =============================================================================

/// Candidate styles for one slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyledSlot {
    /// Whitespace-separated class names.
    pub class_names: Option<Rc<str>>,
    /// Inline fragments, applied after class fragments.
    pub inline: Vec<Rc<StyleFragment>>,
}

impl StyledSlot {
    pub fn classes(class_names: &str) -> Self {
        Self {
            class_names: Some(Rc::from(class_names)),
            inline: Vec::new(),
        }
    }

    pub fn with_inline(mut self, fragment: Rc<StyleFragment>) -> Self {
        self.inline.push(fragment);
        self
    }

    /// Registry fragments then inline fragments. Tracked on the registry.
    pub fn fragments(&self) -> Vec<Rc<StyleFragment>> {
        let mut fragments = self
            .class_names
            .as_deref()
            .map(lookup_class_names)
            .unwrap_or_default();
        fragments.extend(self.inline.iter().cloned());
        fragments
    }

    pub fn is_empty(&self) -> bool {
        self.class_names.as_deref().is_none_or(|names| names.trim().is_empty())
            && self.inline.is_empty()
    }
}

/// What a component inherited, plus its own interaction state.
///
/// Without interaction signals no pseudo-class condition can match and the
/// component cannot publish containers.
#[derive(Debug, Clone, Copy)]
pub struct FlattenContext<'a> {
    pub interaction: Option<&'a InteractionSignals>,
    pub inherited: &'a InheritedContext,
}

// =============================================================================
// Outputs
// =============================================================================

/// Merged metadata of every fragment touching one slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlotMeta {
    pub animated: bool,
    pub transition: bool,
    pub requires_layout: bool,
    pub uses_variables: bool,
    pub variables: BTreeMap<String, StyleValue>,
    pub container: Option<ContainerDeclaration>,
    pub pseudo_classes: PseudoClasses,
}

impl SlotMeta {
    fn merge(&mut self, meta: &StyleMeta) {
        self.animated |= meta.animations;
        self.transition |= meta.transition;
        self.requires_layout |= meta.requires_layout;
        self.uses_variables |= meta.uses_variables;
        self.pseudo_classes |= meta.pseudo_classes;
        self.variables
            .extend(meta.variables.iter().map(|(k, v)| (k.clone(), v.clone())));

        if let Some(declared) = &meta.container {
            let container = self.container.get_or_insert_with(ContainerDeclaration::default);
            for name in &declared.names {
                if !container.names.contains(name) {
                    container.names.push(name.clone());
                }
            }
            container.kind = declared.kind;
        }
    }
}

/// The resolved styles of a component and what it must do beyond applying them.
#[derive(Debug, Clone, Default)]
pub struct InteropMeta {
    /// Final style per slot.
    pub styled_props: BTreeMap<String, Rc<Style>>,
    pub styled_props_meta: BTreeMap<String, SlotMeta>,
    /// Variables to expose to descendants.
    pub variables: BTreeMap<String, StyleValue>,
    /// Containers to expose to descendants, including `__default`.
    pub containers: BTreeMap<String, Rc<ContainerRuntime>>,
    pub animated_props: BTreeSet<String>,
    pub transition_props: BTreeSet<String>,
    pub requires_layout: bool,
    pub has_inline_variables: bool,
    pub has_inline_containers: bool,
    pub has_active: bool,
    pub has_hover: bool,
    pub has_focus: bool,
    /// Set when an animation wrapper is needed; changes with the set of animated slots.
    pub animation_interop_key: Option<String>,
    /// Development diagnostics. Never fatal.
    pub diagnostics: Vec<InteropError>,
}

impl InteropMeta {
    /// Pseudo-classes the component needs interaction handlers for.
    pub fn pseudo_classes(&self) -> PseudoClasses {
        let mut pseudo = PseudoClasses::empty();
        pseudo.set(PseudoClasses::HOVER, self.has_hover);
        pseudo.set(PseudoClasses::ACTIVE, self.has_active);
        pseudo.set(PseudoClasses::FOCUS, self.has_focus);
        pseudo
    }

    pub fn render_variant(&self) -> RenderVariant {
        RenderVariant::from_pseudo_classes(self.pseudo_classes())
    }

    /// Input for the animation executor, when one is needed.
    pub fn animation_interop(&self) -> Option<AnimationInterop> {
        self.animation_interop_key
            .as_ref()
            .map(|key| AnimationInterop {
                key: key.clone(),
                animated_props: self.animated_props.clone(),
                transition_props: self.transition_props.clone(),
            })
    }
}

// =============================================================================
// Variable Resolution
// =============================================================================

struct VariableResolver<'a> {
    own: &'a BTreeMap<String, StyleValue>,
    inherited: &'a InheritedContext,
    visiting: Vec<String>,
    diagnostics: &'a mut Vec<InteropError>,
}

impl VariableResolver<'_> {
    /// Own slot variables, then inherited scopes, then root, then universal.
    fn lookup(&self, name: &str) -> Option<StyleValue> {
        self.own
            .get(name)
            .or_else(|| self.inherited.variables.get(name))
            .cloned()
            .or_else(|| root_variable(name))
            .or_else(|| universal_variable(name))
    }

    fn resolve(&mut self, value: &StyleValue) -> Option<StyleValue> {
        let StyleValue::Var(reference) = value else {
            return Some(value.clone());
        };

        if self.visiting.contains(&reference.name) {
            let cycle = InteropError::VariableCycle {
                name: reference.name.clone(),
            };
            if !self.diagnostics.contains(&cycle) {
                self.diagnostics.push(cycle);
            }
            return None;
        }

        let resolved = self.lookup(&reference.name).and_then(|raw| {
            self.visiting.push(reference.name.clone());
            let resolved = self.resolve(&raw);
            self.visiting.pop();
            resolved
        });

        match (resolved, &reference.fallback) {
            (Some(value), _) => Some(value),
            (None, Some(fallback)) => self.resolve(fallback),
            (None, None) => None,
        }
    }
}

// =============================================================================
// Conditions
// =============================================================================

fn query_matches(query: &ContainerQuery, containers: &ContainerScope) -> bool {
    let name = query.name.as_deref().unwrap_or(DEFAULT_CONTAINER);
    let Some(container) = containers.get(name) else {
        return false;
    };

    if !container.interaction.matches(query.pseudo_classes) {
        return false;
    }

    if query.has_size_condition() {
        let Some(layout) = container.interaction.layout() else {
            return false;
        };
        if query.min_width.is_some_and(|min| layout.width < min)
            || query.max_width.is_some_and(|max| layout.width > max)
        {
            return false;
        }
    }

    true
}

fn applies(meta: &StyleMeta, cx: &FlattenContext<'_>) -> bool {
    let pseudo_ok = match cx.interaction {
        Some(interaction) => interaction.matches(meta.pseudo_classes),
        None => meta.pseudo_classes.is_empty(),
    };
    pseudo_ok
        && meta.color_scheme.is_none_or(|scheme| color_scheme::get() == scheme)
        && meta
            .container_queries
            .iter()
            .all(|query| query_matches(query, &cx.inherited.containers))
}

// =============================================================================
// Flatten
// =============================================================================

/// Resolve every slot and aggregate the component's interop metadata.
pub fn flatten_style_props(slots: &[(String, StyledSlot)], cx: &FlattenContext<'_>) -> InteropMeta {
    let mut out = InteropMeta::default();

    for (slot, styled) in slots {
        let fragments: Vec<(Rc<StyleFragment>, Rc<StyleMeta>)> = styled
            .fragments()
            .into_iter()
            .map(|fragment| {
                let meta = style_meta_or_default(&fragment);
                (fragment, meta)
            })
            .collect();

        let mut slot_meta = SlotMeta::default();
        for (fragment, meta) in &fragments {
            slot_meta.merge(meta);
            slot_meta.uses_variables |= fragment.references_variables();
        }

        if let Some(declared) = &slot_meta.container {
            for (_, meta) in &fragments {
                for query in &meta.container_queries {
                    let Some(name) = query.name.as_ref() else {
                        continue;
                    };
                    let error = InteropError::ContainerSelfReference { name: name.clone() };
                    if declared.names.contains(name) && !out.diagnostics.contains(&error) {
                        out.diagnostics.push(error);
                    }
                }
            }
        }

        let mut style = Style::new();
        let mut resolver = VariableResolver {
            own: &slot_meta.variables,
            inherited: cx.inherited,
            visiting: Vec::new(),
            diagnostics: &mut out.diagnostics,
        };
        for (fragment, meta) in &fragments {
            if !applies(meta, cx) {
                continue;
            }
            for (prop, value) in fragment.declarations() {
                match resolver.resolve(value) {
                    Some(resolved) => style.insert(prop.clone(), resolved),
                    None => {
                        style.remove(prop);
                    }
                }
            }
        }

        out.styled_props.insert(slot.clone(), Rc::new(style));
        out.styled_props_meta.insert(slot.clone(), slot_meta);
    }

    aggregate(slots, cx, &mut out);

    for diagnostic in &out.diagnostics {
        tracing::warn!(%diagnostic, "style resolution diagnostic");
    }

    out
}

/// Global step: expose variables and containers, OR the flags, derive the animation key.
fn aggregate(slots: &[(String, StyledSlot)], cx: &FlattenContext<'_>, out: &mut InteropMeta) {
    for (slot, _) in slots {
        let Some(meta) = out.styled_props_meta.get(slot) else {
            continue;
        };

        if !meta.variables.is_empty() {
            out.has_inline_variables = true;
            out.variables
                .extend(meta.variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        if let Some(declared) = &meta.container {
            out.has_inline_containers = true;
            match (cx.interaction, out.styled_props.get(slot)) {
                (Some(interaction), Some(style)) => {
                    let runtime = Rc::new(ContainerRuntime {
                        kind: declared.kind,
                        style: Rc::clone(style),
                        interaction: interaction.clone(),
                    });
                    out.containers
                        .insert(DEFAULT_CONTAINER.to_string(), Rc::clone(&runtime));
                    for name in &declared.names {
                        out.containers.insert(name.clone(), Rc::clone(&runtime));
                    }
                }
                _ => tracing::debug!(slot = %slot, "container declared without interaction state"),
            }
        }

        if meta.animated {
            out.animated_props.insert(slot.clone());
        }
        if meta.transition {
            out.transition_props.insert(slot.clone());
        }

        let publishes = out.has_inline_containers;
        out.requires_layout |= publishes || meta.requires_layout;
        out.has_active |= publishes || meta.pseudo_classes.contains(PseudoClasses::ACTIVE);
        out.has_hover |= publishes || meta.pseudo_classes.contains(PseudoClasses::HOVER);
        out.has_focus |= publishes || meta.pseudo_classes.contains(PseudoClasses::FOCUS);
    }

    let keyed: BTreeSet<&String> = out
        .animated_props
        .iter()
        .chain(out.transition_props.iter())
        .collect();
    if !keyed.is_empty() {
        out.animation_interop_key = Some(
            keyed
                .into_iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(ANIMATION_KEY_SEPARATOR),
        );
    }
}

/// Whether any fragment in these slots needs more than static application:
/// non-empty metadata, or a `var()` reference (inline fragments carry no
/// metadata of their own). Untracked.
pub fn slots_have_meta(slots: &[(String, StyledSlot)]) -> bool {
    crate::signals::untracked(|| {
        slots.iter().any(|(_, styled)| {
            styled.fragments().iter().any(|fragment| {
                fragment.references_variables() || !style_meta_or_default(fragment).is_empty()
            })
        })
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{register, reset_all, CompiledStyle};
    use crate::state::VariableScope;
    use crate::theme::{
        reset_variables, set_root_variable, set_universal_variable, ManualAppearance,
    };
    use crate::types::{ColorScheme, Layout, Rgba, SchemeSetting};
    use tracing_test::traced_test;

    fn setup() {
        reset_all();
        reset_variables();
    }

    fn slot(class_names: &str) -> Vec<(String, StyledSlot)> {
        vec![("style".to_string(), StyledSlot::classes(class_names))]
    }

    fn flatten(slots: &[(String, StyledSlot)], interaction: &InteractionSignals) -> InteropMeta {
        let inherited = InheritedContext::default();
        flatten_style_props(
            slots,
            &FlattenContext {
                interaction: Some(interaction),
                inherited: &inherited,
            },
        )
    }

    fn color(meta: &InteropMeta) -> Option<StyleValue> {
        meta.styled_props["style"].get("color").cloned()
    }

    #[test]
    fn test_later_class_wins() {
        setup();
        register("a", [CompiledStyle::new().set("color", Rgba::BLACK.into())]);
        register("b", [CompiledStyle::new().set("color", Rgba::WHITE.into())]);

        let interaction = InteractionSignals::new();
        assert_eq!(color(&flatten(&slot("a b"), &interaction)), Some(Rgba::WHITE.into()));
        assert_eq!(color(&flatten(&slot("b a"), &interaction)), Some(Rgba::BLACK.into()));
    }

    #[test]
    fn test_inline_after_classes() {
        setup();
        register("text-black", [CompiledStyle::new().set("color", Rgba::BLACK.into())]);

        let inline = StyleFragment::inline([("color", StyleValue::Color(Rgba::WHITE))]);
        let slots = vec![(
            "style".to_string(),
            StyledSlot::classes("text-black").with_inline(inline),
        )];
        assert_eq!(
            color(&flatten(&slots, &InteractionSignals::new())),
            Some(Rgba::WHITE.into())
        );
    }

    #[test]
    fn test_unknown_class_is_ignored() {
        setup();
        let meta = flatten(&slot("does-not-exist"), &InteractionSignals::new());
        assert!(meta.styled_props["style"].is_empty());
        assert!(meta.diagnostics.is_empty());
    }

    #[test]
    fn test_pseudo_flags_set_even_when_inactive() {
        setup();
        register(
            "hover:text-white",
            [CompiledStyle::new().set("color", Rgba::WHITE.into()).hover()],
        );

        let interaction = InteractionSignals::new();
        let meta = flatten(&slot("hover:text-white"), &interaction);
        assert!(meta.has_hover);
        assert!(!meta.has_active);
        assert_eq!(color(&meta), None);
        assert_eq!(meta.render_variant(), RenderVariant::Interactive);

        interaction.hover.set(true);
        let meta = flatten(&slot("hover:text-white"), &interaction);
        assert_eq!(color(&meta), Some(Rgba::WHITE.into()));
    }

    #[test]
    fn test_variable_resolution_order() {
        setup();
        set_universal_variable("--gap", StyleValue::Number(1.0));
        set_root_variable("--gap", StyleValue::Number(2.0));
        register("gap", [CompiledStyle::new().set("gap", StyleValue::var("--gap"))]);
        register(
            "gap-own",
            [CompiledStyle::new()
                .set("--gap", StyleValue::Number(4.0))
                .set("gap", StyleValue::var("--gap"))],
        );

        let interaction = InteractionSignals::new();
        let gap = |meta: &InteropMeta| meta.styled_props["style"].get("gap").cloned();

        assert_eq!(gap(&flatten(&slot("gap"), &interaction)), Some(StyleValue::Number(2.0)));

        let inherited = InheritedContext {
            variables: VariableScope::root()
                .extend(BTreeMap::from([("--gap".to_string(), StyleValue::Number(3.0))])),
            ..InheritedContext::default()
        };
        let cx = FlattenContext {
            interaction: Some(&interaction),
            inherited: &inherited,
        };
        assert_eq!(gap(&flatten_style_props(&slot("gap"), &cx)), Some(StyleValue::Number(3.0)));
        assert_eq!(
            gap(&flatten_style_props(&slot("gap-own"), &cx)),
            Some(StyleValue::Number(4.0))
        );
    }

    #[test]
    fn test_unresolved_variable_uses_fallback_or_drops() {
        setup();
        register(
            "with-fallback",
            [CompiledStyle::new().set("gap", StyleValue::var_or("--nope", StyleValue::Number(8.0)))],
        );
        register(
            "without-fallback",
            [CompiledStyle::new()
                .set("gap", StyleValue::Number(1.0))
                .set("gap", StyleValue::var("--nope"))],
        );

        let interaction = InteractionSignals::new();
        let meta = flatten(&slot("with-fallback"), &interaction);
        assert_eq!(meta.styled_props["style"].get("gap"), Some(&StyleValue::Number(8.0)));

        let meta = flatten(&slot("without-fallback"), &interaction);
        assert_eq!(meta.styled_props["style"].get("gap"), None);
        assert!(meta.styled_props_meta["style"].uses_variables);
    }

    #[test]
    #[traced_test]
    fn test_variable_cycle_is_reported() {
        setup();
        register(
            "cycle",
            [CompiledStyle::new()
                .set("--a", StyleValue::var("--b"))
                .set("--b", StyleValue::var("--a"))
                .set("gap", StyleValue::var("--a"))],
        );

        let meta = flatten(&slot("cycle"), &InteractionSignals::new());
        assert_eq!(meta.styled_props["style"].get("gap"), None);
        assert_eq!(
            meta.diagnostics,
            vec![InteropError::VariableCycle {
                name: "--a".to_string()
            }]
        );
        assert!(logs_contain("style resolution diagnostic"));
    }

    #[test]
    fn test_container_publishes_default_and_forces_flags() {
        setup();
        register("group", [CompiledStyle::new().container(["group"])]);

        let meta = flatten(&slot("group"), &InteractionSignals::new());
        assert!(meta.has_inline_containers);
        assert!(meta.requires_layout);
        assert!(meta.has_hover && meta.has_active && meta.has_focus);
        assert!(Rc::ptr_eq(&meta.containers["group"], &meta.containers[DEFAULT_CONTAINER]));
    }

    #[test]
    #[traced_test]
    fn test_container_self_reference_is_reported() {
        setup();
        register(
            "card",
            [CompiledStyle::new().container(["card"])],
        );
        register(
            "card-hover:text-white",
            [CompiledStyle::new()
                .set("color", Rgba::WHITE.into())
                .query(ContainerQuery::named("card").hover())],
        );

        let meta = flatten(&slot("card card-hover:text-white"), &InteractionSignals::new());
        assert_eq!(
            meta.diagnostics,
            vec![InteropError::ContainerSelfReference {
                name: "card".to_string()
            }]
        );
        assert!(logs_contain("queried by the same component"));
    }

    #[test]
    fn test_container_query_against_ancestor() {
        setup();
        register(
            "group-hover:text-white",
            [CompiledStyle::new()
                .set("color", Rgba::WHITE.into())
                .query(ContainerQuery::named("group").hover())],
        );
        register(
            "wide:gap",
            [CompiledStyle::new()
                .set("gap", StyleValue::Number(10.0))
                .query(ContainerQuery::nearest().min_width(300.0))],
        );

        let parent = InteractionSignals::new();
        let runtime = Rc::new(ContainerRuntime {
            kind: Default::default(),
            style: Rc::new(Style::new()),
            interaction: parent.clone(),
        });
        let inherited = InheritedContext {
            containers: ContainerScope::root().extend(BTreeMap::from([
                ("group".to_string(), Rc::clone(&runtime)),
                (DEFAULT_CONTAINER.to_string(), runtime),
            ])),
            ..InheritedContext::default()
        };
        let child = InteractionSignals::new();
        let cx = FlattenContext {
            interaction: Some(&child),
            inherited: &inherited,
        };
        let slots = slot("group-hover:text-white wide:gap");

        let meta = flatten_style_props(&slots, &cx);
        assert_eq!(color(&meta), None);
        assert_eq!(meta.styled_props["style"].get("gap"), None);

        parent.hover.set(true);
        parent.layout.set(Some(Layout {
            width: 320.0,
            height: 10.0,
        }));
        let meta = flatten_style_props(&slots, &cx);
        assert_eq!(color(&meta), Some(Rgba::WHITE.into()));
        assert_eq!(meta.styled_props["style"].get("gap"), Some(&StyleValue::Number(10.0)));
    }

    #[test]
    fn test_animation_key_is_sorted_union() {
        setup();
        register("fade", [CompiledStyle::new().set("opacity", StyleValue::Number(0.0)).animated()]);
        register("ease", [CompiledStyle::new().set("color", Rgba::BLACK.into()).transition()]);

        let slots = vec![
            ("opacity".to_string(), StyledSlot::classes("fade")),
            ("color".to_string(), StyledSlot::classes("ease")),
        ];
        let meta = flatten(&slots, &InteractionSignals::new());
        assert_eq!(meta.animation_interop_key.as_deref(), Some("color:opacity"));

        let interop = meta.animation_interop().unwrap();
        assert!(interop.animated_props.contains("opacity"));
        assert!(interop.transition_props.contains("color"));
    }

    #[test]
    fn test_no_animation_no_key() {
        setup();
        register("p-4", [CompiledStyle::new().set("padding", StyleValue::Number(16.0))]);
        let meta = flatten(&slot("p-4"), &InteractionSignals::new());
        assert!(meta.animation_interop_key.is_none());
        assert!(meta.animation_interop().is_none());
    }

    #[test]
    fn test_slots_have_meta() {
        setup();
        register("p-4", [CompiledStyle::new().set("padding", StyleValue::Number(16.0))]);
        register("fade", [CompiledStyle::new().animated()]);

        assert!(!slots_have_meta(&slot("p-4")));
        assert!(slots_have_meta(&slot("p-4 fade")));
    }

    #[test]
    fn test_inline_variable_reference_needs_wrapper() {
        setup();
        register("p-4", [CompiledStyle::new().set("padding", StyleValue::Number(16.0))]);

        let plain = StyleFragment::inline([("opacity", StyleValue::Number(0.5))]);
        let themed = StyleFragment::inline([("color", StyleValue::var("--accent"))]);
        let slots = |inline: &Rc<StyleFragment>| {
            vec![(
                "style".to_string(),
                StyledSlot::classes("p-4").with_inline(Rc::clone(inline)),
            )]
        };

        assert!(!slots_have_meta(&slots(&plain)));
        assert!(slots_have_meta(&slots(&themed)));

        let meta = flatten(&slots(&themed), &InteractionSignals::new());
        assert!(meta.styled_props_meta["style"].uses_variables);
    }

    #[test]
    fn test_scheme_condition_follows_store() {
        setup();
        color_scheme::reset(Rc::new(ManualAppearance::new(Some(ColorScheme::Light))));
        register("text-black", [CompiledStyle::new().set("color", Rgba::BLACK.into())]);
        register(
            "dark:text-white",
            [CompiledStyle::new().set("color", Rgba::WHITE.into()).dark()],
        );

        let slots = slot("text-black dark:text-white");
        assert!(slots_have_meta(&slots));

        let interaction = InteractionSignals::new();
        assert_eq!(color(&flatten(&slots, &interaction)), Some(Rgba::BLACK.into()));

        color_scheme::set(SchemeSetting::Dark);
        let meta = flatten(&slots, &interaction);
        assert_eq!(color(&meta), Some(Rgba::WHITE.into()));
        assert_eq!(meta.render_variant(), RenderVariant::Plain);
    }
}
