//! Style fragments and their metadata.
//!
//! A `StyleFragment` is one compiled rule's payload for one class name. The
//! stylesheet compiler hands the registry `CompiledStyle`s (declarations plus
//! metadata hints); registration splits custom properties (`--name`) out into
//! `StyleMeta::variables` and freezes the rest into a shared fragment.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::types::{ColorScheme, PseudoClasses, StyleValue};

// =============================================================================
// StyleFragment
// =============================================================================

/// Immutable compiled style payload. Shared by identity as `Rc<StyleFragment>`.
///
/// Fragments must never be deep-cloned between registration and lookup:
/// metadata is keyed by the `Rc` allocation, and a clone has none.
#[derive(Debug, PartialEq, Default)]
pub struct StyleFragment {
    declarations: Vec<(String, StyleValue)>,
}

impl StyleFragment {
    pub fn new<K: Into<String>>(declarations: impl IntoIterator<Item = (K, StyleValue)>) -> Self {
        Self {
            declarations: declarations
                .into_iter()
                .map(|(prop, value)| (prop.into(), value))
                .collect(),
        }
    }

    /// A shared fragment for a directly-supplied inline style. Carries no metadata.
    pub fn inline<K: Into<String>>(
        declarations: impl IntoIterator<Item = (K, StyleValue)>,
    ) -> Rc<Self> {
        Rc::new(Self::new(declarations))
    }

    /// Declarations in authored order.
    pub fn declarations(&self) -> &[(String, StyleValue)] {
        &self.declarations
    }

    /// Effective value of `prop` within this fragment (last occurrence wins).
    pub fn get(&self, prop: &str) -> Option<&StyleValue> {
        self.declarations
            .iter()
            .rev()
            .find(|(name, _)| name == prop)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Whether any value is a `var()` reference.
    pub fn references_variables(&self) -> bool {
        self.declarations
            .iter()
            .any(|(_, value)| value.references_variables())
    }
}

// =============================================================================
// Containers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerType {
    #[default]
    Normal,
    Size,
    InlineSize,
}

/// `container-name` / `container-type` declared by a fragment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContainerDeclaration {
    pub names: Vec<String>,
    pub kind: ContainerType,
}

/// Condition on the nearest ancestor container of a name.
///
/// `name: None` targets the nearest container of any name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContainerQuery {
    pub name: Option<String>,
    pub pseudo_classes: PseudoClasses,
    pub min_width: Option<f32>,
    pub max_width: Option<f32>,
}

impl ContainerQuery {
    /// Query the nearest container named `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Query the nearest container of any name.
    pub fn nearest() -> Self {
        Self::default()
    }

    pub fn hover(mut self) -> Self {
        self.pseudo_classes |= PseudoClasses::HOVER;
        self
    }

    pub fn active(mut self) -> Self {
        self.pseudo_classes |= PseudoClasses::ACTIVE;
        self
    }

    pub fn focus(mut self) -> Self {
        self.pseudo_classes |= PseudoClasses::FOCUS;
        self
    }

    pub fn min_width(mut self, width: f32) -> Self {
        self.min_width = Some(width);
        self
    }

    pub fn max_width(mut self, width: f32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn has_size_condition(&self) -> bool {
        self.min_width.is_some() || self.max_width.is_some()
    }
}

// =============================================================================
// StyleMeta
// =============================================================================

/// What a fragment needs beyond its static payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleMeta {
    /// Custom properties declared by the rule.
    pub variables: BTreeMap<String, StyleValue>,
    /// Some value is a `var()` reference.
    pub uses_variables: bool,
    pub animations: bool,
    pub transition: bool,
    pub container: Option<ContainerDeclaration>,
    pub container_queries: Vec<ContainerQuery>,
    /// The rule only applies while these states are active.
    pub pseudo_classes: PseudoClasses,
    /// The rule only applies under this color scheme (`dark:` / `light:`).
    pub color_scheme: Option<ColorScheme>,
    pub requires_layout: bool,
}

impl StyleMeta {
    /// No special requirements: the fragment can be applied statically.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// CompiledStyle
// =============================================================================

/// One rule as emitted by the stylesheet compiler, before registration.
///
/// ```
/// use spark_css_interop::engine::{CompiledStyle, ContainerQuery};
/// use spark_css_interop::{Rgba, StyleValue};
///
/// let hover_bg = CompiledStyle::new()
///     .set("backgroundColor", Rgba::rgb(255, 0, 0).into())
///     .hover();
///
/// let group_hover_text = CompiledStyle::new()
///     .set("color", StyleValue::var("--color-primary"))
///     .query(ContainerQuery::named("group").hover());
/// # let _ = (hover_bg, group_hover_text);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledStyle {
    pub declarations: Vec<(String, StyleValue)>,
    pub meta: StyleMeta,
}

impl CompiledStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration. Names starting with `--` become declared variables.
    pub fn set(mut self, prop: impl Into<String>, value: StyleValue) -> Self {
        self.declarations.push((prop.into(), value));
        self
    }

    pub fn hover(mut self) -> Self {
        self.meta.pseudo_classes |= PseudoClasses::HOVER;
        self
    }

    pub fn active(mut self) -> Self {
        self.meta.pseudo_classes |= PseudoClasses::ACTIVE;
        self
    }

    pub fn focus(mut self) -> Self {
        self.meta.pseudo_classes |= PseudoClasses::FOCUS;
        self
    }

    pub fn dark(mut self) -> Self {
        self.meta.color_scheme = Some(ColorScheme::Dark);
        self
    }

    pub fn light(mut self) -> Self {
        self.meta.color_scheme = Some(ColorScheme::Light);
        self
    }

    pub fn animated(mut self) -> Self {
        self.meta.animations = true;
        self
    }

    pub fn transition(mut self) -> Self {
        self.meta.transition = true;
        self
    }

    pub fn requires_layout(mut self) -> Self {
        self.meta.requires_layout = true;
        self
    }

    /// Declare this rule's element a container under `names`.
    pub fn container<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        let declaration = self.meta.container.get_or_insert_with(ContainerDeclaration::default);
        declaration.names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn container_type(mut self, kind: ContainerType) -> Self {
        self.meta
            .container
            .get_or_insert_with(ContainerDeclaration::default)
            .kind = kind;
        self
    }

    /// Only apply while the nearest matching container satisfies `query`.
    pub fn query(mut self, query: ContainerQuery) -> Self {
        self.meta.container_queries.push(query);
        self
    }

    /// Split into the frozen fragment and its derived metadata.
    pub(crate) fn into_parts(self) -> (StyleFragment, StyleMeta) {
        let Self {
            declarations,
            mut meta,
        } = self;

        let mut payload = Vec::with_capacity(declarations.len());
        for (prop, value) in declarations {
            if prop.starts_with("--") {
                meta.variables.insert(prop, value);
            } else {
                payload.push((prop, value));
            }
        }

        let fragment = StyleFragment {
            declarations: payload,
        };
        meta.uses_variables |= fragment.references_variables();
        (fragment, meta)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgba;

    #[test]
    fn test_fragment_last_occurrence_wins() {
        let fragment = StyleFragment::new([
            ("opacity", StyleValue::Number(0.5)),
            ("opacity", StyleValue::Number(1.0)),
        ]);
        assert_eq!(fragment.get("opacity"), Some(&StyleValue::Number(1.0)));
        assert_eq!(fragment.get("color"), None);
    }

    #[test]
    fn test_into_parts_splits_custom_properties() {
        let (fragment, meta) = CompiledStyle::new()
            .set("--color-primary", Rgba::rgb(255, 115, 179).into())
            .set("color", StyleValue::var("--color-primary"))
            .into_parts();

        assert_eq!(fragment.declarations().len(), 1);
        assert_eq!(
            meta.variables.get("--color-primary"),
            Some(&StyleValue::Color(Rgba::rgb(255, 115, 179)))
        );
        assert!(meta.uses_variables);
    }

    #[test]
    fn test_plain_style_has_empty_meta() {
        let (_, meta) = CompiledStyle::new()
            .set("backgroundColor", Rgba::BLACK.into())
            .into_parts();
        assert!(meta.is_empty());
    }

    #[test]
    fn test_scheme_condition_is_meta() {
        let (_, meta) = CompiledStyle::new()
            .set("color", Rgba::WHITE.into())
            .dark()
            .into_parts();
        assert_eq!(meta.color_scheme, Some(ColorScheme::Dark));
        assert!(!meta.is_empty());
    }

    #[test]
    fn test_container_builder() {
        let (_, meta) = CompiledStyle::new()
            .container(["card", "group"])
            .container_type(ContainerType::Size)
            .into_parts();
        let container = meta.container.unwrap();
        assert_eq!(container.names, vec!["card".to_string(), "group".to_string()]);
        assert_eq!(container.kind, ContainerType::Size);
    }

    #[test]
    fn test_query_builder() {
        let query = ContainerQuery::named("card").hover().min_width(100.0);
        assert_eq!(query.name.as_deref(), Some("card"));
        assert!(query.pseudo_classes.contains(PseudoClasses::HOVER));
        assert!(query.has_size_condition());
        assert!(!ContainerQuery::nearest().has_size_condition());
    }
}
