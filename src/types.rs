//! Core types for spark-css-interop.
//!
//! These types flow from the registry through the resolution pipeline to the
//! host: colors, style values, resolved styles, color schemes, pseudo-class
//! flags and component types.

use std::collections::BTreeMap;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::InteropError;

// =============================================================================
// Color
// =============================================================================

/// RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Create a new RGBA color.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
}

// =============================================================================
// Style Values
// =============================================================================

/// Reference to a custom variable (`var(--name, fallback)`).
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub name: String,
    pub fallback: Option<Box<StyleValue>>,
}

/// One property value as authored by the stylesheet compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// Unitless number (lengths, opacity, weights).
    Number(f32),
    /// Color.
    Color(Rgba),
    /// Keyword or any other string value.
    Keyword(String),
    /// Custom variable reference, resolved at render time.
    Var(VarRef),
}

impl StyleValue {
    /// `var(--name)` with no fallback.
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(VarRef {
            name: name.into(),
            fallback: None,
        })
    }

    /// `var(--name, fallback)`.
    pub fn var_or(name: impl Into<String>, fallback: StyleValue) -> Self {
        Self::Var(VarRef {
            name: name.into(),
            fallback: Some(Box::new(fallback)),
        })
    }

    /// Whether resolving this value needs the variable chain.
    pub fn references_variables(&self) -> bool {
        matches!(self, Self::Var(_))
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<f32> for StyleValue {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<Rgba> for StyleValue {
    fn from(value: Rgba) -> Self {
        Self::Color(value)
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        Self::Keyword(value.to_string())
    }
}

// =============================================================================
// Style
// =============================================================================

/// A resolved property → value map. Values never contain `Var` references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    props: BTreeMap<String, StyleValue>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, prop: &str) -> Option<&StyleValue> {
        self.props.get(prop)
    }

    pub fn insert(&mut self, prop: impl Into<String>, value: StyleValue) {
        self.props.insert(prop.into(), value);
    }

    pub fn remove(&mut self, prop: &str) -> Option<StyleValue> {
        self.props.remove(prop)
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StyleValue)> {
        self.props.iter()
    }
}

impl FromIterator<(String, StyleValue)> for Style {
    fn from_iter<I: IntoIterator<Item = (String, StyleValue)>>(iter: I) -> Self {
        Self {
            props: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Color Scheme
// =============================================================================

/// The effective appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub const fn toggled(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// What the user asked for: a fixed scheme, or follow the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeSetting {
    Light,
    Dark,
    System,
}

impl From<ColorScheme> for SchemeSetting {
    fn from(scheme: ColorScheme) -> Self {
        match scheme {
            ColorScheme::Light => Self::Light,
            ColorScheme::Dark => Self::Dark,
        }
    }
}

impl FromStr for SchemeSetting {
    type Err = InteropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            _ => Err(InteropError::UnknownColorScheme {
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// Pseudo Classes
// =============================================================================

bitflags! {
    /// Interactive pseudo-states a style can depend on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PseudoClasses: u8 {
        const HOVER = 1 << 0;
        const ACTIVE = 1 << 1;
        const FOCUS = 1 << 2;
    }
}

// =============================================================================
// Layout
// =============================================================================

/// Measured size reported by the host's layout event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
}

// =============================================================================
// Component Types
// =============================================================================

/// Host component types the interop layer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    View,
    Pressable,
    Text,
    TextInput,
    Image,
    ImageBackground,
    ScrollView,
    FlatList,
    ActivityIndicator,
    /// Any other host or user component, by name.
    Custom(&'static str),
}

impl ComponentType {
    /// The type to render for a variant. Only a plain `View` is upgraded.
    pub const fn with_variant(self, variant: RenderVariant) -> Self {
        match (self, variant) {
            (Self::View, RenderVariant::Interactive) => Self::Pressable,
            (other, _) => other,
        }
    }
}

/// Closed set of render-time capabilities, chosen from pseudo-class needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderVariant {
    #[default]
    Plain,
    Interactive,
}

impl RenderVariant {
    pub fn from_pseudo_classes(pseudo: PseudoClasses) -> Self {
        if pseudo.is_empty() {
            Self::Plain
        } else {
            Self::Interactive
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_arrive_parsed() {
        assert_eq!(Rgba::rgb(255, 115, 179), Rgba::new(255, 115, 179, 255));
        assert_eq!(Rgba::TRANSPARENT.a, 0);
        assert_eq!(StyleValue::from(Rgba::BLACK).as_color(), Some(Rgba::BLACK));
        assert_eq!(StyleValue::from("#000").as_color(), None);
    }

    #[test]
    fn test_scheme_setting_from_str() {
        assert_eq!("dark".parse::<SchemeSetting>(), Ok(SchemeSetting::Dark));
        assert_eq!("System".parse::<SchemeSetting>(), Ok(SchemeSetting::System));
        assert!("sepia".parse::<SchemeSetting>().is_err());
    }

    #[test]
    fn test_only_view_is_upgraded() {
        assert_eq!(
            ComponentType::View.with_variant(RenderVariant::Interactive),
            ComponentType::Pressable
        );
        assert_eq!(
            ComponentType::View.with_variant(RenderVariant::Plain),
            ComponentType::View
        );
        assert_eq!(
            ComponentType::Text.with_variant(RenderVariant::Interactive),
            ComponentType::Text
        );
    }

    #[test]
    fn test_render_variant_from_pseudo_classes() {
        assert_eq!(RenderVariant::from_pseudo_classes(PseudoClasses::empty()), RenderVariant::Plain);
        assert_eq!(
            RenderVariant::from_pseudo_classes(PseudoClasses::FOCUS),
            RenderVariant::Interactive
        );
    }
}
