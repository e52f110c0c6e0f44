//! Prop Mapping - Which prop receives which class-derived style.
//!
//! A component can accept several class-name props (`className`,
//! `contentContainerClassName`, ...). Each feeds one style slot named after
//! the target style prop. Some hosts take a style value as a plain prop
//! (`ActivityIndicator` reads `color`), so a mapping can also lift a resolved
//! style property out of a slot into a prop.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::ComponentType;

/// Where a class-name prop's resolved style goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingTarget {
    /// Into the named style prop (`className` → `style`).
    Style(String),
    /// Into a style slot named after the class-name prop itself.
    Itself,
}

/// Move one resolved style property out of a slot into a plain prop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeStyleToProp {
    pub slot: String,
    pub style_prop: String,
    pub target_prop: String,
}

/// Class-name prop → style slot table for one component type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropMapping {
    entries: Vec<(String, MappingTarget)>,
    native_style_to_prop: Vec<NativeStyleToProp>,
}

impl PropMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// `class_prop` feeds the style prop `style_prop`.
    pub fn map(mut self, class_prop: impl Into<String>, style_prop: impl Into<String>) -> Self {
        self.entries
            .push((class_prop.into(), MappingTarget::Style(style_prop.into())));
        self
    }

    /// `class_prop` is its own style slot.
    pub fn map_to_self(mut self, class_prop: impl Into<String>) -> Self {
        self.entries.push((class_prop.into(), MappingTarget::Itself));
        self
    }

    /// Lift `style_prop` out of `slot` into the prop `target_prop`.
    pub fn extract(
        mut self,
        slot: impl Into<String>,
        style_prop: impl Into<String>,
        target_prop: impl Into<String>,
    ) -> Self {
        self.native_style_to_prop.push(NativeStyleToProp {
            slot: slot.into(),
            style_prop: style_prop.into(),
            target_prop: target_prop.into(),
        });
        self
    }

    /// `(class prop, slot name)` pairs in declaration order.
    pub fn slots(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(class_prop, target)| {
            let slot = match target {
                MappingTarget::Style(style_prop) => style_prop.as_str(),
                MappingTarget::Itself => class_prop.as_str(),
            };
            (class_prop.as_str(), slot)
        })
    }

    /// Slot fed by `class_prop`, if mapped.
    pub fn slot_for(&self, class_prop: &str) -> Option<&str> {
        self.slots()
            .find(|(prop, _)| *prop == class_prop)
            .map(|(_, slot)| slot)
    }

    pub fn native_style_to_prop(&self) -> &[NativeStyleToProp] {
        &self.native_style_to_prop
    }

    /// Built-in table for a host component.
    pub fn for_component(component: ComponentType) -> Self {
        let base = Self::new().map("className", "style");
        match component {
            ComponentType::ScrollView => base
                .map("contentContainerClassName", "contentContainerStyle")
                .map("indicatorClassName", "indicatorStyle"),
            ComponentType::FlatList => base
                .map("contentContainerClassName", "contentContainerStyle")
                .map("indicatorClassName", "indicatorStyle")
                .map("columnWrapperClassName", "columnWrapperStyle")
                .map("ListHeaderComponentClassName", "ListHeaderComponentStyle")
                .map("ListFooterComponentClassName", "ListFooterComponentStyle"),
            ComponentType::ImageBackground => base.map("imageClassName", "imageStyle"),
            ComponentType::ActivityIndicator => base.extract("style", "color", "color"),
            ComponentType::View
            | ComponentType::Pressable
            | ComponentType::Text
            | ComponentType::TextInput
            | ComponentType::Image
            | ComponentType::Custom(_) => base,
        }
    }
}

// =============================================================================
// Component Mapping Table
// =============================================================================

thread_local! {
    static COMPONENT_MAPPINGS: RefCell<HashMap<ComponentType, Rc<PropMapping>>> =
        RefCell::new(HashMap::new());
}

/// Override the table used for `component`.
pub fn register_component_mapping(component: ComponentType, mapping: PropMapping) {
    tracing::debug!(?component, "registered prop mapping");
    COMPONENT_MAPPINGS.with(|map| {
        map.borrow_mut().insert(component, Rc::new(mapping));
    });
}

/// Registered table for `component`, or its built-in default.
pub fn mapping_for(component: ComponentType) -> Rc<PropMapping> {
    COMPONENT_MAPPINGS.with(|map| {
        map.borrow_mut()
            .entry(component)
            .or_insert_with(|| Rc::new(PropMapping::for_component(component)))
            .clone()
    })
}

/// Drop every registered table (for testing).
pub fn reset_component_mappings() {
    COMPONENT_MAPPINGS.with(|map| map.borrow_mut().clear());
}
