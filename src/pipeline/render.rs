//! Tree Renderer - Resolve a whole element tree across render passes.
//!
//! A minimal host loop around `css_interop`: it keeps one `InteropDecision`
//! per element and one `InteropWrapper` per wrapped element (identified by
//! position and key), provides each wrapper's scopes to its subtree, and
//! drops state whose element left the tree. Wrappers report tracked changes by marking the renderer dirty.
//!
//! # Example
//!
//! ```
//! use spark_css_interop::engine::{register, CompiledStyle};
//! use spark_css_interop::pipeline::Renderer;
//! use spark_css_interop::primitives::{Element, HostEvent};
//! use spark_css_interop::{ComponentType, StyleValue};
//!
//! register("hover:fade", [CompiledStyle::new().set("opacity", StyleValue::Number(0.5)).hover()]);
//!
//! let renderer = Renderer::new();
//! let tree = Element::new(ComponentType::View).prop("className", "hover:fade");
//!
//! let output = renderer.render(&tree);
//! assert_eq!(output.component, ComponentType::Pressable);
//!
//! let hover_in = output.props.handler("onHoverIn").unwrap().clone();
//! hover_in(&HostEvent::HoverIn);
//! assert!(renderer.needs_render());
//!
//! let output = renderer.render(&tree);
//! assert_eq!(
//!     output.style("style").and_then(|s| s.get("opacity")),
//!     Some(&StyleValue::Number(0.5))
//! );
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::engine::mapping_for;
use crate::primitives::Element;
use crate::state::{current, provide};

use super::interop::{css_interop_cached, Interop, InteropDecision, InteropWrapper};

type NodePath = Vec<String>;

/// Keeps wrappers alive between render passes.
pub struct Renderer {
    decisions: RefCell<HashMap<NodePath, Rc<InteropDecision>>>,
    wrappers: RefCell<HashMap<NodePath, Rc<InteropWrapper>>>,
    dirty: Rc<Cell<bool>>,
    passes: Cell<u64>,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            decisions: RefCell::new(HashMap::new()),
            wrappers: RefCell::new(HashMap::new()),
            dirty: Rc::new(Cell::new(false)),
            passes: Cell::new(0),
        }
    }

    /// Resolve `root` and its subtree into host elements.
    pub fn render(&self, root: &Element) -> Element {
        self.dirty.set(false);
        let pass = self.passes.get() + 1;
        self.passes.set(pass);

        let mut seen = HashSet::new();
        let mut path = Vec::new();
        let output = self.render_node(root, 0, &mut path, &mut seen);

        self.decisions.borrow_mut().retain(|path, _| seen.contains(path));
        let mut wrappers = self.wrappers.borrow_mut();
        let before = wrappers.len();
        wrappers.retain(|path, _| seen.contains(path));
        tracing::debug!(
            pass,
            wrappers = wrappers.len(),
            unmounted = before - wrappers.len(),
            "render pass"
        );

        output
    }

    /// Whether a wrapper asked for another pass since the last `render`.
    pub fn needs_render(&self) -> bool {
        self.dirty.get()
    }

    /// Number of live wrappers.
    pub fn wrapper_count(&self) -> usize {
        self.wrappers.borrow().len()
    }

    pub fn pass_count(&self) -> u64 {
        self.passes.get()
    }

    /// Fast-path decisions evaluated by the elements currently in the tree.
    pub fn decision_count(&self) -> u64 {
        self.decisions
            .borrow()
            .values()
            .map(|decision| decision.evaluation_count())
            .sum()
    }

    fn decision(&self, path: &NodePath) -> Rc<InteropDecision> {
        self.decisions
            .borrow_mut()
            .entry(path.clone())
            .or_default()
            .clone()
    }

    fn wrapper(&self, path: &NodePath) -> Rc<InteropWrapper> {
        let mut wrappers = self.wrappers.borrow_mut();
        let dirty = Rc::clone(&self.dirty);
        wrappers
            .entry(path.clone())
            .or_insert_with(|| Rc::new(InteropWrapper::new(move || dirty.set(true))))
            .clone()
    }

    fn render_node(
        &self,
        element: &Element,
        index: usize,
        path: &mut NodePath,
        seen: &mut HashSet<NodePath>,
    ) -> Element {
        let segment = match &element.key {
            Some(key) => format!("{:?}:{key}", element.component),
            None => format!("{:?}#{index}", element.component),
        };
        path.push(segment);
        seen.insert(path.clone());

        let mapping = mapping_for(element.component);
        let decision = self.decision(path);
        let output = match css_interop_cached(element.clone(), &mapping, &decision) {
            Interop::Static(mut output) => {
                self.wrappers.borrow_mut().remove(&*path);
                output.children = self.render_children(&output.children, path, seen);
                output
            }
            Interop::Wrapped(wrapped) => {
                let wrapper = self.wrapper(path);
                let mut output = wrapper.render(&wrapped, &current());
                output.children = match output.provides.clone() {
                    Some(context) => {
                        provide(context, || self.render_children(&output.children, path, seen))
                    }
                    None => self.render_children(&output.children, path, seen),
                };
                output
            }
        };

        path.pop();
        output
    }

    fn render_children(
        &self,
        children: &[Element],
        path: &mut NodePath,
        seen: &mut HashSet<NodePath>,
    ) -> Vec<Element> {
        children
            .iter()
            .enumerate()
            .map(|(index, child)| self.render_node(child, index, path, seen))
            .collect()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
