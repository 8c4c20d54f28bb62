//! Contracts between the engine and its collaborators.
//!
//! The engine never constructs, caches or renders components itself. It asks
//! a [`ComponentFactory`] for instances and a [`Render`] implementation for
//! markup, and talks to instances only through [`Component`].

use serde_json::{Map, Value};

use crate::core::error::Result;
use crate::core::state::{AsFields, Fields, StateNode};

/// A live, server-side component instance.
pub trait Component: Fields + AsFields + Send {
    /// Registered component name, e.g. `hello-world`.
    fn name(&self) -> &str;

    /// Instance id, stable across requests.
    fn id(&self) -> &str;

    /// All public attributes, serialized. Nested field objects and records
    /// appear as JSON objects.
    fn attributes(&self) -> Map<String, Value>;

    /// Dispatch table: names accepted by [`Component::call_method`].
    fn methods(&self) -> &'static [&'static str];

    /// Invoke `method` with positional arguments.
    ///
    /// Only called with names listed in [`Component::methods`].
    fn call_method(&mut self, method: &str, args: Vec<Value>) -> anyhow::Result<()>;

    /// Template used by the render capability.
    fn template_name(&self) -> String {
        format!("{}.html", self.name())
    }
}

/// Root node for path resolution over a component.
pub fn root_node(component: &mut dyn Component) -> StateNode<'_> {
    StateNode::Fields(component.as_fields())
}

/// Creates (or looks up) component instances.
pub trait ComponentFactory {
    /// Instance for `id`. A cached instance may be returned unless
    /// `skip_cache` is set, in which case the instance must be freshly built.
    fn create(&self, id: &str, name: &str, skip_cache: bool) -> Result<Box<dyn Component>>;

    /// Hand an instance back once a request is done with it, whether the
    /// request succeeded or not.
    fn release(&self, _component: Box<dyn Component>) {}
}

/// Produces markup for the final component state.
pub trait Render {
    fn render(&self, component: &dyn Component) -> anyhow::Result<String>;
}
