//! Ordered application of a request's action queue.
//!
//! Actions run strictly in client order; a later action sees every effect of
//! the earlier ones. The first error aborts the queue. Nothing is rolled back:
//! actions applied before the failure keep their effect on the component.
//!
//! Unresolved targets (unknown paths, methods, assignment targets) are skipped
//! silently unless strict mode is on, in which case they abort like any other
//! error.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::call::{CallKind, MethodCall, classify};
use crate::core::component::{Component, ComponentFactory, root_node};
use crate::core::envelope::{Action, ActionKind};
use crate::core::error::{Error, Result};
use crate::core::path::{self, SetOutcome};
use crate::core::state::{Fields, StateNode};

/// Apply client `data` to a component before the queue runs.
///
/// Nested field objects and records are filled key by key; every other known
/// field is assigned directly. Unknown names are ignored.
pub fn hydrate(component: &mut dyn Component, data: &Map<String, Value>) {
    hydrate_node(root_node(component), data);
}

fn hydrate_node(mut node: StateNode<'_>, data: &Map<String, Value>) {
    for (name, value) in data {
        if !node.has(name) {
            continue;
        }
        let nested = match (&mut node, value) {
            (StateNode::Fields(fields), Value::Object(inner)) => {
                structured_child(&mut **fields, name).map(|child| (child, inner))
            }
            (StateNode::External(record), Value::Object(inner)) => {
                structured_child(&mut **record, name).map(|child| (child, inner))
            }
            _ => None,
        };
        match nested {
            Some((child, inner)) => hydrate_node(child, inner),
            None => {
                node.set(name, value.clone());
            }
        }
    }
}

fn structured_child<'n>(fields: &'n mut dyn Fields, name: &str) -> Option<StateNode<'n>> {
    fields.node_mut(name).filter(|child| child.is_structured())
}

/// Runs an action queue against one component instance.
pub struct ActionDispatcher<'a> {
    factory: &'a dyn ComponentFactory,
    component_name: &'a str,
    component_id: &'a str,
    strict: bool,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(
        factory: &'a dyn ComponentFactory,
        component_name: &'a str,
        component_id: &'a str,
    ) -> Self {
        Self {
            factory,
            component_name,
            component_id,
            strict: false,
        }
    }

    /// Raise [`Error::Unresolved`] instead of skipping unresolved targets.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Apply every action in order, updating `component` and `snapshot`.
    ///
    /// `component` may be replaced wholesale by a `reset` action.
    pub fn apply_queue(
        &self,
        component: &mut Box<dyn Component>,
        snapshot: &mut Map<String, Value>,
        queue: &[Action],
    ) -> Result<()> {
        for (index, action) in queue.iter().enumerate() {
            if let Err(err) = self.apply(component, snapshot, action) {
                warn!(
                    component_id = self.component_id,
                    index,
                    kind = err.kind(),
                    error = %err,
                    "action queue aborted"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    /// Apply a single action.
    pub fn apply(
        &self,
        component: &mut Box<dyn Component>,
        snapshot: &mut Map<String, Value>,
        action: &Action,
    ) -> Result<()> {
        match &action.kind {
            ActionKind::SyncInput => self.sync_input(&mut **component, snapshot, action),
            ActionKind::CallMethod => {
                let name = action
                    .payload_str("name")
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| Error::validation("Missing 'name' key for callMethod"))?;
                match classify(name) {
                    CallKind::Reset => self.reset(component, snapshot),
                    CallKind::Assign { target, value } => {
                        self.assign(&mut **component, snapshot, &target, value)
                    }
                    CallKind::Invoke(call) => self.invoke(&mut **component, snapshot, call),
                }
            }
            ActionKind::Unknown(kind) => Err(Error::UnknownAction(kind.clone())),
        }
    }

    fn sync_input(
        &self,
        component: &mut dyn Component,
        snapshot: &mut Map<String, Value>,
        action: &Action,
    ) -> Result<()> {
        let Some(name) = action.payload_str("name") else {
            return Ok(());
        };
        let value = match action.payload.get("value") {
            None | Some(Value::Null) => return Ok(()),
            Some(value) => value.clone(),
        };

        debug!(component_id = self.component_id, path = name, "sync input");
        match path::set(root_node(component), snapshot, name, value) {
            SetOutcome::Applied => Ok(()),
            SetOutcome::Unresolved => self.unresolved(name),
            SetOutcome::Rejected => self.rejected(name),
        }
    }

    fn reset(
        &self,
        component: &mut Box<dyn Component>,
        snapshot: &mut Map<String, Value>,
    ) -> Result<()> {
        debug!(component_id = self.component_id, "reset");
        let fresh = self
            .factory
            .create(self.component_id, self.component_name, true)?;
        *snapshot = fresh.attributes();
        *component = fresh;
        Ok(())
    }

    fn assign(
        &self,
        component: &mut dyn Component,
        snapshot: &mut Map<String, Value>,
        target: &str,
        value: Value,
    ) -> Result<()> {
        debug!(component_id = self.component_id, field = target, "assign");
        if !component.has_field(target) {
            return self.unresolved(target);
        }
        if !component.set_field(target, value.clone()) {
            return self.rejected(target);
        }
        let stored = component.get_field(target).unwrap_or(value);
        snapshot.insert(target.to_string(), stored);
        Ok(())
    }

    fn invoke(
        &self,
        component: &mut dyn Component,
        snapshot: &mut Map<String, Value>,
        call: MethodCall,
    ) -> Result<()> {
        if !component.methods().iter().any(|method| *method == call.name) {
            return self.unresolved(&call.name);
        }

        debug!(
            component_id = self.component_id,
            method = %call.name,
            args = call.args.len(),
            "call method"
        );
        let MethodCall { name, args } = call;
        component
            .call_method(&name, args)
            .map_err(|source| Error::Method {
                method: name.clone(),
                source,
            })?;

        // Method bodies may touch any field, so refresh them all.
        snapshot.extend(component.attributes());
        Ok(())
    }

    fn unresolved(&self, target: &str) -> Result<()> {
        if self.strict {
            return Err(Error::Unresolved(target.to_string()));
        }
        debug!(component_id = self.component_id, field = target, "skipping unresolved target");
        Ok(())
    }

    fn rejected(&self, target: &str) -> Result<()> {
        if self.strict {
            return Err(Error::InvalidValue(target.to_string()));
        }
        warn!(component_id = self.component_id, field = target, "value does not fit field, skipped");
        Ok(())
    }
}
