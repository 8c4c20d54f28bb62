//! Test-only components, collaborators and request builders.

use std::cell::Cell;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::core::checksum::ChecksumValidator;
use crate::core::component::{Component, ComponentFactory, Render};
use crate::core::envelope::{Action, ActionKind};
use crate::core::error::Error;
use crate::core::state::{Fields, Record, StateNode, assign};

/// Secret used by test validators.
pub const TEST_SECRET: &str = "not-a-secret";

/// Counter with one method that can fail.
#[derive(Debug, Clone, PartialEq)]
pub struct Counter {
    id: String,
    pub count: i64,
    pub label: String,
}

impl Counter {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            count: 0,
            label: "Counter".to_string(),
        }
    }
}

impl Fields for Counter {
    fn has_field(&self, name: &str) -> bool {
        matches!(name, "count" | "label")
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "count" => Some(json!(self.count)),
            "label" => Some(json!(self.label)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match name {
            "count" => assign(&mut self.count, value),
            "label" => assign(&mut self.label, value),
            _ => false,
        }
    }
}

impl Component for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert("count".to_string(), json!(self.count));
        attributes.insert("label".to_string(), json!(self.label));
        attributes
    }

    fn methods(&self) -> &'static [&'static str] {
        &["increment", "decrement", "set_label"]
    }

    fn call_method(&mut self, method: &str, args: Vec<Value>) -> Result<()> {
        match method {
            "increment" => self.count += 1,
            "decrement" => {
                if self.count == 0 {
                    bail!("count cannot go below zero");
                }
                self.count -= 1;
            }
            "set_label" => match args.first().and_then(Value::as_str) {
                Some(label) => self.label = label.to_string(),
                None => bail!("set_label expects a string"),
            },
            other => bail!("no method {other}"),
        }
        Ok(())
    }
}

/// Nested field object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub age: u32,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: "Neil".to_string(),
            age: 60,
        }
    }
}

impl Fields for Author {
    fn has_field(&self, name: &str) -> bool {
        matches!(name, "name" | "age")
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(json!(self.name)),
            "age" => Some(json!(self.age)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match name {
            "name" => assign(&mut self.name, value),
            "age" => assign(&mut self.age, value),
            _ => false,
        }
    }
}

/// Component exercising every container kind: a typed field object
/// (`author`), an external record (`publisher`) and a plain mapping (`tags`).
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    id: String,
    pub title: String,
    pub author: Author,
    pub publisher: Record,
    pub tags: Map<String, Value>,
}

impl Book {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: "American Gods".to_string(),
            author: Author::default(),
            publisher: Record::new(object(json!({
                "name": "Headline",
                "address": {"city": "London"}
            }))),
            tags: object(json!({"genre": "fantasy"})),
        }
    }
}

impl Fields for Book {
    fn has_field(&self, name: &str) -> bool {
        matches!(name, "title" | "author" | "publisher" | "tags")
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "title" => Some(json!(self.title)),
            "author" => serde_json::to_value(&self.author).ok(),
            "publisher" => Some(self.publisher.to_value()),
            "tags" => Some(Value::Object(self.tags.clone())),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match name {
            "title" => assign(&mut self.title, value),
            "author" => assign(&mut self.author, value),
            "tags" => assign(&mut self.tags, value),
            _ => false,
        }
    }

    fn node_mut(&mut self, name: &str) -> Option<StateNode<'_>> {
        match name {
            "author" => Some(StateNode::Fields(&mut self.author)),
            "publisher" => Some(StateNode::External(&mut self.publisher)),
            "tags" => Some(StateNode::Map(&mut self.tags)),
            _ => None,
        }
    }
}

impl Component for Book {
    fn name(&self) -> &str {
        "book"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> Map<String, Value> {
        ["title", "author", "publisher", "tags"]
            .into_iter()
            .filter_map(|name| Some((name.to_string(), self.get_field(name)?)))
            .collect()
    }

    fn methods(&self) -> &'static [&'static str] {
        &["retitle"]
    }

    fn call_method(&mut self, method: &str, args: Vec<Value>) -> Result<()> {
        match (method, args.first()) {
            ("retitle", Some(Value::String(title))) => self.title = title.clone(),
            ("retitle", _) => self.title = String::new(),
            (other, _) => bail!("no method {other}"),
        }
        Ok(())
    }
}

/// Factory that always builds fresh instances and counts what it was asked.
#[derive(Debug, Default)]
pub struct StaticFactory {
    created: Cell<usize>,
    fresh: Cell<usize>,
    released: Cell<usize>,
}

impl StaticFactory {
    /// Calls made with `skip_cache` set.
    pub fn fresh_builds(&self) -> usize {
        self.fresh.get()
    }

    pub fn created(&self) -> usize {
        self.created.get()
    }

    pub fn released(&self) -> usize {
        self.released.get()
    }
}

impl ComponentFactory for StaticFactory {
    fn create(
        &self,
        id: &str,
        name: &str,
        skip_cache: bool,
    ) -> crate::core::error::Result<Box<dyn Component>> {
        self.created.set(self.created.get() + 1);
        if skip_cache {
            self.fresh.set(self.fresh.get() + 1);
        }
        match name {
            "counter" => Ok(Box::new(Counter::new(id))),
            "book" => Ok(Box::new(Book::new(id))),
            other => Err(Error::validation(format!("Unknown component '{other}'"))),
        }
    }

    fn release(&self, _component: Box<dyn Component>) {
        self.released.set(self.released.get() + 1);
    }
}

/// Renders `<name id="..">{attributes json}</name>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoRenderer;

impl Render for EchoRenderer {
    fn render(&self, component: &dyn Component) -> Result<String> {
        let attributes = serde_json::to_string(&component.attributes())?;
        Ok(format!(
            "<{name} id=\"{id}\">{attributes}</{name}>",
            name = component.name(),
            id = component.id(),
        ))
    }
}

/// Renderer that always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrokenRenderer;

impl Render for BrokenRenderer {
    fn render(&self, _component: &dyn Component) -> Result<String> {
        bail!("template missing")
    }
}

pub fn sync_input(path: &str, value: Value) -> Action {
    Action {
        kind: ActionKind::SyncInput,
        payload: object(json!({"name": path, "value": value})),
    }
}

pub fn call_method(name: &str) -> Action {
    Action {
        kind: ActionKind::CallMethod,
        payload: object(json!({"name": name})),
    }
}

/// Request body for `id` carrying `data`, signed with `validator`.
pub fn signed_body(
    validator: &ChecksumValidator,
    id: &str,
    data: Value,
    action_queue: Value,
) -> Vec<u8> {
    let checksum = validator
        .generate(&object(data.clone()))
        .expect("checksum");
    json!({
        "id": id,
        "data": data,
        "checksum": checksum,
        "actionQueue": action_queue,
    })
    .to_string()
    .into_bytes()
}

/// Unwrap a JSON object literal.
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}
