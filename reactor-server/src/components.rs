//! Components served by this binary and the registry that builds them.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow, bail};
use reactor::core::component::Component;
use reactor::core::error::Error;
use reactor::core::state::{Fields, Record, StateNode, assign};
use serde_json::{Map, Value, json};

type Constructor = fn(&str) -> Box<dyn Component>;

/// Component name → constructor.
pub struct Registry {
    constructors: BTreeMap<&'static str, Constructor>,
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry with the bundled demo components.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("hello-world", |id| Box::new(HelloWorld::new(id)));
        registry.register("counter", |id| Box::new(Counter::new(id)));
        registry.register("book", |id| Box::new(Book::new(id)));
        registry
    }

    pub fn register(&mut self, name: &'static str, constructor: Constructor) {
        self.constructors.insert(name, constructor);
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    /// Fresh instance of `name` with id `id`.
    pub fn build(&self, name: &str, id: &str) -> reactor::core::error::Result<Box<dyn Component>> {
        self.constructors
            .get(name)
            .map(|constructor| constructor(id))
            .ok_or_else(|| Error::validation(format!("Unknown component '{name}'")))
    }
}

fn string_arg(args: &[Value], index: usize, method: &str) -> Result<String> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{method} expects a quoted string argument"))
}

/// Greets whoever is named in `name`.
pub struct HelloWorld {
    id: String,
    name: String,
}

impl HelloWorld {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: "World".to_string(),
        }
    }
}

impl Fields for HelloWorld {
    fn has_field(&self, name: &str) -> bool {
        name == "name"
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        (name == "name").then(|| json!(self.name))
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match name {
            "name" => assign(&mut self.name, value),
            _ => false,
        }
    }
}

impl Component for HelloWorld {
    fn name(&self) -> &str {
        "hello-world"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert("name".to_string(), json!(self.name));
        attributes
    }

    fn methods(&self) -> &'static [&'static str] {
        &["set_name", "shout"]
    }

    fn call_method(&mut self, method: &str, args: Vec<Value>) -> Result<()> {
        match method {
            "set_name" => {
                self.name = match args.first() {
                    Some(_) => string_arg(&args, 0, method)?,
                    None => "World".to_string(),
                };
            }
            "shout" => self.name = self.name.to_uppercase(),
            other => bail!("unknown method {other}"),
        }
        Ok(())
    }
}

/// Counter with a configurable step.
pub struct Counter {
    id: String,
    count: i64,
    step: i64,
}

impl Counter {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            count: 0,
            step: 1,
        }
    }
}

impl Fields for Counter {
    fn has_field(&self, name: &str) -> bool {
        matches!(name, "count" | "step")
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "count" => Some(json!(self.count)),
            "step" => Some(json!(self.step)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match name {
            "count" => assign(&mut self.count, value),
            "step" => assign(&mut self.step, value),
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
        attributes.insert("step".to_string(), json!(self.step));
        attributes
    }

    fn methods(&self) -> &'static [&'static str] {
        &["increment", "decrement", "add"]
    }

    fn call_method(&mut self, method: &str, args: Vec<Value>) -> Result<()> {
        let next = match method {
            "increment" => self.count.checked_add(self.step),
            "decrement" => self.count.checked_sub(self.step),
            // Arguments arrive as strings; `add('5')` parses the literal here.
            "add" => {
                let raw = string_arg(&args, 0, method)?;
                let amount: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("add expects an integer, got '{raw}'"))?;
                self.count.checked_add(amount)
            }
            other => bail!("unknown method {other}"),
        };
        self.count = next.ok_or_else(|| anyhow!("count overflow"))?;
        Ok(())
    }
}

/// Nested field object of [`Book`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Author {
    pub name: String,
    pub born: Option<u16>,
}

impl Fields for Author {
    fn has_field(&self, name: &str) -> bool {
        matches!(name, "name" | "born")
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(json!(self.name)),
            "born" => Some(json!(self.born)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match name {
            "name" => assign(&mut self.name, value),
            "born" => assign(&mut self.born, value),
            _ => false,
        }
    }
}

/// Book form with a nested author and a publisher row.
pub struct Book {
    id: String,
    title: String,
    author: Author,
    publisher: Record,
}

impl Book {
    pub fn new(id: &str) -> Self {
        let mut publisher = Map::new();
        publisher.insert("name".to_string(), json!("Headline"));
        publisher.insert("city".to_string(), json!("London"));
        Self {
            id: id.to_string(),
            title: "Good Omens".to_string(),
            author: Author {
                name: "Neil".to_string(),
                born: None,
            },
            publisher: Record::new(publisher),
        }
    }
}

impl Fields for Book {
    fn has_field(&self, name: &str) -> bool {
        matches!(name, "title" | "author" | "publisher")
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "title" => Some(json!(self.title)),
            "author" => serde_json::to_value(&self.author).ok(),
            "publisher" => Some(self.publisher.to_value()),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match name {
            "title" => assign(&mut self.title, value),
            "author" => assign(&mut self.author, value),
            _ => false,
        }
    }

    fn node_mut(&mut self, name: &str) -> Option<StateNode<'_>> {
        match name {
            "author" => Some(StateNode::Fields(&mut self.author)),
            "publisher" => Some(StateNode::External(&mut self.publisher)),
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
        ["title", "author", "publisher"]
            .into_iter()
            .filter_map(|name| Some((name.to_string(), self.get_field(name)?)))
            .collect()
    }

    fn methods(&self) -> &'static [&'static str] {
        &["retitle", "credit"]
    }

    fn call_method(&mut self, method: &str, args: Vec<Value>) -> Result<()> {
        match method {
            "retitle" => self.title = string_arg(&args, 0, method)?,
            "credit" => {
                self.author.name = string_arg(&args, 0, method)?;
                self.author.born = None;
            }
            other => bail!("unknown method {other}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_builds_known_components() {
        let registry = Registry::with_defaults();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["book", "counter", "hello-world"]
        );
        let hello = registry.build("hello-world", "h-1").expect("build");
        assert_eq!(hello.id(), "h-1");
        assert_eq!(hello.attributes()["name"], json!("World"));
    }

    #[test]
    fn registry_rejects_unknown_names() {
        let err = Registry::with_defaults()
            .build("spaceship", "s-1")
            .err()
            .expect("unknown");
        assert_eq!(err.to_string(), "Unknown component 'spaceship'");
    }

    #[test]
    fn counter_add_parses_string_literal() {
        let mut counter = Counter::new("c-1");
        counter.call_method("add", vec![json!("5")]).expect("add");
        assert_eq!(counter.count, 5);
        assert!(counter.call_method("add", vec![Value::Null]).is_err());
        assert!(counter.call_method("add", vec![json!("five")]).is_err());
    }

    #[test]
    fn counter_overflow_is_an_error() {
        let mut counter = Counter::new("c-1");
        assert!(counter.set_field("step", json!(i64::MAX)));
        counter.call_method("increment", Vec::new()).expect("0 + max fits");

        let err = counter
            .call_method("increment", Vec::new())
            .expect_err("overflow");
        assert_eq!(err.to_string(), "count overflow");
        assert_eq!(counter.count, i64::MAX);

        counter.count = i64::MIN;
        assert!(counter.call_method("decrement", Vec::new()).is_err());
        counter.count = i64::MAX;
        assert!(counter.call_method("add", vec![json!("1")]).is_err());
        assert_eq!(counter.count, i64::MAX);
    }

    #[test]
    fn hello_set_name_defaults_to_world() {
        let mut hello = HelloWorld::new("h-1");
        hello.call_method("set_name", vec![json!("Bob")]).expect("set");
        assert_eq!(hello.name, "Bob");
        hello.call_method("set_name", Vec::new()).expect("reset name");
        assert_eq!(hello.name, "World");
    }
}
