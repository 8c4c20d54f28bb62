//! Named-field access over heterogeneous component state.
//!
//! Component state is a tree whose inner nodes come in three kinds: plain
//! JSON mappings, typed field objects, and externally-backed records. Path
//! resolution and hydration walk all three through [`StateNode`] without
//! knowing which concrete type sits behind a node.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Get/set-by-name capability shared by components and nested field objects.
pub trait Fields {
    /// True if `name` is a public field.
    fn has_field(&self, name: &str) -> bool;

    /// Current value of `name`, serialized.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Assign `value` to `name`.
    ///
    /// Returns `false` when the field is unknown or the value does not fit the
    /// field's type; the field is left unchanged in that case.
    fn set_field(&mut self, name: &str, value: Value) -> bool;

    /// Container view of `name` when that field holds nested state.
    fn node_mut(&mut self, _name: &str) -> Option<StateNode<'_>> {
        None
    }
}

/// Upcast helper so `dyn Component` can be handed out as `dyn Fields`.
pub trait AsFields {
    fn as_fields(&mut self) -> &mut dyn Fields;
}

impl<T: Fields> AsFields for T {
    fn as_fields(&mut self) -> &mut dyn Fields {
        self
    }
}

/// A mutable view of one container in the state tree.
pub enum StateNode<'a> {
    /// Plain mapping; segments address keys.
    Map(&'a mut Map<String, Value>),
    /// Typed object exposing named fields.
    Fields(&'a mut dyn Fields),
    /// Externally-backed record (e.g. a persisted row).
    External(&'a mut Record),
}

impl<'a> StateNode<'a> {
    pub fn has(&self, name: &str) -> bool {
        match self {
            StateNode::Map(map) => map.contains_key(name),
            StateNode::Fields(fields) => fields.has_field(name),
            StateNode::External(record) => record.has_field(name),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self {
            StateNode::Map(map) => map.get(name).cloned(),
            StateNode::Fields(fields) => fields.get_field(name),
            StateNode::External(record) => record.get_field(name),
        }
    }

    /// Write `value` under an existing `name`. Returns `false` if nothing changed.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self {
            StateNode::Map(map) => match map.get_mut(name) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            StateNode::Fields(fields) => fields.set_field(name, value),
            StateNode::External(record) => record.set_field(name, value),
        }
    }

    /// Step into the container stored under `name`.
    ///
    /// Returns `None` if `name` is missing or holds a scalar.
    pub fn descend(self, name: &str) -> Option<StateNode<'a>> {
        match self {
            StateNode::Map(map) => match map.get_mut(name) {
                Some(Value::Object(inner)) => Some(StateNode::Map(inner)),
                _ => None,
            },
            StateNode::Fields(fields) => fields.node_mut(name),
            StateNode::External(record) => record.node_mut(name),
        }
    }

    /// True for typed objects and records, which hydrate key by key rather
    /// than being replaced wholesale.
    pub fn is_structured(&self) -> bool {
        matches!(self, StateNode::Fields(_) | StateNode::External(_))
    }
}

/// Deserialize `value` into a typed field slot.
///
/// Form inputs always arrive as strings, so a string that does not fit the
/// slot as-is is retried as the literal it spells: `"5"` fills an integer,
/// `"true"` a boolean, and a blank string clears an optional field.
/// Leaves `slot` untouched and returns `false` if neither form fits.
pub fn assign<T: DeserializeOwned>(slot: &mut T, value: Value) -> bool {
    let literal = value.as_str().and_then(scalar_literal);
    let parsed = serde_json::from_value(value)
        .ok()
        .or_else(|| literal.and_then(|literal| serde_json::from_value(literal).ok()));
    match parsed {
        Some(parsed) => {
            *slot = parsed;
            true
        }
        None => false,
    }
}

fn scalar_literal(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Some(Value::Null);
    }
    match serde_json::from_str(text) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => Some(value),
        _ => None,
    }
}

/// Externally-backed structured object, such as a database row.
///
/// Only the columns the record was loaded with are writable. The loaded
/// values are kept so a persistence layer can flush exactly the columns whose
/// value changed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: Map<String, Value>,
    loaded: Map<String, Value>,
}

impl Record {
    pub fn new(values: Map<String, Value>) -> Self {
        Self {
            loaded: values.clone(),
            values,
        }
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Serialized form used in component attributes.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Columns that differ from their value at load or the last
    /// [`Record::mark_clean`], sorted.
    pub fn dirty_fields(&self) -> Vec<&str> {
        let mut dirty: Vec<&str> = self
            .values
            .iter()
            .filter(|(name, value)| self.loaded.get(name.as_str()) != Some(*value))
            .map(|(name, _)| name.as_str())
            .collect();
        dirty.sort_unstable();
        dirty
    }

    pub fn mark_clean(&mut self) {
        self.loaded = self.values.clone();
    }
}

impl Fields for Record {
    fn has_field(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn node_mut(&mut self, name: &str) -> Option<StateNode<'_>> {
        match self.values.get_mut(name) {
            Some(Value::Object(inner)) => Some(StateNode::Map(inner)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Record {
        let values = json!({"name": "Headline", "meta": {"city": "London"}});
        let Value::Object(values) = values else {
            panic!("object literal");
        };
        Record::new(values)
    }

    #[test]
    fn record_only_writes_known_columns() {
        let mut record = record();
        assert!(record.set_field("name", json!("Bloomsbury")));
        assert!(!record.set_field("founded", json!(1986)));
        assert_eq!(record.get_field("name"), Some(json!("Bloomsbury")));
        assert!(!record.has_field("founded"));
        assert_eq!(record.dirty_fields(), vec!["name"]);
    }

    #[test]
    fn record_write_through_descent_marks_json_column_dirty() {
        let mut record = record();
        let node = StateNode::External(&mut record);
        let Some(mut meta) = node.descend("meta") else {
            panic!("meta is an object column");
        };
        assert!(meta.set("city", json!("Oxford")));
        assert_eq!(record.values()["meta"], json!({"city": "Oxford"}));
        assert_eq!(record.dirty_fields(), vec!["meta"]);
        record.mark_clean();
        assert!(record.dirty_fields().is_empty());
    }

    #[test]
    fn record_reads_and_unchanged_writes_stay_clean() {
        let mut record = record();
        let node = StateNode::External(&mut record);
        let meta = node.descend("meta").expect("object column");
        assert_eq!(meta.get("city"), Some(json!("London")));
        assert!(record.set_field("name", json!("Headline")));
        assert!(record.dirty_fields().is_empty());
    }

    #[test]
    fn map_node_refuses_new_keys_and_scalar_descent() {
        let mut map = Map::new();
        map.insert("count".to_string(), json!(1));
        let mut node = StateNode::Map(&mut map);
        assert!(!node.set("missing", json!(2)));
        assert!(node.set("count", json!(2)));
        assert!(node.descend("count").is_none());
        assert_eq!(map["count"], json!(2));
    }

    #[test]
    fn assign_rejects_wrong_shape() {
        let mut count: i64 = 3;
        assert!(!assign(&mut count, json!("three")));
        assert_eq!(count, 3);
        assert!(assign(&mut count, json!(4)));
        assert_eq!(count, 4);
    }

    #[test]
    fn assign_coerces_form_strings_into_scalars() {
        let mut count: i64 = 0;
        assert!(assign(&mut count, json!(" 5 ")));
        assert_eq!(count, 5);
        assert!(!assign(&mut count, json!("5.5")));
        assert_eq!(count, 5);

        let mut ratio: f64 = 0.0;
        assert!(assign(&mut ratio, json!("0.25")));
        assert_eq!(ratio, 0.25);

        let mut flag = false;
        assert!(assign(&mut flag, json!("true")));
        assert!(flag);

        let mut born: Option<u16> = Some(1960);
        assert!(assign(&mut born, json!("")));
        assert_eq!(born, None);

        // Strings stay strings when the slot takes them as-is.
        let mut label = String::new();
        assert!(assign(&mut label, json!("5")));
        assert_eq!(label, "5");
    }
}
