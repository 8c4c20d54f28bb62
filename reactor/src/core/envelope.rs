//! Request envelope: parsing and structural validation of a message body.
//!
//! Wire format:
//!
//! ```json
//! { "id": "abc", "data": {...}, "checksum": "3CNgV9En",
//!   "actionQueue": [{ "type": "syncInput", "payload": {...} }] }
//! ```
//!
//! Checks run in a fixed order (parse, non-empty body, `data`, `id`, checksum)
//! so the first problem found is the one reported.

use serde_json::{Map, Value};

use crate::core::checksum::ChecksumValidator;
use crate::core::error::{Error, Result};

/// Action discriminator from the `type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    SyncInput,
    CallMethod,
    /// Any other `type`; kept so the queue can fail when it reaches it.
    Unknown(String),
}

impl ActionKind {
    fn from_type(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(kind)) if kind == "syncInput" => ActionKind::SyncInput,
            Some(Value::String(kind)) if kind == "callMethod" => ActionKind::CallMethod,
            Some(Value::String(kind)) => ActionKind::Unknown(kind.clone()),
            Some(other) => ActionKind::Unknown(other.to_string()),
            None => ActionKind::Unknown(String::new()),
        }
    }
}

/// One queued client action.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub payload: Map<String, Value>,
}

impl Action {
    fn from_value(value: Value) -> Self {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Action {
                    kind: ActionKind::from_type(Some(&other)),
                    payload: Map::new(),
                };
            }
        };
        let kind = ActionKind::from_type(fields.get("type"));
        let payload = match fields.remove("payload") {
            Some(Value::Object(payload)) => payload,
            _ => Map::new(),
        };
        Action { kind, payload }
    }

    /// String field of the payload, if present.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// A parsed, checksum-verified message.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRequest {
    pub id: String,
    /// Client state; also the starting point of the outgoing snapshot.
    pub data: Map<String, Value>,
    pub checksum: String,
    pub action_queue: Vec<Action>,
}

impl ComponentRequest {
    /// Parse `body` and verify its checksum with `validator`.
    pub fn parse(body: &[u8], validator: &ChecksumValidator) -> Result<Self> {
        let parsed: Value = serde_json::from_slice(body).map_err(Error::Parse)?;
        if is_falsy(&parsed) {
            return Err(Error::validation("Invalid JSON body"));
        }
        let Value::Object(mut body) = parsed else {
            return Err(Error::validation("Invalid JSON body"));
        };

        // An empty mapping is valid data; only absence (or null) is not.
        let data = match body.remove("data") {
            None | Some(Value::Null) => return Err(Error::validation("Missing data")),
            Some(Value::Object(data)) => data,
            Some(_) => return Err(Error::validation("Invalid data")),
        };

        let id = match body.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => return Err(Error::validation("Missing component id")),
        };

        let checksum = body
            .get("checksum")
            .and_then(Value::as_str)
            .map(str::to_string);
        validator.validate(&data, checksum.as_deref())?;

        let action_queue = match body.remove("actionQueue") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(actions)) => actions.into_iter().map(Action::from_value).collect(),
            Some(_) => return Err(Error::validation("Invalid actionQueue")),
        };

        Ok(ComponentRequest {
            id,
            data,
            checksum: checksum.unwrap_or_default(),
            action_queue,
        })
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
