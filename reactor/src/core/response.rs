//! Reply payloads sent back to the client.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::component::{Component, Render};
use crate::core::error::{Error, Result};

/// Successful reply: re-rendered markup plus the outgoing state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub dom: String,
    pub data: Map<String, Value>,
}

/// Failed reply. Sent with the same transport status as a success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Either reply shape, serialized without a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Success(MessageResponse),
    Failure(ErrorResponse),
}

impl From<Error> for Reply {
    fn from(err: Error) -> Self {
        Reply::Failure(ErrorResponse {
            error: err.to_string(),
        })
    }
}

impl From<Result<MessageResponse>> for Reply {
    fn from(result: Result<MessageResponse>) -> Self {
        match result {
            Ok(response) => Reply::Success(response),
            Err(err) => Reply::from(err),
        }
    }
}

/// Render `component` and combine it with `id` and `data`.
pub fn assemble(
    id: &str,
    component: &dyn Component,
    renderer: &dyn Render,
    data: Map<String, Value>,
) -> Result<MessageResponse> {
    let dom = renderer.render(component).map_err(Error::Render)?;
    Ok(MessageResponse {
        id: id.to_string(),
        dom,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Counter, EchoRenderer};
    use serde_json::json;

    #[test]
    fn replies_serialize_to_wire_shapes() {
        let counter = Counter::new("c-1");
        let response = assemble("c-1", &counter, &EchoRenderer, counter.attributes())
            .expect("assemble");

        let success = serde_json::to_value(Reply::Success(response)).expect("json");
        assert_eq!(
            success,
            json!({
                "id": "c-1",
                "dom": "<counter id=\"c-1\">{\"count\":0,\"label\":\"Counter\"}</counter>",
                "data": {"count": 0, "label": "Counter"}
            })
        );

        let failure = serde_json::to_value(Reply::from(Error::Integrity)).expect("json");
        assert_eq!(failure, json!({"error": "Checksum does not match"}));
    }
}
