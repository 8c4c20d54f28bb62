//! One request in, one reply out.
//!
//! Orchestrates the core: parse and verify the envelope, obtain the component
//! instance, hydrate it from client state, run the action queue, render, and
//! assemble the reply. Every failure is converted into the `{ "error": ... }`
//! payload here and nowhere else.

use tracing::{info, warn};

use crate::core::checksum::ChecksumValidator;
use crate::core::component::{ComponentFactory, Render};
use crate::core::dispatch::{ActionDispatcher, hydrate};
use crate::core::envelope::ComponentRequest;
use crate::core::error::{Error, Result};
use crate::core::response::{MessageResponse, Reply, assemble};
use crate::io::config::EngineConfig;

/// Message-processing engine. Cheap to share; holds only immutable settings.
#[derive(Debug, Clone)]
pub struct Engine {
    validator: ChecksumValidator,
    strict: bool,
}

impl Engine {
    pub fn new(validator: ChecksumValidator) -> Self {
        Self {
            validator,
            strict: false,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.validator()).strict(config.strict)
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn validator(&self) -> &ChecksumValidator {
        &self.validator
    }

    /// Parse and verify a request body.
    pub fn parse_request(&self, body: &[u8]) -> Result<ComponentRequest> {
        ComponentRequest::parse(body, &self.validator).inspect_err(|err| {
            warn!(kind = err.kind(), error = %err, "rejected message");
        })
    }

    /// Apply a verified request to the `component_name` instance it targets.
    ///
    /// The instance is always handed back to `factory` afterwards, including
    /// when an action fails part-way: earlier actions are not rolled back.
    pub fn process(
        &self,
        component_name: &str,
        request: ComponentRequest,
        factory: &dyn ComponentFactory,
        renderer: &dyn Render,
    ) -> Result<MessageResponse> {
        if component_name.is_empty() {
            return Err(Error::validation("Missing component name in url"));
        }

        let ComponentRequest {
            id,
            data,
            action_queue,
            ..
        } = request;

        let mut component = factory.create(&id, component_name, false)?;
        hydrate(&mut *component, &data);

        let mut snapshot = data;
        let dispatcher = ActionDispatcher::new(factory, component_name, &id).strict(self.strict);
        let outcome = dispatcher
            .apply_queue(&mut component, &mut snapshot, &action_queue)
            .and_then(|()| assemble(&id, &*component, renderer, snapshot));
        factory.release(component);

        if outcome.is_ok() {
            info!(
                component = component_name,
                component_id = %id,
                actions = action_queue.len(),
                "message handled"
            );
        }
        outcome
    }

    /// Parse, process and convert to the wire reply in one step.
    pub fn handle_message(
        &self,
        component_name: &str,
        body: &[u8],
        factory: &dyn ComponentFactory,
        renderer: &dyn Render,
    ) -> Reply {
        if component_name.is_empty() {
            return Reply::from(Error::validation("Missing component name in url"));
        }
        let result = self
            .parse_request(body)
            .and_then(|request| self.process(component_name, request, factory, renderer));
        Reply::from(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checksum::KeyOrder;
    use crate::core::response::ErrorResponse;
    use crate::test_support::{BrokenRenderer, EchoRenderer, StaticFactory, TEST_SECRET, signed_body};
    use serde_json::json;

    fn engine() -> Engine {
        Engine::new(ChecksumValidator::new(TEST_SECRET, KeyOrder::Document))
    }

    fn error_of(reply: Reply) -> String {
        match reply {
            Reply::Failure(ErrorResponse { error }) => error,
            Reply::Success(response) => panic!("expected failure, got {response:?}"),
        }
    }

    #[test]
    fn missing_component_name_is_checked_first() {
        let factory = StaticFactory::default();
        let reply = engine().handle_message("", b"not json", &factory, &EchoRenderer);
        assert_eq!(error_of(reply), "Missing component name in url");
    }

    #[test]
    fn unparseable_body_creates_nothing() {
        let factory = StaticFactory::default();
        let reply = engine().handle_message("counter", b"{", &factory, &EchoRenderer);
        assert_eq!(error_of(reply), "Body could not be parsed");
        assert_eq!(factory.created(), 0);
    }

    #[test]
    fn instance_is_released_even_when_rendering_fails() {
        let engine = engine();
        let factory = StaticFactory::default();
        let body = signed_body(engine.validator(), "c-1", json!({}), json!([]));

        let reply = engine.handle_message("counter", &body, &factory, &BrokenRenderer);

        assert_eq!(
            error_of(reply),
            "Component could not be rendered: template missing"
        );
        assert_eq!(factory.released(), 1);
    }

    #[test]
    fn unknown_component_name_is_reported() {
        let engine = engine();
        let factory = StaticFactory::default();
        let body = signed_body(engine.validator(), "x-1", json!({}), json!([]));

        let reply = engine.handle_message("spaceship", &body, &factory, &EchoRenderer);
        assert_eq!(error_of(reply), "Unknown component 'spaceship'");
    }
}
