//! Error taxonomy for message processing.
//!
//! The `Display` output of every variant is the exact text sent back to the
//! client in the `{ "error": ... }` payload.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort processing of a message.
#[derive(Debug, Error)]
pub enum Error {
    /// Request body is not well-formed JSON.
    #[error("Body could not be parsed")]
    Parse(#[source] serde_json::Error),

    /// Request is well-formed but structurally invalid (missing id, data,
    /// checksum, or a `callMethod` without a name).
    #[error("{0}")]
    Validation(String),

    /// Supplied checksum does not match the state it came with.
    #[error("Checksum does not match")]
    Integrity,

    /// Action `type` is neither `syncInput` nor `callMethod`.
    #[error("Unknown action_type '{0}'")]
    UnknownAction(String),

    /// A path, method or assignment target did not resolve. Only raised in
    /// strict mode; lenient mode skips these silently.
    #[error("Unable to resolve '{0}'")]
    Unresolved(String),

    /// A path or assignment target resolved but refused the value. Only
    /// raised in strict mode.
    #[error("Invalid value for '{0}'")]
    InvalidValue(String),

    /// A component method body returned an error.
    #[error("Method '{method}' failed: {source}")]
    Method {
        method: String,
        #[source]
        source: anyhow::Error,
    },

    /// The render capability failed.
    #[error("Component could not be rendered: {0}")]
    Render(#[source] anyhow::Error),

    /// State could not be serialized for signing.
    #[error("State could not be serialized")]
    Serialize(#[source] serde_json::Error),

    /// The checksum secret is empty, so anyone could mint tokens.
    #[error("Invalid secret key")]
    Secret,
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Short machine-friendly kind, used as a tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Parse(_) => "parse",
            Error::Validation(_) => "validation",
            Error::Integrity => "integrity",
            Error::UnknownAction(_) => "unknown_action",
            Error::Unresolved(_) => "unresolved",
            Error::InvalidValue(_) => "invalid_value",
            Error::Method { .. } => "method",
            Error::Render(_) => "render",
            Error::Serialize(_) => "serialize",
            Error::Secret => "secret",
        }
    }
}
