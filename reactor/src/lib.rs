//! Server-side message engine for reactive components.
//!
//! A client sends a compact message describing what the user did (synced
//! inputs, method calls) together with a signed copy of the component state.
//! This crate validates the message, applies the actions to a live component
//! and assembles the reply the client patches its DOM with. The architecture
//! keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (call parsing, path resolution,
//!   checksums, the action queue). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (config files, template rendering).
//!
//! [`message`] coordinates both to turn one request body into one reply.

pub mod core;
pub mod io;
pub mod logging;
pub mod message;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
