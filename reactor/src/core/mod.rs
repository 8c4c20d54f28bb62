//! Deterministic, pure logic of the message engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! state and return deterministic outputs suitable for tests. Rendering and
//! instance lookup reach the core only through the traits in [`component`].

pub mod call;
pub mod checksum;
pub mod component;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod path;
pub mod response;
pub mod state;
