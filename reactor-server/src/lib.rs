//! HTTP transport for the reactor message engine.
//!
//! Exposes `POST /message/{component_name}`, keeps live component instances
//! in an in-memory cache keyed by component id, and renders replies from
//! templates on disk.

pub mod cache;
pub mod components;
pub mod routes;
pub mod state;
