//! I/O helpers: configuration files and template rendering.

pub mod config;
pub mod render;
