// LogWatch - core/mod.rs
//
// Core business logic layer.
// Must NOT depend on: platform, app, or any I/O.

pub mod matcher;
pub mod model;
