// LogWatch - lib.rs
//
// Library entry point, exposing the watcher for the binary, integration
// tests, and programmatic use.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
