// LogWatch - app/mod.rs
//
// Application layer: cancellation, tailing, output, orchestration, signals.
// Dependencies: core and util layers.
// Must NOT depend on: platform.

pub mod cancel;
pub mod signal;
pub mod sink;
pub mod supervisor;
pub mod tail;
