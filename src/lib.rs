//! Incremental clicker simulation.
//!
//! The `clicker` module holds the economy (ledger, producers, production
//! ticks, achievements, rebirth) and its persistence. `input`, `time` and
//! `logging` are the shared plumbing the web front-end in `main.rs` uses.

pub mod clicker;
pub mod input;
pub mod logging;
pub mod time;
