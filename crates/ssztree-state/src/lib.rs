// crates/ssztree-state/src/lib.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Beacon-state container family (reduced two-fork preset), snapshot I/O,
//! a seeded synthetic generator, and the diff-load state migration.

pub mod any_fork;
pub mod containers;
pub mod generator;
pub mod io;
pub mod migrate;

// ---- Re-exports for workspace compatibility ----
pub use any_fork::{AnyState, AnyStateView, ForkName};
pub use containers::*;
pub use migrate::{
    diff_serialized_indices, load_state_altair, load_state_phase0, MigrationOutcome,
};
