// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

//! The enrollment engine.
//!
//! Owns the catalog, the students, the groups and the decanate queues, and
//! applies [`Command`]s to them. Every successful command yields an
//! [`Outcome`] and exactly one audit event; a failed command changes
//! nothing.
//!
//! The engine can be shared between threads. Each student, group and
//! decanate sits behind its own lock, so commands touching disjoint
//! entities proceed in parallel.

mod apply;
mod clock;
mod command;
mod config;
mod error;
mod requests;
mod state;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock, local_date};
pub use command::Command;
pub use config::EngineConfig;
pub use error::CoreError;
pub use state::{Engine, Outcome, TransitionResult};
