// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use enrollment::{Command, Engine, FixedClock};
use enrollment_audit::{Actor, Cause};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, warn};

/// A scripted sequence of commands.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

/// One command, who issues it and why.
///
/// The command's own fields sit next to the step fields:
///
/// ```json
/// { "actor": { "id": "registrar", "actor_type": "admin" },
///   "cause": { "id": "term-open", "description": "Open the term" },
///   "at": "2026-01-20T09:00:00Z",
///   "command": "enroll", "student": "S-1", "subject": "ALG",
///   "group": "ALG-01", "period": "2026-1" }
/// ```
#[derive(Debug, Deserialize)]
pub struct Step {
    pub actor: Actor,
    pub cause: Cause,
    /// Moves the clock before the command runs.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub at: Option<OffsetDateTime>,
    /// The step is expected to be rejected.
    #[serde(default)]
    pub expect_rejection: bool,
    #[serde(flatten)]
    pub command: Command,
}

/// Counts gathered while replaying a scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub applied: usize,
    pub rejected: usize,
    /// Steps whose result contradicted `expect_rejection`.
    pub unexpected: usize,
}

impl Scenario {
    /// The first instant any step pins the clock to.
    pub fn first_instant(&self) -> Option<OffsetDateTime> {
        self.steps.iter().find_map(|step| step.at)
    }

    /// Applies every step in order.
    ///
    /// Steps carrying `at` move `clock` when one is given. With `strict`,
    /// the replay stops at the first unexpected result.
    pub fn run(self, engine: &Engine, clock: Option<&FixedClock>, strict: bool) -> Summary {
        let mut summary: Summary = Summary::default();
        for (index, step) in self.steps.into_iter().enumerate() {
            let number: usize = index + 1;
            if let (Some(clock), Some(at)) = (clock, step.at) {
                clock.set(at);
            }
            let name: &'static str = step.command.name();
            let expect_rejection: bool = step.expect_rejection;

            let expected: bool = match engine.apply(step.command, step.actor, step.cause) {
                Ok(result) => {
                    summary.applied += 1;
                    info!(step = number, command = name, "{}", result.outcome);
                    !expect_rejection
                }
                Err(err) => {
                    summary.rejected += 1;
                    let kind: String = err
                        .violation_kind()
                        .map_or_else(|| String::from("internal"), |k| k.to_string());
                    warn!(step = number, command = name, %kind, "Rejected: {err}");
                    expect_rejection
                }
            };

            if !expected {
                summary.unexpected += 1;
                warn!(
                    step = number,
                    command = name,
                    expect_rejection,
                    "Step result differs from expectation"
                );
                if strict {
                    break;
                }
            }
        }
        summary
    }
}
