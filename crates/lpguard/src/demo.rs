//! The demo loop: alternate failing and succeeding guarded invocations.

use crate::alloc::{ContextAllocator, TrackingAllocator};
use crate::config::DemoConfig;
use crate::guard::{run_guarded_with, Outcome};
use lpguard_solver::terminal;

/// Outcome of one demo iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationReport {
    pub iteration: u32,
    pub outcome: Outcome,
}

/// Outcomes of a whole demo run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoReport {
    pub iterations: Vec<IterationReport>,
}

impl DemoReport {
    pub fn all_succeeded(&self) -> bool {
        self.iterations.iter().all(|it| it.outcome.is_success())
    }

    /// Number of iterations that did not succeed.
    pub fn failures(&self) -> usize {
        self.iterations
            .iter()
            .filter(|it| !it.outcome.is_success())
            .count()
    }

    /// Process exit status. Outcomes only matter when `strict` is set.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if strict && !self.all_succeeded() {
            1
        } else {
            0
        }
    }
}

/// Whether iteration `i` is meant to fail.
fn forces_error(iteration: u32) -> bool {
    iteration & 1 == 1
}

/// Run the demo with the global allocator.
pub fn run_demo(config: &DemoConfig) -> DemoReport {
    run_demo_with(TrackingAllocator::global(), config)
}

/// Run the demo, printing progress through the library terminal.
pub fn run_demo_with<A>(alloc: &A, config: &DemoConfig) -> DemoReport
where
    A: ContextAllocator + ?Sized,
{
    terminal::print(&format!("Library version: {}", lpguard_solver::version()));

    let mut report = DemoReport::default();
    for iteration in 1..=config.iterations {
        let force_error = forces_error(iteration);
        let expectation = if force_error {
            "error expected to occur"
        } else {
            "success expected"
        };
        terminal::print(&format!("\nIteration {iteration}, {expectation}."));

        let outcome = run_guarded_with(alloc, &config.message, force_error);
        tracing::info!(iteration, %outcome, "iteration finished");
        if outcome.is_success() {
            terminal::print("Successful execution.");
        } else {
            terminal::print("An error has occurred.");
        }

        report.iterations.push(IterationReport { iteration, outcome });
    }
    report
}
