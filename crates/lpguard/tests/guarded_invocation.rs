//! Integration tests for guarded invocation of the LP library.

use lpguard::{
    run_demo_with, run_guarded, run_guarded_with, AllocSite, DemoConfig, FailingAllocator,
    Outcome, TrackingAllocator, DEFAULT_MESSAGE,
};
use lpguard_solver::terminal::{self, Capture};
use lpguard_solver::{error_hook_registered, mem_usage, set_fatal_policy, FatalPolicy, LibraryFatal};
use std::panic::{self, AssertUnwindSafe};

/// Odd iterations fail, even ones succeed, each printing its own cue.
#[test]
fn test_scenario_table() {
    let alloc = TrackingAllocator::new();

    for input in 1..=4 {
        let capture = Capture::new();
        let id = capture.attach();

        let outcome = run_guarded_with(&alloc, DEFAULT_MESSAGE, input % 2 == 1);
        let out = capture.contents();
        terminal::remove_listener(id);

        if input % 2 == 1 {
            assert_eq!(outcome, Outcome::Failure, "input {input}");
            assert!(
                out.ends_with(
                    "This information was passed to the hook function.\n\
                     Post treatment of error.\n"
                ),
                "input {input}: {out}"
            );
        } else {
            assert_eq!(outcome, Outcome::Success, "input {input}");
            assert!(!out.contains(DEFAULT_MESSAGE), "input {input}: {out}");
        }
    }
}

/// After a guarded call the hook slot is empty: a later unguarded fault
/// takes the library's fatal path instead of reaching a stale hook.
#[test]
fn test_no_stale_hook_after_guarded_call() {
    terminal::set_output(false);
    set_fatal_policy(FatalPolicy::Panic);

    for trigger in [true, false] {
        run_guarded(trigger);
        assert!(!error_hook_registered());

        let err = panic::catch_unwind(AssertUnwindSafe(|| lpguard::build_model(true)))
            .expect_err("unguarded fault must not return");
        let fatal = err.downcast::<LibraryFatal>().expect("fatal path, not a resumption");
        assert_eq!(fatal.message, "count = -1; invalid number of columns");
        lpguard_solver::release_global_resources();
    }
}

/// All four iterations leave no context allocation and no library memory behind.
#[test]
fn test_no_leaks_across_demo() {
    terminal::set_output(false);
    let alloc = TrackingAllocator::new();

    let report = run_demo_with(&alloc, &DemoConfig::default());

    assert_eq!(report.iterations.len(), 4);
    assert_eq!(alloc.stats().outstanding(), 0);
    assert_eq!(alloc.stats().bytes(), 0);
    // context plus recovery point, per iteration
    assert_eq!(alloc.stats().total(), 8);
    assert_eq!(mem_usage().count, 0);
    assert_eq!(mem_usage().bytes, 0);
}

/// Failed allocations report ResourceExhausted without touching the library.
#[test]
fn test_allocation_failure_never_calls_library() {
    for site in [AllocSite::Context, AllocSite::RecoveryPoint] {
        let capture = Capture::new();
        let id = capture.attach();
        let alloc = FailingAllocator::new(site);

        assert_eq!(run_guarded_with(&alloc, DEFAULT_MESSAGE, true), Outcome::ResourceExhausted);
        assert_eq!(run_guarded_with(&alloc, DEFAULT_MESSAGE, false), Outcome::ResourceExhausted);

        terminal::remove_listener(id);
        assert_eq!(capture.contents(), "", "{site}");
        assert_eq!(mem_usage().peak_count, 0, "{site}");
        assert!(!error_hook_registered());
        assert_eq!(alloc.stats().outstanding(), 0);
    }
}

#[test]
fn test_repeated_success_is_idempotent() {
    let capture = Capture::new();
    capture.attach();

    for _ in 0..100 {
        assert_eq!(run_guarded(false), Outcome::Success);
        assert!(!error_hook_registered());
    }
    assert_eq!(mem_usage().count, 0);
    assert_eq!(capture.contents(), "");
}

#[test]
fn test_failure_then_success_is_independent() {
    terminal::set_output(false);
    assert_eq!(run_guarded(true), Outcome::Failure);
    assert_eq!(run_guarded(false), Outcome::Success);
    assert_eq!(run_guarded(true), Outcome::Failure);
    assert_eq!(run_guarded(false), Outcome::Success);
}

#[test]
fn test_demo_transcript() {
    let capture = Capture::new();
    capture.attach();

    lpguard::run_demo(&DemoConfig::default());

    insta::assert_snapshot!(capture.contents().trim_end(), @r"
    Library version: 4.57

    Iteration 1, error expected to occur.
    add_cols: count = -1; invalid number of columns
    Error detected in add_cols
    This information was passed to the hook function.
    Post treatment of error.
    An error has occurred.

    Iteration 2, success expected.
    Successful execution.

    Iteration 3, error expected to occur.
    add_cols: count = -1; invalid number of columns
    Error detected in add_cols
    This information was passed to the hook function.
    Post treatment of error.
    An error has occurred.

    Iteration 4, success expected.
    Successful execution.
    ");
}
