//! Integration tests for routing library faults through the error hook.

use lpguard_solver::terminal::{self, Capture};
use lpguard_solver::{
    add_cols, create_problem, error_hook_registered, mem_usage, set_error_hook, set_fatal_policy,
    FatalPolicy, LibraryFatal,
};
use std::cell::Cell;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};

struct Unwound(u32);

/// Hook that records the call and unwinds back to the test.
unsafe extern "C-unwind" fn unwinding_hook(info: *mut c_void) {
    let hits = &*(info as *const Cell<u32>);
    hits.set(hits.get() + 1);
    terminal::print("hook called");
    lpguard_solver::release_global_resources();
    panic::resume_unwind(Box::new(Unwound(hits.get())));
}

#[test]
fn test_fault_prints_then_calls_hook() {
    let capture = Capture::new();
    capture.attach();
    let hits = Cell::new(0u32);
    unsafe { set_error_hook(Some(unwinding_hook), &hits as *const Cell<u32> as *mut c_void) };

    let prob = create_problem();
    let err = panic::catch_unwind(AssertUnwindSafe(|| add_cols(prob, -1)))
        .expect_err("negative column count must fault");

    assert_eq!(err.downcast_ref::<Unwound>().map(|u| u.0), Some(1));
    assert_eq!(hits.get(), 1);
    assert_eq!(
        capture.contents(),
        "add_cols: count = -1; invalid number of columns\n\
         Error detected in add_cols\n\
         hook called\n"
    );
}

#[test]
fn test_hook_release_frees_abandoned_problem() {
    terminal::set_output(false);
    let hits = Cell::new(0u32);
    unsafe { set_error_hook(Some(unwinding_hook), &hits as *const Cell<u32> as *mut c_void) };

    let prob = create_problem();
    add_cols(prob, 5);
    assert_eq!(mem_usage().count, 6);

    let _ = panic::catch_unwind(AssertUnwindSafe(|| add_cols(prob, -2)));

    assert_eq!(mem_usage().count, 0);
    // releasing the environment empties the hook slot as well
    assert!(!error_hook_registered());
}

#[test]
fn test_valid_calls_never_touch_hook() {
    terminal::set_output(false);
    let hits = Cell::new(0u32);
    unsafe { set_error_hook(Some(unwinding_hook), &hits as *const Cell<u32> as *mut c_void) };

    let prob = create_problem();
    assert_eq!(add_cols(prob, 1), 1);
    lpguard_solver::delete_problem(prob);

    assert_eq!(hits.get(), 0);
    assert_eq!(mem_usage().count, 0);
    unsafe { set_error_hook(None, std::ptr::null_mut()) };
}

#[test]
fn test_no_hook_is_fatal() {
    terminal::set_output(false);
    set_fatal_policy(FatalPolicy::Panic);

    let prob = create_problem();
    let err = panic::catch_unwind(AssertUnwindSafe(|| add_cols(prob, -1)))
        .expect_err("negative column count must fault");

    let fatal = err.downcast::<LibraryFatal>().expect("LibraryFatal payload");
    assert_eq!(fatal.to_string(), "fatal library error in add_cols: count = -1; invalid number of columns");
}
