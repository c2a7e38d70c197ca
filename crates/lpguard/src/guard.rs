//! Guarded invocation of library code.

use crate::alloc::{ContextAllocator, TrackingAllocator};
use crate::context::InvocationContext;
use crate::error::{GuardError, Result};
use crate::hook::HookGuard;
use crate::recovery::{self, Arrival};
use lpguard_solver::terminal;
use std::fmt;

/// Message the error hook prints when none is configured.
pub const DEFAULT_MESSAGE: &str = "This information was passed to the hook function.";

/// Status of one guarded invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The guarded operations completed.
    Success,
    /// The library rejected an operation; control was recovered.
    Failure,
    /// The invocation could not be attempted.
    ResourceExhausted,
}

impl Outcome {
    /// Map the result of [`invoke`] to a status.
    ///
    /// A busy hook slot counts as [`Outcome::ResourceExhausted`]: like a
    /// failed allocation, nothing was attempted.
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(GuardError::LibraryFailure) => Outcome::Failure,
            Err(GuardError::ResourceExhausted(_) | GuardError::HookBusy) => {
                Outcome::ResourceExhausted
            }
        }
    }

    /// Numeric status: 0 success, 1 failure, 2 out of memory.
    pub fn code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Failure => 1,
            Outcome::ResourceExhausted => 2,
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::Failure => f.write_str("failure"),
            Outcome::ResourceExhausted => f.write_str("resource exhausted"),
        }
    }
}

/// Run `body` inside a guarded region.
///
/// 1. Allocate an invocation context holding `message` and a recovery point.
/// 2. Install the recovery hook with the context as its data.
/// 3. Run `body`. If the library faults, the hook prints `message`, releases
///    the library environment and resumes here.
/// 4. Remove the hook and free the context, whichever way `body` ended.
///
/// Nothing in `body` is retried. Panics that did not come from the hook
/// propagate after the hook has been removed. Guarded regions do not nest:
/// an inner call fails with [`GuardError::HookBusy`] without running its
/// body.
pub fn invoke<A, T>(alloc: &A, message: &str, body: impl FnOnce() -> T) -> Result<T>
where
    A: ContextAllocator + ?Sized,
{
    let context = InvocationContext::allocate(alloc, message)?;
    let token = context.recovery_point().token();
    let _span = tracing::debug_span!("guarded", token).entered();

    let arrival = {
        let _hook = HookGuard::install(&context)?;
        recovery::enter(context.recovery_point(), body)
    };
    drop(context);

    match arrival {
        Arrival::First(value) => Ok(value),
        Arrival::Resumed => {
            tracing::info!(token, "recovered from library failure");
            Err(GuardError::LibraryFailure)
        }
    }
}

/// Build and discard a one-column problem.
///
/// With `force_error` the column count is negative, which the library
/// rejects.
pub fn build_model(force_error: bool) {
    let prob = lpguard_solver::create_problem();
    let count = if force_error { -1 } else { 1 };
    lpguard_solver::add_cols(prob, count);
    lpguard_solver::delete_problem(prob);
}

/// Build the demo model under guard using `alloc` and `message`.
///
/// Prints `Post treatment of error.` when control was recovered.
pub fn run_guarded_with<A>(alloc: &A, message: &str, trigger_failure: bool) -> Outcome
where
    A: ContextAllocator + ?Sized,
{
    let result = invoke(alloc, message, || build_model(trigger_failure));
    if let Err(GuardError::LibraryFailure) = result {
        terminal::print("Post treatment of error.");
    }
    Outcome::from_result(&result)
}

/// Build the demo model under guard with the default allocator and message.
pub fn run_guarded(trigger_failure: bool) -> Outcome {
    run_guarded_with(TrackingAllocator::global(), DEFAULT_MESSAGE, trigger_failure)
}

/// Guarded model build; a failure is forced when bit 0 of `force_error` is set.
pub fn run_optimizer(force_error: i32) -> Outcome {
    run_guarded(force_error & 1 != 0)
}
