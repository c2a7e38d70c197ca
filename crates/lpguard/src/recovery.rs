//! Transfer of control from the error hook back to the recovery point.
//!
//! The hook never returns to the library. It unwinds with a [`Resumption`]
//! carrying the recovery point's token, discarding every library frame
//! between the failure site and the recovery point. [`enter`] catches the
//! unwind and reports which way the region was left.

use crate::context::{InvocationContext, RecoveryPoint};
use lpguard_solver::terminal;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};

/// Unwind payload raised by [`recovery_hook`].
#[derive(Debug)]
pub(crate) struct Resumption {
    pub(crate) token: u64,
}

/// How control came out of a guarded region.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Arrival<T> {
    /// The body ran to completion.
    First(T),
    /// The error hook transferred control back.
    Resumed,
}

/// Run `body` with `point` as its recovery point.
///
/// Unwinds that are not a resumption for `point` keep unwinding.
pub(crate) fn enter<T>(point: &RecoveryPoint, body: impl FnOnce() -> T) -> Arrival<T> {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => Arrival::First(value),
        Err(payload) => match payload.downcast::<Resumption>() {
            Ok(resumption) if resumption.token == point.token() => Arrival::Resumed,
            Ok(resumption) => panic::resume_unwind(resumption),
            Err(other) => panic::resume_unwind(other),
        },
    }
}

/// Error hook installed for the duration of a guarded region.
///
/// Prints the context's message, releases the library environment (the
/// abandoned problem object with it), then resumes at the recovery point.
///
/// # Safety
/// `info` must point to a live [`InvocationContext`].
pub(crate) unsafe extern "C-unwind" fn recovery_hook(info: *mut c_void) {
    let context = &*(info as *const InvocationContext<'_>);
    terminal::print(context.message());

    lpguard_solver::release_global_resources();

    let token = context.recovery_point().token();
    tracing::debug!(token, "resuming at recovery point");
    panic::resume_unwind(Box::new(Resumption { token }))
}
