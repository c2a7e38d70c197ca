//! Invocation contexts and recovery points.

use crate::alloc::{AllocSite, ContextAllocator, Lease};
use crate::error::Result;
use std::cell::Cell;
use std::mem::size_of;

thread_local! {
    static NEXT_TOKEN: Cell<u64> = const { Cell::new(1) };
}

/// Marks the frame a library failure is recovered into.
///
/// Tokens are unique per thread, so a resumption can only be claimed by the
/// frame that captured it.
#[derive(Debug, PartialEq, Eq)]
pub struct RecoveryPoint {
    token: u64,
}

impl RecoveryPoint {
    pub(crate) fn capture() -> Self {
        let token = NEXT_TOKEN.with(|next| {
            let token = next.get();
            next.set(token + 1);
            token
        });
        Self { token }
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

/// Per-call data handed to the error hook.
///
/// Lives exactly as long as one guarded invocation. The error hook reads it
/// only when the library reports a failure.
#[derive(Debug)]
pub struct InvocationContext<'a> {
    message: String,
    recovery: Box<RecoveryPoint>,
    _recovery_lease: Lease<'a>,
    _lease: Lease<'a>,
}

impl<'a> InvocationContext<'a> {
    /// Allocate a context and capture its recovery point.
    ///
    /// If the recovery point cannot be allocated, the context allocation is
    /// released before the error is returned.
    pub fn allocate<A>(alloc: &'a A, message: &str) -> Result<Box<Self>>
    where
        A: ContextAllocator + ?Sized,
    {
        let lease = alloc.allocate(AllocSite::Context, size_of::<Self>() + message.len())?;
        let recovery_lease = alloc.allocate(AllocSite::RecoveryPoint, size_of::<RecoveryPoint>())?;

        Ok(Box::new(Self {
            message: message.to_owned(),
            recovery: Box::new(RecoveryPoint::capture()),
            _recovery_lease: recovery_lease,
            _lease: lease,
        }))
    }

    /// Diagnostic printed by the error hook.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn recovery_point(&self) -> &RecoveryPoint {
        &self.recovery
    }
}
