//! Scoped ownership of the library's error hook slot.

use crate::context::InvocationContext;
use crate::error::{GuardError, Result};
use crate::recovery::recovery_hook;
use std::ffi::c_void;
use std::marker::PhantomData;

/// Holds the error hook slot for the lifetime of a guarded region.
///
/// Installing registers [`recovery_hook`] with the context as its opaque
/// data. Dropping empties the slot again, on every exit path including an
/// unwind. The slot is thread-local, so the guard is neither `Send` nor
/// `Sync`.
#[must_use = "the hook is removed as soon as the guard is dropped"]
pub struct HookGuard<'c> {
    _slot: PhantomData<(&'c (), *const ())>,
}

impl<'c> HookGuard<'c> {
    /// Claim the slot for `context`.
    ///
    /// Fails with [`GuardError::HookBusy`] if a hook is already installed,
    /// whether by an enclosing guarded region or by other code.
    pub fn install(context: &'c InvocationContext<'_>) -> Result<Self> {
        if lpguard_solver::error_hook_registered() {
            tracing::warn!("error hook slot already occupied");
            return Err(GuardError::HookBusy);
        }

        let info = context as *const InvocationContext<'_> as *mut c_void;
        // SAFETY: `context` outlives the guard, and the guard empties the
        // slot before it is dropped.
        unsafe { lpguard_solver::set_error_hook(Some(recovery_hook), info) };
        tracing::debug!(token = context.recovery_point().token(), "error hook installed");

        Ok(Self { _slot: PhantomData })
    }
}

impl Drop for HookGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: removing the hook leaves no pointer behind.
        unsafe { lpguard_solver::set_error_hook(None, std::ptr::null_mut()) };
        tracing::debug!("error hook removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::TrackingAllocator;
    use lpguard_solver::error_hook_registered;

    #[test]
    fn test_guard_pairs_install_and_remove() {
        let alloc = TrackingAllocator::new();
        let ctx = InvocationContext::allocate(&alloc, "msg").unwrap();
        {
            let _guard = HookGuard::install(&ctx).unwrap();
            assert!(error_hook_registered());
        }
        assert!(!error_hook_registered());
    }

    #[test]
    fn test_second_install_is_busy() {
        let alloc = TrackingAllocator::new();
        let outer = InvocationContext::allocate(&alloc, "outer").unwrap();
        let inner = InvocationContext::allocate(&alloc, "inner").unwrap();

        let _guard = HookGuard::install(&outer).unwrap();
        assert!(matches!(HookGuard::install(&inner), Err(GuardError::HookBusy)));
        // the failed install must not clear the outer registration
        assert!(error_hook_registered());
    }

    #[test]
    fn test_guard_removes_hook_during_unwind() {
        let alloc = TrackingAllocator::new();
        let ctx = InvocationContext::allocate(&alloc, "msg").unwrap();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = HookGuard::install(&ctx).unwrap();
            std::panic::resume_unwind(Box::new(()));
        }));
        assert!(!error_hook_registered());
    }
}
