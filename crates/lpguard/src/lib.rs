//! Recoverable error handling for calls into the LP library.
//!
//! The library treats invalid arguments as fatal: it reports them through a
//! single per-thread error hook and aborts if the hook returns. This crate
//! turns such faults into ordinary results:
//!
//! ```text
//! invoke(alloc, message, body)
//!   allocate InvocationContext { message, RecoveryPoint }
//!   HookGuard::install(&context)        // claims the hook slot
//!   catch_unwind(body) ──────────────┐
//!     library fault -> recovery_hook │  prints message,
//!                                    │  releases library memory,
//!     <── resume_unwind(Resumption) ─┘  unwinds to the recovery point
//!   drop(HookGuard)                     // slot emptied on every path
//!   drop(context)
//! ```
//!
//! [`run_guarded`] and [`run_optimizer`] wrap a one-column model build,
//! returning an [`Outcome`]. [`run_demo`] is the four-iteration demo.
//!
//! Recovery relies on unwinding; building with `panic = "abort"` is
//! rejected.

#[cfg(panic = "abort")]
compile_error!("lpguard recovers library faults by unwinding and cannot be built with panic=abort");

mod alloc;
mod config;
mod context;
mod demo;
mod error;
mod guard;
mod hook;
mod recovery;

pub use alloc::{AllocSite, AllocStats, ContextAllocator, FailingAllocator, Lease, TrackingAllocator};
pub use config::{DemoConfig, LibraryConfig};
pub use context::{InvocationContext, RecoveryPoint};
pub use demo::{run_demo, run_demo_with, DemoReport, IterationReport};
pub use error::{ConfigError, GuardError, Result};
pub use guard::{
    build_model, invoke, run_guarded, run_guarded_with, run_optimizer, Outcome, DEFAULT_MESSAGE,
};
pub use hook::HookGuard;
