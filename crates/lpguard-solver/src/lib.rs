//! In-process linear-programming library for guarded-call experiments.
//!
//! This crate reproduces the calling convention of a native LP library:
//!
//! - Problem objects are created and destroyed through opaque handles
//! - Invalid arguments are not returned as errors; they raise a library
//!   fault that is routed through a single, per-thread error hook
//! - If no hook is installed, or the hook returns, the fault is fatal
//! - All library-owned memory can be released in one call
//! - Terminal output goes through a hookable terminal
//!
//! # Fault routing
//!
//! ```text
//! add_cols(prob, -1)
//!   -> terminal: "add_cols: count = -1; invalid number of columns"
//!   -> terminal: "Error detected in add_cols"
//!   -> error hook(info)          // must not return
//!   -> fatal path (abort/panic)  // only if it does
//! ```
//!
//! The environment is thread-local, so every thread sees its own problem
//! store and its own hook slot.

mod env;
mod problem;
pub mod terminal;

pub use env::{
    error_hook_registered, mem_usage, release_global_resources, set_error_hook, set_fatal_policy,
    fatal_policy, ErrorHook, FatalPolicy, LibraryFatal, MemUsage,
};
pub use problem::{
    add_cols, add_rows, col_name, create_problem, delete_problem, num_cols, num_rows, obj_coef,
    problem_name, row_name, set_col_name, set_obj_coef, set_problem_name, set_row_name,
    ProblemHandle, MAX_COLS, MAX_ROWS,
};

/// Library version string.
pub const VERSION: &str = "4.57";

/// Return the library version.
pub fn version() -> &'static str {
    VERSION
}
