//! Library environment: problem store, memory accounting and the error hook.
//!
//! Everything the library allocates lives in a thread-local [`Environment`].
//! [`release_global_resources`] drops it wholesale, which is the only safe
//! thing to do after a fault has abandoned a half-built problem.

use crate::terminal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::cell::{Cell, RefCell};
use std::ffi::c_void;
use std::fmt;

/// Error hook called by the library when it detects an invalid operation.
///
/// The hook receives the opaque pointer given to [`set_error_hook`]. It must
/// not return: returning sends the library down its fatal path. Leaving by
/// unwinding is allowed, hence the `C-unwind` ABI.
pub type ErrorHook = unsafe extern "C-unwind" fn(info: *mut c_void);

/// What the library does when a fault cannot be handed to a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalPolicy {
    /// Abort the process.
    #[default]
    Abort,
    /// Panic with a [`LibraryFatal`] payload.
    Panic,
}

/// Panic payload raised on the fatal path under [`FatalPolicy::Panic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFatal {
    /// Library operation that faulted.
    pub op: &'static str,
    /// Why the fault was fatal.
    pub message: String,
}

impl fmt::Display for LibraryFatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fatal library error in {}: {}", self.op, self.message)
    }
}

/// Memory held by the library environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemUsage {
    /// Number of live memory blocks.
    pub count: usize,
    /// Highest `count` since the environment was last released.
    pub peak_count: usize,
    /// Bytes held by live blocks.
    pub bytes: usize,
    /// Highest `bytes` since the environment was last released.
    pub peak_bytes: usize,
}

impl MemUsage {
    pub(crate) fn acquire(&mut self, blocks: usize, bytes: usize) {
        self.count += blocks;
        self.bytes += bytes;
        self.peak_count = self.peak_count.max(self.count);
        self.peak_bytes = self.peak_bytes.max(self.bytes);
    }

    pub(crate) fn release(&mut self, blocks: usize, bytes: usize) {
        self.count = self.count.saturating_sub(blocks);
        self.bytes = self.bytes.saturating_sub(bytes);
    }
}

pub(crate) struct Column {
    pub(crate) name: Option<SmolStr>,
    pub(crate) coef: f64,
}

pub(crate) struct Row {
    pub(crate) name: Option<SmolStr>,
}

pub(crate) const PROBLEM_BLOCK: usize = std::mem::size_of::<ProblemData>();
pub(crate) const COLUMN_BLOCK: usize = std::mem::size_of::<Column>();
pub(crate) const ROW_BLOCK: usize = std::mem::size_of::<Row>();

#[derive(Default)]
pub(crate) struct ProblemData {
    pub(crate) name: Option<SmolStr>,
    pub(crate) cols: Vec<Column>,
    pub(crate) rows: Vec<Row>,
}

impl ProblemData {
    fn blocks(&self) -> usize {
        1 + self.cols.len() + self.rows.len()
    }

    fn bytes(&self) -> usize {
        PROBLEM_BLOCK + self.cols.len() * COLUMN_BLOCK + self.rows.len() * ROW_BLOCK
    }
}

#[derive(Clone, Copy)]
struct HookSlot {
    hook: ErrorHook,
    info: *mut c_void,
}

/// Thread-local library state.
pub(crate) struct Environment {
    pub(crate) problems: FxHashMap<u32, ProblemData>,
    pub(crate) usage: MemUsage,
    /// Survives releases so a stale handle never aliases a new problem.
    next_id: u32,
    hook: Option<HookSlot>,
}

impl Environment {
    fn new() -> Self {
        Self {
            problems: FxHashMap::default(),
            usage: MemUsage::default(),
            next_id: 1,
            hook: None,
        }
    }

    pub(crate) fn insert_problem(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.problems.insert(id, ProblemData::default());
        self.usage.acquire(1, PROBLEM_BLOCK);
        id
    }

    pub(crate) fn remove_problem(&mut self, id: u32) -> bool {
        match self.problems.remove(&id) {
            Some(data) => {
                self.usage.release(data.blocks(), data.bytes());
                true
            }
            None => false,
        }
    }

    /// Drop every problem, reset accounting and empty the hook slot.
    fn release(&mut self) -> usize {
        let freed = self.problems.len();
        self.problems.clear();
        self.usage = MemUsage::default();
        self.hook = None;
        freed
    }
}

thread_local! {
    static ENV: RefCell<Environment> = RefCell::new(Environment::new());
    static FATAL_POLICY: Cell<FatalPolicy> = const { Cell::new(FatalPolicy::Abort) };
}

/// Run `f` with the thread's environment borrowed.
///
/// `f` must not call back into the library; faults are raised only after
/// the borrow ends.
pub(crate) fn with_env<R>(f: impl FnOnce(&mut Environment) -> R) -> R {
    ENV.with(|env| f(&mut env.borrow_mut()))
}

/// Install or remove the error hook.
///
/// Passing `None` empties the slot and `info` is ignored. There is a single
/// slot per thread; installing a hook replaces any previous one.
///
/// # Safety
/// While the registration stands, `info` must stay valid for whatever
/// `hook` does with it.
pub unsafe fn set_error_hook(hook: Option<ErrorHook>, info: *mut c_void) {
    let installed = hook.is_some();
    with_env(|env| env.hook = hook.map(|hook| HookSlot { hook, info }));
    tracing::debug!(installed, "error hook slot updated");
}

/// Whether an error hook is currently installed on this thread.
pub fn error_hook_registered() -> bool {
    with_env(|env| env.hook.is_some())
}

/// Free every problem object and reset the environment, hook slot included.
///
/// Safe to call at any time, including from inside an error hook.
pub fn release_global_resources() {
    let freed = with_env(Environment::release);
    tracing::debug!(problems = freed, "library environment released");
}

/// Memory currently held by the library on this thread.
pub fn mem_usage() -> MemUsage {
    with_env(|env| env.usage)
}

/// Set the fatal path behaviour for this thread. Returns the previous policy.
///
/// The policy is not part of the environment and is kept across
/// [`release_global_resources`].
pub fn set_fatal_policy(policy: FatalPolicy) -> FatalPolicy {
    FATAL_POLICY.with(|p| p.replace(policy))
}

/// Fatal path behaviour for this thread.
pub fn fatal_policy() -> FatalPolicy {
    FATAL_POLICY.with(Cell::get)
}

/// Report an invalid operation and hand control to the error hook.
#[cold]
pub(crate) fn fault(op: &'static str, detail: String) -> ! {
    terminal::print(&format!("{op}: {detail}"));
    terminal::print(&format!("Error detected in {op}"));

    let slot = with_env(|env| env.hook);
    if let Some(HookSlot { hook, info }) = slot {
        tracing::debug!(op, "passing library error to error hook");
        // SAFETY: `set_error_hook` callers guarantee `info` is valid for
        // `hook` while the registration stands.
        unsafe { hook(info) };
        fatal(op, "error hook returned to the library".to_string());
    }

    fatal(op, detail)
}

fn fatal(op: &'static str, message: String) -> ! {
    tracing::error!(op, %message, "unrecoverable library error");
    match fatal_policy() {
        FatalPolicy::Abort => std::process::abort(),
        FatalPolicy::Panic => std::panic::panic_any(LibraryFatal { op, message }),
    }
}
