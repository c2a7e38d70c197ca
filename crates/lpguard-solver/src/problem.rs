//! Problem objects.
//!
//! Columns and rows are numbered from 1. Every invalid argument, including
//! a stale handle, is a library fault: these functions either succeed or do
//! not return.

use crate::env::{self, fault, Column, ProblemData, Row, COLUMN_BLOCK, ROW_BLOCK};
use smol_str::SmolStr;

/// Maximum number of columns in one problem.
pub const MAX_COLS: usize = 100_000_000;

/// Maximum number of rows in one problem.
pub const MAX_ROWS: usize = 100_000_000;

/// Maximum length of a problem, row or column name.
const MAX_NAME_LEN: usize = 255;

/// Opaque handle to a problem object owned by the library environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProblemHandle(u32);

/// Look up `prob` and run `f` on it, faulting if the handle is stale.
fn with_problem<R>(
    op: &'static str,
    prob: ProblemHandle,
    f: impl FnOnce(&mut ProblemData, &mut env::MemUsage) -> R,
) -> R {
    let result = env::with_env(|env| {
        let usage = &mut env.usage;
        env.problems.get_mut(&prob.0).map(|data| f(data, usage))
    });
    match result {
        Some(value) => value,
        None => fault(op, format!("prob = {}; invalid problem object", prob.0)),
    }
}

fn check_name(op: &'static str, name: &str) {
    if name.len() > MAX_NAME_LEN {
        fault(op, format!("name too long ({} bytes)", name.len()));
    }
}

/// Create an empty problem.
pub fn create_problem() -> ProblemHandle {
    let id = env::with_env(|env| env.insert_problem());
    tracing::trace!(prob = id, "problem created");
    ProblemHandle(id)
}

/// Delete a problem and free everything it holds.
pub fn delete_problem(prob: ProblemHandle) {
    if !env::with_env(|env| env.remove_problem(prob.0)) {
        fault(
            "delete_problem",
            format!("prob = {}; invalid problem object", prob.0),
        );
    }
    tracing::trace!(prob = prob.0, "problem deleted");
}

/// Assign or clear the problem name.
pub fn set_problem_name(prob: ProblemHandle, name: Option<&str>) {
    if let Some(name) = name {
        check_name("set_problem_name", name);
    }
    with_problem("set_problem_name", prob, |data, _| {
        data.name = name.filter(|n| !n.is_empty()).map(SmolStr::new);
    });
}

/// Problem name, if one is set.
pub fn problem_name(prob: ProblemHandle) -> Option<SmolStr> {
    with_problem("problem_name", prob, |data, _| data.name.clone())
}

/// Append `count` columns. Returns the number of the first new column.
///
/// A negative count is a fault; zero adds nothing.
pub fn add_cols(prob: ProblemHandle, count: i32) -> usize {
    if count < 0 {
        fault(
            "add_cols",
            format!("count = {count}; invalid number of columns"),
        );
    }
    let count = count as usize;
    let added = with_problem("add_cols", prob, |data, usage| {
        let first = data.cols.len() + 1;
        if count > MAX_COLS - data.cols.len() {
            return Err(first - 1);
        }
        data.cols
            .extend((0..count).map(|_| Column { name: None, coef: 0.0 }));
        usage.acquire(count, count * COLUMN_BLOCK);
        Ok(first)
    });
    match added {
        Ok(first) => first,
        Err(existing) => fault(
            "add_cols",
            format!("count = {count}; too many columns (already {existing})"),
        ),
    }
}

/// Append `count` rows. Returns the number of the first new row.
///
/// A negative count is a fault; zero adds nothing.
pub fn add_rows(prob: ProblemHandle, count: i32) -> usize {
    if count < 0 {
        fault("add_rows", format!("count = {count}; invalid number of rows"));
    }
    let count = count as usize;
    let added = with_problem("add_rows", prob, |data, usage| {
        let first = data.rows.len() + 1;
        if count > MAX_ROWS - data.rows.len() {
            return Err(first - 1);
        }
        data.rows.extend((0..count).map(|_| Row { name: None }));
        usage.acquire(count, count * ROW_BLOCK);
        Ok(first)
    });
    match added {
        Ok(first) => first,
        Err(existing) => fault(
            "add_rows",
            format!("count = {count}; too many rows (already {existing})"),
        ),
    }
}

/// Number of columns.
pub fn num_cols(prob: ProblemHandle) -> usize {
    with_problem("num_cols", prob, |data, _| data.cols.len())
}

/// Number of rows.
pub fn num_rows(prob: ProblemHandle) -> usize {
    with_problem("num_rows", prob, |data, _| data.rows.len())
}

/// Resolve a 1-based column number, faulting when out of range.
fn col_index(op: &'static str, prob: ProblemHandle, j: usize) -> usize {
    let n = num_cols(prob);
    if j < 1 || j > n {
        fault(op, format!("j = {j}; column number out of range"));
    }
    j - 1
}

/// Assign or clear the name of column `j`.
pub fn set_col_name(prob: ProblemHandle, j: usize, name: Option<&str>) {
    if let Some(name) = name {
        check_name("set_col_name", name);
    }
    let idx = col_index("set_col_name", prob, j);
    with_problem("set_col_name", prob, |data, _| {
        data.cols[idx].name = name.filter(|n| !n.is_empty()).map(SmolStr::new);
    });
}

/// Name of column `j`, if one is set.
pub fn col_name(prob: ProblemHandle, j: usize) -> Option<SmolStr> {
    let idx = col_index("col_name", prob, j);
    with_problem("col_name", prob, |data, _| data.cols[idx].name.clone())
}

/// Resolve a 1-based row number, faulting when out of range.
fn row_index(op: &'static str, prob: ProblemHandle, i: usize) -> usize {
    let m = num_rows(prob);
    if i < 1 || i > m {
        fault(op, format!("i = {i}; row number out of range"));
    }
    i - 1
}

/// Assign or clear the name of row `i`.
pub fn set_row_name(prob: ProblemHandle, i: usize, name: Option<&str>) {
    if let Some(name) = name {
        check_name("set_row_name", name);
    }
    let idx = row_index("set_row_name", prob, i);
    with_problem("set_row_name", prob, |data, _| {
        data.rows[idx].name = name.filter(|n| !n.is_empty()).map(SmolStr::new);
    });
}

/// Name of row `i`, if one is set.
pub fn row_name(prob: ProblemHandle, i: usize) -> Option<SmolStr> {
    let idx = row_index("row_name", prob, i);
    with_problem("row_name", prob, |data, _| data.rows[idx].name.clone())
}

/// Set the objective coefficient of column `j`.
pub fn set_obj_coef(prob: ProblemHandle, j: usize, coef: f64) {
    if !coef.is_finite() {
        fault("set_obj_coef", format!("coef = {coef}; invalid coefficient"));
    }
    let idx = col_index("set_obj_coef", prob, j);
    with_problem("set_obj_coef", prob, |data, _| data.cols[idx].coef = coef);
}

/// Objective coefficient of column `j`.
pub fn obj_coef(prob: ProblemHandle, j: usize) -> f64 {
    let idx = col_index("obj_coef", prob, j);
    with_problem("obj_coef", prob, |data, _| data.cols[idx].coef)
}
