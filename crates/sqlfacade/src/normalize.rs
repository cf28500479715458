//! Turns a backend cursor into an [`ExecutionResult`].

use crate::backend::Backend;
use crate::result::{ExecutionResult, Fetch, ResultHandle, Row};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// Comparison used to decide whether an execution counts as successful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessSignal {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,
}

impl SuccessSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuccessSignal::Eq => "==",
            SuccessSignal::Ne => "!=",
            SuccessSignal::Ge => ">=",
            SuccessSignal::Le => "<=",
            SuccessSignal::Gt => ">",
            SuccessSignal::Lt => "<",
        }
    }

    /// Parse one of `==`, `!=`, `>=`, `<=`, `>`, `<`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "==" => Some(SuccessSignal::Eq),
            "!=" => Some(SuccessSignal::Ne),
            ">=" => Some(SuccessSignal::Ge),
            "<=" => Some(SuccessSignal::Le),
            ">" => Some(SuccessSignal::Gt),
            "<" => Some(SuccessSignal::Lt),
            _ => None,
        }
    }

    fn compare(&self, count: u64) -> bool {
        match self {
            SuccessSignal::Eq => count == 0,
            SuccessSignal::Ne => count != 0,
            SuccessSignal::Ge => true,
            SuccessSignal::Le => count == 0,
            SuccessSignal::Gt => count > 0,
            SuccessSignal::Lt => false,
        }
    }

    /// `(affected_rows <cmp> 0) OR (row_count <cmp> 0)`.
    ///
    /// Both counts are compared against zero and OR-ed, so a SELECT (rows but
    /// no affected count) passes `==` and `>=` alike. Callers rely on this
    /// leniency; do not tighten it to an AND.
    pub fn evaluate(&self, affected_rows: u64, row_count: u64) -> bool {
        self.compare(affected_rows) || self.compare(row_count)
    }
}

impl fmt::Display for SuccessSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuccessSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SuccessSignal::parse(s).ok_or_else(|| format!("unrecognized success signal '{s}'"))
    }
}

/// Evaluate a textual signal. Unrecognized signals fail.
pub fn evaluate_success(signal: &str, affected_rows: u64, row_count: u64) -> bool {
    SuccessSignal::parse(signal).is_some_and(|s| s.evaluate(affected_rows, row_count))
}

/// `true` iff the backend reports at least one row for `handle`.
pub fn has_rows<B: Backend>(backend: &B, handle: &ResultHandle) -> bool {
    backend.row_count(handle) > 0
}

/// Drain `handle` through the backend's `fetch_one`.
///
/// Returns an empty vector when the handle has no rows.
pub fn fetch_all<B: Backend>(backend: &B, handle: &mut ResultHandle) -> Vec<Row> {
    if !has_rows(backend, handle) {
        return Vec::new();
    }
    let mut rows = Vec::new();
    while let Some(row) = backend.fetch_one(handle) {
        rows.push(row);
    }
    rows
}

/// Package a finished statement into an [`ExecutionResult`].
///
/// `signal == None` stands for an unrecognized signal and always fails.
pub fn normalize<B: Backend>(
    backend: &B,
    sql: String,
    mut handle: ResultHandle,
    signal: Option<SuccessSignal>,
    fetch_all_rows: bool,
    started: Instant,
) -> ExecutionResult {
    let fetch = if fetch_all_rows {
        Fetch::All(fetch_all(backend, &mut handle))
    } else if has_rows(backend, &handle) {
        Fetch::One(backend.fetch_one(&mut handle))
    } else {
        Fetch::One(None)
    };

    let row_count = backend.row_count(&handle);
    let affected_rows = backend.affected_rows();
    let success = signal.is_some_and(|s| s.evaluate(affected_rows, row_count));
    handle.rewind();

    ExecutionResult {
        sql,
        fetch,
        success,
        handle,
        row_count,
        has_rows: row_count > 0,
        affected_rows,
        elapsed: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_of_counts_is_lenient() {
        assert!(evaluate_success("==", 0, 5));
        assert!(evaluate_success("==", 5, 0));
        assert!(!evaluate_success("==", 3, 5));
    }

    #[test]
    fn test_each_signal() {
        assert!(evaluate_success(">=", 0, 0));
        assert!(evaluate_success("!=", 0, 1));
        assert!(!evaluate_success("!=", 0, 0));
        assert!(evaluate_success("<=", 4, 0));
        assert!(!evaluate_success("<=", 4, 2));
        assert!(evaluate_success(">", 0, 2));
        assert!(!evaluate_success(">", 0, 0));
        assert!(!evaluate_success("<", 0, 0));
    }

    #[test]
    fn test_unrecognized_signal_fails() {
        assert!(!evaluate_success("=", 1, 1));
        assert!(!evaluate_success("<>", 1, 1));
        assert!("~".parse::<SuccessSignal>().is_err());
    }

    #[test]
    fn test_signal_round_trip() {
        for s in ["==", "!=", ">=", "<=", ">", "<"] {
            assert_eq!(SuccessSignal::parse(s).unwrap().as_str(), s);
        }
    }
}
