//! Backend-neutral rows, cursors and execution results.

use serde::Serialize;
use serde::ser::SerializeMap;
use std::sync::Arc;
use std::time::Duration;

/// One result row: column names with nullable text values.
///
/// Every backend hands values back in their textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named column. `None` if the column is missing or NULL.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.get_idx(idx)
    }

    /// Value at a column index. `None` if out of range or NULL.
    pub fn get_idx(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }

    /// Iterate `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(|v| v.as_deref()))
    }

    /// Convert to a JSON object keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(k, v)| {
                let v = v.map_or(serde_json::Value::Null, |s| {
                    serde_json::Value::String(s.to_string())
                });
                (k.to_string(), v)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Serialize for Row {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, &v)?;
        }
        map.end()
    }
}

/// Buffered cursor over the rows a statement produced.
///
/// Backends fill this once per `run`; [`ResultHandle::next_row`] walks it.
#[derive(Debug, Clone, Default)]
pub struct ResultHandle {
    columns: Arc<[String]>,
    rows: Vec<Row>,
    position: usize,
    affected: u64,
}

impl ResultHandle {
    pub fn new(columns: Arc<[String]>, rows: Vec<Row>, affected: u64) -> Self {
        Self {
            columns,
            rows,
            position: 0,
            affected,
        }
    }

    /// A handle for a statement that returned no result set.
    pub fn affected_only(affected: u64) -> Self {
        Self {
            affected,
            ..Self::default()
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Total rows in the result set, independent of the cursor position.
    pub fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    /// Rows reported as affected by the statement.
    pub fn affected(&self) -> u64 {
        self.affected
    }

    /// Advance the cursor and return the next row.
    pub fn next_row(&mut self) -> Option<Row> {
        let row = self.rows.get(self.position)?.clone();
        self.position += 1;
        Some(row)
    }

    /// Move the cursor back to the first row.
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

/// Fetch payload of an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Fetch {
    /// Single-row mode: the first row, if any.
    One(Option<Row>),
    /// Fetch-all mode: every row in order.
    All(Vec<Row>),
}

impl Fetch {
    /// Rows in this payload as a vector.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Fetch::One(row) => row.into_iter().collect(),
            Fetch::All(rows) => rows,
        }
    }

    pub fn first(&self) -> Option<&Row> {
        match self {
            Fetch::One(row) => row.as_ref(),
            Fetch::All(rows) => rows.first(),
        }
    }
}

/// Snapshot of one executed statement.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// The SQL that was sent.
    pub sql: String,
    /// Fetched row(s).
    pub fetch: Fetch,
    /// Outcome of the success-signal comparison.
    pub success: bool,
    /// The backend cursor, rewound to the first row.
    pub handle: ResultHandle,
    /// Rows in the result set.
    pub row_count: u64,
    /// `row_count > 0`.
    pub has_rows: bool,
    /// Rows affected by the statement.
    pub affected_rows: u64,
    /// Wall-clock time from statement start to normalization end.
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn elapsed_millis(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// What a statement method returned.
///
/// Backend failures are errors; the two soft failures are variants here so
/// callers can branch on them.
#[derive(Debug, Clone)]
#[must_use]
pub enum Outcome {
    Executed(ExecutionResult),
    /// Safemode refused an UPDATE/DELETE without conditions. No SQL was sent.
    GuardRejected,
    /// There was no SQL to run.
    EmptyStatement,
}

impl Outcome {
    /// The execution result, if a statement ran.
    pub fn executed(&self) -> Option<&ExecutionResult> {
        match self {
            Outcome::Executed(result) => Some(result),
            _ => None,
        }
    }

    pub fn into_executed(self) -> Option<ExecutionResult> {
        match self {
            Outcome::Executed(result) => Some(result),
            _ => None,
        }
    }

    /// `true` only when a statement ran and its success check passed.
    pub fn is_success(&self) -> bool {
        self.executed().is_some_and(|r| r.success)
    }

    pub fn is_guard_rejected(&self) -> bool {
        matches!(self, Outcome::GuardRejected)
    }

    pub fn is_empty_statement(&self) -> bool {
        matches!(self, Outcome::EmptyStatement)
    }
}
