//! Relational front-end interface and the [`QueryExecutor`].
//!
//! The front-end itself (parser, planner, catalog) sits behind [`RelationalDriver`].
//! This module only defines the handles it hands out and the single-pass
//! [`QueryResult`] built on top of them.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::error::GridError;
use crate::teardown::Closeable;
use crate::types::Value;

/// Connection property carrying the model descriptor (`inline:<json>` or a file path).
pub const MODEL_PROPERTY: &str = "model";

/// Connection properties.
pub type Properties = BTreeMap<String, String>;

/// Entry point of a relational front-end.
pub trait RelationalDriver: Send + Sync {
    fn connect(&self, properties: &Properties) -> Result<Box<dyn Connection>, GridError>;
}

pub trait Connection: Closeable {
    fn create_statement(&self) -> Result<Box<dyn Statement>, GridError>;

    fn is_closed(&self) -> bool;
}

pub trait Statement: Closeable {
    fn execute_query(&mut self, sql: &str) -> Result<Box<dyn ResultSet>, GridError>;
}

/// Forward-only cursor over a query's rows.
pub trait ResultSet: Closeable {
    fn metadata(&self) -> Arc<ResultMetadata>;

    /// Move to the next row. `Ok(false)` once the rows are exhausted.
    fn advance(&mut self) -> Result<bool, GridError>;

    /// Value of the current row at a 1-based column index.
    fn value(&self, index: usize) -> Result<Value, GridError>;
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// One output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub label: String,
    /// 1-based ordinal position.
    pub index: usize,
}

/// Column metadata of a result. Indices are 1-based and contiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMetadata {
    columns: Vec<ColumnMeta>,
}

impl ResultMetadata {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| ColumnMeta {
                label: label.into(),
                index: i + 1,
            })
            .collect();
        Self { columns }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Valid column indices, `1..=count`.
    pub fn indices(&self) -> RangeInclusive<usize> {
        1..=self.columns.len()
    }

    pub fn column(&self, index: usize) -> Result<&ColumnMeta, GridError> {
        index
            .checked_sub(1)
            .and_then(|i| self.columns.get(i))
            .ok_or_else(|| {
                GridError::query_msg(format!(
                    "column index {index} out of range 1..={}",
                    self.columns.len()
                ))
            })
    }

    pub fn column_label(&self, index: usize) -> Result<&str, GridError> {
        self.column(index).map(|c| c.label.as_str())
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }
}

/// A materialized row, in column-index order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    metadata: Arc<ResultMetadata>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(metadata: Arc<ResultMetadata>, values: Vec<Value>) -> Self {
        Self { metadata, values }
    }

    pub fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    /// Value at a 1-based column index.
    pub fn get(&self, index: usize) -> Result<&Value, GridError> {
        self.metadata.column(index)?;
        self.values
            .get(index - 1)
            .ok_or_else(|| GridError::query_msg(format!("row has no value at column {index}")))
    }

    /// `(label, value)` pairs in ascending column-index order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.metadata
            .columns()
            .iter()
            .map(|c| c.label.as_str())
            .zip(self.values.iter())
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// Query execution
// ---------------------------------------------------------------------------

/// A single-pass row sequence plus the statement that produced it.
///
/// `next_row` yields rows until the end, then `Ok(None)` on every later call.
pub struct QueryResult {
    metadata: Arc<ResultMetadata>,
    cursor: Box<dyn ResultSet>,
    statement: Box<dyn Statement>,
    exhausted: bool,
}

impl QueryResult {
    pub fn metadata(&self) -> &ResultMetadata {
        &self.metadata
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Block until the next row is available. `Ok(None)` marks the end.
    pub fn next_row(&mut self) -> Result<Option<Row>, GridError> {
        if self.exhausted {
            return Ok(None);
        }
        let advanced = self.cursor.advance().map_err(|e| {
            self.exhausted = true;
            e.into_query_failure()
        })?;
        if !advanced {
            self.exhausted = true;
            return Ok(None);
        }
        let values = self
            .metadata
            .indices()
            .map(|i| self.cursor.value(i))
            .collect::<Result<Vec<_>, _>>();
        match values {
            Ok(values) => Ok(Some(Row::new(Arc::clone(&self.metadata), values))),
            Err(e) => {
                self.exhausted = true;
                Err(e.into_query_failure())
            }
        }
    }

    /// Split into the cursor and its statement, in closing order.
    pub fn into_parts(self) -> (Box<dyn ResultSet>, Box<dyn Statement>) {
        (self.cursor, self.statement)
    }
}

impl Iterator for QueryResult {
    type Item = Result<Row, GridError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Runs one parameterless query over a live connection.
pub struct QueryExecutor;

impl QueryExecutor {
    /// Execute `sql` and return its lazy row sequence.
    ///
    /// Every failure is reported as `QueryFailure`. When execution fails the
    /// statement created for it is closed before returning.
    pub fn execute(connection: &dyn Connection, sql: &str) -> Result<QueryResult, GridError> {
        let mut statement = connection
            .create_statement()
            .map_err(GridError::into_query_failure)?;
        match statement.execute_query(sql) {
            Ok(cursor) => {
                let metadata = cursor.metadata();
                tracing::debug!(columns = metadata.column_count(), "query submitted");
                Ok(QueryResult {
                    metadata,
                    cursor,
                    statement,
                    exhausted: false,
                })
            }
            Err(err) => {
                if let Err(close_err) = statement.close() {
                    tracing::warn!(error = %close_err, "failed to close statement after query failure");
                }
                Err(err.into_query_failure())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct VecCursor {
        metadata: Arc<ResultMetadata>,
        rows: Vec<Vec<Value>>,
        position: Option<usize>,
        advances: Rc<Cell<usize>>,
    }

    impl Closeable for VecCursor {
        fn close(&mut self) -> Result<(), GridError> {
            Ok(())
        }
    }

    impl ResultSet for VecCursor {
        fn metadata(&self) -> Arc<ResultMetadata> {
            Arc::clone(&self.metadata)
        }

        fn advance(&mut self) -> Result<bool, GridError> {
            self.advances.set(self.advances.get() + 1);
            let next = self.position.map_or(0, |p| p + 1);
            if next >= self.rows.len() {
                self.position = Some(self.rows.len());
                return Ok(false);
            }
            self.position = Some(next);
            Ok(true)
        }

        fn value(&self, index: usize) -> Result<Value, GridError> {
            let row = self
                .position
                .and_then(|p| self.rows.get(p))
                .ok_or_else(|| GridError::query_msg("no current row"))?;
            row.get(index - 1)
                .cloned()
                .ok_or_else(|| GridError::query_msg(format!("row has no column {index}")))
        }
    }

    struct FixedStatement {
        rows: Vec<Vec<Value>>,
        advances: Rc<Cell<usize>>,
        closed: Rc<Cell<bool>>,
    }

    impl Closeable for FixedStatement {
        fn close(&mut self) -> Result<(), GridError> {
            self.closed.set(true);
            Ok(())
        }
    }

    impl Statement for FixedStatement {
        fn execute_query(&mut self, sql: &str) -> Result<Box<dyn ResultSet>, GridError> {
            if sql.contains("missing") {
                return Err(GridError::connection("table 'missing' not found"));
            }
            Ok(Box::new(VecCursor {
                metadata: Arc::new(ResultMetadata::new(["author", "retailCost", "quantityInStock"])),
                rows: self.rows.clone(),
                position: None,
                advances: Rc::clone(&self.advances),
            }))
        }
    }

    struct FixedConnection {
        rows: Vec<Vec<Value>>,
        advances: Rc<Cell<usize>>,
        statement_closed: Rc<Cell<bool>>,
    }

    impl Closeable for FixedConnection {
        fn close(&mut self) -> Result<(), GridError> {
            Ok(())
        }
    }

    impl Connection for FixedConnection {
        fn create_statement(&self) -> Result<Box<dyn Statement>, GridError> {
            Ok(Box::new(FixedStatement {
                rows: self.rows.clone(),
                advances: Rc::clone(&self.advances),
                closed: Rc::clone(&self.statement_closed),
            }))
        }

        fn is_closed(&self) -> bool {
            false
        }
    }

    fn connection(rows: Vec<Vec<Value>>) -> FixedConnection {
        FixedConnection {
            rows,
            advances: Rc::new(Cell::new(0)),
            statement_closed: Rc::new(Cell::new(false)),
        }
    }

    fn book(author: &str, cost: f64, qty: i64) -> Vec<Value> {
        vec![Value::from(author), Value::Double(cost), Value::Int(qty)]
    }

    #[test]
    fn metadata_indices_are_one_based_and_contiguous() {
        let meta = ResultMetadata::new(["author", "retailCost", "quantityInStock"]);
        assert_eq!(meta.indices().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(meta.column_label(1).unwrap(), "author");
        assert_eq!(meta.column_label(3).unwrap(), "quantityInStock");
        assert!(meta.column_label(0).is_err());
        assert!(meta.column_label(4).is_err());
    }

    #[test]
    fn rows_are_exhausted_exactly_once() {
        let conn = connection(vec![book("Daisy Mae West", 34.99, 10), book("Jim Heavisides", 59.99, 36)]);
        let mut result = QueryExecutor::execute(&conn, "SELECT 1").expect("execute");

        let first = result.next_row().unwrap().expect("row 1");
        assert_eq!(first.get(1).unwrap(), &Value::from("Daisy Mae West"));
        assert!(result.next_row().unwrap().is_some());
        assert!(result.next_row().unwrap().is_none());
        assert!(result.is_exhausted());

        // Past the end: still end-of-sequence, and the cursor is not touched again.
        let advances = conn.advances.get();
        assert!(result.next_row().unwrap().is_none());
        assert!(result.next().is_none());
        assert_eq!(conn.advances.get(), advances);
    }

    #[test]
    fn row_entries_follow_column_order() {
        let conn = connection(vec![book("Clarence Meeks", 11.99, 4)]);
        let result = QueryExecutor::execute(&conn, "SELECT 1").expect("execute");
        let rows: Vec<Row> = result.collect::<Result<_, _>>().expect("rows");
        let entries: Vec<(String, String)> = rows[0]
            .entries()
            .map(|(label, value)| (label.to_string(), value.to_string()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("author".to_string(), "Clarence Meeks".to_string()),
                ("retailCost".to_string(), "11.99".to_string()),
                ("quantityInStock".to_string(), "4".to_string()),
            ]
        );
    }

    #[test]
    fn execution_error_is_query_failure_and_closes_statement() {
        let conn = connection(vec![]);
        let err = QueryExecutor::execute(&conn, "SELECT * FROM missing")
            .err()
            .expect("must fail");
        assert!(matches!(err, GridError::QueryFailure { .. }), "got: {err}");
        assert!(err.to_string().contains("table 'missing' not found"));
        assert!(conn.statement_closed.get());
    }

    #[test]
    fn unreadable_row_ends_the_sequence() {
        let conn = connection(vec![vec![Value::from("Daisy Mae West")], book("Jim Heavisides", 59.99, 36)]);
        let mut result = QueryExecutor::execute(&conn, "SELECT 1").expect("execute");

        let err = result.next_row().unwrap_err();
        assert!(matches!(err, GridError::QueryFailure { .. }), "got: {err}");
        assert!(err.to_string().contains("row has no column 2"));
        assert!(result.is_exhausted());

        let advances = conn.advances.get();
        assert!(result.next_row().unwrap().is_none());
        assert_eq!(conn.advances.get(), advances);
    }

    #[test]
    fn empty_result_ends_immediately() {
        let conn = connection(vec![]);
        let mut result = QueryExecutor::execute(&conn, "SELECT 1").expect("execute");
        assert!(result.next_row().unwrap().is_none());
        assert_eq!(result.metadata().column_count(), 3);
    }
}
