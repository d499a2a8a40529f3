//! Lazy result cursor.
//!
//! Nothing is read from the cache until the first [`ResultSet::advance`]; the regions
//! of every source are then snapshotted and combined by a nested loop, outer table
//! first. Closing the cursor, its statement or its connection invalidates it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gridsql_core::{Closeable, GridError, ResultMetadata, ResultSet, Value};

use crate::error::EngineError;
use crate::plan::LogicalPlan;

enum CursorState {
    Pending,
    Streaming(Scan),
    Exhausted,
}

/// Nested-loop position over materialized sources.
struct Scan {
    tables: Vec<Vec<Vec<Value>>>,
    positions: Vec<usize>,
    started: bool,
}

impl Scan {
    fn new(tables: Vec<Vec<Vec<Value>>>) -> Self {
        let positions = vec![0; tables.len()];
        Self {
            tables,
            positions,
            started: false,
        }
    }

    /// Move to the next combination. `false` once every combination was visited.
    fn step(&mut self) -> bool {
        if !self.started {
            self.started = true;
            return self.tables.iter().all(|rows| !rows.is_empty());
        }
        for i in (0..self.positions.len()).rev() {
            self.positions[i] += 1;
            if self.positions[i] < self.tables[i].len() {
                return true;
            }
            self.positions[i] = 0;
        }
        false
    }

    fn combined(&self) -> Vec<Value> {
        self.tables
            .iter()
            .zip(&self.positions)
            .flat_map(|(rows, &at)| rows[at].iter().cloned())
            .collect()
    }

    fn next_match(&mut self, plan: &LogicalPlan) -> Option<Vec<Value>> {
        while self.step() {
            let row = self.combined();
            if plan.accepts(&row) {
                return Some(row);
            }
        }
        None
    }
}

pub struct GridResultSet {
    plan: Arc<LogicalPlan>,
    state: CursorState,
    current: Option<Vec<Value>>,
    closed: bool,
    statement_closed: Arc<AtomicBool>,
    connection_closed: Arc<AtomicBool>,
}

impl GridResultSet {
    pub(crate) fn new(
        plan: Arc<LogicalPlan>,
        statement_closed: Arc<AtomicBool>,
        connection_closed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            plan,
            state: CursorState::Pending,
            current: None,
            closed: false,
            statement_closed,
            connection_closed,
        }
    }

    fn ensure_usable(&self) -> Result<(), EngineError> {
        if self.closed {
            Err(EngineError::Closed("result set"))
        } else if self.statement_closed.load(Ordering::SeqCst) {
            Err(EngineError::Closed("statement"))
        } else if self.connection_closed.load(Ordering::SeqCst) {
            Err(EngineError::Closed("connection"))
        } else {
            Ok(())
        }
    }

    fn load(&self) -> Result<Scan, EngineError> {
        let mut tables = Vec::with_capacity(self.plan.sources().len());
        for source in self.plan.sources() {
            let table = &source.table;
            let records = table
                .cache
                .read_region(&table.name)
                .map_err(|source| EngineError::Cache {
                    region: table.name.clone(),
                    source,
                })?;
            tracing::debug!(region = %table.name, rows = records.len(), "region loaded");
            let rows = records
                .iter()
                .map(|record| {
                    table
                        .columns
                        .iter()
                        .map(|column| record.get(column).cloned().unwrap_or(Value::Null))
                        .collect()
                })
                .collect();
            tables.push(rows);
        }
        Ok(Scan::new(tables))
    }
}

impl Closeable for GridResultSet {
    fn close(&mut self) -> Result<(), GridError> {
        self.closed = true;
        self.current = None;
        self.state = CursorState::Exhausted;
        Ok(())
    }

    fn describe(&self) -> String {
        "result set".to_string()
    }
}

impl ResultSet for GridResultSet {
    fn metadata(&self) -> Arc<ResultMetadata> {
        self.plan.metadata()
    }

    fn advance(&mut self) -> Result<bool, GridError> {
        self.ensure_usable()?;
        if matches!(self.state, CursorState::Pending) {
            match self.load() {
                Ok(scan) => self.state = CursorState::Streaming(scan),
                Err(err) => {
                    self.state = CursorState::Exhausted;
                    return Err(err.into());
                }
            }
        }
        let next = match &mut self.state {
            CursorState::Streaming(scan) => scan.next_match(&self.plan),
            _ => None,
        };
        match next {
            Some(row) => {
                self.current = Some(self.plan.project(&row));
                Ok(true)
            }
            None => {
                self.state = CursorState::Exhausted;
                self.current = None;
                Ok(false)
            }
        }
    }

    fn value(&self, index: usize) -> Result<Value, GridError> {
        self.ensure_usable()?;
        self.plan.metadata().column(index)?;
        let row = self.current.as_ref().ok_or(EngineError::NoCurrentRow)?;
        Ok(row.get(index - 1).cloned().unwrap_or(Value::Null))
    }
}
