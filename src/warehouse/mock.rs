//! Mock warehouse clients for testing.
//!
//! Provides in-memory implementations for headless testing of the pipeline.

use super::{ColumnInfo, TabularResult, Value, WarehouseClient};
use crate::error::{ExportError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// A mock warehouse client backed by a fixed in-memory table.
///
/// Honors the `LIMIT` clause of the scan statement by truncating the stored
/// rows, and records every statement it receives so tests can assert on the
/// exact SQL sent downstream.
pub struct MockWarehouseClient {
    table: TabularResult,
    seen_sql: Mutex<Vec<String>>,
}

impl MockWarehouseClient {
    /// Creates a mock client serving the given table.
    pub fn with_table(table: TabularResult) -> Self {
        Self {
            table,
            seen_sql: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock client serving `n` generated rows of (id, name).
    pub fn with_generated_rows(n: usize) -> Self {
        let columns = vec![
            ColumnInfo::new("id", "bigint"),
            ColumnInfo::new("name", "string"),
        ];
        let rows = (0..n)
            .map(|i| {
                vec![
                    Value::Int(i as i64),
                    Value::String(format!("row_{i}")),
                ]
            })
            .collect();
        Self::with_table(TabularResult::with_data(columns, rows))
    }

    /// Returns the scan statements received so far.
    pub fn seen_sql(&self) -> Vec<String> {
        self.seen_sql.lock().expect("seen_sql lock poisoned").clone()
    }
}

impl Default for MockWarehouseClient {
    fn default() -> Self {
        Self::with_table(TabularResult::new())
    }
}

#[async_trait]
impl WarehouseClient for MockWarehouseClient {
    async fn execute_bounded_scan(&self, sql: &str) -> Result<TabularResult> {
        self.seen_sql
            .lock()
            .expect("seen_sql lock poisoned")
            .push(sql.to_string());

        let limit = parse_limit(sql);
        let mut result = self.table.clone();
        if let Some(limit) = limit {
            result.rows.truncate(limit);
        }
        Ok(result)
    }
}

/// Extracts the row cap from a trailing `LIMIT n` clause.
fn parse_limit(sql: &str) -> Option<usize> {
    let upper = sql.to_uppercase();
    let idx = upper.rfind("LIMIT")?;
    sql[idx + "LIMIT".len()..].trim().parse().ok()
}

/// A mock warehouse client whose scans always fail.
pub struct FailingWarehouseClient {
    message: String,
}

impl FailingWarehouseClient {
    /// Creates a client that fails every scan with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl WarehouseClient for FailingWarehouseClient {
    async fn execute_bounded_scan(&self, _sql: &str) -> Result<TabularResult> {
        Err(ExportError::query(self.message.clone()))
    }
}
