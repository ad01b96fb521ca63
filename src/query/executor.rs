//! Bounded query executor.
//!
//! Builds and runs the `SELECT * FROM <table> LIMIT <n>` scan. The requested
//! row limit is clamped to the configured ceiling before it reaches the SQL
//! text, so no query can ever ask the warehouse for more than the ceiling.

use std::sync::OnceLock;
use std::time::Instant;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{ExportError, Result};
use crate::warehouse::{TabularResult, WarehouseClient};

/// Default hard ceiling on the effective row limit.
pub const DEFAULT_ROW_LIMIT_CEILING: usize = 500_000;

/// Row-limit presets offered to interactive callers.
pub const ROW_LIMIT_PRESETS: [usize; 4] = [10_000, 50_000, 100_000, 200_000];

/// Validates a table name of the form `project.table` or bare `table`.
///
/// Identifiers are restricted to `[A-Za-z_][A-Za-z0-9_]*`, which also keeps
/// the interpolated SQL free of injected syntax.
pub fn validate_table_name(name: &str) -> Result<()> {
    static TABLE_NAME_RE: OnceLock<Regex> = OnceLock::new();
    let re = TABLE_NAME_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("table name regex is valid")
    });

    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ExportError::invalid_input("table name must not be empty"));
    }
    if !re.is_match(trimmed) {
        return Err(ExportError::invalid_input(format!(
            "invalid table name '{trimmed}': expected 'project.table' or 'table'"
        )));
    }
    Ok(())
}

/// Query executor that clamps limits and runs bounded scans.
pub struct QueryExecutor<'a> {
    client: &'a dyn WarehouseClient,
    row_limit_ceiling: usize,
}

impl<'a> QueryExecutor<'a> {
    /// Creates an executor over the given client with the given ceiling.
    pub fn new(client: &'a dyn WarehouseClient, row_limit_ceiling: usize) -> Self {
        Self {
            client,
            row_limit_ceiling,
        }
    }

    /// Returns the limit that will actually be sent downstream.
    pub fn effective_limit(&self, requested: usize) -> usize {
        requested.min(self.row_limit_ceiling)
    }

    /// Builds the bounded scan statement for the given table and limit.
    fn build_scan_sql(table_name: &str, limit: usize) -> String {
        format!("SELECT * FROM {table_name} LIMIT {limit}")
    }

    /// Runs a bounded scan against the given table.
    ///
    /// Returns the materialized result; a valid-but-empty table yields zero
    /// rows with the schema preserved, which is success and distinct from any
    /// failure. The result is never partial.
    pub async fn run(&self, table_name: &str, requested_limit: usize) -> Result<TabularResult> {
        validate_table_name(table_name)?;

        let limit = self.effective_limit(requested_limit);
        if limit < requested_limit {
            debug!(requested_limit, limit, "Row limit clamped to ceiling");
        }
        let sql = Self::build_scan_sql(table_name.trim(), limit);

        let start = Instant::now();
        let result = self.client.execute_bounded_scan(&sql).await?;
        info!(
            table = table_name,
            rows = result.row_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Bounded scan complete"
        );

        Ok(result)
    }
}
