//! Bounded query execution.
//!
//! Clamps caller-requested row limits and issues full-table bounded scans.

mod executor;

pub use executor::{validate_table_name, QueryExecutor, DEFAULT_ROW_LIMIT_CEILING, ROW_LIMIT_PRESETS};
