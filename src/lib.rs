//! odps-export - bounded warehouse table scans exported to Excel workbooks.
//!
//! This library exposes the core modules for use in integration tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod query;
pub mod warehouse;
