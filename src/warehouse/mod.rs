//! Warehouse abstraction layer.
//!
//! Provides a trait-based interface for the warehouse query service, allowing
//! the HTTP client and the in-memory mock to be used interchangeably.

mod http;
mod mock;
mod types;

pub use http::HttpWarehouseClient;
pub use mock::{FailingWarehouseClient, MockWarehouseClient};
pub use types::{ColumnInfo, Row, TabularResult, Value};

use crate::config::{Credentials, ExportConfig};
use crate::error::Result;
use async_trait::async_trait;

/// Builds a warehouse client handle from credentials and configuration.
///
/// This is the connection factory for the pipeline: credentials are validated
/// before any network activity, the service is probed exactly once, and a
/// rejected or unreachable service is terminal for the request.
pub async fn connect(
    credentials: &Credentials,
    config: &ExportConfig,
) -> Result<Box<dyn WarehouseClient>> {
    credentials.validate()?;
    let client = HttpWarehouseClient::connect(credentials, config).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface to the warehouse query service.
///
/// The service is an opaque capability: it accepts a bounded scan statement
/// and returns the materialized rows.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Executes a bounded `SELECT * ... LIMIT n` scan and materializes the result.
    async fn execute_bounded_scan(&self, sql: &str) -> Result<TabularResult>;
}
