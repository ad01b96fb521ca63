//! Export pipeline orchestration.
//!
//! Runs the three stages strictly in sequence: connect, bounded query, chunked
//! workbook write. Every stage fails closed; nothing proceeds on a failed
//! predecessor, and no retries happen anywhere. Progress is reported through a
//! caller-supplied callback at stage transitions and after each finalized
//! sheet.

use std::fmt;

use tracing::info;

use crate::config::{Credentials, ExportConfig};
use crate::error::Result;
use crate::export::writer;
use crate::query::QueryExecutor;
use crate::warehouse::{self, ColumnInfo, WarehouseClient};

/// MIME type of the produced artifact.
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// One export request: which table, and how many rows the caller asked for.
///
/// The row limit is a request, not a promise; the executor clamps it to the
/// configured ceiling before any SQL is built.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Table to scan, `project.table` or bare `table` form.
    pub table_name: String,

    /// Caller-requested row limit.
    pub row_limit: usize,
}

/// Pipeline stage, reported through the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    /// Building the warehouse handle.
    Connecting,
    /// Running the bounded scan.
    Querying,
    /// Serializing sheets.
    Writing,
}

impl ExportStage {
    /// Returns the stage name for display purposes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Querying => "querying",
            Self::Writing => "writing",
        }
    }
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discrete progress update from the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportProgress {
    /// A new stage has started.
    Stage(ExportStage),
    /// A sheet has been finalized (`sheet` of `total`, 1-indexed).
    SheetFinalized { sheet: usize, total: usize },
}

/// The final downloadable spreadsheet.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Download filename, derived from the table name.
    pub filename: String,

    /// Complete xlsx bytes. Only ever observable fully written.
    pub bytes: Vec<u8>,

    /// Number of sheets in the workbook.
    pub sheet_count: usize,

    /// Total data rows across all sheets.
    pub row_count: usize,
}

impl Artifact {
    /// Returns the artifact's MIME type.
    pub fn mime_type(&self) -> &'static str {
        XLSX_MIME_TYPE
    }
}

/// Terminal outcome of a successful pipeline run.
#[derive(Debug)]
pub enum ExportOutcome {
    /// Rows were found and serialized.
    Completed(Artifact),

    /// The query succeeded but returned zero rows; no artifact is produced.
    Empty {
        /// Schema of the (empty) table, when the warehouse reported one.
        columns: Vec<ColumnInfo>,
    },
}

/// Derives the download filename: last dot-separated segment of the table
/// name, plus the xlsx extension.
pub fn derive_filename(table_name: &str) -> String {
    let base = table_name.rsplit('.').next().unwrap_or(table_name);
    format!("{base}.xlsx")
}

/// The sequential connect → query → write pipeline.
#[derive(Debug, Clone)]
pub struct ExportPipeline {
    row_limit_ceiling: usize,
    chunk_size: usize,
}

impl ExportPipeline {
    /// Creates a pipeline with the given ceiling and chunk size.
    pub fn new(row_limit_ceiling: usize, chunk_size: usize) -> Self {
        Self {
            row_limit_ceiling,
            chunk_size,
        }
    }

    /// Creates a pipeline from a validated configuration.
    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.row_limit_ceiling, config.chunk_size)
    }

    /// Runs the full pipeline: acquire a handle, then query and write.
    ///
    /// The credentials live only for this call and are never stored.
    pub async fn export(
        &self,
        credentials: &Credentials,
        config: &ExportConfig,
        request: &ExportRequest,
        progress: &mut dyn FnMut(ExportProgress),
    ) -> Result<ExportOutcome> {
        progress(ExportProgress::Stage(ExportStage::Connecting));
        let client = warehouse::connect(credentials, config).await?;
        self.run_with_client(client.as_ref(), request, progress).await
    }

    /// Runs the query and write stages against an existing handle.
    pub async fn run_with_client(
        &self,
        client: &dyn WarehouseClient,
        request: &ExportRequest,
        progress: &mut dyn FnMut(ExportProgress),
    ) -> Result<ExportOutcome> {
        progress(ExportProgress::Stage(ExportStage::Querying));
        let executor = QueryExecutor::new(client, self.row_limit_ceiling);
        let table = executor.run(&request.table_name, request.row_limit).await?;

        if table.is_empty() {
            info!(table = %request.table_name, "Query returned no rows; nothing to export");
            return Ok(ExportOutcome::Empty {
                columns: table.columns,
            });
        }

        progress(ExportProgress::Stage(ExportStage::Writing));
        let mut on_sheet = |sheet: usize, total: usize| {
            progress(ExportProgress::SheetFinalized { sheet, total });
        };
        let bytes = writer::write_workbook(&table, self.chunk_size, &mut on_sheet)?;

        let artifact = Artifact {
            filename: derive_filename(&request.table_name),
            sheet_count: writer::sheet_count(table.row_count(), self.chunk_size),
            row_count: table.row_count(),
            bytes,
        };
        info!(
            filename = %artifact.filename,
            sheets = artifact.sheet_count,
            rows = artifact.row_count,
            "Export complete"
        );
        Ok(ExportOutcome::Completed(artifact))
    }
}
