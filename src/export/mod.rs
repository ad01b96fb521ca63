//! Spreadsheet export: chunked workbook writing and pipeline orchestration.

mod pipeline;
mod writer;

pub use pipeline::{
    Artifact, ExportOutcome, ExportPipeline, ExportProgress, ExportRequest, ExportStage,
    XLSX_MIME_TYPE,
};
pub use writer::{
    chunk_bounds, sheet_count, sheet_name, write_workbook, DEFAULT_CHUNK_SIZE, SHEET_NAME_PREFIX,
};
