//! odps-export - bounded warehouse table scans exported to Excel workbooks.

use odps_export::cli::Cli;
use odps_export::config::Config;
use odps_export::error::{ExportError, Result};
use odps_export::export::{ExportOutcome, ExportPipeline, ExportProgress, ExportRequest};
use odps_export::warehouse::MockWarehouseClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load .env if present; the real environment wins.
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Load configuration file
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let file_config = Config::load_from_file(&config_path)?;

    // Resolve the effective configuration and fail fast on unusable values.
    let export_config = cli.to_export_config(&file_config);
    export_config.validate()?;
    info!("Warehouse: {}", export_config.display_string());

    let request = ExportRequest {
        table_name: cli.table.clone(),
        row_limit: cli.max_rows,
    };
    let pipeline = ExportPipeline::from_config(&export_config);

    let mut progress = |p: ExportProgress| match p {
        ExportProgress::Stage(stage) => info!("Stage: {stage}"),
        ExportProgress::SheetFinalized { sheet, total } => {
            info!("Writing sheet {sheet}/{total}");
        }
    };

    let outcome = if cli.mock_db {
        let client = MockWarehouseClient::with_generated_rows(cli.mock_rows);
        pipeline
            .run_with_client(&client, &request, &mut progress)
            .await?
    } else {
        // Credentials live only for this request and are dropped with it.
        let credentials = cli.credentials()?;
        pipeline
            .export(&credentials, &export_config, &request, &mut progress)
            .await?
    };

    match outcome {
        ExportOutcome::Completed(artifact) => {
            let path = cli.output_path(&artifact.filename);
            std::fs::write(&path, &artifact.bytes).map_err(|e| {
                ExportError::io(format!(
                    "Failed to write artifact to {}: {e}",
                    path.display()
                ))
            })?;
            info!(
                rows = artifact.row_count,
                sheets = artifact.sheet_count,
                "Artifact written to {}",
                path.display()
            );
            println!(
                "Exported {} rows ({} sheets) to {}",
                artifact.row_count,
                artifact.sheet_count,
                path.display()
            );
        }
        ExportOutcome::Empty { columns } => {
            info!(columns = columns.len(), "Query returned no rows");
            println!("Query succeeded but returned no rows; no file was written.");
        }
    }

    Ok(())
}
