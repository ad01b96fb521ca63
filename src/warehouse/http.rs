//! HTTP warehouse client implementation.
//!
//! Talks to the warehouse's REST query endpoint: a lightweight project probe
//! at connect time, then one POST per bounded scan. A single attempt is made
//! for every request; connectivity failures are terminal for the export.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ColumnInfo, Row, TabularResult, Value, WarehouseClient};
use crate::config::{Credentials, ExportConfig};
use crate::error::{ExportError, Result};

/// Default timeout for warehouse requests.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Header carrying the access key id.
const ACCESS_ID_HEADER: &str = "x-odps-access-id";

/// Header carrying the access key secret.
const ACCESS_KEY_HEADER: &str = "x-odps-access-key";

/// HTTP warehouse client.
pub struct HttpWarehouseClient {
    client: Client,
    endpoint: Url,
    project: String,
    credentials: Credentials,
}

impl HttpWarehouseClient {
    /// Connects to the warehouse, probing the project once to verify the
    /// credentials are accepted.
    ///
    /// No retries: a rejected or unreachable service surfaces immediately.
    pub async fn connect(credentials: &Credentials, config: &ExportConfig) -> Result<Self> {
        credentials.validate()?;

        let endpoint = config.endpoint_url()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ExportError::connection(format!("Failed to create HTTP client: {e}")))?;

        let this = Self {
            client,
            endpoint,
            project: config.project().to_string(),
            credentials: credentials.clone(),
        };

        this.probe_project().await?;
        debug!(project = %this.project, "Connected to warehouse");
        Ok(this)
    }

    /// Verifies the credentials against the project endpoint.
    async fn probe_project(&self) -> Result<()> {
        let url = self.endpoint_join(&format!("projects/{}", self.project))?;

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| ExportError::connection(format!("Warehouse unreachable: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Message must not echo credential values.
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ExportError::connection(
                "Warehouse rejected the provided credentials",
            ));
        }
        Err(ExportError::connection(format!(
            "Warehouse returned {status} for project '{}'",
            self.project
        )))
    }

    /// Attaches the authentication headers to a request.
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(ACCESS_ID_HEADER, &self.credentials.access_id)
            .header(ACCESS_KEY_HEADER, &self.credentials.access_secret)
    }

    /// Joins a path onto the configured endpoint.
    fn endpoint_join(&self, path: &str) -> Result<Url> {
        // Url::join treats a path without a trailing slash as a file segment,
        // so normalize before joining.
        let mut base = self.endpoint.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(path)
            .map_err(|e| ExportError::connection(format!("Invalid endpoint path: {e}")))
    }

    /// Parses a failed scan response into the matching error kind.
    fn parse_scan_error(status: StatusCode, body: &str) -> ExportError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return ExportError::connection("Warehouse rejected the provided credentials");
        }

        if let Ok(error_response) = serde_json::from_str::<ScanErrorResponse>(body) {
            return ExportError::query(error_response.error.message);
        }

        ExportError::query(format!("Warehouse returned {status}: {body}"))
    }
}

#[async_trait]
impl WarehouseClient for HttpWarehouseClient {
    async fn execute_bounded_scan(&self, sql: &str) -> Result<TabularResult> {
        let url = self.endpoint_join("queries")?;
        let request = ScanRequest {
            project: &self.project,
            sql,
        };

        debug!(%sql, "Executing bounded scan");

        let response = self
            .authorized(self.client.post(url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ExportError::connection(format!("Warehouse unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_scan_error(status, &body));
        }

        let scan: ScanResponse = response
            .json()
            .await
            .map_err(|e| ExportError::query(format!("Malformed scan response: {e}")))?;

        scan.into_result()
    }
}

/// Request body for the scan endpoint.
#[derive(Debug, Serialize)]
struct ScanRequest<'a> {
    project: &'a str,
    sql: &'a str,
}

/// Response body from the scan endpoint.
#[derive(Debug, Deserialize)]
struct ScanResponse {
    columns: Vec<ScanColumn>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ScanColumn {
    name: String,
    #[serde(rename = "type", default)]
    data_type: String,
}

/// Error body from the scan endpoint.
#[derive(Debug, Deserialize)]
struct ScanErrorResponse {
    error: ScanErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ScanErrorDetail {
    message: String,
}

impl ScanResponse {
    /// Converts the JSON payload into a `TabularResult`.
    ///
    /// Rows must be scalar-only and as wide as the schema; anything else is a
    /// malformed response from the service.
    fn into_result(self) -> Result<TabularResult> {
        let columns: Vec<ColumnInfo> = self
            .columns
            .into_iter()
            .map(|c| ColumnInfo::new(c.name, c.data_type))
            .collect();

        let mut rows: Vec<Row> = Vec::with_capacity(self.rows.len());
        for (row_idx, raw) in self.rows.into_iter().enumerate() {
            if raw.len() != columns.len() {
                return Err(ExportError::query(format!(
                    "Row {row_idx} has {} values but the schema has {} columns",
                    raw.len(),
                    columns.len()
                )));
            }
            let mut row: Row = Vec::with_capacity(raw.len());
            for (col_idx, cell) in raw.into_iter().enumerate() {
                row.push(convert_cell(cell).ok_or_else(|| {
                    ExportError::query(format!(
                        "Non-scalar value in row {row_idx}, column '{}'",
                        columns[col_idx].name
                    ))
                })?);
            }
            rows.push(row);
        }

        Ok(TabularResult::with_data(columns, rows))
    }
}

/// Maps a JSON scalar to a warehouse value. Arrays and objects are rejected.
fn convert_cell(value: serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::Bool(b) => Some(Value::Bool(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Int(i))
            } else {
                n.as_f64().map(Value::Float)
            }
        }
        serde_json::Value::String(s) => Some(Value::String(s)),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}
