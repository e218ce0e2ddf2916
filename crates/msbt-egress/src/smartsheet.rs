//! Smartsheet egress connector
//!
//! Queries arrive as virtual function calls (`getSheetById(123)`) and are
//! dispatched to a fixed set of Smartsheet API 2.0 operations.

use crate::{
    EgressError, Result,
    client::{HttpClientConfig, check_status, create_client, read_json, with_retry},
};
use async_trait::async_trait;
use msbt_core::{DataSource, FunctionCall, SourceKind, SourceRequest};
use reqwest::{Client, header::ACCEPT};
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

/// Smartsheet connector configuration
#[derive(Debug, Clone)]
pub struct SmartsheetConfig {
    /// API access token
    pub access_token: String,

    /// API base URL (default: https://api.smartsheet.com/2.0)
    pub base_url: String,

    /// File written by `writeToCSV`
    pub export_path: PathBuf,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl SmartsheetConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: "https://api.smartsheet.com/2.0".to_string(),
            export_path: PathBuf::from("output.csv"),
            client_config: HttpClientConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_export_path(mut self, export_path: impl Into<PathBuf>) -> Self {
        self.export_path = export_path.into();
        self
    }
}

/// The operations reachable through a virtual function call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartsheetOperation {
    GetSheetRows { sheet_id: u64, row_id: u64 },
    GetSheetAsJson { sheet_id: u64 },
    GetSheetById { sheet_id: u64 },
    WriteToCsv { sheet_id: u64 },
    ListSheets,
}

impl SmartsheetOperation {
    /// Resolve a parsed call. `Ok(None)` for names outside the fixed set;
    /// an error when a known name has missing or non-numeric ids.
    pub fn from_call(call: &FunctionCall) -> msbt_core::Result<Option<Self>> {
        let id = |index: usize, label: &str| {
            call.arg_u64(index).ok_or_else(|| {
                msbt_core::Error::InvalidRequest(format!(
                    "{} requires a numeric {}",
                    call.name, label
                ))
            })
        };

        let operation = match call.name.as_str() {
            "getSheetRows" => Self::GetSheetRows {
                sheet_id: id(0, "sheetId")?,
                row_id: id(1, "rowId")?,
            },
            "getSheetAsJSON" => Self::GetSheetAsJson {
                sheet_id: id(0, "sheetId")?,
            },
            "getSheetById" => Self::GetSheetById {
                sheet_id: id(0, "sheetId")?,
            },
            "writeToCSV" => Self::WriteToCsv {
                sheet_id: id(0, "sheetId")?,
            },
            "listSheets" => Self::ListSheets,
            _ => return Ok(None),
        };

        Ok(Some(operation))
    }
}

/// Reply for queries that name no known operation
pub fn no_query() -> Value {
    json!({ "message": "no query" })
}

/// Convert CSV text with a header row into an array of JSON objects.
/// All values are kept as strings; short rows omit their missing columns.
pub fn csv_to_json(text: &str) -> Result<Value> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| EgressError::ParseError(format!("Invalid CSV header: {}", e)))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| EgressError::ParseError(format!("Invalid CSV row: {}", e)))?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), Value::from(value)))
            .collect();
        rows.push(Value::Object(row));
    }

    Ok(Value::Array(rows))
}

/// Error body returned in place of a row: the vendor's JSON error when it
/// sent one, with `statusCode` added.
fn row_error(sheet_id: u64, row_id: u64, err: EgressError) -> Value {
    warn!("Error fetching row {} of sheet {}: {}", row_id, sheet_id, err);
    match err {
        EgressError::ProviderError {
            status_code,
            message,
        } => match serde_json::from_str::<Value>(&message) {
            Ok(Value::Object(mut body)) => {
                body.insert("statusCode".to_string(), Value::from(status_code));
                Value::Object(body)
            }
            _ => json!({ "statusCode": status_code, "message": message }),
        },
        other => json!({ "message": other.to_string() }),
    }
}

/// Smartsheet connector
pub struct SmartsheetConnector {
    config: SmartsheetConfig,
    client: Client,
}

impl SmartsheetConnector {
    pub fn new(config: SmartsheetConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        with_retry(self.config.client_config.max_retries, || {
            let url = url.as_str();
            async move {
                let response = self
                    .client
                    .get(url)
                    .bearer_auth(&self.config.access_token)
                    .send()
                    .await?;

                read_json(response, "Smartsheet").await
            }
        })
        .await
    }

    /// List the sheets visible to the token
    #[instrument(skip(self))]
    pub async fn list_sheets(&self) -> Result<Value> {
        self.get_json("/sheets").await
    }

    /// Full sheet with columns and rows
    #[instrument(skip(self))]
    pub async fn get_sheet(&self, sheet_id: u64) -> Result<Value> {
        self.get_json(&format!("/sheets/{}", sheet_id)).await
    }

    /// A single row of a sheet
    #[instrument(skip(self))]
    pub async fn get_row(&self, sheet_id: u64, row_id: u64) -> Result<Value> {
        self.get_json(&format!("/sheets/{}/rows/{}", sheet_id, row_id))
            .await
    }

    /// Sheet rendered as CSV text
    #[instrument(skip(self))]
    pub async fn get_sheet_csv(&self, sheet_id: u64) -> Result<String> {
        let url = self.url(&format!("/sheets/{}", sheet_id));
        with_retry(self.config.client_config.max_retries, || {
            let url = url.as_str();
            async move {
                let response = self
                    .client
                    .get(url)
                    .bearer_auth(&self.config.access_token)
                    .header(ACCEPT, "text/csv")
                    .send()
                    .await?;

                Ok::<_, EgressError>(check_status(response).await?.text().await?)
            }
        })
        .await
    }

    /// CSV download, empty when the download fails
    async fn download_csv(&self, sheet_id: u64) -> String {
        match self.get_sheet_csv(sheet_id).await {
            Ok(csv) => csv,
            Err(e) => {
                error!("Error downloading sheet {}: {}", sheet_id, e);
                String::new()
            }
        }
    }

    /// `{ "json": [...], "csv": "..." }`; `json` stays `""` when there is no CSV
    #[instrument(skip(self))]
    pub async fn sheet_as_json(&self, sheet_id: u64) -> Result<Value> {
        let csv = self.download_csv(sheet_id).await;
        let json = if csv.is_empty() {
            Value::from("")
        } else {
            csv_to_json(&csv)?
        };

        Ok(json!({ "json": json, "csv": csv }))
    }

    /// Write the sheet as CSV to the configured export path
    #[instrument(skip(self))]
    pub async fn write_csv(&self, sheet_id: u64) -> Result<Value> {
        let csv = self.download_csv(sheet_id).await;
        if !csv.is_empty() {
            let mut contents = csv.lines().collect::<Vec<_>>().join("\n");
            contents.push('\n');
            tokio::fs::write(&self.config.export_path, contents).await?;
        }

        let file_name = self
            .config
            .export_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config.export_path.display().to_string());

        Ok(json!({ "message": format!("SUCCESS writing {}", file_name) }))
    }

    /// Run one resolved operation. A failed row lookup answers with the
    /// error body instead of failing the request.
    pub async fn run(&self, operation: SmartsheetOperation) -> Result<Value> {
        match operation {
            SmartsheetOperation::GetSheetRows { sheet_id, row_id } => {
                Ok(self
                    .get_row(sheet_id, row_id)
                    .await
                    .unwrap_or_else(|e| row_error(sheet_id, row_id, e)))
            }
            SmartsheetOperation::GetSheetAsJson { sheet_id } => self.sheet_as_json(sheet_id).await,
            SmartsheetOperation::GetSheetById { sheet_id } => self.get_sheet(sheet_id).await,
            SmartsheetOperation::WriteToCsv { sheet_id } => self.write_csv(sheet_id).await,
            SmartsheetOperation::ListSheets => self.list_sheets().await,
        }
    }
}

#[async_trait]
impl DataSource for SmartsheetConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Smartsheet
    }

    async fn execute(&self, request: SourceRequest) -> msbt_core::Result<Value> {
        let Some(query) = request.envelope.query_text() else {
            return Ok(no_query());
        };

        let operation = match FunctionCall::parse(query) {
            Some(call) => SmartsheetOperation::from_call(&call)?,
            None => None,
        };

        let response = match operation {
            Some(operation) => self.run(operation).await?,
            None => no_query(),
        };

        info!("🔵[smartsheet]: {}", query);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(text: &str) -> FunctionCall {
        FunctionCall::parse(text).unwrap()
    }

    #[test]
    fn test_operation_from_call() {
        assert_eq!(
            SmartsheetOperation::from_call(&call("getSheetRows(1, 2)")).unwrap(),
            Some(SmartsheetOperation::GetSheetRows {
                sheet_id: 1,
                row_id: 2
            })
        );
        assert_eq!(
            SmartsheetOperation::from_call(&call("getSheetAsJSON(2888478287155076)")).unwrap(),
            Some(SmartsheetOperation::GetSheetAsJson {
                sheet_id: 2888478287155076
            })
        );
        assert_eq!(
            SmartsheetOperation::from_call(&call("listSheets()")).unwrap(),
            Some(SmartsheetOperation::ListSheets)
        );
    }

    #[test]
    fn test_unknown_function_resolves_to_none() {
        assert_eq!(
            SmartsheetOperation::from_call(&call("deleteSheet(1)")).unwrap(),
            None
        );
    }

    #[test]
    fn test_known_function_with_bad_ids() {
        let err = SmartsheetOperation::from_call(&call("getSheetRows(1)")).unwrap_err();
        assert!(err.to_string().contains("rowId"));

        let err = SmartsheetOperation::from_call(&call("getSheetById(abc)")).unwrap_err();
        assert!(err.to_string().contains("sheetId"));
    }

    #[test]
    fn test_csv_to_json() {
        let json = csv_to_json("Name,Status\nAcme,Open\nGlobex,Closed\n").unwrap();
        assert_eq!(
            json,
            json!([
                { "Name": "Acme", "Status": "Open" },
                { "Name": "Globex", "Status": "Closed" }
            ])
        );
    }

    #[test]
    fn test_csv_to_json_quoted_and_short_rows() {
        let json = csv_to_json("\u{feff}Name,Notes\n\"Adams, Reese\",\"said \"\"hi\"\"\"\nSolo\n").unwrap();
        assert_eq!(json[0]["Name"], "Adams, Reese");
        assert_eq!(json[0]["Notes"], "said \"hi\"");
        assert_eq!(json[1], json!({ "Name": "Solo" }));
    }

    #[test]
    fn test_csv_header_only() {
        assert_eq!(csv_to_json("A,B\n").unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_execute_without_query() {
        let connector = SmartsheetConnector::new(SmartsheetConfig::new("token")).unwrap();
        let result = connector.execute(SourceRequest::default()).await.unwrap();
        assert_eq!(result, no_query());
    }

    #[tokio::test]
    async fn test_execute_unparseable_query() {
        let connector = SmartsheetConnector::new(SmartsheetConfig::new("token")).unwrap();
        let request = SourceRequest::new(msbt_core::QueryEnvelope::with_query("listSheets"));
        assert_eq!(connector.execute(request).await.unwrap(), no_query());
    }
}
