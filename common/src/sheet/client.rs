use super::SheetStore;
use crate::errors::StageError;
use crate::models::{JobRecord, SheetRow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// HTTP-backed Sheet Store client against a generic row-oriented REST
/// backend addressed by `sheet_id`. Stands in for the concrete spreadsheet
/// API the job record is ultimately stored in; the wire contract (one
/// header read, one bulk row read, one batched update, one batched append)
/// is what's specified here, not a particular vendor SDK.
pub struct SheetClient {
    http: reqwest::Client,
    base_url: String,
    sheet_id: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct HeaderResponse {
    columns: Vec<String>,
}

#[derive(Deserialize)]
struct RowsResponse {
    rows: Vec<HashMap<String, Value>>,
}

#[derive(Serialize)]
struct BatchUpdateRequest<'a> {
    updates: Vec<RowUpdate<'a>>,
}

#[derive(Serialize)]
struct RowUpdate<'a> {
    job_id: &'a str,
    fields: HashMap<String, Value>,
}

#[derive(Serialize)]
struct AppendRequest {
    rows: Vec<HashMap<String, Value>>,
}

impl SheetClient {
    pub fn new(http: reqwest::Client, base_url: String, sheet_id: String, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url,
            sheet_id,
            api_key,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/sheets/{}/{}", self.base_url, self.sheet_id, path);
        let req = self.http.request(method, url);
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    #[instrument(skip(self))]
    async fn fetch_header(&self) -> Result<Vec<String>, StageError> {
        let response = self
            .request(reqwest::Method::GET, "header")
            .send()
            .await
            .map_err(|e| sheet_error("fetch_header", e))?;
        let parsed: HeaderResponse = response.json().await.map_err(|e| sheet_error("fetch_header", e))?;
        Ok(parsed.columns)
    }

    #[instrument(skip(self))]
    async fn fetch_rows(&self) -> Result<Vec<HashMap<String, Value>>, StageError> {
        let response = self
            .request(reqwest::Method::GET, "rows")
            .send()
            .await
            .map_err(|e| sheet_error("fetch_rows", e))?;
        let parsed: RowsResponse = response.json().await.map_err(|e| sheet_error("fetch_rows", e))?;
        Ok(parsed.rows)
    }
}

fn sheet_error(op: &str, err: reqwest::Error) -> StageError {
    StageError::CollaboratorFailed {
        stage: "sheet_store".to_string(),
        job_id: op.to_string(),
        reason: err.to_string(),
    }
}

/// Keep only the fields present in `headers`; the header row is the source
/// of truth for column presence, absent fields are silently dropped.
fn project_onto_headers(row: &SheetRow, headers: &[String]) -> HashMap<String, Value> {
    headers
        .iter()
        .filter_map(|col| row.get(col).map(|v| (col.clone(), v.clone())))
        .collect()
}

#[async_trait]
impl SheetStore for SheetClient {
    #[instrument(skip(self, record), fields(job_id = %record.job_id))]
    async fn update_one(&self, record: &JobRecord) -> Result<(), StageError> {
        self.update_many(std::slice::from_ref(record)).await
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn update_many(&self, records: &[JobRecord]) -> Result<(), StageError> {
        if records.is_empty() {
            return Ok(());
        }

        let headers = self.fetch_header().await?;
        let existing_rows = self.fetch_rows().await?;
        let existing_ids: std::collections::HashSet<&str> = existing_rows
            .iter()
            .filter_map(|row| row.get("job_id").and_then(Value::as_str))
            .collect();

        let mut updates = Vec::new();
        let mut appends = Vec::new();

        for record in records {
            let row = record.to_sheet_row();
            let fields = project_onto_headers(&row, &headers);
            if existing_ids.contains(record.job_id.as_str()) {
                updates.push(RowUpdate {
                    job_id: &record.job_id,
                    fields,
                });
            } else {
                appends.push(fields);
            }
        }

        if !updates.is_empty() {
            self.request(reqwest::Method::POST, "batch_update")
                .json(&BatchUpdateRequest { updates })
                .send()
                .await
                .map_err(|e| sheet_error("batch_update", e))?;
        }

        if !appends.is_empty() {
            self.request(reqwest::Method::POST, "append")
                .json(&AppendRequest { rows: appends })
                .send()
                .await
                .map_err(|e| sheet_error("append", e))?;
        }

        info!(
            updated = records.len() - appends_len(&appends),
            appended = appends_len(&appends),
            "sheet store batch write complete"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, job_id: &str) -> Result<Option<SheetRow>, StageError> {
        let response = self
            .request(reqwest::Method::GET, &format!("rows/{job_id}"))
            .send()
            .await
            .map_err(|e| sheet_error("get_by_id", e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!(job_id, "sheet row not found");
            return Ok(None);
        }

        let row: HashMap<String, Value> = response.json().await.map_err(|e| sheet_error("get_by_id", e))?;
        Ok(Some(SheetRow(row)))
    }
}

fn appends_len(appends: &[HashMap<String, Value>]) -> usize {
    appends.len()
}
