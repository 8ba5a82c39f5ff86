use chrono::{DateTime, Datelike, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::AirtableConfig;
use crate::error::{Result, VoxError};

/// One record as Airtable returns it. `fields` is kept opaque here; field
/// normalization happens at ingestion.
#[derive(Debug, Clone, Deserialize)]
pub struct AirtableRecord {
    pub id: String,
    #[serde(rename = "createdTime")]
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl AirtableRecord {
    /// The upstream modification timestamp, taken from the `Last Modified`
    /// payload field when the table exposes it, otherwise the creation time.
    pub fn modified_time(&self) -> DateTime<Utc> {
        self.fields
            .get("Last Modified")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(self.created_time)
    }
}

#[derive(Debug, Deserialize)]
struct AirtableResponse {
    #[serde(default)]
    records: Vec<Value>,
    offset: Option<String>,
}

/// Converts raw page entries into typed records, skipping entries that do
/// not parse instead of failing the page.
fn parse_records(raw: Vec<Value>) -> Vec<AirtableRecord> {
    let mut records = Vec::with_capacity(raw.len());
    for value in raw {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<missing id>")
            .to_string();
        match serde_json::from_value::<AirtableRecord>(value) {
            Ok(record) => records.push(record),
            Err(error) => {
                tracing::warn!(id = %id, error = %error, "Skipping unparseable upstream record");
            }
        }
    }
    records
}

#[derive(Clone)]
pub struct AirtableClient {
    client: Client,
    config: AirtableConfig,
}

impl AirtableClient {
    pub fn new(config: AirtableConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some() && !self.config.base_id.is_empty()
    }

    /// Fetches every record matching the scope, following pagination until
    /// the server stops returning an offset cursor. `since = None` fetches
    /// the full current-year scope; `since = Some(ts)` narrows to records
    /// created or modified after `ts`.
    pub async fn fetch_records(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<AirtableRecord>> {
        if !self.is_configured() {
            return Err(VoxError::Validation(
                "Airtable API key and base ID are required".to_string(),
            ));
        }

        let formula = filter_formula(Utc::now().year(), since.as_ref());
        let mut all_records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let page = self.fetch_page(&formula, offset.as_deref()).await?;
            if page.records.is_empty() {
                break;
            }
            all_records.extend(parse_records(page.records));
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        tracing::debug!(records = all_records.len(), "Fetched Airtable records");
        Ok(all_records)
    }

    async fn fetch_page(&self, formula: &str, offset: Option<&str>) -> Result<AirtableResponse> {
        let mut headers = HeaderMap::new();
        if let Some(ref api_key) = self.config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {api_key}"))
                    .map_err(|e| VoxError::Validation(format!("Invalid API key header: {e}")))?,
            );
        }

        let url = format!(
            "{}/{}/{}",
            self.config.base_url, self.config.base_id, self.config.table_name
        );
        let page_size = self.config.page_size.to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("pageSize", page_size.as_str()),
            ("filterByFormula", formula),
        ];
        if let Some(cursor) = offset {
            query.push(("offset", cursor));
        }

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(100 * 2_u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .get(&url)
                .headers(headers.clone())
                .query(&query)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        return Ok(resp.json::<AirtableResponse>().await?);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse().ok());
                        last_error = Some(VoxError::ApiRateLimit { retry_after });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED
                        || status == reqwest::StatusCode::FORBIDDEN
                    {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(VoxError::ApiAuth(body));
                    }

                    let body = resp.text().await.unwrap_or_default();
                    if status.is_server_error() {
                        last_error = Some(VoxError::Upstream {
                            status: status.as_u16(),
                            message: body,
                        });
                        continue;
                    }

                    return Err(VoxError::Upstream {
                        status: status.as_u16(),
                        message: body,
                    });
                }
                Err(e) => {
                    last_error = Some(VoxError::Http(e));
                    continue;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            VoxError::Internal("Airtable request failed with no response".to_string())
        }))
    }
}

/// Builds the `filterByFormula` value. Every fetch is scoped to records
/// created in `year`; an incremental fetch additionally requires creation or
/// modification after `since`.
fn filter_formula(year: i32, since: Option<&DateTime<Utc>>) -> String {
    let year_scope = format!("YEAR({{Created}}) = {year}");
    match since {
        None => year_scope,
        Some(ts) => {
            let ts = ts.to_rfc3339();
            format!(
                "AND({year_scope}, OR({{Created}} > '{ts}', {{Last Modified Time}} > '{ts}'))"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_full_scope_formula() {
        assert_eq!(filter_formula(2025, None), "YEAR({Created}) = 2025");
    }

    #[test]
    fn test_incremental_formula_includes_both_timestamps() {
        let since = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let formula = filter_formula(2025, Some(&since));

        assert!(formula.starts_with("AND(YEAR({Created}) = 2025, OR("));
        assert!(formula.contains("{Created} > '2025-06-01T12:00:00+00:00'"));
        assert!(formula.contains("{Last Modified Time} > '2025-06-01T12:00:00+00:00'"));
    }

    #[test]
    fn test_modified_time_prefers_payload_field() {
        let record: AirtableRecord = serde_json::from_value(serde_json::json!({
            "id": "rec123",
            "createdTime": "2025-05-01T10:00:00.000Z",
            "fields": {"Last Modified": "2025-06-15T08:30:00+00:00"}
        }))
        .unwrap();

        assert_eq!(
            record.modified_time(),
            Utc.with_ymd_and_hms(2025, 6, 15, 8, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_records_skips_unparseable_entries() {
        let raw = vec![
            serde_json::json!({
                "id": "rec_ok",
                "createdTime": "2025-05-01T10:00:00.000Z",
                "fields": {"Priority": "1"}
            }),
            serde_json::json!({
                "id": "rec_bad",
                "createdTime": "not a timestamp",
                "fields": {}
            }),
        ];

        let records = parse_records(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "rec_ok");
    }

    #[test]
    fn test_modified_time_falls_back_to_created() {
        let record: AirtableRecord = serde_json::from_value(serde_json::json!({
            "id": "rec123",
            "createdTime": "2025-05-01T10:00:00.000Z",
            "fields": {}
        }))
        .unwrap();

        assert_eq!(record.modified_time(), record.created_time);
    }
}
