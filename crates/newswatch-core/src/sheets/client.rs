use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::auth::AccessTokenProvider;
use super::rows::{build_rows, HEADER_ROW};
use super::{ScanLogEntry, ScanLogger};
use crate::config::SheetsConfig;
use crate::feed::build_client;
use crate::{Error, Result};

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

/// Thin client for the Drive search and Sheets create/append endpoints
pub struct SheetsClient {
    client: Client,
    drive_api_base: String,
    sheets_api_base: String,
    worksheet_title: String,
}

impl SheetsClient {
    pub fn new(client: Client, config: &SheetsConfig) -> Self {
        Self {
            client,
            drive_api_base: config.drive_api_base.trim_end_matches('/').to_string(),
            sheets_api_base: config.sheets_api_base.trim_end_matches('/').to_string(),
            worksheet_title: config.worksheet_title.clone(),
        }
    }

    /// Find a spreadsheet by exact name
    pub async fn find_spreadsheet(&self, token: &str, name: &str) -> Result<Option<String>> {
        let query = format!(
            "name='{}' and mimeType='{}'",
            name.replace('\\', "\\\\").replace('\'', "\\'"),
            SPREADSHEET_MIME
        );

        let response = self
            .client
            .get(format!("{}/drive/v3/files", self.drive_api_base))
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name)"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Sheets(format!("Spreadsheet search failed: HTTP {}", status)));
        }

        let list: FileList = response.json().await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    /// Create a spreadsheet with one frozen-header worksheet and write the header row
    pub async fn create_spreadsheet(&self, token: &str, name: &str) -> Result<String> {
        // Header is part of the initial grid so the sheet never exists without it
        let header: Vec<_> = HEADER_ROW
            .iter()
            .map(|h| json!({ "userEnteredValue": { "stringValue": h } }))
            .collect();

        let body = json!({
            "properties": { "title": name },
            "sheets": [{
                "properties": {
                    "title": self.worksheet_title,
                    "gridProperties": { "frozenRowCount": 1 }
                },
                "data": [{
                    "startRow": 0,
                    "startColumn": 0,
                    "rowData": [{ "values": header }]
                }]
            }]
        });

        let response = self
            .client
            .post(format!("{}/v4/spreadsheets", self.sheets_api_base))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Sheets(format!("Spreadsheet creation failed: HTTP {}", status)));
        }

        let created: CreatedSpreadsheet = response.json().await?;
        tracing::info!("Created spreadsheet '{}' ({})", name, created.spreadsheet_id);

        Ok(created.spreadsheet_id)
    }

    /// Resolve a spreadsheet by name, creating it when absent
    pub async fn get_or_create(&self, token: &str, name: &str) -> Result<String> {
        match self.find_spreadsheet(token, name).await? {
            Some(id) => Ok(id),
            None => self.create_spreadsheet(token, name).await,
        }
    }

    /// Append raw rows after the last row of the table anchored at `anchor`
    pub async fn append_rows(
        &self,
        token: &str,
        spreadsheet_id: &str,
        anchor: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        let range = format!("{}!{}", self.worksheet_title, anchor);
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}:append",
            self.sheets_api_base,
            spreadsheet_id,
            urlencoding::encode(&range)
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": rows }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Sheets(format!("Append failed: HTTP {}: {}", status, detail)));
        }

        Ok(())
    }
}

/// Google Sheets implementation of [`ScanLogger`]
pub struct SheetsLogger {
    enabled: bool,
    spreadsheet_name: String,
    auth: AccessTokenProvider,
    sheets: SheetsClient,
}

impl SheetsLogger {
    pub fn new(config: &SheetsConfig, timeout_secs: u64) -> Result<Self> {
        let client = build_client(timeout_secs, &None)?;

        Ok(Self {
            enabled: config.enabled,
            spreadsheet_name: config.spreadsheet_name.clone(),
            auth: AccessTokenProvider::new(client.clone(), config),
            sheets: SheetsClient::new(client, config),
        })
    }

    async fn write(&self, entry: &ScanLogEntry<'_>) -> Result<usize> {
        let token = self.auth.access_token().await?;
        let spreadsheet_id = self.sheets.get_or_create(&token, &self.spreadsheet_name).await?;

        let rows = build_rows(
            entry.matches,
            entry.alert_sent,
            entry.total_fetched,
            entry.summary_group,
            entry.timestamp,
        );
        self.sheets.append_rows(&token, &spreadsheet_id, "A2", &rows).await?;

        Ok(rows.len())
    }
}

#[async_trait]
impl ScanLogger for SheetsLogger {
    async fn log_scan(&self, entry: &ScanLogEntry<'_>) -> bool {
        if !self.enabled {
            tracing::debug!("Spreadsheet logging disabled");
            return false;
        }
        if !self.auth.has_credentials() {
            tracing::warn!("Spreadsheet credentials not set, skipping scan log");
            return false;
        }

        match self.write(entry).await {
            Ok(count) => {
                if entry.matches.is_empty() {
                    tracing::info!("Logged scan summary (no matches) to Google Sheets");
                } else {
                    tracing::info!("Logged {} matched articles to Google Sheets", count);
                }
                true
            }
            Err(e) => {
                tracing::error!("Error logging to sheets: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Article;
    use crate::matcher::MatchedArticle;
    use chrono::{Local, Utc};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn config(server: &MockServer) -> SheetsConfig {
        SheetsConfig {
            access_token: Some("tok".to_string()),
            drive_api_base: server.uri(),
            sheets_api_base: server.uri(),
            ..SheetsConfig::default()
        }
    }

    fn matched(title: &str) -> MatchedArticle {
        MatchedArticle {
            article: Article {
                title: title.to_string(),
                link: format!("https://example.com/{}", title),
                published_at: Utc::now(),
                summary: None,
                source: "ABC".to_string(),
            },
            matched_keywords: vec!["fuel".to_string()],
            match_score: 1,
            search_group: "General".to_string(),
        }
    }

    fn entry<'a>(matches: &'a [MatchedArticle], alert_sent: bool) -> ScanLogEntry<'a> {
        ScanLogEntry {
            matches,
            alert_sent,
            total_fetched: 12,
            summary_group: "General",
            timestamp: Local::now(),
        }
    }

    async fn mount_existing(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(header("authorization", "Bearer tok"))
            .and(query_param(
                "q",
                "name='Fuel Alert Logs' and mimeType='application/vnd.google-apps.spreadsheet'",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": [{ "id": "sheet-1", "name": "Fuel Alert Logs" }]
            })))
            .mount(server)
            .await;
    }

    fn appended_rows(request: &Request) -> usize {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        body["values"].as_array().unwrap().len()
    }

    #[tokio::test]
    async fn test_appends_one_row_per_match() {
        let server = MockServer::start().await;
        mount_existing(&server).await;

        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-1/values/Alert%20Logs%21A2:append"))
            .and(query_param("valueInputOption", "RAW"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let logger = SheetsLogger::new(&config(&server), 5).unwrap();
        let matches = vec![matched("a"), matched("b"), matched("c")];
        assert!(logger.log_scan(&entry(&matches, true)).await);

        let requests = server.received_requests().await.unwrap();
        let append = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
        assert_eq!(appended_rows(append), 3);

        let body: serde_json::Value = serde_json::from_slice(&append.body).unwrap();
        assert_eq!(body["values"][0][6], "Yes");
    }

    #[tokio::test]
    async fn test_empty_scan_appends_summary_row() {
        let server = MockServer::start().await;
        mount_existing(&server).await;

        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-1/values/Alert%20Logs%21A2:append"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let logger = SheetsLogger::new(&config(&server), 5).unwrap();
        assert!(logger.log_scan(&entry(&[], false)).await);

        let requests = server.received_requests().await.unwrap();
        let append = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
        assert_eq!(appended_rows(append), 1);

        let body: serde_json::Value = serde_json::from_slice(&append.body).unwrap();
        assert_eq!(body["values"][0][2], "Total articles scanned: 12");
    }

    #[tokio::test]
    async fn test_creates_spreadsheet_with_header() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "files": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets"))
            .and(body_partial_json(serde_json::json!({
                "properties": { "title": "Fuel Alert Logs" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "spreadsheetId": "new-sheet"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/new-sheet/values/Alert%20Logs%21A1:append"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/new-sheet/values/Alert%20Logs%21A2:append"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let logger = SheetsLogger::new(&config(&server), 5).unwrap();
        assert!(logger.log_scan(&entry(&[matched("a")], false)).await);

        // Header row travels with the create request itself
        let requests = server.received_requests().await.unwrap();
        let create = requests
            .iter()
            .find(|r| r.url.path() == "/v4/spreadsheets")
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&create.body).unwrap();
        let sheet = &body["sheets"][0];
        assert_eq!(sheet["properties"]["title"], "Alert Logs");

        let header: Vec<_> = sheet["data"][0]["rowData"][0]["values"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["userEnteredValue"]["stringValue"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(header, HEADER_ROW);
    }

    #[tokio::test]
    async fn test_create_failure_returns_false() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "files": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/new-sheet/values/Alert%20Logs%21A2:append"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let logger = SheetsLogger::new(&config(&server), 5).unwrap();
        assert!(!logger.log_scan(&entry(&[matched("a")], false)).await);
    }

    #[tokio::test]
    async fn test_api_failure_returns_false() {
        let server = MockServer::start().await;
        mount_existing(&server).await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let logger = SheetsLogger::new(&config(&server), 5).unwrap();
        assert!(!logger.log_scan(&entry(&[matched("a")], false)).await);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_noop() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let logger = SheetsLogger::new(
            &SheetsConfig {
                access_token: None,
                ..config(&server)
            },
            5,
        )
        .unwrap();
        assert!(!logger.log_scan(&entry(&[], false)).await);
    }
}
