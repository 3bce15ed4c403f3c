use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;

use crate::config::SheetsConfig;
use crate::{Error, Result};

const CONNECTOR_NAME: &str = "google-sheet";

#[derive(Deserialize)]
struct ConnectionList {
    #[serde(default)]
    items: Vec<Connection>,
}

#[derive(Deserialize)]
struct Connection {
    #[serde(default)]
    settings: ConnectionSettings,
}

#[derive(Deserialize, Default)]
struct ConnectionSettings {
    access_token: Option<String>,
}

/// Obtains the bearer token for the spreadsheet APIs.
///
/// A static token wins; otherwise the token is fetched from the connector
/// service using the workspace identity.
pub struct AccessTokenProvider {
    client: Client,
    static_token: Option<String>,
    connectors_url: Option<String>,
    connector_token: Option<String>,
}

impl AccessTokenProvider {
    pub fn new(client: Client, config: &SheetsConfig) -> Self {
        let connectors_url = config.connectors_hostname.as_deref().map(|host| {
            format!(
                "{}://{}/api/v2/connection",
                config.connectors_scheme,
                host.trim_end_matches('/')
            )
        });

        Self {
            client,
            static_token: config.access_token.clone(),
            connectors_url,
            connector_token: config.connector_token(),
        }
    }

    /// Whether any credential source is available
    pub fn has_credentials(&self) -> bool {
        self.static_token.is_some()
            || (self.connectors_url.is_some() && self.connector_token.is_some())
    }

    pub async fn access_token(&self) -> Result<String> {
        if let Some(ref token) = self.static_token {
            return Ok(token.clone());
        }

        let url = self.connectors_url.as_deref()
            .ok_or_else(|| Error::Sheets("REPLIT_CONNECTORS_HOSTNAME not set".to_string()))?;
        let identity = self.connector_token.as_deref()
            .ok_or_else(|| Error::Sheets("X_REPLIT_TOKEN not found for repl/depl".to_string()))?;

        let response = self
            .client
            .get(url)
            .query(&[("include_secrets", "true"), ("connector_names", CONNECTOR_NAME)])
            .header(ACCEPT, "application/json")
            .header("X_REPLIT_TOKEN", identity)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Sheets(format!("Connector handshake failed: HTTP {}", status)));
        }

        let connections: ConnectionList = response.json().await?;

        let connection = connections.items.into_iter().next()
            .ok_or_else(|| Error::Sheets("Google Sheet not connected".to_string()))?;

        connection.settings.access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Sheets("No access token found".to_string()))
    }
}
