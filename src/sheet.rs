//! Destination sheet served through the Sheety API

use crate::ScoutError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

const SERVICE: &str = "sheety";

/// One destination row of the sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRow {
    pub id: u64,
    pub city: String,
    /// Highest flight price worth a notification
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iata_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SheetResponse {
    #[serde(default)]
    flights: Vec<SheetRow>,
}

pub struct SheetClient {
    http_client: Client,
    endpoint: String,
    token: String,
}

impl SheetClient {
    pub fn new(endpoint: &str, token: &str) -> Result<Self, ScoutError> {
        Ok(Self {
            http_client: Client::builder().build()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// All destination rows
    #[instrument(level = "info", skip(self))]
    pub async fn rows(&self) -> Result<Vec<SheetRow>, ScoutError> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_status(response).await?;

        let sheet: SheetResponse = response.json().await?;
        info!(rows = sheet.flights.len(), "Loaded destination sheet");
        Ok(sheet.flights)
    }

    /// Store the resolved IATA code on a row
    #[instrument(level = "debug", skip(self))]
    pub async fn set_iata_code(&self, row_id: u64, code: &str) -> Result<(), ScoutError> {
        let body = json!({ "flight": { "iataCode": code } });
        let response = self
            .http_client
            .put(format!("{}/{}", self.endpoint, row_id))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;

        debug!("Row updated");
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ScoutError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ScoutError::Api {
        service: SERVICE,
        status: status.as_u16(),
        body,
    })
}
