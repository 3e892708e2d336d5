//! Authenticated HTTP client for the Amadeus self-service APIs

use crate::config::Credentials;
use crate::ScoutError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument};

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const SERVICE: &str = "amadeus";

/// Amadeus wraps every result list in a `data` array
#[derive(Debug, Deserialize)]
pub(crate) struct DataList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Amadeus client bound to one set of application credentials.
///
/// The access token is requested on first use and reused afterwards.
pub struct AmadeusClient {
    http_client: Client,
    base_url: String,
    credentials: Credentials,
    access_token: OnceCell<String>,
}

impl AmadeusClient {
    /// Create a new client
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, ScoutError> {
        debug!(base_url, "Creating new Amadeus client");
        let http_client = Client::builder()
            .user_agent(concat!("trip-scout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            access_token: OnceCell::new(),
        })
    }

    /// Fetch (once) and return the bearer token
    #[instrument(level = "debug", skip(self))]
    pub async fn access_token(&self) -> Result<&str, ScoutError> {
        let token = self
            .access_token
            .get_or_try_init(|| self.request_token())
            .await?;
        Ok(token.as_str())
    }

    async fn request_token(&self) -> Result<String, ScoutError> {
        info!("Requesting Amadeus access token");
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, TOKEN_PATH))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Token request failed");
            return Err(ScoutError::Auth {
                service: SERVICE,
                message: format!("{}: {}", status, body),
            });
        }

        let token: TokenResponse = response.json().await?;
        debug!("Access token received");
        Ok(token.access_token)
    }

    /// GET `path` with the bearer token and decode the JSON body
    #[instrument(level = "debug", skip(self, query))]
    pub async fn get_json<Q, T>(&self, path: &str, query: &Q) -> Result<T, ScoutError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.base_url, path);

        let start_time = std::time::Instant::now();
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .header("accept", "application/vnd.amadeus+json")
            .query(query)
            .send()
            .await?;
        let status = response.status();

        debug!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "HTTP request completed"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoutError::Api {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
