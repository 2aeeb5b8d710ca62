use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Every upstream body carries a `success` flag that can be false on HTTP 200.
pub trait Envelope {
    fn success(&self) -> bool;
    fn cause(&self) -> Option<&str>;
}

/// Reject a body whose `success` flag is false.
pub fn check_envelope<T: Envelope>(endpoint: &str, body: T) -> Result<T> {
    if body.success() {
        Ok(body)
    } else {
        Err(AppError::Protocol(format!(
            "{} reported failure: {}",
            endpoint,
            body.cause().unwrap_or("no cause given")
        )))
    }
}

/// Decode a response body. A body that does not match the expected shape is a
/// protocol failure, like `success: false`.
pub fn decode_body<T>(endpoint: &str, bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned + Envelope,
{
    let body: T = serde_json::from_slice(bytes).map_err(|e| {
        AppError::Protocol(format!("{} returned an unexpected body: {}", endpoint, e))
    })?;
    check_envelope(endpoint, body)
}

/// Thin HTTP client for the marketplace API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("skyblock-flipper/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base: config.api_base.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// GET `path` and decode it. Non-2xx statuses and `success: false` bodies are errors.
    pub async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned + Envelope,
    {
        let url = self.endpoint(path)?;
        let mut request = self.http.get(url.clone()).query(query);
        if let Some(key) = &self.api_key {
            request = request.header("API-Key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        debug!(path, bytes = bytes.len(), "[FETCH] response received");
        decode_body(path, &bytes)
    }
}
