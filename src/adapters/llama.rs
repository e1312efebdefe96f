use crate::domain::model::Record;
use crate::domain::ports::RecordSource;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.llama.fi/protocols";

/// Turns a provider payload (a JSON array of protocol objects) into raw records.
/// Items that are not objects are skipped.
pub fn parse_protocols(payload: serde_json::Value) -> Result<Vec<Record>> {
    let serde_json::Value::Array(items) = payload else {
        return Err(LensError::ProcessingError {
            message: "expected a JSON array of protocols".to_string(),
        });
    };

    let total = items.len();
    let records: Vec<Record> = items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::Object(obj) => Some(Record::from(obj)),
            _ => None,
        })
        .collect();

    if records.len() < total {
        tracing::debug!("Skipped {} non-object item(s)", total - records.len());
    }
    Ok(records)
}

/// DefiLlama `/protocols` over HTTP.
pub struct LlamaSource {
    client: Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl LlamaSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl RecordSource for LlamaSource {
    async fn fetch_all(&self) -> Result<Vec<Record>> {
        tracing::debug!("Making API request to: {}", self.endpoint);

        let mut request = self.client.get(&self.endpoint);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        tracing::debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(LensError::ApiStatusError {
                status: response.status().as_u16(),
                endpoint: self.endpoint.clone(),
            });
        }

        let payload: serde_json::Value = response.json().await?;
        parse_protocols(payload)
    }
}
