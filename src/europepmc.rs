//! Client for the Europe PMC REST search API, used to check that an ft_id
//! refers to a document Europe PMC knows about.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::config::EuropePmcConfig;

/// Largest search response accepted from Europe PMC
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Lookup of externally defined document identifiers.
#[async_trait]
pub trait DocumentRegistry: Send + Sync {
    async fn ft_id_exists(&self, ft_id: &str) -> Result<bool, RegistryError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EuropePmcLite {
    #[serde(default)]
    hit_count: Option<u64>,
}

pub struct EuropePmcClient {
    base_url: String,
    client: Client,
}

impl EuropePmcClient {
    pub fn new(config: &EuropePmcConfig) -> Result<Self, RegistryError> {
        tracing::info!(base_url = %config.base_url, "Building Europe PMC client");

        let mut builder = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(proxy) = config.proxy_url() {
            tracing::info!(proxy = %proxy, "Using HTTP proxy for Europe PMC");
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

/// PMC identifiers are searched by PMCID, anything else by external id.
fn search_query(ft_id: &str) -> String {
    if ft_id.to_ascii_uppercase().starts_with("PMC") {
        format!("PMCID:{ft_id}")
    } else {
        format!("EXT_ID:{ft_id}")
    }
}

#[async_trait]
impl DocumentRegistry for EuropePmcClient {
    async fn ft_id_exists(&self, ft_id: &str) -> Result<bool, RegistryError> {
        let query = search_query(ft_id);
        let resp = self
            .client
            .get(self.search_url())
            .query(&[
                ("query", query.as_str()),
                ("format", "json"),
                ("resultType", "lite"),
                ("pageSize", "1"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body = read_capped_body(resp, MAX_RESPONSE_BYTES).await?;
        let lite: EuropePmcLite = serde_json::from_slice(&body)
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;

        Ok(lite.hit_count.unwrap_or(0) > 0)
    }
}

/// Read a response body, giving up as soon as it grows past `limit` bytes.
async fn read_capped_body(mut resp: Response, limit: usize) -> Result<Vec<u8>, RegistryError> {
    if let Some(length) = resp.content_length() {
        if length > limit as u64 {
            return Err(RegistryError::InvalidResponse(format!(
                "response of {length} bytes exceeds limit of {limit}"
            )));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(RegistryError::InvalidResponse(format!(
                "response exceeds limit of {limit} bytes"
            )));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
