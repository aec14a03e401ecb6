//! Paginated client for the on-street parking bay sensor feed
//!
//! Pages are fetched one after another, newest first. Any failure ends the
//! walk and whatever was collected so far is returned.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::UpstreamConfig;

/// Hard cap imposed by the open-data API on `limit`.
pub const MAX_PAGE_SIZE: usize = 99;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(StatusCode),
}

/// Source of raw sensor records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Up to `max_records` records, most recently updated first. Never fails:
    /// transport problems degrade to a partial or empty result.
    async fn fetch(&self, zone: Option<&str>, max_records: usize) -> Vec<Value>;
}

#[derive(Debug, Deserialize)]
struct RecordsPage {
    #[serde(default)]
    results: Vec<Value>,
}

/// Client for the Melbourne open-data records endpoint.
#[derive(Clone)]
pub struct OpenDataClient {
    base_url: String,
    client: reqwest::Client,
    page_size: usize,
    page_delay: Duration,
}

impl OpenDataClient {
    pub fn new(cfg: &UpstreamConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("parking-forecast/0.1"));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_seconds))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url: cfg.base_url.clone(),
            client,
            page_size: cfg.page_size.clamp(1, MAX_PAGE_SIZE),
            page_delay: Duration::from_millis(cfg.page_delay_ms),
        })
    }

    async fn fetch_page(
        &self,
        zone: Option<&str>,
        offset: usize,
    ) -> Result<Vec<Value>, FetchError> {
        let mut params: Vec<(&str, String)> = vec![
            ("order_by", "lastupdated desc".to_string()),
            ("limit", self.page_size.to_string()),
            ("offset", offset.to_string()),
        ];
        if let Some(zone) = zone {
            params.push(("where", zone_clause(zone)));
        }

        let resp = self.client.get(&self.base_url).query(&params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let page: RecordsPage = resp.json().await?;
        Ok(page.results)
    }
}

/// `zone_number="<zone>"` with backslashes and quotes escaped, so the zone
/// is always a single string literal in the upstream query.
fn zone_clause(zone: &str) -> String {
    let escaped = zone.replace('\\', "\\\\").replace('"', "\\\"");
    format!("zone_number=\"{escaped}\"")
}

#[async_trait]
impl RecordSource for OpenDataClient {
    async fn fetch(&self, zone: Option<&str>, max_records: usize) -> Vec<Value> {
        let mut records: Vec<Value> = Vec::new();
        let mut offset = 0;

        while records.len() < max_records {
            let page = match self.fetch_page(zone, offset).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, offset, collected = records.len(), "upstream fetch stopped");
                    break;
                }
            };

            let page_len = page.len();
            debug!(offset, page_len, "fetched upstream page");
            records.extend(page);

            if page_len < self.page_size {
                break;
            }
            offset += self.page_size;
            tokio::time::sleep(self.page_delay).await;
        }

        records.truncate(max_records);
        info!(count = records.len(), zone = zone.unwrap_or(""), "upstream fetch complete");
        records
    }
}
