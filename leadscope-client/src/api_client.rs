//! HTTP implementation of [`RemoteResultSource`] for the leads API.

use crate::config::{AuthConfig, ClientConfig};
use crate::error::ClientError;
use async_trait::async_trait;
use leadscope_core::{
    FetchError, FetchMode, LeadWithContacts, PageQuery, PaginationInfo, RemoteResultSource,
    ResultPage,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const LEADS_PATH: &str = "/leads/combined-data";

/// Body of a successful `GET /leads/combined-data`.
#[derive(Debug, Deserialize)]
struct LeadsEnvelope {
    leads: Vec<LeadWithContacts>,
    pagination: Option<PaginationInfo>,
}

#[derive(Clone)]
pub struct HttpResultSource {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
    visible_only: Option<bool>,
    timeout: Duration,
}

impl HttpResultSource {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let timeout = config.request_timeout();
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let auth_header = build_auth_headers(&config.auth)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth_header,
            visible_only: config.visible_only,
            timeout,
        })
    }

    /// Query parameters for `query`, stamped with the cache-busting `_t`.
    pub fn query_params(&self, query: &PageQuery, timestamp_ms: i64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("skip", query.skip().to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(search) = query.triple.search_param() {
            params.push(("search", search.to_string()));
        }
        if let Some(scraped) = query.triple.status.scraped_param() {
            params.push(("scraped", scraped.to_string()));
        }
        if let Some(industry_id) = query.triple.category.industry_id() {
            params.push(("industry_id", industry_id.to_string()));
        }
        if let Some(visible_only) = self.visible_only {
            params.push(("visible_only", visible_only.to_string()));
        }
        params.push(("_t", timestamp_ms.to_string()));
        params
    }

    fn map_transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                elapsed: self.timeout,
            }
        } else {
            FetchError::network(err.to_string())
        }
    }

    async fn parse_response(&self, response: reqwest::Response) -> Result<ResultPage, FetchError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| self.map_transport_error(err))?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: LeadsEnvelope =
            serde_json::from_str(&text).map_err(|err| FetchError::malformed(err.to_string()))?;
        let pagination = envelope
            .pagination
            .ok_or_else(|| FetchError::malformed("missing pagination"))?;
        Ok(ResultPage::new(envelope.leads, pagination))
    }
}

#[async_trait]
impl RemoteResultSource for HttpResultSource {
    async fn fetch(&self, query: &PageQuery, mode: FetchMode) -> Result<ResultPage, FetchError> {
        let url = format!("{}{}", self.base_url, LEADS_PATH);
        let params = self.query_params(query, chrono::Utc::now().timestamp_millis());
        debug!(%mode, key = %query.cache_key(), "GET {}", url);

        let response = self
            .client
            .get(url)
            .headers(self.auth_header.clone())
            .query(&params)
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;
        self.parse_response(response).await
    }
}

fn build_auth_headers(auth: &AuthConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = &auth.bearer_token {
        let value = format!("Bearer {}", token);
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&value)?,
        );
    }
    Ok(headers)
}
