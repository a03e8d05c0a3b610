//! HTTP client for the claims-data API.
//!
//! Implements the two read-only collaborators the aggregation engine needs:
//! the paged validation-message query and the single-claim lookup.

mod config;

use claim_messages_core::{
    ClaimDetail, ClaimDetailSource, ClaimRef, MessageQuery, UpstreamError, ValidationMessageQuery,
    ValidationMessagesPage,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

pub use config::{
    ClaimsApiConfig, CLAIMS_API_ACCESS_TOKEN_ENV, CLAIMS_API_TIMEOUT_MS_ENV, CLAIMS_API_URL_ENV,
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS,
};

const API_PREFIX: &str = "/api/v1";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Claims-data API client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ClaimsDataClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl ClaimsDataClient {
    /// Create a client with the configured timeout.
    ///
    /// # Errors
    /// Returns [`ClientError::Build`] when the underlying HTTP client cannot be built.
    pub fn new(config: &ClaimsApiConfig) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }
}

impl ValidationMessageQuery for ClaimsDataClient {
    async fn fetch_messages(
        &self,
        query: &MessageQuery,
    ) -> Result<Option<ValidationMessagesPage>, UpstreamError> {
        let params = message_query_params(query);
        debug!(submission_id = %query.submission_id, ?params, "requesting validation messages");

        let response = self
            .client
            .get(self.url("/validation-messages"))
            .header(AUTHORIZATION, &self.access_token)
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;

        read_optional_json(response, false).await
    }
}

impl ClaimDetailSource for ClaimsDataClient {
    async fn fetch_claim(&self, claim: ClaimRef) -> Result<Option<ClaimDetail>, UpstreamError> {
        let path = format!("/submissions/{}/claims/{}", claim.submission_id, claim.claim_id);
        let response = self
            .client
            .get(self.url(&path))
            .header(AUTHORIZATION, &self.access_token)
            .send()
            .await
            .map_err(transport_error)?;

        read_optional_json(response, true).await
    }
}

/// Query-string pairs for the validation-message endpoint; absent filters are omitted.
#[must_use]
pub fn message_query_params(query: &MessageQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("submission-id", query.submission_id.to_string())];
    if let Some(claim_id) = query.claim_id {
        params.push(("claim-id", claim_id.to_string()));
    }
    if let Some(message_type) = query.message_type {
        params.push(("type", message_type.as_str().to_string()));
    }
    if let Some(source) = &query.source {
        params.push(("source", source.clone()));
    }
    if let Some(page) = query.page {
        params.push(("page", page.to_string()));
    }
    if let Some(size) = query.size {
        params.push(("size", size.to_string()));
    }
    params
}

async fn read_optional_json<T>(
    response: Response,
    not_found_is_empty: bool,
) -> Result<Option<T>, UpstreamError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if status == StatusCode::NO_CONTENT || (not_found_is_empty && status == StatusCode::NOT_FOUND) {
        return Ok(None);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Status { status: status.as_u16(), body });
    }

    let body = response.text().await.map_err(transport_error)?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&body).map(Some).map_err(|err| UpstreamError::Decode(err.to_string()))
}

fn transport_error(err: reqwest::Error) -> UpstreamError {
    UpstreamError::Transport(err.to_string())
}
