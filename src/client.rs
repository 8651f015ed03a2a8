use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::json;
use std::time::Duration;

use crate::config::Config;
use crate::decoder::decode_company;
use crate::errors::{AppError, FetchErrorKind, FetchFailure};
use crate::models::{FetchOutcome, Identifier};
use crate::query::IdentifierBinding;

/// Relative path every profile lookup is POSTed to.
const QUERY_PATH: &str = "/v1/query";

/// Client for the remote company-profile GraphQL endpoint.
///
/// Holds only immutable configuration (base URL, headers, timeout, query
/// document) and is safe to share across all concurrent calls in a run.
#[derive(Clone)]
pub struct ProfileApiClient {
    client: reqwest::Client,
    base_url: String,
    query: String,
    binding: IdentifierBinding,
}

impl ProfileApiClient {
    /// Creates a new `ProfileApiClient`.
    ///
    /// The API key and content type go into the default header set; the
    /// per-call timeout (default 60 s) is the only per-item cancellation
    /// mechanism in a run.
    pub fn new(config: &Config, query: String) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            AppError::Config("PROFILE_API_KEY contains non-header characters".to_string())
        })?;
        headers.insert("x-api-key", api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                AppError::ExternalApi(format!("Failed to create profile API client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            query,
            binding: config.id_binding,
        })
    }

    /// Fetches the profile for one identifier.
    ///
    /// Exactly one outbound call, no retry, no caching. Every possible
    /// failure is folded into a `FetchOutcome::Failure` value; this method
    /// never returns an error and never panics across its boundary.
    pub async fn fetch_profile(&self, id: Identifier) -> FetchOutcome {
        match self.execute(&id).await {
            Ok(record) => FetchOutcome::Success(record),
            Err(failure) => {
                tracing::warn!("Fetch failed for identifier {}: {}", id, failure);
                FetchOutcome::failure(id, failure.kind, failure.message)
            }
        }
    }

    async fn execute(&self, id: &Identifier) -> Result<crate::models::CompanyRecord, FetchFailure> {
        let url = format!("{}{}", self.base_url, QUERY_PATH);

        // Single variable binding, keyed by the configured lookup field
        let mut variables = serde_json::Map::new();
        variables.insert(
            self.binding.key().to_string(),
            serde_json::to_value(id).map_err(|e| {
                FetchFailure::new(
                    FetchErrorKind::Unexpected,
                    format!("unserializable identifier: {}", e),
                )
            })?,
        );
        let body = json!({
            "query": self.query,
            "variables": variables,
        });

        tracing::debug!("Requesting profile {} via {}", id, self.binding);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                FetchFailure::new(
                    FetchErrorKind::Transport,
                    format!("request failed: {}", e),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetchFailure::new(
                FetchErrorKind::HttpStatus,
                format!("endpoint returned {}: {}", status, error_text),
            ));
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            FetchFailure::new(
                FetchErrorKind::Decode,
                format!("response body is not JSON: {}", e),
            )
        })?;

        let record = decode_company(payload)?;
        Ok(record)
    }
}
