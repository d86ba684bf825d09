//! HTTP client for the remote catalog service.
//!
//! Wraps `reqwest` with typed status handling (404 → `NotFound`/`None`,
//! 429 → `RateLimited`, other non-2xx → `UnexpectedStatus`) and automatic
//! retry with exponential backoff on transient failures. All write calls
//! carry the bearer token when one is configured.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use catsync_core::{AppConfig, CanonicalProduct};

use crate::error::RemoteError;
use crate::retry::retry_with_backoff;
use crate::types::{IdsResponse, ProductPatch, RemoteProduct};

pub struct CatalogClient {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl CatalogClient {
    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`RemoteError::InvalidBaseUrl`] if the
    /// configured base URL does not parse.
    pub fn new(config: &AppConfig) -> Result<Self, RemoteError> {
        Self::with_base_url(
            &config.catalog_base_url,
            config.catalog_api_token.as_deref(),
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_secs,
        )
    }

    /// Creates a client with an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`RemoteError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        base_url: &str,
        api_token: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise: exactly one trailing slash so joined paths land under
        // the base path rather than replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| RemoteError::InvalidBaseUrl {
            url: normalised.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            api_token: api_token.map(str::to_owned),
            max_retries,
            backoff_base_secs,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Converts a non-2xx response into the matching [`RemoteError`].
    fn status_error(response: &reqwest::Response, url: &str) -> Option<RemoteError> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Some(RemoteError::RateLimited { retry_after_secs });
        }
        if status == StatusCode::NOT_FOUND {
            return Some(RemoteError::NotFound {
                url: url.to_owned(),
            });
        }
        if !status.is_success() {
            return Some(RemoteError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        None
    }

    /// Fetches the full set of remote product IDs.
    ///
    /// The catalog keeps one global ID namespace; callers filter by supplier
    /// tag digit before diffing.
    ///
    /// # Errors
    ///
    /// Any transport, status, or deserialization failure after retries.
    pub async fn list_ids(&self) -> Result<HashSet<String>, RemoteError> {
        let url = self.endpoint("products/all_ids/");
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self.authed(self.client.get(&url)).send().await?;
                if let Some(err) = Self::status_error(&response, &url) {
                    return Err(err);
                }
                let body = response.text().await?;
                let parsed: IdsResponse =
                    serde_json::from_str(&body).map_err(|e| RemoteError::Deserialize {
                        context: "all_ids response".to_owned(),
                        source: e,
                    })?;
                Ok(parsed.product_ids.into_iter().collect())
            }
        })
        .await
    }

    /// Fetches a single remote product. Returns `Ok(None)` on 404 — a
    /// missing product is an expected outcome during reconciliation, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Any transport, status, or deserialization failure after retries.
    pub async fn get(&self, id: &str) -> Result<Option<RemoteProduct>, RemoteError> {
        let url = self.endpoint(&format!("products/{id}/"));
        let result = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self.authed(self.client.get(&url)).send().await?;
                if let Some(err) = Self::status_error(&response, &url) {
                    return Err(err);
                }
                let body = response.text().await?;
                serde_json::from_str::<RemoteProduct>(&body).map_err(|e| {
                    RemoteError::Deserialize {
                        context: format!("product {id}"),
                        source: e,
                    }
                })
            }
        })
        .await;

        match result {
            Ok(product) => Ok(Some(product)),
            Err(RemoteError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Creates a product via the uploader endpoint (expects 201).
    ///
    /// # Errors
    ///
    /// Any transport or status failure after retries.
    pub async fn create(&self, product: &CanonicalProduct) -> Result<(), RemoteError> {
        let url = self.endpoint("products/auto/uploader/");
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .authed(self.client.post(&url))
                    .json(product)
                    .send()
                    .await?;
                if let Some(err) = Self::status_error(&response, &url) {
                    return Err(err);
                }
                Ok(())
            }
        })
        .await
    }

    /// Applies a partial update to an existing product (expects 200).
    ///
    /// # Errors
    ///
    /// Any transport or status failure after retries; 404 surfaces as
    /// [`RemoteError::NotFound`] since updating a missing product indicates a
    /// diff computed against stale state.
    pub async fn update(&self, id: &str, patch: &ProductPatch) -> Result<(), RemoteError> {
        let url = self.endpoint(&format!("products/auto/uploader/{id}/"));
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .authed(self.client.put(&url))
                    .json(patch)
                    .send()
                    .await?;
                if let Some(err) = Self::status_error(&response, &url) {
                    return Err(err);
                }
                Ok(())
            }
        })
        .await
    }

    /// Deletes a product (expects 204). A 404 is treated as success — the
    /// record is already gone, which is the state the reconciler wanted.
    ///
    /// # Errors
    ///
    /// Any transport or status failure after retries.
    pub async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let url = self.endpoint(&format!("products/{id}/"));
        let result = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self.authed(self.client.delete(&url)).send().await?;
                if let Some(err) = Self::status_error(&response, &url) {
                    return Err(err);
                }
                Ok(())
            }
        })
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(RemoteError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
