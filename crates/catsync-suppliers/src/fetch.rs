//! Feed document acquisition.
//!
//! A feed lives either on disk (single file or a directory of documents,
//! which is also how FTP-dropped feeds arrive) or behind an HTTP GET,
//! optionally with basic auth. Credentials are resolved once at process
//! start and carried on the supplier config; nothing here reads the
//! environment.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};

use catsync_core::{FeedLocation, SupplierConfig};

use crate::error::FeedError;

pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Creates a fetcher with configured timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    #[must_use]
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Retrieves all documents for a feed location, in deterministic order
    /// (single document, or directory entries sorted by filename).
    ///
    /// # Errors
    ///
    /// - [`FeedError::Io`] when a file or directory cannot be read.
    /// - [`FeedError::AccessDenied`] on HTTP 401/403 — the supplier has not
    ///   authorized this caller; fatal for the supplier's run.
    /// - [`FeedError::UnexpectedStatus`] on any other non-2xx response.
    pub async fn fetch(
        &self,
        supplier: &SupplierConfig,
        location: &FeedLocation,
    ) -> Result<Vec<String>, FeedError> {
        match location {
            FeedLocation::File { path } => Ok(vec![read_file(path)?]),
            FeedLocation::Dir { path } => read_dir_sorted(path),
            FeedLocation::Http { url } => {
                let body = self.fetch_http(supplier, url).await?;
                Ok(vec![body])
            }
        }
    }

    async fn fetch_http(&self, supplier: &SupplierConfig, url: &str) -> Result<String, FeedError> {
        let mut request = self.client.get(url);
        if let Some(credentials) = &supplier.credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FeedError::AccessDenied {
                supplier: supplier.slug.clone(),
                reason: format!("feed fetch returned HTTP {} for {url}", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.text().await?)
    }
}

fn read_file(path: &Path) -> Result<String, FeedError> {
    std::fs::read_to_string(path).map_err(|e| FeedError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn read_dir_sorted(path: &Path) -> Result<Vec<String>, FeedError> {
    let entries = std::fs::read_dir(path).map_err(|e| FeedError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut files: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    files.iter().map(|p| read_file(p)).collect()
}
