use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    /// Base URL of the remote catalog service.
    pub catalog_base_url: String,
    /// Bearer token for catalog write operations, if the deployment uses one.
    pub catalog_api_token: Option<String>,
    pub log_level: String,
    pub suppliers_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Pause after this many processed records during reconciliation.
    pub batch_pause_every: usize,
    pub batch_pause_secs: u64,
    /// Directory rehosted images are written into.
    pub image_dir: PathBuf,
    /// Concurrent image download workers.
    pub image_concurrency: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("catalog_base_url", &self.catalog_base_url)
            .field(
                "catalog_api_token",
                &self.catalog_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("log_level", &self.log_level)
            .field("suppliers_path", &self.suppliers_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("batch_pause_every", &self.batch_pause_every)
            .field("batch_pause_secs", &self.batch_pause_secs)
            .field("image_dir", &self.image_dir)
            .field("image_concurrency", &self.image_concurrency)
            .finish()
    }
}
