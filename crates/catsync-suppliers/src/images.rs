//! Image fetch-and-rehost.
//!
//! Some suppliers serve product images from an authenticated host, so the
//! pipeline downloads the bytes and serves them from local storage instead of
//! passing the URL through. Downloads fan out to a bounded set of concurrent
//! workers; a failed download drops that image (no inline retry — the next
//! scheduled run picks it up again).

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use reqwest::Client;
use uuid::Uuid;

use catsync_core::ImageRef;

use crate::error::FeedError;

pub struct ImageRehoster {
    client: Client,
    out_dir: PathBuf,
    concurrency: usize,
    /// URL prefix identifying images that require authenticated download.
    auth_prefix: String,
}

impl ImageRehoster {
    /// # Errors
    ///
    /// Returns [`FeedError::Io`] if the output directory cannot be created.
    pub fn new(
        client: Client,
        out_dir: &Path,
        concurrency: usize,
        auth_prefix: &str,
    ) -> Result<Self, FeedError> {
        std::fs::create_dir_all(out_dir).map_err(|e| FeedError::Io {
            path: out_dir.display().to_string(),
            source: e,
        })?;
        Ok(Self {
            client,
            out_dir: out_dir.to_path_buf(),
            concurrency: concurrency.max(1),
            auth_prefix: auth_prefix.to_owned(),
        })
    }

    /// Resolves a product's image URLs into [`ImageRef`]s, preserving feed
    /// order. URLs under the authenticated prefix are downloaded and replaced
    /// with local paths; everything else passes through unchanged. Failed
    /// downloads are logged and dropped.
    pub async fn rehost(&self, urls: Vec<String>) -> Vec<ImageRef> {
        let mut results: Vec<(usize, Option<ImageRef>)> =
            stream::iter(urls.into_iter().enumerate().map(|(idx, url)| async move {
                if !url.starts_with(&self.auth_prefix) {
                    return (idx, Some(ImageRef { name: url }));
                }
                match self.download(&url).await {
                    Ok(local) => (idx, Some(ImageRef { name: local })),
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "image download failed — dropping image");
                        (idx, None)
                    }
                }
            }))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().filter_map(|(_, r)| r).collect()
    }

    async fn download(&self, url: &str) -> Result<String, FeedError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        let bytes = response.bytes().await?;

        // Generated filenames keep concurrent workers from ever contending
        // on the same path.
        let filename = format!("{}{}", Uuid::new_v4(), extension_of(url));
        let target = self.out_dir.join(&filename);
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| FeedError::Io {
                path: target.display().to_string(),
                source: e,
            })?;

        Ok(target.display().to_string())
    }
}

/// File extension (with dot) from a URL path, empty when none is present.
fn extension_of(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .next()
        .and_then(|file| file.rfind('.').map(|i| &file[i..]))
        .filter(|ext| ext.len() <= 8 && !ext.contains('/'))
        .map_or_else(String::new, str::to_owned)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn extension_of_plain_url() {
        assert_eq!(extension_of("https://cdn.example.com/a/b/photo.jpg"), ".jpg");
    }

    #[test]
    fn extension_of_with_query_string() {
        assert_eq!(
            extension_of("https://cdn.example.com/photo.png?size=large"),
            ".png"
        );
    }

    #[test]
    fn extension_of_none() {
        assert_eq!(extension_of("https://cdn.example.com/photo"), "");
    }

    #[tokio::test]
    async fn passthrough_urls_keep_feed_order() {
        let dir = tempfile::tempdir().unwrap();
        let rehoster = ImageRehoster::new(
            Client::new(),
            dir.path(),
            10,
            "https://secure.example.com/",
        )
        .unwrap();

        let urls: Vec<String> = (0..20)
            .map(|i| format!("https://cdn.example.com/img{i}.jpg"))
            .collect();
        let refs = rehoster.rehost(urls.clone()).await;
        let names: Vec<String> = refs.into_iter().map(|r| r.name).collect();
        assert_eq!(names, urls);
    }

    #[tokio::test]
    async fn authenticated_urls_are_downloaded_and_rehosted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/photo.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpegdata".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/media/", server.uri());
        let rehoster = ImageRehoster::new(Client::new(), dir.path(), 2, &prefix).unwrap();

        let refs = rehoster
            .rehost(vec![format!("{}/media/photo.jpg", server.uri())])
            .await;
        assert_eq!(refs.len(), 1);
        let local = std::path::Path::new(&refs[0].name);
        assert!(local.starts_with(dir.path()));
        assert_eq!(local.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert_eq!(std::fs::read(local).unwrap(), b"jpegdata");
    }

    #[tokio::test]
    async fn failed_download_is_dropped_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/broken.jpg"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/media/", server.uri());
        let rehoster = ImageRehoster::new(Client::new(), dir.path(), 2, &prefix).unwrap();

        let refs = rehoster
            .rehost(vec![
                format!("{}/media/broken.jpg", server.uri()),
                "https://cdn.example.com/fine.jpg".to_owned(),
            ])
            .await;
        let names: Vec<String> = refs.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["https://cdn.example.com/fine.jpg".to_owned()]);
    }
}
