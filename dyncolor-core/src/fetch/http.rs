//! HTTP-backed request executor

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use url::Url;

use super::decode::decode_blocking;
use super::{LoadedImage, RequestExecutor, Result};
use crate::config::LoaderConfig;
use crate::error::FetchError;

/// Where a submitted URL points
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Remote(Url),
    Local(PathBuf),
}

/// Image executor that fetches over HTTP(S) or reads local files
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    max_bytes: u64,
}

impl HttpExecutor {
    /// Build an executor from loader configuration
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(2)
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self::with_client(client, config.max_bytes))
    }

    /// Use an existing client
    pub fn with_client(client: Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }

    async fn fetch_remote(&self, url: Url) -> Result<Vec<u8>> {
        let mut response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }

        if let Some(size) = response.content_length()
            && size > self.max_bytes
        {
            return Err(FetchError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let capacity = response
            .content_length()
            .unwrap_or(0)
            .min(self.max_bytes) as usize;
        let mut body = Vec::with_capacity(capacity);

        // Content-Length can be absent or wrong, so enforce the limit while
        // streaming as well.
        while let Some(chunk) = response.chunk().await? {
            let size = (body.len() + chunk.len()) as u64;
            if size > self.max_bytes {
                return Err(FetchError::TooLarge {
                    size,
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    async fn read_local(&self, path: &Path) -> Result<Vec<u8>> {
        let io_err = |source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(io_err)?;
        if metadata.len() > self.max_bytes {
            return Err(FetchError::TooLarge {
                size: metadata.len(),
                limit: self.max_bytes,
            });
        }

        tokio::fs::read(path).await.map_err(io_err)
    }
}

#[async_trait::async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, url: &str) -> Result<LoadedImage> {
        let target = resolve_target(url)?;
        tracing::debug!(?target, "fetching image");

        let data = match target {
            Target::Remote(url) => self.fetch_remote(url).await?,
            Target::Local(path) => self.read_local(&path).await?,
        };

        let byte_len = data.len();
        let decoded = decode_blocking(data).await?;
        let image = LoadedImage::from_decoded(url, decoded, byte_len);

        tracing::debug!(
            url,
            byte_len,
            width = image.width(),
            height = image.height(),
            normalized = image.was_normalized(),
            "image decoded"
        );

        Ok(image)
    }
}

fn resolve_target(raw: &str) -> Result<Target> {
    match Url::parse(raw) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(Target::Remote(url)),
            "file" => url
                .to_file_path()
                .map(Target::Local)
                .map_err(|_| FetchError::UnsupportedScheme("file".to_string())),
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        },
        // Anything without a scheme is treated as a local path
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Ok(Target::Local(PathBuf::from(raw)))
        }
        Err(source) => Err(FetchError::InvalidUrl {
            url: raw.to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_http_and_https() {
        assert!(matches!(
            resolve_target("https://example.com/a.png"),
            Ok(Target::Remote(_))
        ));
        assert!(matches!(
            resolve_target("http://example.com/a.png"),
            Ok(Target::Remote(_))
        ));
    }

    #[test]
    fn bare_paths_are_local() {
        assert_eq!(
            resolve_target("images/cat.png").unwrap(),
            Target::Local(PathBuf::from("images/cat.png"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn file_urls_are_local() {
        assert_eq!(
            resolve_target("file:///tmp/cat.png").unwrap(),
            Target::Local(PathBuf::from("/tmp/cat.png"))
        );
    }

    #[test]
    fn other_schemes_are_rejected() {
        let err = resolve_target("ftp://example.com/a.png").unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn malformed_urls_are_invalid() {
        let err = resolve_target("http://[::1").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn oversized_local_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let executor = HttpExecutor::with_client(Client::new(), 16);
        let err = executor.execute(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { size: 64, limit: 16 }));
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() {
        let executor = HttpExecutor::with_client(Client::new(), 1024);
        let err = executor
            .execute("/definitely/not/here.png")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
