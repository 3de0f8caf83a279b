use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::{FetchError, Locator};

/// Retrieves the raw bytes of an artifact.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, locator: &Locator) -> Result<Bytes, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// How often a transient failure is retried. Zero disables retries.
    pub retries: u32,
    /// Gives up on a connection that stays silent for this long.
    pub read_timeout: Option<Duration>,
}

pub fn app_user_agent() -> String {
    format!("artifetch/{}", artifetch_consts::consts::ARTIFETCH_VERSION)
}

/// Builds the http client used for downloading artifacts.
pub fn build_http_client(options: &ClientOptions) -> Result<ClientWithMiddleware, FetchError> {
    let mut builder = Client::builder()
        .pool_max_idle_per_host(20)
        .user_agent(app_user_agent());
    if let Some(timeout) = options.read_timeout {
        builder = builder.read_timeout(timeout);
    }
    let client = builder.build()?;

    let mut client_builder = ClientBuilder::new(client);
    if options.retries > 0 {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(options.retries);
        client_builder =
            client_builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
    }
    Ok(client_builder.build())
}

/// Fetches `http(s)://` locators over the network and `file://` locators
/// from the local filesystem.
#[derive(Clone)]
pub struct HttpFetcher {
    client: ClientWithMiddleware,
}

impl HttpFetcher {
    pub fn new(client: ClientWithMiddleware) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &Locator) -> Result<Bytes, FetchError> {
        let url = locator.url().map_err(|source| FetchError::InvalidUrl {
            locator: locator.to_string(),
            source,
        })?;

        match url.scheme() {
            "file" => {
                let path = url.to_file_path().map_err(|_| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("'{url}' does not point to a local path"),
                    )
                })?;
                Ok(Bytes::from(fs_err::tokio::read(path).await?))
            }
            "http" | "https" => {
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::HttpStatus { url, status });
                }
                Ok(response.bytes().await?)
            }
            scheme => Err(FetchError::UnsupportedScheme(scheme.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientOptions, Fetcher, HttpFetcher, app_user_agent, build_http_client};
    use crate::{FetchError, Locator};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(build_http_client(&ClientOptions::default()).unwrap())
    }

    #[test]
    fn user_agent_carries_the_version() {
        assert!(app_user_agent().starts_with("artifetch/"));
    }

    #[tokio::test]
    async fn reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.zip");
        fs_err::write(&path, b"payload").unwrap();
        let locator = Locator::new(url::Url::from_file_path(&path).unwrap().to_string());

        let bytes = fetcher().fetch(&locator).await.unwrap();

        assert_eq!(&bytes[..], b"payload");
    }

    #[tokio::test]
    async fn missing_local_files_are_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let locator = Locator::new(
            url::Url::from_file_path(dir.path().join("missing.zip"))
                .unwrap()
                .to_string(),
        );

        let err = fetcher().fetch(&locator).await.unwrap_err();

        assert!(matches!(err, FetchError::Io(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_schemes() {
        let err = fetcher()
            .fetch(&Locator::new("ftp://example.com/a.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme(scheme) if scheme == "ftp"));
    }

    #[tokio::test]
    async fn rejects_locators_that_are_not_urls() {
        let err = fetcher()
            .fetch(&Locator::new("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
