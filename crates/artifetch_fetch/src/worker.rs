use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use artifetch_archive::{MaterializeSummary, decode, materialize};
use bytes::Bytes;
use tracing::instrument;

use crate::{ArtifactError, FetchOutcome, Fetcher, Locator};

/// Fetches a single artifact and extracts it into the destination directory.
///
/// Cloning a worker is cheap, all clones share the same fetcher.
#[derive(Clone)]
pub struct Worker {
    fetcher: Arc<dyn Fetcher>,
    destination: PathBuf,
    timeout: Option<Duration>,
}

impl Worker {
    pub fn new(fetcher: Arc<dyn Fetcher>, destination: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            destination: destination.into(),
            timeout: None,
        }
    }

    /// Bounds how long fetching the bytes of an artifact may take.
    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Processes `locator` to completion. Failures are captured in the
    /// returned outcome, they are never propagated.
    #[instrument(skip_all, fields(locator = %locator))]
    pub async fn run(&self, locator: Locator) -> FetchOutcome {
        match self.fetch_and_extract(&locator).await {
            Ok(summary) => {
                tracing::info!(
                    "Successfully extracted file: {} ({} files, {} bytes)",
                    locator.display_name(),
                    summary.files,
                    summary.bytes
                );
                FetchOutcome::success(locator)
            }
            Err(err) => FetchOutcome::failure(locator, err),
        }
    }

    async fn fetch_and_extract(&self, locator: &Locator) -> Result<MaterializeSummary, ArtifactError> {
        let name = locator.display_name();

        tracing::debug!("Downloading file: {name}");
        let bytes = self.fetch(locator).await?;

        tracing::debug!("Extracting file: {name}");
        let destination = self.destination.clone();
        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || span.in_scope(|| extract(bytes, &destination, name)))
            .await
            .map_err(|err| ArtifactError::Join {
                locator: locator.clone(),
                source: Arc::new(err),
            })?
    }

    async fn fetch(&self, locator: &Locator) -> Result<Bytes, ArtifactError> {
        let fetch = self.fetcher.fetch(locator);
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, fetch)
                .await
                .map_err(|_| ArtifactError::Timeout {
                    locator: locator.clone(),
                    timeout,
                })?,
            None => fetch.await,
        };
        result.map_err(|source| ArtifactError::Fetch {
            locator: locator.clone(),
            source,
        })
    }
}

fn extract(bytes: Bytes, destination: &Path, name: String) -> Result<MaterializeSummary, ArtifactError> {
    let mut decoder = decode(bytes).map_err(|source| ArtifactError::Decode {
        name: name.clone(),
        source,
    })?;
    tracing::trace!("{name} contains {} entries", decoder.len());
    materialize(&mut decoder, destination).map_err(|err| ArtifactError::from_materialize(name, err))
}
