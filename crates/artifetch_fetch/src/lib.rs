//! Discovery of artifact locators and the fetch-extract worker that turns a
//! single locator into files on disk.

mod discovery;
mod error;
mod fetcher;
mod locator;
mod outcome;
mod worker;

pub use discovery::{DiscoveryConfig, KeyMatch, discover, discover_from_env};
pub use error::{ArtifactError, ConfigError, ErrorKind, FetchError};
pub use fetcher::{ClientOptions, Fetcher, HttpFetcher, build_http_client};
pub use locator::Locator;
pub use outcome::FetchOutcome;
pub use worker::Worker;
