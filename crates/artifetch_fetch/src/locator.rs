use std::fmt::{Display, Formatter};

use artifetch_consts::consts;
use url::Url;

/// Identifies a remote artifact, typically by URL.
///
/// The string is kept verbatim; it is only parsed when it is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator(String);

impl Locator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.0)
    }

    /// A short name for diagnostics: the last segment of the URL path.
    pub fn display_name(&self) -> String {
        let segment = match self.url() {
            Ok(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(str::to_string),
            Err(_) => self
                .0
                .split(['?', '#'])
                .next()
                .and_then(|path| path.rsplit('/').next())
                .map(str::to_string),
        };
        segment
            .filter(|segment| !segment.is_empty())
            .unwrap_or_else(|| consts::FALLBACK_FILE_NAME.to_string())
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Locator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Locator {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
