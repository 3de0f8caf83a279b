use crate::{ArtifactError, Locator};

/// The result of processing a single locator.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    locator: Locator,
    error: Option<ArtifactError>,
}

impl FetchOutcome {
    pub fn success(locator: Locator) -> Self {
        Self {
            locator,
            error: None,
        }
    }

    pub fn failure(locator: Locator, error: ArtifactError) -> Self {
        Self {
            locator,
            error: Some(error),
        }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn error(&self) -> Option<&ArtifactError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Locator, ArtifactError> {
        match self.error {
            None => Ok(self.locator),
            Some(err) => Err(err),
        }
    }
}
