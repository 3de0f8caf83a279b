use artifetch_consts::consts;

use crate::{ConfigError, Locator};

/// How an environment key is compared against the configured prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyMatch {
    /// The prefix may occur anywhere in the key.
    #[default]
    Contains,
    /// The key has to start with the prefix.
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub prefix: String,
    pub key_match: KeyMatch,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::new(consts::DEFAULT_ENV_PREFIX)
    }
}

impl DiscoveryConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            key_match: KeyMatch::default(),
        }
    }

    pub fn with_key_match(self, key_match: KeyMatch) -> Self {
        Self { key_match, ..self }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.prefix.contains('=') {
            return Err(ConfigError::InvalidPrefix(self.prefix.clone()));
        }
        Ok(())
    }

    fn matches(&self, key: &str) -> bool {
        match self.key_match {
            KeyMatch::Contains => key.contains(&self.prefix),
            KeyMatch::Prefix => key.starts_with(&self.prefix),
        }
    }

    /// Turns a single key/value pair into a locator if the key is selected.
    fn select(&self, key: &str, value: &str) -> Option<Locator> {
        if !self.matches(key) {
            return None;
        }
        if key.is_empty() || value.is_empty() {
            tracing::debug!("skipping environment variable '{key}' without a value");
            return None;
        }
        Some(Locator::new(value))
    }
}

/// Selects the locators from `entries`, each of the form `KEY=VALUE`.
///
/// An entry is split at its first `=`, so values may contain `=` themselves.
/// Entries that are selected by their key but have no value are skipped.
/// The relative order of `entries` is preserved.
pub fn discover<I, S>(entries: I, config: &DiscoveryConfig) -> Result<Vec<Locator>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    config.validate()?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((key, value)) => config.select(key, value),
                None => config.select(entry, ""),
            }
        })
        .collect())
}

/// Selects the locators from the environment of the current process.
///
/// Variables whose name or value is not valid unicode are skipped.
pub fn discover_from_env(config: &DiscoveryConfig) -> Result<Vec<Locator>, ConfigError> {
    config.validate()?;
    let mut locators = Vec::new();
    for (key, value) in std::env::vars_os() {
        let (Some(key), Some(value)) = (key.to_str(), value.to_str()) else {
            tracing::debug!("skipping non-unicode environment variable {key:?}");
            continue;
        };
        locators.extend(config.select(key, value));
    }
    Ok(locators)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{DiscoveryConfig, KeyMatch, discover, discover_from_env};
    use crate::{ConfigError, Locator};

    fn locators(values: &[&str]) -> Vec<Locator> {
        values.iter().copied().map(Locator::from).collect()
    }

    #[test]
    fn selects_keys_containing_the_prefix() {
        let entries = [
            "ARTIFACT_A=http://x/1.zip",
            "PATH=/bin",
            "MY_ARTIFACT_B=http://x/2.zip",
        ];

        let found = discover(entries, &DiscoveryConfig::default()).unwrap();

        assert_eq!(found, locators(&["http://x/1.zip", "http://x/2.zip"]));
    }

    #[test]
    fn unrelated_keys_are_excluded() {
        let entries = [
            "ARTIFACT_A=http://x/1.zip",
            "ARTIFACT_B=http://x/2.zip",
            "OTHER=val",
        ];

        let found = discover(entries, &DiscoveryConfig::new("ARTIFACT_")).unwrap();

        assert_eq!(found, locators(&["http://x/1.zip", "http://x/2.zip"]));
    }

    #[test]
    fn prefix_mode_only_selects_leading_matches() {
        let entries = [
            "ARTIFACT_A=http://x/1.zip",
            "MY_ARTIFACT_B=http://x/2.zip",
        ];
        let config = DiscoveryConfig::default().with_key_match(KeyMatch::Prefix);

        let found = discover(entries, &config).unwrap();

        assert_eq!(found, locators(&["http://x/1.zip"]));
    }

    #[test]
    fn values_may_contain_equal_signs() {
        let entries = ["ARTIFACT_SIGNED=https://x/a.zip?sig=abc=&v=2"];

        let found = discover(entries, &DiscoveryConfig::default()).unwrap();

        assert_eq!(found, locators(&["https://x/a.zip?sig=abc=&v=2"]));
    }

    #[rstest]
    #[case::no_separator("ARTIFACT_A")]
    #[case::empty_value("ARTIFACT_A=")]
    #[case::empty_key("=ARTIFACT_A")]
    fn malformed_entries_are_skipped(#[case] entry: &str) {
        let entries = [entry, "ARTIFACT_B=http://x/2.zip"];

        let found = discover(entries, &DiscoveryConfig::default()).unwrap();

        assert_eq!(found, locators(&["http://x/2.zip"]));
    }

    #[test]
    fn no_match_is_not_an_error() {
        let found = discover(["HOME=/root"], &DiscoveryConfig::default()).unwrap();
        assert!(found.is_empty());
    }

    #[rstest]
    #[case::empty("", ConfigError::EmptyPrefix)]
    #[case::separator("A=B", ConfigError::InvalidPrefix("A=B".to_string()))]
    fn invalid_prefixes_are_rejected(#[case] prefix: &str, #[case] expected: ConfigError) {
        let err = discover(["A=B"], &DiscoveryConfig::new(prefix)).unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn reads_the_process_environment() {
        temp_env::with_vars(
            [
                ("ARTIFETCH_DISCOVERY_TEST_ONE", Some("http://x/one.zip")),
                ("ARTIFETCH_DISCOVERY_TEST_EMPTY", Some("")),
            ],
            || {
                let config = DiscoveryConfig::new("ARTIFETCH_DISCOVERY_TEST_");
                let found = discover_from_env(&config).unwrap();
                assert_eq!(found, locators(&["http://x/one.zip"]));
            },
        );
    }
}
