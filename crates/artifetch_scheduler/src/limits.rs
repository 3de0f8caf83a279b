use std::num::NonZero;

use artifetch_fetch::ConfigError;

/// The requested number of concurrent workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Limit {
    /// Derive the limit from the number of available cores.
    #[default]
    Default,

    /// An explicit limit. Has to be positive to be usable.
    Max(i64),
}

impl From<i64> for Limit {
    fn from(value: i64) -> Self {
        Limit::Max(value)
    }
}

/// A validated upper bound on the number of workers active at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyBudget(NonZero<usize>);

impl ConcurrencyBudget {
    pub fn new(requested: i64) -> Result<Self, ConfigError> {
        usize::try_from(requested)
            .ok()
            .and_then(NonZero::new)
            .map(Self)
            .ok_or(ConfigError::InvalidBudget(requested))
    }

    /// Twice the number of cores plus one, downloads mostly wait on I/O.
    pub fn from_available_parallelism() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(NonZero::get)
            .unwrap_or(1);
        Self(NonZero::new((cpus + 1) * 2).unwrap_or(NonZero::<usize>::MIN))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<Limit> for ConcurrencyBudget {
    type Error = ConfigError;

    fn try_from(limit: Limit) -> Result<Self, Self::Error> {
        match limit {
            Limit::Default => Ok(Self::from_available_parallelism()),
            Limit::Max(max) => Self::new(max),
        }
    }
}
