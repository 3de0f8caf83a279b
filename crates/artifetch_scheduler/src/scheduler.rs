use std::{collections::HashMap, sync::Arc};

use artifetch_fetch::{ArtifactError, ConfigError, FetchOutcome, Locator, Worker};
use tokio::{
    sync::Semaphore,
    task::{self, JoinError, JoinSet},
};
use tokio_util::sync::CancellationToken;

use crate::{ConcurrencyBudget, Limit, Reporter};

/// Runs a [`Worker`] for every locator while keeping at most the configured
/// number of workers active.
pub struct Scheduler {
    worker: Worker,
    limit: Limit,
    reporter: Option<Arc<dyn Reporter>>,
    cancellation_token: CancellationToken,
}

/// Book-keeping for a single call to [`Scheduler::run_all`].
struct Run<'a> {
    reporter: Option<&'a dyn Reporter>,
    in_flight: HashMap<task::Id, Locator>,
    outcomes: Vec<FetchOutcome>,
}

impl Scheduler {
    pub fn new(worker: Worker) -> Self {
        Self {
            worker,
            limit: Limit::Default,
            reporter: None,
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn with_limit(self, limit: Limit) -> Self {
        Self { limit, ..self }
    }

    pub fn with_reporter(self, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            reporter: Some(reporter),
            ..self
        }
    }

    pub fn with_cancellation_token(self, cancellation_token: CancellationToken) -> Self {
        Self {
            cancellation_token,
            ..self
        }
    }

    /// A token that stops new workers from being launched once cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Processes every locator and returns one outcome per locator, in
    /// completion order.
    ///
    /// Fails without launching anything if the limit is not a usable
    /// budget. Locators that were not launched when the cancellation token
    /// fired receive a [`ArtifactError::Cancelled`] outcome, workers that
    /// already started run to completion.
    pub async fn run_all(&self, locators: Vec<Locator>) -> Result<Vec<FetchOutcome>, ConfigError> {
        let budget = ConcurrencyBudget::try_from(self.limit)?;
        let mut run = Run {
            reporter: self.reporter.as_deref(),
            in_flight: HashMap::new(),
            outcomes: Vec::with_capacity(locators.len()),
        };
        if locators.is_empty() {
            return Ok(run.outcomes);
        }

        tracing::debug!(
            "processing {} artifacts with at most {} concurrent workers",
            locators.len(),
            budget.get()
        );
        if let Some(reporter) = run.reporter {
            reporter.on_queued(locators.len());
        }

        let semaphore = Arc::new(Semaphore::new(budget.get().min(Semaphore::MAX_PERMITS)));
        let mut tasks = JoinSet::new();
        let mut pending = locators.into_iter();

        while let Some(locator) = pending.next() {
            // Wait for a free slot, collecting finished workers in the meantime.
            let permit = loop {
                tokio::select! {
                    biased;
                    _ = self.cancellation_token.cancelled() => break None,
                    Some(joined) = tasks.join_next_with_id(), if !tasks.is_empty() => run.collect(joined),
                    permit = semaphore.clone().acquire_owned() => break permit.ok(),
                }
            };

            let Some(permit) = permit else {
                tracing::debug!("cancelled, skipping the remaining artifacts");
                for locator in std::iter::once(locator).chain(pending.by_ref()) {
                    run.record(FetchOutcome::failure(
                        locator.clone(),
                        ArtifactError::Cancelled { locator },
                    ));
                }
                break;
            };

            let worker = self.worker.clone();
            let reporter = self.reporter.clone();
            let task_locator = locator.clone();
            let handle = tasks.spawn(async move {
                let _permit = permit;
                if let Some(reporter) = &reporter {
                    reporter.on_start(&task_locator);
                }
                let outcome = worker.run(task_locator).await;
                // Reported while the permit is still held.
                if let Some(reporter) = &reporter {
                    reporter.on_finished(&outcome);
                }
                outcome
            });
            run.in_flight.insert(handle.id(), locator);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            run.collect(joined);
        }

        debug_assert!(run.in_flight.is_empty());
        Ok(run.outcomes)
    }
}

impl Run<'_> {
    fn collect(&mut self, joined: Result<(task::Id, FetchOutcome), JoinError>) {
        match joined {
            Ok((id, outcome)) => {
                self.in_flight.remove(&id);
                self.outcomes.push(outcome);
            }
            Err(err) => {
                let Some(locator) = self.in_flight.remove(&err.id()) else {
                    tracing::error!("a worker stopped without a known artifact: {err}");
                    return;
                };
                tracing::error!("the worker for {locator} stopped unexpectedly: {err}");
                self.record(FetchOutcome::failure(
                    locator.clone(),
                    ArtifactError::Join {
                        locator,
                        source: Arc::new(err),
                    },
                ));
            }
        }
    }

    /// Stores an outcome that no worker task reported itself.
    fn record(&mut self, outcome: FetchOutcome) {
        if let Some(reporter) = self.reporter {
            reporter.on_finished(&outcome);
        }
        self.outcomes.push(outcome);
    }
}
