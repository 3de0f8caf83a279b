use std::{path::PathBuf, sync::Arc, time::Duration};

use artifetch_consts::consts;
use artifetch_fetch::{
    ClientOptions, DiscoveryConfig, FetchOutcome, HttpFetcher, KeyMatch, Worker,
    build_http_client, discover_from_env,
};
use artifetch_scheduler::{ConcurrencyBudget, Limit, Scheduler};
use clap::Parser;
use miette::IntoDiagnostic;

use crate::{progress, reporter::ProgressReporter};

/// Download every artifact named by the environment and extract it into the
/// target directory.
#[derive(Parser, Debug, Clone)]
#[group(skip)]
pub struct Args {
    /// Environment variables whose name contains this string hold the urls
    /// of the artifacts to extract.
    #[arg(
        long,
        visible_alias = "envprefix",
        env = "ARTIFETCH_ENV_PREFIX",
        default_value = consts::DEFAULT_ENV_PREFIX,
        help_heading = consts::CLAP_DISCOVERY_OPTIONS
    )]
    pub env_prefix: String,

    /// How environment variable names are compared against the prefix.
    #[arg(
        long,
        value_enum,
        env = "ARTIFETCH_MATCH_MODE",
        default_value = "contains",
        help_heading = consts::CLAP_DISCOVERY_OPTIONS
    )]
    pub match_mode: MatchMode,

    /// The directory to extract into. Created if it does not exist.
    #[arg(
        long,
        visible_alias = "targetdir",
        env = "ARTIFETCH_TARGET_DIR",
        default_value = consts::DEFAULT_TARGET_DIR,
        help_heading = consts::CLAP_DOWNLOAD_OPTIONS
    )]
    pub target_dir: PathBuf,

    /// Maximum number of artifacts processed at the same time. Defaults to
    /// twice the number of cores plus two.
    #[arg(
        long,
        env = "ARTIFETCH_MAX_CONCURRENT_DOWNLOADS",
        allow_negative_numbers = true,
        help_heading = consts::CLAP_DOWNLOAD_OPTIONS
    )]
    pub max_concurrent_downloads: Option<i64>,

    /// Give up on downloading a single artifact after this many seconds.
    #[arg(
        long,
        env = "ARTIFETCH_TIMEOUT",
        value_parser = parse_seconds,
        help_heading = consts::CLAP_DOWNLOAD_OPTIONS
    )]
    pub timeout: Option<Duration>,

    /// How often a download is retried after a transient network error.
    #[arg(
        long,
        env = "ARTIFETCH_RETRIES",
        default_value_t = 0,
        help_heading = consts::CLAP_DOWNLOAD_OPTIONS
    )]
    pub retries: u32,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// The prefix may appear anywhere in the variable name.
    #[default]
    Contains,
    /// The variable name has to start with the prefix.
    Prefix,
}

impl From<MatchMode> for KeyMatch {
    fn from(value: MatchMode) -> Self {
        match value {
            MatchMode::Contains => KeyMatch::Contains,
            MatchMode::Prefix => KeyMatch::Prefix,
        }
    }
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("the timeout must be positive, got '{value}'"));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|err| format!("'{value}' is not a usable timeout: {err}"))
}

impl Args {
    fn limit(&self) -> Limit {
        self.max_concurrent_downloads
            .map(Limit::Max)
            .unwrap_or_default()
    }
}

pub async fn execute(args: Args) -> miette::Result<()> {
    let discovery =
        DiscoveryConfig::new(args.env_prefix.clone()).with_key_match(args.match_mode.into());
    let locators = discover_from_env(&discovery)?;
    let limit = args.limit();
    let budget = ConcurrencyBudget::try_from(limit)?;

    if locators.is_empty() {
        tracing::warn!(
            "no environment variables matching '{}' were found, nothing to extract",
            discovery.prefix
        );
        return Ok(());
    }
    tracing::debug!(
        "found {} artifacts, extracting with up to {} concurrent workers",
        locators.len(),
        budget.get()
    );

    fs_err::tokio::create_dir_all(&args.target_dir)
        .await
        .into_diagnostic()?;

    let client = build_http_client(&ClientOptions {
        retries: args.retries,
        read_timeout: args.timeout,
    })?;
    let worker = Worker::new(Arc::new(HttpFetcher::new(client)), &args.target_dir)
        .with_timeout(args.timeout);
    let reporter = Arc::new(ProgressReporter::new(progress::global_multi_progress()));
    let scheduler = Scheduler::new(worker)
        .with_limit(limit)
        .with_reporter(reporter.clone());

    // Stop launching new downloads on ctrl+c, running ones are finished.
    let cancellation_token = scheduler.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, waiting for running downloads to finish");
            cancellation_token.cancel();
        }
    });
    let outcomes = scheduler.run_all(locators).await;
    ctrl_c.abort();
    reporter.finish();

    report_outcomes(&outcomes?, &args.target_dir)
}

/// Logs every failed outcome and turns them into a single error.
fn report_outcomes(outcomes: &[FetchOutcome], target_dir: &std::path::Path) -> miette::Result<()> {
    let failed = outcomes
        .iter()
        .filter_map(|outcome| outcome.error().map(|err| (outcome.locator(), err)))
        .inspect(|(locator, err)| {
            tracing::error!("Failed to extract: {locator}: {}", error_chain(*err))
        })
        .count();

    if failed > 0 {
        miette::bail!(
            "{failed} of {} artifacts could not be extracted",
            outcomes.len()
        );
    }

    progress::println(format!(
        "{} Extracted {} artifacts into {}",
        consts::SUCCESS_STYLE.apply_to("✔"),
        outcomes.len(),
        target_dir.display()
    ));
    Ok(())
}

/// Joins the messages of `err` and all of its sources.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}
