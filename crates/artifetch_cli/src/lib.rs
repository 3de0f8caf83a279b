//! # artifetch CLI
//!
//! Parses the command line, configures colors, logging and progress output
//! and hands over to [`extract::execute`].
#![deny(clippy::dbg_macro, clippy::unwrap_used)]

use clap::Parser;
use clap::builder::{Styles, styling::AnsiColor};
use indicatif::ProgressDrawTarget;
use miette::IntoDiagnostic;

use artifetch_consts::consts;
use std::{env, io::IsTerminal};
use tracing_subscriber::filter::LevelFilter;

pub mod extract;
pub mod progress;
pub mod reporter;

#[derive(Parser, Debug)]
#[command(
    name = "artifetch",
    version(consts::ARTIFETCH_VERSION),
    about = format!("
artifetch [version {}] - Downloads build artifacts named by environment variables and extracts them.

Every environment variable whose name contains the prefix (ARTIFACT_ by default) is
read as the url of a zip archive. All archives are downloaded concurrently and
extracted into the target directory.

Basic Usage:
    $ ARTIFACT_APP=https://example.com/app.zip artifetch --target-dir ./out
", consts::ARTIFETCH_VERSION),
)]
#[clap(styles = help_styles(), disable_help_flag = true)]
pub struct Args {
    #[clap(flatten)]
    extract: extract::Args,

    #[clap(flatten)]
    global_options: GlobalOptions,
}

#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Display help information
    #[clap(
        long,
        short,
        action = clap::ArgAction::Help,
        help_heading = consts::CLAP_GLOBAL_OPTIONS
    )]
    help: Option<bool>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[clap(short, long, action = clap::ArgAction::Count, help_heading = consts::CLAP_GLOBAL_OPTIONS)]
    verbose: u8,

    /// Decrease logging verbosity (quiet mode)
    #[clap(short, long, action = clap::ArgAction::Count, help_heading = consts::CLAP_GLOBAL_OPTIONS)]
    quiet: u8,

    /// Print debug logs, same as -v
    #[clap(long, help_heading = consts::CLAP_GLOBAL_OPTIONS)]
    debug: bool,

    /// Whether the log needs to be colored.
    #[clap(long, default_value = "auto", env = "ARTIFETCH_COLOR", help_heading = consts::CLAP_GLOBAL_OPTIONS)]
    color: ColorMode,

    /// Hide the progress bar, always turned on if stderr is not a terminal.
    #[clap(long, default_value = "false", env = "ARTIFETCH_NO_PROGRESS", help_heading = consts::CLAP_GLOBAL_OPTIONS)]
    no_progress: bool,
}

impl Args {
    /// Whether to show progress bars or not, based on the terminal and the user's preference.
    fn no_progress(&self) -> bool {
        if !std::io::stderr().is_terminal() {
            true
        } else {
            self.global_options.no_progress
        }
    }

    /// Determine the log level filter based on verbose and quiet counts.
    fn log_level_filter(&self) -> LevelFilter {
        let verbose = self
            .global_options
            .verbose
            .max(u8::from(self.global_options.debug));
        match (self.global_options.quiet, verbose) {
            // Quiet mode overrides verbose
            (q, _) if q > 0 => LevelFilter::OFF,
            (_, 0) => LevelFilter::INFO,
            (_, 1) => LevelFilter::DEBUG,
            (_, _) => LevelFilter::TRACE,
        }
    }
}

pub async fn execute() -> miette::Result<()> {
    let args = Args::parse();
    let no_progress = args.no_progress();

    set_console_colors(args.global_options.color);

    let use_colors = console::colors_enabled_stderr();
    let in_ci = matches!(env::var("CI").as_deref(), Ok("1" | "true"));
    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::default()
                .color(use_colors)
                // Don't wrap lines in CI environments to avoid breaking logs.
                .wrap_lines(!in_ci)
                .build(),
        )
    }))?;

    if no_progress {
        progress::global_multi_progress().set_draw_target(ProgressDrawTarget::hidden());
    }

    setup_logging(&args, use_colors)?;

    extract::execute(args.extract).await
}

/// Artifetch crates log at the requested level, everything else one step
/// quieter.
fn log_directives(level: LevelFilter) -> (LevelFilter, String) {
    let dependency_level = match level {
        LevelFilter::INFO => LevelFilter::WARN,
        LevelFilter::DEBUG => LevelFilter::INFO,
        other => other,
    };
    let directives = [
        "artifetch",
        "artifetch_archive",
        "artifetch_cli",
        "artifetch_fetch",
        "artifetch_scheduler",
    ]
    .map(|target| format!("{target}={level}"))
    .join(",");
    (dependency_level, directives)
}

fn setup_logging(args: &Args, use_colors: bool) -> miette::Result<()> {
    use crate::progress::ProgressLogWriter;
    use tracing_subscriber::{
        EnvFilter, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
    };

    let level = args.log_level_filter();
    let (dependency_level, directives) = log_directives(level);

    // Explicit verbosity flags win over RUST_LOG.
    let cli_verbosity_set = args.global_options.verbose > 0
        || args.global_options.quiet > 0
        || args.global_options.debug;
    let directives = match env::var("RUST_LOG") {
        Ok(env_directives) if !cli_verbosity_set && !env_directives.is_empty() => {
            format!("{directives},{env_directives}")
        }
        _ => directives,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(dependency_level.into())
        .parse(&directives)
        .into_diagnostic()?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(use_colors)
        .with_target(level >= LevelFilter::DEBUG)
        .with_writer(ProgressLogWriter::stderr(progress::global_multi_progress()))
        .without_time();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
    Ok(())
}

/// When to color the output. `FORCE_COLOR` and `NO_COLOR` win over the
/// flag, `Auto` leaves the decision to the terminal.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorMode {
    Always,
    Never,
    #[default]
    Auto,
}

impl ColorMode {
    /// `None` means colors follow whether the output is a terminal.
    fn colors_enabled(self, force_color: bool, no_color: bool) -> Option<bool> {
        match self {
            _ if force_color => Some(true),
            _ if no_color => Some(false),
            ColorMode::Always => Some(true),
            ColorMode::Never => Some(false),
            ColorMode::Auto => None,
        }
    }
}

/// Only a non-empty value counts, see <https://no-color.org>.
fn env_flag(key: &str) -> bool {
    env::var_os(key).is_some_and(|value| !value.is_empty())
}

fn set_console_colors(mode: ColorMode) {
    if let Some(enabled) = mode.colors_enabled(env_flag("FORCE_COLOR"), env_flag("NO_COLOR")) {
        console::set_colors_enabled(enabled);
        console::set_colors_enabled_stderr(enabled);
    }
}

/// Help colors, in line with the progress bar and the log styles.
fn help_styles() -> Styles {
    let heading = AnsiColor::Yellow.on_default().bold();
    let literal = AnsiColor::Cyan.on_default();
    let error = AnsiColor::Red.on_default().bold();
    Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(literal)
        .placeholder(literal.dimmed())
        .valid(AnsiColor::Green.on_default())
        .invalid(error)
        .error(error)
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use rstest::rstest;
    use tracing_subscriber::filter::LevelFilter;

    use super::{Args, ColorMode, env_flag, log_directives};

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[rstest]
    #[case(&["artifetch"], LevelFilter::INFO)]
    #[case(&["artifetch", "-v"], LevelFilter::DEBUG)]
    #[case(&["artifetch", "--debug"], LevelFilter::DEBUG)]
    #[case(&["artifetch", "-vv"], LevelFilter::TRACE)]
    #[case(&["artifetch", "--debug", "-vv"], LevelFilter::TRACE)]
    #[case(&["artifetch", "-q", "-vv"], LevelFilter::OFF)]
    fn verbosity_flags(#[case] argv: &[&str], #[case] expected: LevelFilter) {
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.log_level_filter(), expected);
    }

    #[test]
    fn dependencies_log_one_level_quieter() {
        let (dependency_level, directives) = log_directives(LevelFilter::DEBUG);
        assert_eq!(dependency_level, LevelFilter::INFO);
        assert!(directives.to_lowercase().contains("artifetch_fetch=debug"));
    }

    #[test]
    fn no_progress_from_environment() {
        temp_env::with_var("ARTIFETCH_NO_PROGRESS", Some("true"), || {
            let args = Args::try_parse_from(["artifetch"]).unwrap();
            assert!(args.global_options.no_progress);
            assert!(args.no_progress());
        });
    }

    #[rstest]
    #[case::auto(ColorMode::Auto, false, false, None)]
    #[case::always(ColorMode::Always, false, false, Some(true))]
    #[case::never(ColorMode::Never, false, false, Some(false))]
    #[case::forced(ColorMode::Never, true, false, Some(true))]
    #[case::no_color(ColorMode::Always, false, true, Some(false))]
    #[case::forced_beats_no_color(ColorMode::Auto, true, true, Some(true))]
    fn color_mode_resolution(
        #[case] mode: ColorMode,
        #[case] force_color: bool,
        #[case] no_color: bool,
        #[case] expected: Option<bool>,
    ) {
        assert_eq!(mode.colors_enabled(force_color, no_color), expected);
    }

    #[test]
    fn empty_no_color_is_ignored() {
        temp_env::with_vars(
            [
                ("ARTIFETCH_TEST_EMPTY_FLAG", Some("")),
                ("ARTIFETCH_TEST_SET_FLAG", Some("1")),
            ],
            || {
                assert!(!env_flag("ARTIFETCH_TEST_EMPTY_FLAG"));
                assert!(env_flag("ARTIFETCH_TEST_SET_FLAG"));
                assert!(!env_flag("ARTIFETCH_TEST_UNSET_FLAG"));
            },
        );
    }

    #[test]
    fn color_mode_from_environment() {
        temp_env::with_var("ARTIFETCH_COLOR", Some("never"), || {
            let args = Args::try_parse_from(["artifetch"]).unwrap();
            assert_eq!(args.global_options.color, ColorMode::Never);
        });
    }
}
