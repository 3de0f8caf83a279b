use std::{io::Write, path::Path};

use artifetch_cli::extract::{self, Args};
use clap::Parser;
use tempfile::tempdir;
use url::Url;
use zip::{ZipWriter, write::SimpleFileOptions};

fn write_archive(path: &Path, files: &[(&str, &str)]) -> String {
    let mut writer = ZipWriter::new(fs_err::File::create(path).unwrap());
    for (name, content) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    Url::from_file_path(path).unwrap().to_string()
}

fn args(prefix: &str, target: &Path) -> Args {
    Args::try_parse_from([
        "artifetch",
        "--env-prefix",
        prefix,
        "--target-dir",
        target.to_str().unwrap(),
        "--max-concurrent-downloads",
        "2",
    ])
    .unwrap()
}

#[tokio::test]
async fn extracts_every_discovered_artifact() {
    let source = tempdir().unwrap();
    let first = write_archive(&source.path().join("first.zip"), &[("one.txt", "1")]);
    let second = write_archive(&source.path().join("second.zip"), &[("nested/two.txt", "2")]);
    let out = tempdir().unwrap();
    let target = out.path().join("created/on/demand");

    let result = temp_env::async_with_vars(
        [
            ("ARTIFETCH_CLI_OK_FIRST", Some(first.as_str())),
            ("X_ARTIFETCH_CLI_OK_SECOND", Some(second.as_str())),
        ],
        extract::execute(args("ARTIFETCH_CLI_OK_", &target)),
    )
    .await;

    result.unwrap();
    assert_eq!(
        fs_err::read_to_string(target.join("one.txt")).unwrap(),
        "1"
    );
    assert_eq!(
        fs_err::read_to_string(target.join("nested/two.txt")).unwrap(),
        "2"
    );
}

#[tokio::test]
async fn one_failure_fails_the_run_but_not_the_others() {
    let source = tempdir().unwrap();
    let good = write_archive(&source.path().join("good.zip"), &[("good.txt", "ok")]);
    let missing = Url::from_file_path(source.path().join("missing.zip"))
        .unwrap()
        .to_string();
    let out = tempdir().unwrap();

    let result = temp_env::async_with_vars(
        [
            ("ARTIFETCH_CLI_MIXED_GOOD", Some(good.as_str())),
            ("ARTIFETCH_CLI_MIXED_MISSING", Some(missing.as_str())),
        ],
        extract::execute(args("ARTIFETCH_CLI_MIXED_", out.path())),
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "1 of 2 artifacts could not be extracted");
    assert!(out.path().join("good.txt").is_file());
}

#[tokio::test]
async fn nothing_to_do_is_a_success() {
    let out = tempdir().unwrap();
    let target = out.path().join("untouched");

    extract::execute(args("ARTIFETCH_CLI_NOTHING_MATCHES_", &target))
        .await
        .unwrap();

    assert!(!target.exists());
}

#[tokio::test]
async fn invalid_budget_is_rejected_before_any_work() {
    let out = tempdir().unwrap();
    let target = out.path().join("never");
    let args = Args::try_parse_from([
        "artifetch",
        "--env-prefix",
        "ARTIFETCH_CLI_BUDGET_",
        "--target-dir",
        target.to_str().unwrap(),
        "--max-concurrent-downloads",
        "0",
    ])
    .unwrap();

    let result = temp_env::async_with_vars(
        [("ARTIFETCH_CLI_BUDGET_A", Some("http://127.0.0.1:9/a.zip"))],
        extract::execute(args),
    )
    .await;

    assert!(result.is_err());
    assert!(!target.exists());
}
