use console::Style;
use std::sync::LazyLock;

pub const ARTIFETCH_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variables whose key contains this string are treated as
/// artifact locators.
pub const DEFAULT_ENV_PREFIX: &str = "ARTIFACT_";
pub const DEFAULT_TARGET_DIR: &str = "./";

/// Name used for a locator whose URL path has no final segment.
pub const FALLBACK_FILE_NAME: &str = "download";

/// The extractor only ever looks at the permission bits of an entry mode.
pub const PERMISSION_BITS: u32 = 0o7777;

/// Copy buffer used while writing entry contents to disk.
pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

pub const CLAP_DISCOVERY_OPTIONS: &str = "Discovery Options";
pub const CLAP_DOWNLOAD_OPTIONS: &str = "Download Options";
pub const CLAP_GLOBAL_OPTIONS: &str = "Global Options";

pub static LOCATOR_STYLE: LazyLock<Style> = LazyLock::new(|| Style::new().cyan());
pub static FAILURE_STYLE: LazyLock<Style> = LazyLock::new(|| Style::new().red().bold());
pub static SUCCESS_STYLE: LazyLock<Style> = LazyLock::new(|| Style::new().green());
