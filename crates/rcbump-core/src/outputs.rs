//! Step-output publishing for CI pipelines.
//!
//! GitHub Actions exposes a file through the `GITHUB_OUTPUT` environment
//! variable; appending `key=value` lines to it makes values available to
//! later workflow steps. The file may not exist yet when a step starts, so
//! writes create it on demand.

use std::fs::OpenOptions;
use std::io::Write;

use camino::Utf8Path;

/// Environment variable naming the step-output file in GitHub Actions.
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Append a `key=value` line to a step-output file.
///
/// Creates the file if it does not exist. Existing content is preserved;
/// CI runners treat the last occurrence of a key as authoritative.
#[tracing::instrument]
pub fn append(path: &Utf8Path, key: &str, value: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{key}={value}")?;
    tracing::debug!(%path, key, value, "wrote step output");
    Ok(())
}
