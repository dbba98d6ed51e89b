//! Command implementations

pub mod align;

pub mod doctor;

pub mod promote;

use camino::Utf8PathBuf;
use rcbump_core::outputs;

/// The step-output file: explicit flag first, then the CI environment.
///
/// Shared across commands that publish `next_version` (align, promote).
pub fn resolve_output_path(flag: Option<Utf8PathBuf>) -> Option<Utf8PathBuf> {
    flag.or_else(|| {
        std::env::var(outputs::GITHUB_OUTPUT_ENV)
            .ok()
            .map(Utf8PathBuf::from)
    })
}
