//! Release-candidate version parsing and arithmetic.
//!
//! Tags look like `v1.2.3-rc.4`: a semver triple plus an `rc.N` pre-release
//! counter. Parsing is strict: a tag that doesn't match is an input error
//! surfaced to the caller, never a guessed version.

use std::fmt;

use semver::Version;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors from version operations.
#[derive(Error, Debug)]
pub enum VersionError {
    /// Failed to parse a semver string.
    #[error("invalid version {input:?}: {source}")]
    InvalidSemver {
        /// The offending tag or version string.
        input: String,
        /// Underlying parse failure.
        source: semver::Error,
    },

    /// Parsed as semver, but not a plain `-rc.N` pre-release.
    #[error("{input:?} is not a release-candidate version (expected MAJOR.MINOR.PATCH-rc.N)")]
    NotReleaseCandidate {
        /// The offending tag or version string.
        input: String,
    },
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// A release-candidate version: `MAJOR.MINOR.PATCH-rc.RC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RcVersion {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
    /// Release-candidate counter.
    pub rc: u64,
}

impl RcVersion {
    /// Construct from components.
    pub const fn new(major: u64, minor: u64, patch: u64, rc: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            rc,
        }
    }

    /// Next candidate on the same base version: `1.2.3-rc.4` → `1.2.3-rc.5`.
    #[must_use]
    pub const fn bump_rc(&self) -> Self {
        Self::new(self.major, self.minor, self.patch, self.rc + 1)
    }

    /// Fresh candidate train for the next minor: `0.1.1-rc.1` → `0.2.1-rc.0`.
    ///
    /// The patch component carries over unchanged; only the rc counter
    /// resets. Downstream release tooling expects exactly this shape.
    #[must_use]
    pub const fn bump_minor(&self) -> Self {
        Self::new(self.major, self.minor + 1, self.patch, 0)
    }

    /// The git tag form, with a leading `v`.
    pub fn tag(&self) -> String {
        format!("v{self}")
    }
}

impl fmt::Display for RcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}-rc.{}",
            self.major, self.minor, self.patch, self.rc
        )
    }
}

// Serialize as the rendered string (like semver::Version does), so JSON
// reports carry "0.2.1-rc.0" rather than a field-by-field object.
impl Serialize for RcVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a version string, stripping an optional `v` prefix.
pub fn parse_version(s: &str) -> VersionResult<Version> {
    let stripped = s.strip_prefix('v').unwrap_or(s);
    Version::parse(stripped).map_err(|source| VersionError::InvalidSemver {
        input: s.to_string(),
        source,
    })
}

/// Parse a release-candidate tag (`v1.2.3-rc.4`; the `v` is optional).
///
/// Rejects stable versions, pre-releases other than `rc.N`, and anything
/// carrying build metadata.
pub fn parse_rc_tag(tag: &str) -> VersionResult<RcVersion> {
    let version = parse_version(tag)?;
    rc_counter(&version).map_or_else(
        || {
            Err(VersionError::NotReleaseCandidate {
                input: tag.to_string(),
            })
        },
        |rc| Ok(RcVersion::new(version.major, version.minor, version.patch, rc)),
    )
}

/// Extract `N` from a pre-release that is exactly `rc.N`.
fn rc_counter(version: &Version) -> Option<u64> {
    if !version.build.is_empty() {
        return None;
    }
    version.pre.as_str().strip_prefix("rc.")?.parse().ok()
}

/// Drop any pre-release suffix, keeping the stable triple.
pub const fn strip_prerelease(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch)
}
