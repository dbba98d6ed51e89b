//! Stable version promotion.
//!
//! On a stable branch the pipeline wants the plain `MAJOR.MINOR.PATCH` the
//! current candidate train resolves to: take the latest `v*` tag, drop its
//! pre-release suffix, and hand the result to downstream release tooling.
//! Promotion is read-only; it never writes to the repository.

use camino::Utf8Path;
use semver::Version;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::git::{self, GitError};
use crate::version::{VersionError, parse_version, strip_prerelease};

/// Tag glob selecting promotion baselines.
///
/// Candidate tags qualify too; their pre-release suffix is dropped.
pub const TAG_GLOB: &str = "v*";

/// First release when no tag exists at all.
const FIRST_RELEASE: Version = Version::new(0, 1, 0);

/// Errors from promotion operations.
#[derive(Error, Debug)]
pub enum PromoteError {
    /// The baseline tag does not parse as a semantic version.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// A git operation failed.
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Result alias for promotion operations.
pub type PromoteResult<T> = Result<T, PromoteError>;

/// The result of planning a promotion run.
#[derive(Debug)]
pub enum PromotePlan {
    /// HEAD is not on a configured stable ref; a successful no-op.
    Skip(PromoteSkip),
    /// The stable version to release as.
    Ready(PromoteOutcome),
}

/// Ref-gate details for a declined promotion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoteSkip {
    /// The ref HEAD points at, or `None` when detached.
    pub current: Option<String>,
    /// The refs promotion is allowed on.
    pub expected: Vec<String>,
}

impl std::fmt::Display for PromoteSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let allowed = self.expected.join(", ");
        match &self.current {
            Some(current) => write!(f, "on {current}, not one of: {allowed}"),
            None => write!(f, "detached HEAD, not one of: {allowed}"),
        }
    }
}

/// Result of a promotion run.
#[derive(Debug, Clone, Serialize)]
pub struct PromoteOutcome {
    /// The tag the stable version derives from, if one existed.
    pub baseline_tag: Option<String>,
    /// The stable version to release as.
    pub stable: Version,
}

/// Plan a promotion run against a repository.
///
/// # Errors
///
/// A baseline tag that does not parse as a semantic version is a hard
/// failure, never silently defaulted.
#[instrument(skip(config), fields(%repo))]
pub fn plan_promote(repo: &Utf8Path, config: &Config) -> PromoteResult<PromotePlan> {
    let expected = config.stable_refs();
    let current = git::current_ref(repo)?;
    let on_stable = current
        .as_deref()
        .is_some_and(|reference| expected.iter().any(|allowed| allowed == reference));
    if !on_stable {
        debug!(?current, ?expected, "ref gate declined");
        return Ok(PromotePlan::Skip(PromoteSkip { current, expected }));
    }

    let tag = git::latest_tag(repo, TAG_GLOB)?;
    let stable = stable_from_tag(tag.as_deref())?;
    debug!(?tag, %stable, "promotion planned");
    Ok(PromotePlan::Ready(PromoteOutcome {
        baseline_tag: tag,
        stable,
    }))
}

/// Derive the stable version from the latest tag.
///
/// No tag at all means a first release, `0.1.0`.
pub fn stable_from_tag(tag: Option<&str>) -> Result<Version, VersionError> {
    match tag {
        None => Ok(FIRST_RELEASE),
        Some(tag) => Ok(strip_prerelease(&parse_version(tag)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_tag_promotes_to_its_triple() {
        let stable = stable_from_tag(Some("v1.2.3-rc.4")).unwrap();
        assert_eq!(stable, Version::new(1, 2, 3));
    }

    #[test]
    fn stable_tag_promotes_to_itself() {
        let stable = stable_from_tag(Some("v2.0.0")).unwrap();
        assert_eq!(stable, Version::new(2, 0, 0));
    }

    #[test]
    fn other_prereleases_are_stripped_too() {
        let stable = stable_from_tag(Some("v0.5.0-beta.1")).unwrap();
        assert_eq!(stable, Version::new(0, 5, 0));
    }

    #[test]
    fn first_release_without_tags() {
        let stable = stable_from_tag(None).unwrap();
        assert_eq!(stable, Version::new(0, 1, 0));
    }

    #[test]
    fn malformed_tag_is_fatal() {
        let result = stable_from_tag(Some("v1.2"));
        assert!(matches!(
            result,
            Err(VersionError::InvalidSemver { .. })
        ));
    }

    #[test]
    fn skip_display_names_allowed_refs() {
        let skip = PromoteSkip {
            current: Some("refs/heads/next".into()),
            expected: vec!["refs/heads/main".into(), "refs/heads/master".into()],
        };
        let text = skip.to_string();
        assert!(text.contains("refs/heads/next"));
        assert!(text.contains("refs/heads/main"));
    }
}
