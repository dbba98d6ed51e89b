//! Release-candidate alignment planning and execution.
//!
//! All orchestration logic lives here. The CLI is purely a display layer.
//!
//! # Two-phase workflow
//!
//! 1. **Plan** ([`plan_align`]) — gate on the target ref, read the baseline
//!    tag and the commit range since it, classify, and compute the next
//!    candidate version.
//! 2. **Execute** ([`ReadyAlign::execute`]) — create the empty marker commit
//!    pinning the version and push it to the current branch.
//!
//! A plan may also come back as [`AlignPlan::Skip`]. Skips are successful
//! no-ops (wrong branch, nothing new, breaking change pending), not errors.

use std::sync::OnceLock;

use camino::Utf8Path;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::classify::{Classification, classify};
use crate::config::Config;
use crate::git::{self, GitError};
use crate::version::{RcVersion, VersionError, parse_rc_tag};

/// Subject line of the marker commit.
pub const MARKER_SUBJECT: &str = "chore: enforce correct rc version";

/// Trailer key consumed by downstream release tooling.
pub const RELEASE_AS: &str = "Release-As:";

/// Tag glob selecting release-candidate baselines.
pub const RC_TAG_GLOB: &str = "v*-rc*";

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from alignment operations.
#[derive(Error, Debug)]
pub enum AlignError {
    /// The baseline tag does not parse as a release-candidate version.
    ///
    /// Fatal: producing a wrong version is worse than failing the job.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// A git operation failed.
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Result alias for alignment operations.
pub type AlignResult<T> = Result<T, AlignError>;

// ──────────────────────────────────────────────
// Plan types
// ──────────────────────────────────────────────

/// The result of planning an alignment run.
#[derive(Debug)]
pub enum AlignPlan {
    /// Nothing to do; a successful no-op.
    Skip(SkipReason),
    /// A marker commit is warranted.
    Ready(ReadyAlign),
}

/// Why a run decided not to commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SkipReason {
    /// HEAD is not on the configured target ref.
    RefMismatch {
        /// The ref HEAD points at, or `None` when detached.
        current: Option<String>,
        /// The ref the workflow is gated on.
        expected: String,
    },
    /// No tag matching `v*-rc*` exists yet.
    NoBaseline,
    /// Nothing new since the baseline tag (release plumbing excluded).
    NoNewCommits,
    /// A breaking change is present; major bumps belong to release tooling.
    BreakingChange,
    /// The tip commit already pins the computed version.
    AlreadyAligned {
        /// The version the tip trailer already carries.
        next: RcVersion,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RefMismatch {
                current: Some(current),
                expected,
            } => write!(f, "on {current}, not {expected}"),
            Self::RefMismatch {
                current: None,
                expected,
            } => write!(f, "detached HEAD, not {expected}"),
            Self::NoBaseline => write!(f, "no release-candidate tag found"),
            Self::NoNewCommits => write!(f, "no new commits since the baseline tag"),
            Self::BreakingChange => {
                write!(f, "breaking change detected; release tooling owns major bumps")
            }
            Self::AlreadyAligned { next } => write!(f, "tip commit already pins {next}"),
        }
    }
}

/// An alignment plan that is ready to execute.
#[derive(Debug, Clone)]
pub struct ReadyAlign {
    /// The baseline candidate parsed from the latest `v*-rc*` tag.
    pub baseline: RcVersion,
    /// Verdict over the commit range.
    pub classification: Classification,
    /// The computed next candidate.
    pub next: RcVersion,
}

// ──────────────────────────────────────────────
// Plan
// ──────────────────────────────────────────────

/// Plan an alignment run against a repository.
///
/// Gathers the baseline tag, the commit range since it (with release
/// plumbing filtered out), and the tip trailer, then hands everything to
/// [`decide`]. Gated on the configured target ref first; a detached HEAD
/// counts as a mismatch.
///
/// # Errors
///
/// A baseline tag that does not parse as `vMAJOR.MINOR.PATCH-rc.N` is a
/// hard failure, never silently defaulted.
#[instrument(skip(config), fields(%repo))]
pub fn plan_align(repo: &Utf8Path, config: &Config) -> AlignResult<AlignPlan> {
    // Step 1: Ref gate
    let expected = config.target_ref();
    let current = git::current_ref(repo)?;
    if current.as_deref() != Some(expected) {
        debug!(?current, expected, "ref gate declined");
        return Ok(AlignPlan::Skip(SkipReason::RefMismatch {
            current,
            expected: expected.to_owned(),
        }));
    }

    // Step 2: Baseline tag
    let Some(tag) = git::latest_tag(repo, RC_TAG_GLOB)? else {
        return Ok(AlignPlan::Skip(SkipReason::NoBaseline));
    };
    let baseline = parse_rc_tag(&tag)?;

    // Step 3: Commit range, minus our own plumbing
    let messages: Vec<String> = git::messages_since(repo, &tag)?
        .into_iter()
        .filter(|m| !is_release_plumbing(m))
        .collect();

    // Step 4: Tip trailer for the idempotency guard
    let head = git::head_message(repo)?;
    let footer = release_as_footer(&head);

    debug!(%baseline, candidates = messages.len(), ?footer, "planning alignment");
    Ok(decide(Some(baseline), &messages, footer.as_deref()))
}

/// Decide what one commit range calls for.
///
/// Pure: every piece of git state arrives as an argument. Guards are
/// evaluated in fixed precedence: missing baseline, empty range, breaking
/// change, then the idempotency check against the tip trailer.
pub fn decide<S: AsRef<str>>(
    baseline: Option<RcVersion>,
    messages: &[S],
    existing_footer: Option<&str>,
) -> AlignPlan {
    let Some(baseline) = baseline else {
        return AlignPlan::Skip(SkipReason::NoBaseline);
    };
    if messages.is_empty() {
        return AlignPlan::Skip(SkipReason::NoNewCommits);
    }

    let classification = classify(messages);
    let next = match classification {
        Classification::Breaking => return AlignPlan::Skip(SkipReason::BreakingChange),
        Classification::Feature => baseline.bump_minor(),
        Classification::FixOrOther => baseline.bump_rc(),
    };

    // Repeated triggers against unchanged history must not stack markers.
    if existing_footer == Some(next.to_string().as_str()) {
        return AlignPlan::Skip(SkipReason::AlreadyAligned { next });
    }

    AlignPlan::Ready(ReadyAlign {
        baseline,
        classification,
        next,
    })
}

/// Commits produced by release plumbing, excluded from classification.
///
/// Covers our own marker commits (by subject or trailer) and release-PR
/// merge commits from downstream tooling.
fn is_release_plumbing(message: &str) -> bool {
    if message.contains(RELEASE_AS) {
        return true;
    }
    let subject = message.lines().next().unwrap_or_default();
    subject == MARKER_SUBJECT || re_release_chore().is_match(subject)
}

fn re_release_chore() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^chore(\(.*\))?: release").unwrap())
}

/// Extract the `Release-As:` trailer value from a commit message, if any.
///
/// Trailers sit at the bottom of a message; the last occurrence wins.
fn release_as_footer(message: &str) -> Option<String> {
    message.lines().rev().find_map(|line| {
        line.trim()
            .strip_prefix(RELEASE_AS)
            .map(|value| value.trim().to_owned())
    })
}

/// Render the marker commit message pinning `next`.
///
/// The trailer value carries no leading `v`; downstream tooling parses the
/// bare version string.
pub fn marker_message(next: RcVersion) -> String {
    format!("{MARKER_SUBJECT}\n\n{RELEASE_AS} {next}")
}

// ──────────────────────────────────────────────
// Execute
// ──────────────────────────────────────────────

/// Result of an executed alignment run.
#[derive(Debug, Clone, Serialize)]
pub struct AlignOutcome {
    /// The baseline candidate the run started from.
    pub baseline: RcVersion,
    /// Verdict over the commit range.
    pub classification: Classification,
    /// The version pinned by the marker commit.
    pub next: RcVersion,
    /// Whether the marker commit was pushed.
    pub pushed: bool,
}

impl ReadyAlign {
    /// Execute the plan: create the empty marker commit and push it.
    ///
    /// The push credential arrives as an explicit argument; nothing here
    /// reads process environment. With a token and an HTTPS remote, the
    /// push URL embeds the credential. Without one, the push goes to the
    /// configured remote name and relies on ambient git credentials.
    #[instrument(skip_all, fields(%repo, next = %self.next))]
    pub fn execute(
        &self,
        repo: &Utf8Path,
        config: &Config,
        token: Option<&str>,
    ) -> AlignResult<AlignOutcome> {
        let message = marker_message(self.next);
        git::commit_empty(repo, &message, config.author_name(), config.author_email())?;
        info!(next = %self.next, "created marker commit");

        let pushed = if config.push_enabled() {
            let target = push_target(repo, config, token)?;
            let branch = branch_of(config.target_ref());
            git::push_head(repo, &target, branch)?;
            info!(branch, "pushed marker commit");
            true
        } else {
            debug!("push disabled by configuration");
            false
        };

        Ok(AlignOutcome {
            baseline: self.baseline,
            classification: self.classification,
            next: self.next,
            pushed,
        })
    }
}

/// Resolve what `git push` is pointed at.
fn push_target(repo: &Utf8Path, config: &Config, token: Option<&str>) -> AlignResult<String> {
    if let Some(token) = token
        && let Some(url) = git::remote_url(repo, config.remote())?
        && let Some(authenticated) = git::authenticated_url(&url, token)
    {
        return Ok(authenticated);
    }
    Ok(config.remote().to_owned())
}

/// Short branch name for `git push HEAD:<branch>`.
fn branch_of(target_ref: &str) -> &str {
    target_ref.strip_prefix("refs/heads/").unwrap_or(target_ref)
}
