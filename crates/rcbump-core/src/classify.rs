//! Commit classification over conventional-commit messages.
//!
//! The verdict is a fixed-precedence scan: breaking > feature > everything
//! else. The default bucket is permissive: `fix`, `chore`, `docs`, and any
//! unrecognized type all land in [`Classification::FixOrOther`].

use std::sync::OnceLock;

use serde::Serialize;
use tracing::debug;

/// Literal token that marks a breaking change anywhere in a message.
pub const BREAKING_TOKEN: &str = "BREAKING CHANGE";

/// Verdict over a batch of commit messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// At least one message contains the breaking-change token.
    Breaking,
    /// No breaking token; at least one `feat`-prefixed subject.
    Feature,
    /// Everything else.
    FixOrOther,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Breaking => write!(f, "breaking"),
            Self::Feature => write!(f, "feature"),
            Self::FixOrOther => write!(f, "fix-or-other"),
        }
    }
}

fn re_feat() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^feat(\(.*\))?:").unwrap())
}

/// Classify a batch of commit messages.
///
/// The breaking token is matched anywhere in a message (subject or body);
/// the feature prefix is matched against the subject line only. The result
/// is order-independent; it depends on which patterns appear in the batch,
/// not where.
pub fn classify<S: AsRef<str>>(messages: &[S]) -> Classification {
    let verdict = if messages
        .iter()
        .any(|m| m.as_ref().contains(BREAKING_TOKEN))
    {
        Classification::Breaking
    } else if messages.iter().any(|m| is_feature(m.as_ref())) {
        Classification::Feature
    } else {
        Classification::FixOrOther
    };
    debug!(count = messages.len(), %verdict, "classified commits");
    verdict
}

/// Whether a message's subject line carries a `feat` type prefix.
fn is_feature(message: &str) -> bool {
    let subject = message.lines().next().unwrap_or("");
    re_feat().is_match(subject)
}
