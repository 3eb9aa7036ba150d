//! Pull-request identification and metadata.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches the two ref shapes TeamCity produces for pull-request builds:
/// a `<digits>/merge` suffix or a `pull/<digits>` path segment.
static PULL_REQUEST_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)/merge|pull/(\d+)").expect("invalid pull-request ref pattern")
});

/// Numeric identifier of a pull request on the hosting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequestId(pub u64);

impl PullRequestId {
    /// Extract a pull-request id from a normalized branch name.
    ///
    /// Returns `None` when the branch does not reference a pull request,
    /// in which case the build proceeds down the feature-branch path.
    /// GitHub numbers pull requests from 1, so an id of zero is rejected.
    pub fn from_branch(branch: &str) -> Option<Self> {
        let captures = PULL_REQUEST_REF.captures(branch)?;
        let digits = captures.get(1).or_else(|| captures.get(2))?;
        let id: u64 = digits.as_str().parse().ok()?;
        if id == 0 {
            return None;
        }
        Some(PullRequestId(id))
    }
}

impl std::fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether GitHub believes the pull request can be merged cleanly.
///
/// GitHub computes this lazily after each push; `Unknown` means the
/// assessment has not finished yet and the caller should re-fetch after a
/// delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mergeability {
    /// The pull request merges cleanly into its base branch.
    Mergeable,
    /// The pull request conflicts with its base branch.
    NotMergeable,
    /// GitHub has not finished computing mergeability.
    Unknown,
}

impl Mergeability {
    /// Map the REST API's `mergeable: bool|null` field.
    pub fn from_api(mergeable: Option<bool>) -> Self {
        match mergeable {
            Some(true) => Mergeability::Mergeable,
            Some(false) => Mergeability::NotMergeable,
            None => Mergeability::Unknown,
        }
    }
}

/// The pull-request fields the resolver inspects.
///
/// Fetched once per poll attempt and discarded after evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestMetadata {
    /// GitHub's mergeability verdict for the head branch.
    pub mergeable: Mergeability,
    /// Whether the pull request has already been merged.
    pub merged: bool,
    /// Name of the branch the pull request comes from.
    pub head_ref: String,
    /// Name of the branch the pull request targets.
    pub base_ref: String,
    /// Pull-request title.
    pub title: String,
}

impl PullRequestMetadata {
    /// True while GitHub has not finished assessing an open pull request.
    ///
    /// The resolver polls until this clears. A merged pull request is never
    /// pending, whatever its `mergeable` field says.
    pub fn is_pending(&self) -> bool {
        self.mergeable == Mergeability::Unknown && !self.merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_ref_yields_id() {
        assert_eq!(PullRequestId::from_branch("33/merge"), Some(PullRequestId(33)));
        assert_eq!(PullRequestId::from_branch("15/merge"), Some(PullRequestId(15)));
    }

    #[test]
    fn test_pull_segment_yields_id() {
        assert_eq!(PullRequestId::from_branch("pull/7"), Some(PullRequestId(7)));
        assert_eq!(
            PullRequestId::from_branch("refs/pull/125/head"),
            Some(PullRequestId(125))
        );
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert_eq!(PullRequestId::from_branch("33/MERGE"), Some(PullRequestId(33)));
        assert_eq!(PullRequestId::from_branch("Pull/9"), Some(PullRequestId(9)));
    }

    #[test]
    fn test_ordinary_branches_are_not_pull_requests() {
        assert_eq!(PullRequestId::from_branch("master"), None);
        assert_eq!(PullRequestId::from_branch("ABC-1-Fix"), None);
        assert_eq!(PullRequestId::from_branch("merge"), None);
        assert_eq!(PullRequestId::from_branch("pull/"), None);
    }

    #[test]
    fn test_id_zero_is_rejected() {
        assert_eq!(PullRequestId::from_branch("0/merge"), None);
        assert_eq!(PullRequestId::from_branch("pull/0"), None);
    }

    #[test]
    fn test_mergeability_from_api() {
        assert_eq!(Mergeability::from_api(Some(true)), Mergeability::Mergeable);
        assert_eq!(Mergeability::from_api(Some(false)), Mergeability::NotMergeable);
        assert_eq!(Mergeability::from_api(None), Mergeability::Unknown);
    }

    #[test]
    fn test_pending_is_unknown_and_not_merged() {
        let mut metadata = PullRequestMetadata {
            mergeable: Mergeability::Unknown,
            merged: false,
            head_ref: "ABC-1-Fix".to_string(),
            base_ref: "master".to_string(),
            title: "ABC-1 Fix".to_string(),
        };
        assert!(metadata.is_pending());

        // A merged pull request is final even with an unknown assessment.
        metadata.merged = true;
        assert!(!metadata.is_pending());

        metadata.merged = false;
        metadata.mergeable = Mergeability::Mergeable;
        assert!(!metadata.is_pending());

        metadata.mergeable = Mergeability::NotMergeable;
        assert!(!metadata.is_pending());
    }
}
