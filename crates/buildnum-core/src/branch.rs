//! Branch-name normalization for TeamCity checkout refs.
//!
//! TeamCity hands the build a raw VCS ref such as `refs/heads/master` or
//! `refs/pulls/15/merge`. [`normalize`] strips the known ref prefixes down
//! to the bare branch name; [`trim`] bounds the name so it stays usable
//! inside a build-number string.

use tracing::info;

/// Longest branch-name fragment that may appear in a build number.
pub const MAX_BRANCH_NAME_LEN: usize = 20;

/// Ref prefixes stripped during normalization, in the order they are tried.
const STRIPPED_PREFIXES: [&str; 3] = ["refs/heads/", "refs/pulls/", "feature/"];

/// Strip known ref prefixes from a raw branch name.
///
/// Each prefix is removed at most once and only when the name actually
/// starts with it, so `normalize` is idempotent for ordinary refs:
/// `refs/heads/feature/ABC-1` and `feature/ABC-1` both normalize to
/// `ABC-1`. Occurrences anywhere else in the name are left alone.
pub fn normalize(raw: &str) -> String {
    let mut branch = raw;
    for prefix in STRIPPED_PREFIXES {
        if let Some(rest) = branch.strip_prefix(prefix) {
            branch = rest;
        }
    }
    branch.to_string()
}

/// Bound a branch name to [`MAX_BRANCH_NAME_LEN`] characters.
///
/// Names at or under the limit pass through unchanged. Truncation is
/// character-based and not token-aware, so a name may be cut mid-word.
pub fn trim(branch: &str) -> String {
    if branch.chars().count() > MAX_BRANCH_NAME_LEN {
        let trimmed: String = branch.chars().take(MAX_BRANCH_NAME_LEN).collect();
        info!(
            "Branch '{}' name too long, trimming to {} chars: '{}'",
            branch, MAX_BRANCH_NAME_LEN, trimmed
        );
        return trimmed;
    }
    branch.to_string()
}
