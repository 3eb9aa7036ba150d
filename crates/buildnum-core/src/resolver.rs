//! Pull-request resolution: bounded mergeability polling plus precondition
//! checks.
//!
//! GitHub computes mergeability lazily, so the first fetch after a push often
//! comes back with `mergeable: null`. The resolver polls at a fixed interval
//! until GitHub makes up its mind, bounded by an attempt ceiling, then runs
//! the merge and naming preconditions in order. The first failing check wins
//! and fails the build.

use std::time::Duration;

use tracing::{debug, info};

use crate::branch;
use crate::error::{BuildNumberError, Result};
use crate::github::PullRequestClient;
use crate::naming::{
    self, BRANCH_NAMING_CONVENTION, PULL_REQUEST_TITLE_NAMING_CONVENTION,
};
use crate::pull_request::{Mergeability, PullRequestId, PullRequestMetadata};

/// Maximum number of metadata fetches before giving up on a pending
/// mergeability assessment.
pub const MERGEABILITY_ATTEMPT_LIMIT: u32 = 12;

/// Fixed delay between poll attempts.
pub const MERGEABILITY_POLL_DELAY: Duration = Duration::from_millis(5000);

/// Attempt bookkeeping for one resolution. Created when polling starts and
/// dropped when it ends, whichever way it ends.
struct RetryState {
    attempts: u32,
    limit: u32,
}

impl RetryState {
    fn new(limit: u32) -> Self {
        RetryState { attempts: 0, limit }
    }

    /// Count one fetch; true when the ceiling has been reached.
    fn record_attempt(&mut self) -> bool {
        self.attempts += 1;
        self.attempts >= self.limit
    }
}

/// Resolves a pull-request build to the branch fragment that goes into the
/// build number.
pub struct PullRequestResolver<'a> {
    client: &'a dyn PullRequestClient,
    enforce_naming_convention: bool,
}

impl<'a> PullRequestResolver<'a> {
    pub fn new(client: &'a dyn PullRequestClient, enforce_naming_convention: bool) -> Self {
        PullRequestResolver {
            client,
            enforce_naming_convention,
        }
    }

    /// Fetch metadata for `id`, polling while mergeability is still being
    /// assessed, and evaluate the merge preconditions.
    ///
    /// Returns the normalized, trimmed head-branch name on success. Transport,
    /// parse and API errors are terminal on the first occurrence; only a
    /// pending assessment is retried.
    pub async fn resolve(&self, id: PullRequestId) -> Result<String> {
        let mut retry = RetryState::new(MERGEABILITY_ATTEMPT_LIMIT);

        loop {
            let metadata = self.client.fetch_pull_request(id).await?;
            debug!("Pull request #{} metadata: {:?}", id, metadata);

            if !metadata.is_pending() {
                return self.evaluate(id, metadata);
            }

            if retry.record_attempt() {
                return Err(BuildNumberError::MergeabilityTimeout {
                    pull_request: id.0,
                    attempts: retry.attempts,
                });
            }

            info!(
                "Mergeability of pull request #{} not assessed yet, retrying in {}ms (attempt {} of {})",
                id,
                MERGEABILITY_POLL_DELAY.as_millis(),
                retry.attempts,
                retry.limit
            );
            tokio::time::sleep(MERGEABILITY_POLL_DELAY).await;
        }
    }

    /// Run the precondition checks on settled metadata. First failure wins.
    fn evaluate(&self, id: PullRequestId, metadata: PullRequestMetadata) -> Result<String> {
        if metadata.merged {
            return Err(BuildNumberError::AlreadyMerged { pull_request: id.0 });
        }

        if metadata.mergeable == Mergeability::NotMergeable {
            return Err(BuildNumberError::NotMergeable {
                pull_request: id.0,
                base_ref: metadata.base_ref,
            });
        }

        if !naming::matches(
            self.enforce_naming_convention,
            Some(&BRANCH_NAMING_CONVENTION),
            Some(&metadata.head_ref),
        ) {
            return Err(BuildNumberError::NamingConvention(format!(
                "Branch name '{}' does not match naming convention regex: '{}'. {}",
                metadata.head_ref,
                BRANCH_NAMING_CONVENTION.pattern.as_str(),
                BRANCH_NAMING_CONVENTION.help
            )));
        }

        if !naming::matches(
            self.enforce_naming_convention,
            Some(&PULL_REQUEST_TITLE_NAMING_CONVENTION),
            Some(&metadata.title),
        ) {
            return Err(BuildNumberError::NamingConvention(format!(
                "Pull request title '{}' does not match naming convention regex: '{}'. {}",
                metadata.title,
                PULL_REQUEST_TITLE_NAMING_CONVENTION.pattern.as_str(),
                PULL_REQUEST_TITLE_NAMING_CONVENTION.help
            )));
        }

        info!(
            "Pull request #{} can be merged into {}",
            id, metadata.base_ref
        );
        Ok(branch::trim(&branch::normalize(&metadata.head_ref)))
    }
}
