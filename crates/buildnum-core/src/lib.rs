//! buildnum-core - TeamCity build-number derivation
//!
//! Computes a deterministic build-number string for a TeamCity build from:
//! - the branch being built (default branch, feature branch, or pull request)
//! - the TeamCity build counter, optionally combined with a package.json version
//! - for pull requests, mergeability and naming-convention data from GitHub
//!
//! The result is reported back to TeamCity as a `buildNumber` service message;
//! failures become a `buildProblem` and a non-zero exit.

pub mod branch;
pub mod error;
pub mod github;
pub mod manifest;
pub mod naming;
pub mod orchestrator;
pub mod pull_request;
pub mod resolver;
pub mod teamcity;
pub mod telemetry;
pub mod version;

// Re-export key types
pub use error::{BuildNumberError, Result};
pub use github::{GitHubClient, PullRequestClient, DEFAULT_API_BASE_URL};
pub use orchestrator::{default_branch_names, set_build_number, BuildContext, DEFAULT_BRANCHES};
pub use pull_request::{Mergeability, PullRequestId, PullRequestMetadata};
pub use resolver::{PullRequestResolver, MERGEABILITY_ATTEMPT_LIMIT, MERGEABILITY_POLL_DELAY};
pub use teamcity::BuildProperties;
