//! Top-level build-number derivation.
//!
//! Classifies the branch being built and assembles the final build number:
//! default branches get a `+r<hash>` revision suffix, feature branches get
//! their trimmed name appended, and pull-request branches are resolved
//! against GitHub first. The result is reported to TeamCity as a
//! `buildNumber` service message on stdout.

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::branch;
use crate::error::{BuildNumberError, Result};
use crate::github::PullRequestClient;
use crate::pull_request::PullRequestId;
use crate::resolver::PullRequestResolver;
use crate::teamcity;
use crate::version;

/// Branch names that receive the revision-suffix build number by default.
pub const DEFAULT_BRANCHES: [&str; 2] = ["master", "main"];

/// Characters of the VCS hash carried into the build number.
const SHORT_HASH_LEN: usize = 7;

/// Shape required of `build.number` when it is used as a build counter.
static BUILD_COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("invalid build counter pattern"));

/// Everything one invocation needs, assembled up front and immutable from
/// then on.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// TeamCity project name, for log narration only.
    pub project_name: String,
    /// Branch ref exactly as TeamCity reports it.
    pub raw_branch: String,
    /// TeamCity `build.number`; the build counter in version mode.
    pub build_number: String,
    /// Full hex VCS revision of the build.
    pub vcs_hash: String,
    /// package.json version, present when version-based numbering was
    /// requested.
    pub manifest_version: Option<String>,
    /// Whether branch and title naming conventions are enforced on pull
    /// requests.
    pub enforce_naming_convention: bool,
    /// Branch names treated as the default branch.
    pub default_branches: Vec<String>,
}

impl BuildContext {
    fn is_default_branch(&self, branch: &str) -> bool {
        self.default_branches.iter().any(|name| name == branch)
    }
}

/// Names treated as the default branch when none are configured.
pub fn default_branch_names() -> Vec<String> {
    DEFAULT_BRANCHES.iter().map(|name| name.to_string()).collect()
}

/// Derive and report the build number for this invocation.
///
/// `client` is only consulted for pull-request branches; passing `None` for
/// such a branch is a configuration error. The final number is both written
/// to stdout as a `buildNumber` service message and returned.
pub async fn set_build_number(
    context: &BuildContext,
    client: Option<&dyn PullRequestClient>,
) -> Result<String> {
    info!("Setting build number for project '{}'", context.project_name);

    let base = base_build_number(context)?;
    let branch = branch::normalize(&context.raw_branch);

    info!("Current build number is '{}'", base);
    info!("Branch is '{}'", branch);

    if context.is_default_branch(&branch) {
        info!("Building {}", branch);
        let number = format!("{base}+r{}", short_hash(&context.vcs_hash));
        report_build_number(&number);
        return Ok(number);
    }

    let Some(id) = PullRequestId::from_branch(&branch) else {
        info!("Building a feature branch");
        let number = format!("{base}-{}", branch::trim(&branch));
        report_build_number(&number);
        return Ok(number);
    };

    println!("{}", teamcity::block_opened("Pull Request"));
    info!("Using pull request #{}", id);

    let client = client.ok_or_else(|| {
        BuildNumberError::Configuration(format!(
            "Building pull request #{id} requires --github-token and --github-repo"
        ))
    })?;

    let resolver = PullRequestResolver::new(client, context.enforce_naming_convention);
    let fragment = resolver.resolve(id).await?;
    info!("Branch for PR #{} is '{}'", id, fragment);

    let number = format!("{base}-{fragment}");
    report_build_number(&number);
    println!("{}", teamcity::block_closed("Pull Request"));
    Ok(number)
}

/// The number everything else is appended to: the raw TeamCity build number,
/// or its composition with the package.json version in version mode.
fn base_build_number(context: &BuildContext) -> Result<String> {
    let Some(manifest_version) = &context.manifest_version else {
        return Ok(context.build_number.clone());
    };

    println!("{}", teamcity::block_opened("package.json version"));
    info!("Using package.json version as the build number");
    info!("Current package.json version is '{}'", manifest_version);

    // build.number must be the plain build counter here; anything else means
    // the build configuration overrode the build number format.
    if !BUILD_COUNTER.is_match(&context.build_number) {
        return Err(BuildNumberError::Configuration(format!(
            "Expected build.number to be a build counter integer, but found '{}'",
            context.build_number
        )));
    }
    info!("Build counter is '{}'", context.build_number);

    let base = version::compose(manifest_version, &context.build_number)?;
    println!("{}", teamcity::block_closed("package.json version"));
    Ok(base)
}

fn short_hash(vcs_hash: &str) -> String {
    vcs_hash
        .chars()
        .take(SHORT_HASH_LEN)
        .collect::<String>()
        .to_uppercase()
}

fn report_build_number(number: &str) {
    println!("{}", teamcity::build_number(number));
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::pull_request::{Mergeability, PullRequestMetadata};

    struct FixedClient(PullRequestMetadata);

    #[async_trait]
    impl PullRequestClient for FixedClient {
        async fn fetch_pull_request(&self, _id: PullRequestId) -> Result<PullRequestMetadata> {
            Ok(self.0.clone())
        }
    }

    /// Fails the test if the orchestrator reaches for the network.
    struct UnreachableClient;

    #[async_trait]
    impl PullRequestClient for UnreachableClient {
        async fn fetch_pull_request(&self, id: PullRequestId) -> Result<PullRequestMetadata> {
            panic!("unexpected fetch of pull request #{id}");
        }
    }

    fn context(raw_branch: &str) -> BuildContext {
        BuildContext {
            project_name: "TopHat".to_string(),
            raw_branch: raw_branch.to_string(),
            build_number: "45".to_string(),
            vcs_hash: "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b".to_string(),
            manifest_version: None,
            enforce_naming_convention: false,
            default_branches: default_branch_names(),
        }
    }

    #[tokio::test]
    async fn test_master_build_gets_revision_suffix() {
        let number = set_build_number(&context("refs/heads/master"), None)
            .await
            .unwrap();
        assert_eq!(number, "45+r9F86D08");
    }

    #[tokio::test]
    async fn test_main_is_also_a_default_branch() {
        let number = set_build_number(&context("main"), None).await.unwrap();
        assert_eq!(number, "45+r9F86D08");
    }

    #[tokio::test]
    async fn test_default_branch_list_is_configurable() {
        let mut trunk_context = context("trunk");
        trunk_context.default_branches = vec!["trunk".to_string()];
        let number = set_build_number(&trunk_context, None).await.unwrap();
        assert_eq!(number, "45+r9F86D08");

        // With the default list, trunk is just a feature branch.
        let number = set_build_number(&context("trunk"), None).await.unwrap();
        assert_eq!(number, "45-trunk");
    }

    #[tokio::test]
    async fn test_feature_branch_gets_trimmed_name_suffix() {
        let number = set_build_number(
            &context("feature/ABC-123-do-thing-with-a-very-long-name"),
            None,
        )
        .await
        .unwrap();
        assert_eq!(number, "45-ABC-123-do-thing-wit");
    }

    #[tokio::test]
    async fn test_pull_request_build_uses_resolved_head_branch() {
        let client = FixedClient(PullRequestMetadata {
            mergeable: Mergeability::Mergeable,
            merged: false,
            head_ref: "ABC-1-Fix".to_string(),
            base_ref: "master".to_string(),
            title: "ABC-1 Fix".to_string(),
        });

        let number = set_build_number(&context("refs/pulls/33/merge"), Some(&client))
            .await
            .unwrap();
        assert_eq!(number, "45-ABC-1-Fix");
    }

    #[tokio::test]
    async fn test_pull_request_without_credentials_is_configuration_error() {
        let err = set_build_number(&context("33/merge"), None).await.unwrap_err();
        match err {
            BuildNumberError::Configuration(message) => {
                assert!(message.contains("pull request #33"));
            }
            other => panic!("expected Configuration, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_not_mergeable_pull_request_fails_the_build() {
        let client = FixedClient(PullRequestMetadata {
            mergeable: Mergeability::NotMergeable,
            merged: false,
            head_ref: "ABC-1-Fix".to_string(),
            base_ref: "master".to_string(),
            title: "ABC-1 Fix".to_string(),
        });

        let err = set_build_number(&context("33/merge"), Some(&client))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildNumberError::NotMergeable { .. }));
    }

    #[tokio::test]
    async fn test_version_mode_composes_release_version() {
        let mut context = context("refs/heads/master");
        context.manifest_version = Some("1.2.3".to_string());
        let number = set_build_number(&context, None).await.unwrap();
        assert_eq!(number, "1.245+r9F86D08");
    }

    #[tokio::test]
    async fn test_version_mode_composes_alpha_version() {
        let mut context = context("feature/short");
        context.manifest_version = Some("2.0.0-alpha.3".to_string());
        context.build_number = "7".to_string();
        let number = set_build_number(&context, None).await.unwrap();
        assert_eq!(number, "2.0.0-alpha.7-short");
    }

    #[tokio::test]
    async fn test_non_numeric_counter_fails_before_any_fetch() {
        let mut context = context("33/merge");
        context.manifest_version = Some("1.2.3".to_string());
        context.build_number = "1.2.3.4".to_string();

        let err = set_build_number(&context, Some(&UnreachableClient))
            .await
            .unwrap_err();
        match err {
            BuildNumberError::Configuration(message) => {
                assert!(message.contains("build counter integer"));
            }
            other => panic!("expected Configuration, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_manifest_version_fails_before_any_fetch() {
        let mut context = context("33/merge");
        context.manifest_version = Some("not-a-version".to_string());

        let err = set_build_number(&context, Some(&UnreachableClient))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildNumberError::Configuration(_)));
    }
}
