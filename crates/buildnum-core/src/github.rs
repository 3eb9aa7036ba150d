//! GitHub REST client for pull-request metadata.
//!
//! One endpoint is used: `GET /repos/{owner}/{repo}/pulls/{id}`. Only the
//! fields the resolver inspects are deserialized; everything else in the
//! response is ignored.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{BuildNumberError, Result};
use crate::pull_request::{Mergeability, PullRequestId, PullRequestMetadata};

/// Default GitHub REST endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// User-Agent sent with every request. GitHub rejects requests without one.
const USER_AGENT: &str = "TeamCity";

/// Source of pull-request metadata.
///
/// The production implementation is [`GitHubClient`]; tests substitute
/// scripted implementations to drive the resolver.
#[async_trait]
pub trait PullRequestClient: Send + Sync {
    /// Fetch the current metadata for one pull request.
    async fn fetch_pull_request(&self, id: PullRequestId) -> Result<PullRequestMetadata>;
}

/// GitHub REST API v3 client scoped to a single repository.
pub struct GitHubClient {
    http_client: reqwest::Client,
    api_base_url: String,
    token: String,
    repo: String,
}

impl GitHubClient {
    /// Create a client for `owner/repo` against the public GitHub API.
    pub fn new(token: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        Self::with_api_base_url(token, repo, DEFAULT_API_BASE_URL)
    }

    /// Create a client against an explicit API base URL (GitHub Enterprise
    /// installations, local test servers).
    pub fn with_api_base_url(
        token: impl Into<String>,
        repo: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| BuildNumberError::Transport(e.to_string()))?;

        Ok(GitHubClient {
            http_client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            repo: repo.into(),
        })
    }

    fn pull_request_url(&self, id: PullRequestId) -> String {
        format!("{}/repos/{}/pulls/{}", self.api_base_url, self.repo, id)
    }
}

#[async_trait]
impl PullRequestClient for GitHubClient {
    async fn fetch_pull_request(&self, id: PullRequestId) -> Result<PullRequestMetadata> {
        let url = self.pull_request_url(id);
        debug!("Fetching pull request metadata from {}", url);

        let response = self
            .http_client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .header("Authorization", format!("token {}", self.token))
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| BuildNumberError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BuildNumberError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(BuildNumberError::Api {
                status: status.as_u16(),
                message: api_error_message(status, &body),
            });
        }

        parse_pull_request(&body)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Pull-request response body, reduced to the fields the resolver reads.
#[derive(Debug, Deserialize)]
struct PullRequestDto {
    mergeable: Option<bool>,
    #[serde(default)]
    merged: bool,
    head: GitRefDto,
    base: GitRefDto,
    title: String,
}

#[derive(Debug, Deserialize)]
struct GitRefDto {
    #[serde(rename = "ref")]
    git_ref: String,
}

/// Error response body; GitHub puts a human-readable reason in `message`.
#[derive(Debug, Deserialize)]
struct ApiErrorDto {
    message: Option<String>,
}

impl From<PullRequestDto> for PullRequestMetadata {
    fn from(dto: PullRequestDto) -> Self {
        PullRequestMetadata {
            mergeable: Mergeability::from_api(dto.mergeable),
            merged: dto.merged,
            head_ref: dto.head.git_ref,
            base_ref: dto.base.git_ref,
            title: dto.title,
        }
    }
}

fn parse_pull_request(body: &str) -> Result<PullRequestMetadata> {
    let dto: PullRequestDto = serde_json::from_str(body)
        .map_err(|e| BuildNumberError::MalformedResponse(e.to_string()))?;
    Ok(dto.into())
}

/// Best-effort extraction of the `message` field from an error body. A body
/// that fails to parse still yields an error carrying the status code.
fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiErrorDto>(body)
        .ok()
        .and_then(|dto| dto.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pull_request_reads_nested_refs() {
        let body = r#"{
            "id": 1,
            "number": 33,
            "title": "ABC-1 Fix",
            "merged": false,
            "mergeable": true,
            "head": { "ref": "ABC-1-Fix", "sha": "abc123" },
            "base": { "ref": "master", "sha": "def456" }
        }"#;

        let metadata = parse_pull_request(body).unwrap();
        assert_eq!(metadata.mergeable, Mergeability::Mergeable);
        assert!(!metadata.merged);
        assert_eq!(metadata.head_ref, "ABC-1-Fix");
        assert_eq!(metadata.base_ref, "master");
        assert_eq!(metadata.title, "ABC-1 Fix");
    }

    #[test]
    fn test_parse_pull_request_null_mergeable_is_unknown() {
        let body = r#"{
            "title": "ABC-1 Fix",
            "merged": false,
            "mergeable": null,
            "head": { "ref": "ABC-1-Fix" },
            "base": { "ref": "master" }
        }"#;

        let metadata = parse_pull_request(body).unwrap();
        assert_eq!(metadata.mergeable, Mergeability::Unknown);
        assert!(metadata.is_pending());
    }

    #[test]
    fn test_parse_pull_request_rejects_malformed_body() {
        let err = parse_pull_request("<html>not json</html>").unwrap_err();
        assert!(matches!(err, BuildNumberError::MalformedResponse(_)));

        // Valid JSON but missing the head/base refs.
        let err = parse_pull_request(r#"{"title": "x"}"#).unwrap_err();
        assert!(matches!(err, BuildNumberError::MalformedResponse(_)));
    }

    #[test]
    fn test_api_error_message_prefers_body_message() {
        let status = reqwest::StatusCode::NOT_FOUND;
        let message = api_error_message(status, r#"{"message": "Not Found"}"#);
        assert_eq!(message, "Not Found");
    }

    #[test]
    fn test_api_error_message_falls_back_to_status_reason() {
        let status = reqwest::StatusCode::BAD_GATEWAY;
        assert_eq!(api_error_message(status, "not json at all"), "Bad Gateway");
        assert_eq!(api_error_message(status, "{}"), "Bad Gateway");
    }

    #[test]
    fn test_pull_request_url_shape() {
        let client = GitHubClient::new("token", "nhsevidence/NICE.TopHat").unwrap();
        assert_eq!(
            client.pull_request_url(PullRequestId(33)),
            "https://api.github.com/repos/nhsevidence/NICE.TopHat/pulls/33"
        );
    }

    #[test]
    fn test_api_base_url_trailing_slash_is_trimmed() {
        let client =
            GitHubClient::with_api_base_url("token", "acme/widgets", "http://127.0.0.1:8080/")
                .unwrap();
        assert_eq!(
            client.pull_request_url(PullRequestId(7)),
            "http://127.0.0.1:8080/repos/acme/widgets/pulls/7"
        );
    }
}
