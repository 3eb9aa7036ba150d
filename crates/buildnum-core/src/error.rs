//! Error types for build-number derivation

use thiserror::Error;

/// Errors that can occur while deriving a build number
#[derive(Error, Debug)]
pub enum BuildNumberError {
    /// Invalid or inconsistent invocation configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required TeamCity build property was absent
    #[error("Missing TeamCity build property: {0}")]
    MissingProperty(String),

    /// Network-level failure reaching the GitHub API
    #[error("GitHub request failed: {0}")]
    Transport(String),

    /// Response body did not match the expected shape
    #[error("Malformed GitHub response: {0}")]
    MalformedResponse(String),

    /// GitHub answered with a non-success status
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Mergeability was still unknown after the attempt limit
    #[error(
        "Could not assess mergeability of pull request #{pull_request} after {attempts} attempts"
    )]
    MergeabilityTimeout { pull_request: u64, attempts: u32 },

    /// The pull request has already been merged
    #[error("Pull request #{pull_request} is already merged")]
    AlreadyMerged { pull_request: u64 },

    /// GitHub reported the pull request as not mergeable
    #[error("Pull request #{pull_request} is not mergeable into {base_ref}")]
    NotMergeable { pull_request: u64, base_ref: String },

    /// A branch name or pull-request title violated the naming convention
    #[error("{0}")]
    NamingConvention(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for build-number operations
pub type Result<T> = std::result::Result<T, BuildNumberError>;
