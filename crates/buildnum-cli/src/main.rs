//! buildnum - TeamCity build-number tool
//!
//! Invoked once per TeamCity build. Derives the build number from the branch
//! being built, the TeamCity build counter (optionally combined with the
//! package.json version) and, for pull-request branches, mergeability and
//! naming data from the GitHub API. Reports the result as a `buildNumber`
//! service message on stdout; any failure becomes a single `buildProblem`
//! message and exit code 1.

use std::env;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, Level};

use buildnum_core::{
    default_branch_names, manifest, set_build_number, teamcity, telemetry, BuildContext,
    BuildProperties, GitHubClient, PullRequestClient, DEFAULT_API_BASE_URL,
};

#[derive(Parser)]
#[command(name = "buildnum")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sets the TeamCity build number for the current build", long_about = None)]
struct Cli {
    /// Raw branch name as TeamCity reports it, e.g. refs/heads/master
    #[arg(short, long)]
    branch: String,

    /// GitHub API token used to fetch pull-request metadata
    #[arg(long, value_name = "TOKEN")]
    github_token: Option<String>,

    /// Repository pull requests belong to, as owner/repo
    #[arg(long, value_name = "OWNER/REPO")]
    github_repo: Option<String>,

    /// Derive the base build number from the package.json version
    #[arg(long)]
    use_package_json_version: bool,

    /// Directory holding package.json, relative to the working directory
    #[arg(long, value_name = "PATH")]
    package_relative_path: Option<String>,

    /// Enforce branch and pull-request-title naming conventions
    #[arg(long)]
    enforce_naming_convention: bool,

    /// Branch name given the default-branch build number (repeatable;
    /// defaults to master, main)
    #[arg(long = "default-branch", value_name = "NAME")]
    default_branches: Vec<String>,

    /// GitHub API base URL, for GitHub Enterprise installations
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_BASE_URL)]
    github_api_url: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    telemetry::init_tracing(cli.json, level);

    if let Err(err) = run(cli).await {
        error!("{err:#}");
        println!("{}", teamcity::build_problem(&format!("{err:#}")));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let properties =
        BuildProperties::from_env().context("Could not read TeamCity build properties")?;

    let manifest_version = if cli.use_package_json_version {
        let cwd = env::current_dir().context("Could not resolve the working directory")?;
        let path = manifest::package_json_path(&cwd, cli.package_relative_path.as_deref());
        Some(manifest::read_version(&path)?)
    } else {
        None
    };

    let context = BuildContext {
        project_name: properties.get(teamcity::PROJECT_NAME)?.to_string(),
        raw_branch: cli.branch,
        build_number: properties.get(teamcity::BUILD_NUMBER)?.to_string(),
        vcs_hash: properties.get(teamcity::VCS_NUMBER)?.to_string(),
        manifest_version,
        enforce_naming_convention: cli.enforce_naming_convention,
        default_branches: if cli.default_branches.is_empty() {
            default_branch_names()
        } else {
            cli.default_branches
        },
    };

    // Only pull-request builds need GitHub; the orchestrator rejects a
    // pull-request branch with no client as a configuration error.
    let client = match (&cli.github_token, &cli.github_repo) {
        (Some(token), Some(repo)) => Some(GitHubClient::with_api_base_url(
            token.as_str(),
            repo.as_str(),
            cli.github_api_url.as_str(),
        )?),
        _ => None,
    };

    set_build_number(
        &context,
        client.as_ref().map(|c| c as &dyn PullRequestClient),
    )
    .await?;

    Ok(())
}
