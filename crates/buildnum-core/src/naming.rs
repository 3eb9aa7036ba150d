//! Naming-convention enforcement for branches and pull-request titles.
//!
//! Conventions tie branches and pull requests back to their Jira reference.
//! Enforcement is opt-in per build and fails open: a build with enforcement
//! switched off, or with no convention configured, always passes.

use std::sync::LazyLock;

use regex::Regex;

/// A naming convention: the pattern a candidate must match plus the help
/// text shown when it does not.
#[derive(Debug)]
pub struct NamingConvention {
    /// Pattern the candidate must match in full.
    pub pattern: Regex,
    /// Human-readable explanation quoted in violation messages.
    pub help: &'static str,
}

/// Convention for pull-request head branch names.
pub static BRANCH_NAMING_CONVENTION: LazyLock<NamingConvention> = LazyLock::new(|| {
    NamingConvention {
        pattern: Regex::new(r"^[A-Z]{2,10}-\d+-[A-Z]+[A-Za-z0-9-_]+$")
            .expect("invalid branch naming convention pattern"),
        help: "example: 'PW-10-Upgrade-mspec'. i.e. 2 - 10 uppercase alphabetic characters \
               (matching Jira project key), then a hyphen, then some numbers (matching Jira \
               reference), then requires another hyphen, an uppercase character, then some \
               more characters (no spaces). separate words with hyphens or underscores",
    }
});

/// Convention for pull-request titles.
pub static PULL_REQUEST_TITLE_NAMING_CONVENTION: LazyLock<NamingConvention> =
    LazyLock::new(|| NamingConvention {
        pattern: Regex::new(r"^[A-Z]{2,10}-\d+ [A-Z]+.+$")
            .expect("invalid pull-request title naming convention pattern"),
        help: "example: 'PW-10 Upgrade mspec'. i.e. 2 - 10 uppercase alphabetic characters \
               (matching Jira project key), then a hyphen, then some numbers (matching Jira \
               reference), then requires space, an uppercase character, then some more \
               characters.",
    });

/// Whether `candidate` satisfies `convention`.
///
/// Returns `true` unconditionally when enforcement is off or no convention
/// is configured. With enforcement and a convention in place, a missing
/// candidate counts as a violation.
pub fn matches(
    enforced: bool,
    convention: Option<&NamingConvention>,
    candidate: Option<&str>,
) -> bool {
    if !enforced {
        return true;
    }
    let Some(convention) = convention else {
        return true;
    };
    match candidate {
        Some(value) => convention.pattern.is_match(value),
        None => false,
    }
}
