//! Build-number composition from a package.json version and the TeamCity
//! build counter.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{BuildNumberError, Result};

/// Pre-release versions shaped like `major.minor.patch-alpha.N`.
static ALPHA_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+-alpha\.(\d+)$").expect("invalid alpha version pattern")
});

/// Release versions shaped like plain `major.minor.patch`.
static RELEASE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.\d+$").expect("invalid release version pattern"));

/// Combine a manifest version with the build counter.
///
/// Alpha versions keep their shape and take the counter as the pre-release
/// number: `("2.0.0-alpha.3", "7")` becomes `"2.0.0-alpha.7"`. Release
/// versions drop the patch segment and append the counter directly after
/// the minor segment with no separator: `("1.2.3", "45")` becomes
/// `"1.245"`.
///
/// Versions of any other shape are rejected as configuration errors rather
/// than silently producing a malformed build number.
pub fn compose(version: &str, counter: &str) -> Result<String> {
    if version.contains("alpha") {
        return match ALPHA_VERSION.captures(version) {
            Some(captures) => {
                // The pre-release number is the trailing digit run; everything
                // before it is preserved verbatim.
                let digits = &captures[1];
                let prefix = &version[..version.len() - digits.len()];
                Ok(format!("{prefix}{counter}"))
            }
            None => Err(BuildNumberError::Configuration(format!(
                "Expected an alpha version shaped like 'major.minor.patch-alpha.N', found '{version}'"
            ))),
        };
    }

    match RELEASE_VERSION.captures(version) {
        Some(captures) => Ok(format!("{}.{}{}", &captures[1], &captures[2], counter)),
        None => Err(BuildNumberError::Configuration(format!(
            "Expected a release version shaped like 'major.minor.patch', found '{version}'"
        ))),
    }
}
