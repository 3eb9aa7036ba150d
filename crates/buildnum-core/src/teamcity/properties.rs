//! TeamCity build-properties file access.
//!
//! TeamCity passes every build a Java-properties file whose path is in the
//! `TEAMCITY_BUILD_PROPERTIES_FILE` environment variable. Only the subset of
//! the properties format TeamCity actually emits is parsed here: comments,
//! `=`/`:` separators, the common backslash escapes, and line continuations.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{BuildNumberError, Result};

/// Environment variable TeamCity sets to the properties-file path.
pub const BUILD_PROPERTIES_FILE_ENV: &str = "TEAMCITY_BUILD_PROPERTIES_FILE";

/// Property holding the TeamCity project name.
pub const PROJECT_NAME: &str = "teamcity.projectName";

/// Property holding the full hex VCS revision of the build.
pub const VCS_NUMBER: &str = "build.vcs.number";

/// Property holding the current build number (the build counter unless the
/// build configuration overrides it).
pub const BUILD_NUMBER: &str = "build.number";

/// Key-value view over a TeamCity build-properties file.
#[derive(Debug, Clone, Default)]
pub struct BuildProperties {
    values: HashMap<String, String>,
}

impl BuildProperties {
    /// Load the properties file named by `TEAMCITY_BUILD_PROPERTIES_FILE`.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(BUILD_PROPERTIES_FILE_ENV).map_err(|_| {
            BuildNumberError::Configuration(format!(
                "{BUILD_PROPERTIES_FILE_ENV} is not set; this tool must run inside a TeamCity build"
            ))
        })?;
        Self::load(Path::new(&path))
    }

    /// Load and parse a properties file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Reading TeamCity build properties from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Parse properties-file text.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in logical_lines(text) {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = split_key_value(line);
            values.insert(key, value);
        }
        BuildProperties { values }
    }

    /// Look up a property, failing with the key name when absent.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| BuildNumberError::MissingProperty(key.to_string()))
    }
}

/// Join continuation lines: a natural line ending in an odd number of
/// backslashes continues onto the next line, whose leading whitespace is
/// dropped.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for natural in text.lines() {
        let natural = if continuing {
            natural.trim_start()
        } else {
            natural
        };

        if ends_with_odd_backslashes(natural) {
            current.push_str(&natural[..natural.len() - 1]);
            continuing = true;
        } else {
            current.push_str(natural);
            lines.push(std::mem::take(&mut current));
            continuing = false;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn ends_with_odd_backslashes(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

/// Split a logical line at the first unescaped `=` or `:` and unescape both
/// halves. A line with no separator is a key with an empty value.
fn split_key_value(line: &str) -> (String, String) {
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                let key = unescape(line[..index].trim_end());
                let value = unescape(line[index + 1..].trim_start());
                return (key, value);
            }
            _ => {}
        }
    }
    (unescape(line.trim_end()), String::new())
}

/// Resolve the `\\`, `\=`, `\:`, `\n`, `\r` and `\t` escapes. An unknown
/// escape drops the backslash, as Java's loader does.
fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => {}
        }
    }
    result
}
