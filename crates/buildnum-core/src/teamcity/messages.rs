//! TeamCity service-message formatting.
//!
//! TeamCity watches stdout for `##teamcity[...]` lines. Every value
//! interpolated into a message must be escaped per the documented rules or
//! the message is silently dropped by the server.

/// Escape a value for interpolation into a service message.
///
/// `|` becomes `||`, `'` becomes `|'`, newlines become `|n`, carriage
/// returns `|r`, and brackets `|[` / `|]`.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '|' => escaped.push_str("||"),
            '\'' => escaped.push_str("|'"),
            '\n' => escaped.push_str("|n"),
            '\r' => escaped.push_str("|r"),
            '[' => escaped.push_str("|["),
            ']' => escaped.push_str("|]"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Message that sets the build number for the current build.
pub fn build_number(number: &str) -> String {
    format!("##teamcity[buildNumber '{}']", escape(number))
}

/// Message that fails the build with a description.
pub fn build_problem(description: &str) -> String {
    format!("##teamcity[buildProblem description='{}']", escape(description))
}

/// Message opening a named, collapsible log block.
pub fn block_opened(name: &str) -> String {
    format!("##teamcity[blockOpened name='{}']", escape(name))
}

/// Message closing a named log block.
pub fn block_closed(name: &str) -> String {
    format!("##teamcity[blockClosed name='{}']", escape(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_passes_plain_values_through() {
        assert_eq!(escape("1.245-ABC-1-Fix"), "1.245-ABC-1-Fix");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_escape_handles_each_special_character() {
        assert_eq!(escape("a|b"), "a||b");
        assert_eq!(escape("it's"), "it|'s");
        assert_eq!(escape("line\nbreak"), "line|nbreak");
        assert_eq!(escape("line\rbreak"), "line|rbreak");
        assert_eq!(escape("[tag]"), "|[tag|]");
    }

    #[test]
    fn test_escape_handles_adjacent_specials() {
        assert_eq!(escape("|'|"), "|||'||");
        assert_eq!(escape("\r\n"), "|r|n");
    }

    #[test]
    fn test_build_number_message() {
        assert_eq!(
            build_number("45+rABCDEF0"),
            "##teamcity[buildNumber '45+rABCDEF0']"
        );
    }

    #[test]
    fn test_build_problem_message_escapes_description() {
        assert_eq!(
            build_problem("Pull request #7 isn't mergeable"),
            "##teamcity[buildProblem description='Pull request #7 isn|'t mergeable']"
        );
    }

    #[test]
    fn test_block_messages() {
        assert_eq!(
            block_opened("Pull Request"),
            "##teamcity[blockOpened name='Pull Request']"
        );
        assert_eq!(
            block_closed("Pull Request"),
            "##teamcity[blockClosed name='Pull Request']"
        );
    }
}
