// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of single lines of integration test output.
//!
//! The integration log is TAP-like: a `start..end` header announcing how many
//! tests will run, followed by one `ok`/`not ok` line per test. Matching never
//! fails; a line that is not recognized is simply [`LineKind::Other`].

use regex::Regex;
use std::{fmt, sync::LazyLock};

static COUNT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<start>[0-9]+)\.\.(?P<end>[0-9]+)").expect("count header regex is valid")
});

static SKIP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<status>ok|not ok) (?P<number>\d+) # skip (?P<reason>\(.+\)) (?P<description>.+)")
        .expect("skip line regex is valid")
});

static RESULT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<status>ok|not ok) (?P<number>\d+) (?P<description>.+)")
        .expect("result line regex is valid")
});

/// The status token at the start of a result line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResultStatus {
    /// `ok`
    Ok,

    /// `not ok`
    NotOk,
}

impl ResultStatus {
    /// Returns the token as it appears in the log.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotOk => "not ok",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "ok" => Some(Self::Ok),
            "not ok" => Some(Self::NotOk),
            _ => None,
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `start..end` line announcing the tests in the log.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CountHeader {
    /// The first test number.
    pub start: i64,

    /// The last test number.
    pub end: i64,
}

impl CountHeader {
    /// The number of tests the header announces: `end - start + 1`.
    ///
    /// Zero or negative when the range is empty or reversed.
    pub fn declared_count(&self) -> i64 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }
}

/// A single `ok`/`not ok` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultLine<'a> {
    /// The status token.
    pub status: ResultStatus,

    /// The test number, verbatim.
    pub number: &'a str,

    /// The test description.
    pub description: &'a str,

    /// For `# skip` lines, the parenthesized reason, parentheses included.
    pub skip_reason: Option<&'a str>,
}

impl ResultLine<'_> {
    /// Returns true if this was a `# skip` line.
    pub fn is_skip(&self) -> bool {
        self.skip_reason.is_some()
    }
}

/// What a line of integration output turned out to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// A `start..end` header.
    CountHeader(CountHeader),

    /// An `ok`/`not ok` line, skipped or not.
    Result(ResultLine<'a>),

    /// Anything else.
    Other,
}

/// Matches a `start..end` count header.
///
/// Numbers too large for an `i64` saturate at `i64::MAX`.
pub fn count_header(line: &str) -> Option<CountHeader> {
    let captures = COUNT_HEADER.captures(line)?;
    Some(CountHeader {
        start: saturating_number(&captures["start"]),
        end: saturating_number(&captures["end"]),
    })
}

// The regex only admits ASCII digits, so overflow is the only way to fail.
fn saturating_number(digits: &str) -> i64 {
    digits.parse().unwrap_or(i64::MAX)
}

/// Matches a result line, trying the `# skip` form first.
pub fn result_line(line: &str) -> Option<ResultLine<'_>> {
    if let Some(captures) = SKIP_LINE.captures(line) {
        return Some(ResultLine {
            status: ResultStatus::from_token(captures.name("status")?.as_str())?,
            number: captures.name("number")?.as_str(),
            description: captures.name("description")?.as_str(),
            skip_reason: Some(captures.name("reason")?.as_str()),
        });
    }

    let captures = RESULT_LINE.captures(line)?;
    Some(ResultLine {
        status: ResultStatus::from_token(captures.name("status")?.as_str())?,
        number: captures.name("number")?.as_str(),
        description: captures.name("description")?.as_str(),
        skip_reason: None,
    })
}

/// Classifies a line. Headers take precedence over result lines.
pub fn classify(line: &str) -> LineKind<'_> {
    if let Some(header) = count_header(line) {
        LineKind::CountHeader(header)
    } else if let Some(result) = result_line(line) {
        LineKind::Result(result)
    } else {
        LineKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("1..2", 1, 2, 2 ; "simple")]
    #[test_case("1..125 tests", 1, 125, 125 ; "trailing text")]
    #[test_case("5..3", 5, 3, -1 ; "reversed")]
    #[test_case("0..0", 0, 0, 1 ; "single zero")]
    #[test_case("1..99999999999999999999", 1, i64::MAX, i64::MAX ; "end overflows")]
    #[test_case(
        "99999999999999999999..99999999999999999999",
        i64::MAX,
        i64::MAX,
        1 ;
        "both overflow"
    )]
    fn count_header_matches(line: &str, start: i64, end: i64, declared: i64) {
        let header = count_header(line).expect("line is a count header");
        assert_eq!(header, CountHeader { start, end });
        assert_eq!(header.declared_count(), declared);
    }

    #[test_case("" ; "empty")]
    #[test_case("ok 1 first test" ; "result line")]
    #[test_case(" 1..2" ; "leading space")]
    #[test_case("a..2" ; "not a number")]
    fn count_header_rejects(line: &str) {
        assert_eq!(count_header(line), None);
    }

    #[test]
    fn result_line_pass_and_fail() {
        assert_eq!(
            result_line("ok 1 first test"),
            Some(ResultLine {
                status: ResultStatus::Ok,
                number: "1",
                description: "first test",
                skip_reason: None,
            })
        );
        assert_eq!(
            result_line("not ok 2 second test"),
            Some(ResultLine {
                status: ResultStatus::NotOk,
                number: "2",
                description: "second test",
                skip_reason: None,
            })
        );
    }

    #[test]
    fn skip_takes_precedence() {
        let line = result_line("ok 3 # skip (not on this kernel) ctr seccomp")
            .expect("line is a result line");
        assert!(line.is_skip());
        assert_eq!(line.status, ResultStatus::Ok);
        assert_eq!(line.number, "3");
        assert_eq!(line.skip_reason, Some("(not on this kernel)"));
        assert_eq!(line.description, "ctr seccomp");
    }

    #[test]
    fn skip_without_reason_is_plain_result() {
        // No parenthesized reason, so only the generic pattern applies.
        let line = result_line("ok 4 # skip flaky").expect("line is a result line");
        assert!(!line.is_skip());
        assert_eq!(line.description, "# skip flaky");
    }

    #[test_case("okay 1 test" ; "bad token")]
    #[test_case("ok test" ; "no number")]
    #[test_case("ok 1" ; "no description")]
    #[test_case("# ok 1 commented" ; "comment")]
    fn result_line_rejects(line: &str) {
        assert_eq!(result_line(line), None);
    }

    #[test]
    fn classify_lines() {
        assert_eq!(
            classify("1..2"),
            LineKind::CountHeader(CountHeader { start: 1, end: 2 })
        );
        assert!(matches!(classify("not ok 2 second"), LineKind::Result(_)));
        assert_eq!(classify("# some diagnostic"), LineKind::Other);
    }
}
