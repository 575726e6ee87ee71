// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsers for the supported input formats, and the registry that picks one
//! for a given file.

mod e2e;
mod integration;

pub use e2e::*;
pub use integration::*;

use crate::errors::ParseError;
use camino::Utf8Path;
use parse2junit_xml::{Report, TestSuite};
use regex::Regex;
use std::fmt;

/// A parser for one kind of result file.
pub trait ResultParser: fmt::Debug {
    /// A short name for this parser, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Parses the file at `path`.
    ///
    /// `hostname` is stamped on suites that don't record their own host.
    /// Returns `Ok(None)` if the file is readable but holds no usable results.
    fn parse(&self, path: &Utf8Path, hostname: &str)
    -> Result<Option<ParsedResults>, ParseError>;
}

/// The output of a [`ResultParser`].
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedResults {
    /// A single suite built from scratch.
    Suite(TestSuite),

    /// A whole document, possibly containing nested suites.
    Report(Report),
}

impl ParsedResults {
    /// Consumes the results, returning every suite in document order with
    /// nesting removed.
    pub fn into_flat_test_suites(self) -> Vec<TestSuite> {
        match self {
            Self::Suite(test_suite) => {
                let mut report = Report::default();
                report.add_test_suite(test_suite);
                report.into_flat_test_suites()
            }
            Self::Report(report) => report.into_flat_test_suites(),
        }
    }
}

/// An ordered list of file name patterns and the parsers that handle them.
#[derive(Debug)]
pub struct ParserRegistry {
    entries: Vec<RegistryEntry>,
}

#[derive(Debug)]
struct RegistryEntry {
    pattern: Regex,
    parser: Box<dyn ResultParser>,
}

impl ParserRegistry {
    /// Creates a registry with no parsers.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers `parser` for paths matching `pattern`.
    ///
    /// Patterns are searched for anywhere in the path, and are tried in
    /// registration order.
    pub fn register(&mut self, pattern: Regex, parser: impl ResultParser + 'static) -> &mut Self {
        self.entries.push(RegistryEntry {
            pattern,
            parser: Box::new(parser),
        });
        self
    }

    /// Returns the first parser whose pattern matches `path`.
    pub fn parser_for(&self, path: &Utf8Path) -> Option<&dyn ResultParser> {
        self.entries
            .iter()
            .find(|entry| entry.pattern.is_match(path.as_str()))
            .map(|entry| &*entry.parser)
    }

    /// Returns the number of registered parsers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no parsers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ParserRegistry {
    /// Integration logs (`testout.txt`) and e2e reports (`junit_NN.xml`).
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(
                Regex::new(r"testout\.txt").expect("integration pattern is valid"),
                IntegrationParser,
            )
            .register(
                Regex::new(r"junit_\d+.xml").expect("e2e pattern is valid"),
                E2eParser,
            );
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("testout.txt", Some("integration") ; "integration log")]
    #[test_case("/artifacts/run-3/testout.txt", Some("integration") ; "nested integration log")]
    #[test_case("junit_01.xml", Some("e2e") ; "e2e report")]
    #[test_case("/artifacts/junit_123.xml", Some("e2e") ; "nested e2e report")]
    #[test_case("junit_.xml", None ; "e2e without number")]
    #[test_case("testout.log", None ; "wrong extension")]
    #[test_case("results.xml", None ; "unknown")]
    fn default_registry_dispatch(path: &str, expected: Option<&str>) {
        let registry = ParserRegistry::default();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.parser_for(Utf8Path::new(path)).map(|parser| parser.name()),
            expected
        );
    }

    #[test]
    fn first_match_wins() {
        let registry = ParserRegistry::default();
        // Matches both patterns; the integration parser was registered first.
        let parser = registry
            .parser_for(Utf8Path::new("/junit_01.xml.d/testout.txt"))
            .expect("path matches");
        assert_eq!(parser.name(), "integration");
    }

    #[test]
    fn empty_registry_matches_nothing() {
        let registry = ParserRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.parser_for(Utf8Path::new("testout.txt")).is_none());
    }
}
