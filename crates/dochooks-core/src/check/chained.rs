//! Runs several checkers over a single tree walk.

use super::{Checker, CheckerFactory, Diagnostics};
use crate::parse::{Document, Node};
use log::debug;
use std::sync::Arc;

/// A checker that forwards every hook to its children in order.
///
/// Hook diagnostics interleave in document order rather than checker by
/// checker.
pub struct ChainedChecker {
    checkers: Vec<Box<dyn Checker>>,
    abort_on_failure: bool,
}

impl ChainedChecker {
    /// Creates a chain over already built checkers.
    pub fn new(checkers: Vec<Box<dyn Checker>>, abort_on_failure: bool) -> Self {
        Self {
            checkers,
            abort_on_failure,
        }
    }

    /// Returns the names of the chained checkers, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.checkers.iter().map(|checker| checker.name()).collect()
    }
}

impl std::fmt::Debug for ChainedChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainedChecker")
            .field("checkers", &self.names())
            .field("abort_on_failure", &self.abort_on_failure)
            .finish()
    }
}

impl Checker for ChainedChecker {
    fn name(&self) -> &'static str {
        "chained"
    }

    fn dispatch_visit(&mut self, node: &Node, diagnostics: &mut Diagnostics) {
        for checker in &mut self.checkers {
            checker.dispatch_visit(node, diagnostics);
        }
    }

    fn dispatch_departure(&mut self, node: &Node, diagnostics: &mut Diagnostics) {
        for checker in &mut self.checkers {
            checker.dispatch_departure(node, diagnostics);
        }
    }

    /// With `abort_on_failure`, stops at the first failing checker.
    /// Otherwise every result is read so all diagnostics are reported.
    fn result(&self, diagnostics: &mut Diagnostics) -> bool {
        let mut passed = true;
        for checker in &self.checkers {
            let checker_passed = checker.result(diagnostics);
            debug!(
                "Checker {} {}",
                checker.name(),
                if checker_passed { "passed" } else { "failed" }
            );
            if self.abort_on_failure && !checker_passed {
                return false;
            }
            passed = checker_passed && passed;
        }
        passed
    }
}

/// Assembles a [`CheckerFactory`] that builds a [`ChainedChecker`] per document.
#[derive(Default)]
pub struct ChainedCheckerBuilder {
    factories: Vec<CheckerFactory>,
    abort_on_failure: bool,
}

impl ChainedCheckerBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether evaluation stops at the first failing checker.
    pub fn abort_on_failure(mut self, value: bool) -> Self {
        self.abort_on_failure = value;
        self
    }

    /// Appends a checker to the chain.
    pub fn with_checker(mut self, factory: CheckerFactory) -> Self {
        self.factories.push(factory);
        self
    }

    /// Finishes the chain.
    pub fn build(self) -> CheckerFactory {
        let factories = self.factories;
        let abort_on_failure = self.abort_on_failure;
        Arc::new(move |document: &Document| -> Box<dyn Checker> {
            let checkers = factories.iter().map(|factory| factory(document)).collect();
            Box::new(ChainedChecker::new(checkers, abort_on_failure))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{ValidationError, check_document};
    use crate::parse::parse_rst;

    /// Fails after the walk when `fail` is set, and reports one diagnostic per
    /// paragraph during the walk.
    struct Probe {
        name: &'static str,
        fail: bool,
        paragraphs: usize,
    }

    impl Checker for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn visit_paragraph(&mut self, node: &Node, diagnostics: &mut Diagnostics) {
            self.paragraphs += 1;
            diagnostics.report(
                self.name,
                ValidationError::CodeBlockInExample { line: node.line },
            );
        }

        fn result(&self, diagnostics: &mut Diagnostics) -> bool {
            if self.fail {
                diagnostics.report(self.name, ValidationError::NoTitles);
            }
            !self.fail && self.paragraphs > 0
        }
    }

    fn probe(name: &'static str, fail: bool) -> CheckerFactory {
        Arc::new(move |_: &Document| -> Box<dyn Checker> {
            Box::new(Probe {
                name,
                fail,
                paragraphs: 0,
            })
        })
    }

    #[test]
    fn hooks_interleave_in_document_order() {
        let factory = ChainedCheckerBuilder::new()
            .with_checker(probe("first", false))
            .with_checker(probe("second", false))
            .build();
        let doc = parse_rst("One.\n\nTwo.\n", "doc.rst").unwrap();
        let report = check_document(&factory, &doc);

        assert!(report.passed);
        let order: Vec<(&str, Option<usize>)> = report
            .diagnostics
            .iter()
            .map(|d| (d.checker, d.line()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("first", Some(1)),
                ("second", Some(1)),
                ("first", Some(3)),
                ("second", Some(3)),
            ]
        );
    }

    #[test]
    fn without_abort_every_result_is_read() {
        let factory = ChainedCheckerBuilder::new()
            .with_checker(probe("first", true))
            .with_checker(probe("second", true))
            .build();
        let doc = parse_rst("Text.\n", "doc.rst").unwrap();
        let report = check_document(&factory, &doc);

        assert!(!report.passed);
        let failures = report
            .diagnostics
            .iter()
            .filter(|d| d.error == ValidationError::NoTitles)
            .count();
        assert_eq!(failures, 2);
    }

    #[test]
    fn abort_stops_at_first_failure() {
        let factory = ChainedCheckerBuilder::new()
            .abort_on_failure(true)
            .with_checker(probe("first", true))
            .with_checker(probe("second", true))
            .build();
        let doc = parse_rst("Text.\n", "doc.rst").unwrap();
        let report = check_document(&factory, &doc);

        assert!(!report.passed);
        let failing: Vec<&str> = report
            .diagnostics
            .iter()
            .filter(|d| d.error == ValidationError::NoTitles)
            .map(|d| d.checker)
            .collect();
        assert_eq!(failing, vec!["first"]);
    }

    #[test]
    fn repeated_checks_are_identical() {
        let factory = ChainedCheckerBuilder::new()
            .with_checker(probe("first", false))
            .with_checker(probe("second", true))
            .build();
        let doc = parse_rst("One.\n\nTwo.\n", "doc.rst").unwrap();
        let first = check_document(&factory, &doc);
        let second = check_document(&factory, &doc);
        assert_eq!(first, second);
    }
}
