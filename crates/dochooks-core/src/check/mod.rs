//! Checker traits and runner for API reference documents.
//!
//! A [`Checker`] is a visitor over the document tree. Hooks fire in document
//! order, a pre-order `visit_*` then a post-order `depart_*` per node, and
//! [`Checker::result`] is read once the walk is done. Checkers are built per
//! document by a [`CheckerFactory`] and can be composed with
//! [`ChainedCheckerBuilder`].

mod chained;
mod code_example;
mod dead_link;
pub mod declaration;
mod error;
mod parameters;
mod probe;
mod title;

pub use chained::{ChainedChecker, ChainedCheckerBuilder};
pub use code_example::CodeExampleChecker;
pub use dead_link::DeadLinkChecker;
pub use declaration::{ApiDeclaration, ApiParameter, DeclarationError, DocType};
pub use error::{Diagnostic, Diagnostics, ValidationError};
pub use parameters::ParametersChecker;
pub use probe::{HttpClient, LinkProbe, ProbeError};
pub use title::TitleChecker;

use crate::parse::{Document, Node, Tag};
use log::debug;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// House-style settings shared by the checkers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Title of the section that documents parameters.
    pub parameters_section: String,
    /// Title of the section that holds code examples.
    pub code_example_section: String,
    /// Allowed second-level titles.
    pub allowed_h2_titles: Vec<String>,
    /// Second-level titles every document must have.
    pub required_h2_titles: Vec<String>,
    /// Marker that flags a documented parameter as optional, e.g. `(int，可选)`.
    pub optional_marker: String,
    /// Prefix of a copy reference paragraph in the code example section.
    pub copy_from_marker: String,
    /// Directive that holds inline code, which is not allowed in examples.
    pub raw_code_directive: String,
    /// Directives that declare the documented API.
    pub declaration_directives: Vec<String>,
    /// If false, HTTP links are not probed.
    pub check_external_links: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            parameters_section: "参数".to_string(),
            code_example_section: "代码示例".to_string(),
            allowed_h2_titles: ["参数", "返回", "属性", "方法", "代码示例"]
                .into_iter()
                .map(String::from)
                .collect(),
            required_h2_titles: ["参数", "代码示例"].into_iter().map(String::from).collect(),
            optional_marker: "，可选".to_string(),
            copy_from_marker: "COPY-FROM".to_string(),
            raw_code_directive: "code-block".to_string(),
            declaration_directives: vec!["py:function".to_string(), "py:class".to_string()],
            check_external_links: true,
        }
    }
}

impl CheckConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parameters section title.
    pub fn with_parameters_section(mut self, title: impl Into<String>) -> Self {
        self.parameters_section = title.into();
        self
    }

    /// Sets the code example section title.
    pub fn with_code_example_section(mut self, title: impl Into<String>) -> Self {
        self.code_example_section = title.into();
        self
    }

    /// Sets the allowed second-level titles.
    pub fn with_allowed_h2_titles(mut self, titles: Vec<String>) -> Self {
        self.allowed_h2_titles = titles;
        self
    }

    /// Sets the required second-level titles.
    pub fn with_required_h2_titles(mut self, titles: Vec<String>) -> Self {
        self.required_h2_titles = titles;
        self
    }

    /// Sets the optional marker used in parameter type annotations.
    pub fn with_optional_marker(mut self, marker: impl Into<String>) -> Self {
        self.optional_marker = marker.into();
        self
    }

    /// Sets the copy reference marker.
    pub fn with_copy_from_marker(mut self, marker: impl Into<String>) -> Self {
        self.copy_from_marker = marker.into();
        self
    }

    /// Sets the directive that counts as a raw code block.
    pub fn with_raw_code_directive(mut self, name: impl Into<String>) -> Self {
        self.raw_code_directive = name.into();
        self
    }

    /// Sets the API declaration directives.
    pub fn with_declaration_directives(mut self, names: Vec<String>) -> Self {
        self.declaration_directives = names;
        self
    }

    /// Sets whether HTTP links are probed.
    pub fn with_check_external_links(mut self, value: bool) -> Self {
        self.check_external_links = value;
        self
    }
}

/// A visitor that validates one document.
///
/// Every hook has an empty default body; tags without a hook are ignored.
/// Hooks may report violations right away, and [`Checker::result`] may add
/// more once the walk is over.
pub trait Checker {
    /// Returns the name of this checker.
    fn name(&self) -> &'static str;

    fn visit_document(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn depart_document(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn visit_section(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn depart_section(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn visit_title(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn depart_title(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn visit_paragraph(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn depart_paragraph(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn visit_literal_block(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn depart_literal_block(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn visit_bullet_list(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn depart_bullet_list(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn visit_list_item(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn depart_list_item(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn visit_reference(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}
    fn depart_reference(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {}

    /// Calls the `visit_*` hook matching the node's tag.
    fn dispatch_visit(&mut self, node: &Node, diagnostics: &mut Diagnostics) {
        match node.tag {
            Tag::Document => self.visit_document(node, diagnostics),
            Tag::Section => self.visit_section(node, diagnostics),
            Tag::Title => self.visit_title(node, diagnostics),
            Tag::Paragraph => self.visit_paragraph(node, diagnostics),
            Tag::LiteralBlock => self.visit_literal_block(node, diagnostics),
            Tag::BulletList => self.visit_bullet_list(node, diagnostics),
            Tag::ListItem => self.visit_list_item(node, diagnostics),
            Tag::Reference => self.visit_reference(node, diagnostics),
            _ => {}
        }
    }

    /// Calls the `depart_*` hook matching the node's tag.
    fn dispatch_departure(&mut self, node: &Node, diagnostics: &mut Diagnostics) {
        match node.tag {
            Tag::Document => self.depart_document(node, diagnostics),
            Tag::Section => self.depart_section(node, diagnostics),
            Tag::Title => self.depart_title(node, diagnostics),
            Tag::Paragraph => self.depart_paragraph(node, diagnostics),
            Tag::LiteralBlock => self.depart_literal_block(node, diagnostics),
            Tag::BulletList => self.depart_bullet_list(node, diagnostics),
            Tag::ListItem => self.depart_list_item(node, diagnostics),
            Tag::Reference => self.depart_reference(node, diagnostics),
            _ => {}
        }
    }

    /// Returns whether the document passed. Only meaningful after a full walk.
    fn result(&self, diagnostics: &mut Diagnostics) -> bool;
}

/// Walks the subtree rooted at `node`: visit, children, depart.
pub fn walkabout(node: &Node, checker: &mut dyn Checker, diagnostics: &mut Diagnostics) {
    checker.dispatch_visit(node, diagnostics);
    for child in &node.children {
        walkabout(child, checker, diagnostics);
    }
    checker.dispatch_departure(node, diagnostics);
}

/// Builds a fresh checker for a document.
pub type CheckerFactory = Arc<dyn Fn(&Document) -> Box<dyn Checker> + Send + Sync>;

/// Outcome of checking one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub passed: bool,
    pub diagnostics: Diagnostics,
}

/// Walks `document` with `checker` and reads its result.
pub fn run_checker(checker: &mut dyn Checker, document: &Document) -> CheckReport {
    debug!("Running check: {} on {}", checker.name(), document.source());
    let mut diagnostics = Diagnostics::new(document.source());
    walkabout(document.root(), checker, &mut diagnostics);
    let passed = checker.result(&mut diagnostics);
    debug!(
        "Check {} {} with {} diagnostic(s)",
        checker.name(),
        if passed { "passed" } else { "failed" },
        diagnostics.len()
    );
    CheckReport {
        passed,
        diagnostics,
    }
}

/// Builds a checker with `factory` and runs it over `document`.
pub fn check_document(factory: &CheckerFactory, document: &Document) -> CheckReport {
    let mut checker = factory(document);
    run_checker(checker.as_mut(), document)
}

/// The built-in checkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckerKind {
    Title,
    Parameters,
    CodeExample,
    DeadLink,
}

impl CheckerKind {
    /// Returns the name used on the command line and in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            CheckerKind::Title => "title",
            CheckerKind::Parameters => "parameters",
            CheckerKind::CodeExample => "code-example",
            CheckerKind::DeadLink => "dead-link",
        }
    }

    /// All built-in checkers in their default order.
    pub fn all() -> Vec<CheckerKind> {
        vec![
            CheckerKind::Title,
            CheckerKind::Parameters,
            CheckerKind::CodeExample,
            CheckerKind::DeadLink,
        ]
    }

    /// Returns a factory building this checker.
    pub fn factory(self, config: Arc<CheckConfig>, probe: Arc<LinkProbe>) -> CheckerFactory {
        match self {
            CheckerKind::Title => Arc::new(move |_: &Document| -> Box<dyn Checker> {
                Box::new(TitleChecker::new(config.clone()))
            }),
            CheckerKind::Parameters => Arc::new(move |_: &Document| -> Box<dyn Checker> {
                Box::new(ParametersChecker::new(config.clone()))
            }),
            CheckerKind::CodeExample => Arc::new(move |_: &Document| -> Box<dyn Checker> {
                Box::new(CodeExampleChecker::new(config.clone()))
            }),
            CheckerKind::DeadLink => Arc::new(move |document: &Document| -> Box<dyn Checker> {
                Box::new(DeadLinkChecker::new(
                    document.source_path(),
                    config.clone(),
                    probe.clone(),
                ))
            }),
        }
    }
}

impl fmt::Display for CheckerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a checker name is not known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown checker '{0}' (expected one of: title, parameters, code-example, dead-link)")]
pub struct UnknownCheckerError(pub String);

impl FromStr for CheckerKind {
    type Err = UnknownCheckerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckerKind::all()
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| UnknownCheckerError(s.to_string()))
    }
}

/// Builds a chained checker factory running `kinds` in order.
pub fn chain_factory(
    kinds: &[CheckerKind],
    abort_on_failure: bool,
    config: Arc<CheckConfig>,
    probe: Arc<LinkProbe>,
) -> CheckerFactory {
    kinds
        .iter()
        .fold(
            ChainedCheckerBuilder::new().abort_on_failure(abort_on_failure),
            |builder, kind| builder.with_checker(kind.factory(config.clone(), probe.clone())),
        )
        .build()
}
