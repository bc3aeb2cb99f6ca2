//! Error types for API document checks.
//!
//! Every rule violation is a [`ValidationError`]. Checkers report them into a
//! [`Diagnostics`] collection together with the document source and the name
//! of the checker that found them.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A rule violation found in an API reference document.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationError {
    /// The document has no section titles at all.
    #[error("No titles found.")]
    NoTitles,

    /// The document has no top-level title.
    #[error("No h1 title found.")]
    NoH1Title,

    /// The document has more than one top-level title.
    #[error("More than one h1 title found.")]
    MultipleH1Titles {
        /// All top-level titles, in document order.
        titles: Vec<String>,
    },

    /// The top-level title is not an identifier.
    #[error("Invalid h1 title ({title}) found.")]
    InvalidH1Title {
        /// The offending title.
        title: String,
    },

    /// The document has no second-level titles.
    #[error("No h2 title found.")]
    NoH2Title,

    /// A second-level title is not one of the allowed headings.
    #[error("Invalid h2 title ({title}) found. Allowed titles: {allowed:?}")]
    InvalidH2Title {
        /// The offending title.
        title: String,
        /// The allowed second-level titles.
        allowed: Vec<String>,
    },

    /// A required second-level title is missing.
    #[error("Required h2 title ({title}) not found.")]
    MissingH2Title {
        /// The missing title.
        title: String,
    },

    /// More than one declaration directive in one document.
    #[error("Found multiple API declarations.")]
    MultipleDeclarations {
        /// The line of the second declaration (1-based).
        line: Option<usize>,
    },

    /// The declaration directive does not hold a valid signature.
    #[error("Invalid API declaration. Got {declaration}.")]
    InvalidDeclaration {
        /// The line of the declaration directive (1-based).
        line: Option<usize>,
        /// The text that failed to parse.
        declaration: String,
    },

    /// A parameter list was found before any declaration.
    #[error("Found a parameter list but no API declaration.")]
    MissingDeclaration {
        /// The line of the parameter list (1-based).
        line: Option<usize>,
    },

    /// A parameter list item does not start with a paragraph.
    #[error("Expected a paragraph, but got {found}.")]
    ExpectedParagraph {
        /// The line of the list item (1-based).
        line: Option<usize>,
        /// The tag that was found instead.
        found: String,
    },

    /// A parameter description does not start with a strong parameter name.
    #[error("Expected a strong, but got {found}.")]
    ExpectedStrong {
        /// The line of the list item (1-based).
        line: Option<usize>,
        /// The tag that was found instead.
        found: String,
    },

    /// A documented parameter name is not an identifier.
    #[error("Parameter name must be a valid identifier. Got {name}.")]
    InvalidParameterName {
        /// The line of the list item (1-based).
        line: Option<usize>,
        /// The offending name, without star prefixes.
        name: String,
    },

    /// Nothing follows the parameter name.
    #[error("Expected a content after parameter name.")]
    MissingParameterContent {
        /// The line of the list item (1-based).
        line: Option<usize>,
    },

    /// The text after the parameter name does not start with a type annotation.
    #[error("Expected a valid parameter type. Got {text}.")]
    InvalidParameterType {
        /// The line of the list item (1-based).
        line: Option<usize>,
        /// The text that should start with the type annotation.
        text: String,
    },

    /// Declared and documented parameter counts differ.
    #[error("Expected {expected} parameters, but got {found}.")]
    ParameterCountMismatch {
        /// The line of the parameter list (1-based).
        line: Option<usize>,
        /// Number of declared parameters.
        expected: usize,
        /// Number of documented parameters.
        found: usize,
    },

    /// A documented parameter name differs from the declaration.
    #[error("Expected parameter {index} name {expected}, but got {found}.")]
    ParameterNameMismatch {
        /// The line of the parameter list (1-based).
        line: Option<usize>,
        /// Position of the parameter (1-based).
        index: usize,
        /// Declared name.
        expected: String,
        /// Documented name.
        found: String,
    },

    /// A documented optional flag differs from the declaration.
    #[error("Expected parameter {index} ({name}) optional {expected}, but got {found}.")]
    ParameterOptionalMismatch {
        /// The line of the parameter list (1-based).
        line: Option<usize>,
        /// Position of the parameter (1-based).
        index: usize,
        /// Declared name.
        name: String,
        /// Declared optional flag.
        expected: bool,
        /// Documented optional flag.
        found: bool,
    },

    /// A raw code block inside the code example section.
    #[error("Found a code block in the code example section. Please use `COPY-FROM` instead.")]
    CodeBlockInExample {
        /// The line of the code block (1-based).
        line: Option<usize>,
    },

    /// A copy reference that does not follow the expected format.
    #[error("Invalid `COPY-FROM` format. Please use `COPY-FROM: <full_API_path>`. Got {text}.")]
    InvalidCopyFrom {
        /// The line of the paragraph (1-based).
        line: Option<usize>,
        /// The offending paragraph text.
        text: String,
    },

    /// An HTTP(S) link that did not answer successfully.
    #[error("Dead http link: {link}")]
    DeadHttpLink {
        /// The line of the reference (1-based).
        line: Option<usize>,
        /// The link target.
        link: String,
    },

    /// A link to an absolute filesystem path.
    #[error("Found absolute file link: {link}")]
    AbsoluteFileLink {
        /// The line of the reference (1-based).
        line: Option<usize>,
        /// The link target.
        link: String,
    },

    /// A relative link to a file that does not exist.
    #[error("Dead file link: {link}")]
    DeadFileLink {
        /// The line of the reference (1-based).
        line: Option<usize>,
        /// The link target.
        link: String,
    },
}

impl ValidationError {
    /// Creates an invalid declaration error.
    pub fn invalid_declaration(declaration: impl Into<String>, line: Option<usize>) -> Self {
        Self::InvalidDeclaration {
            line,
            declaration: declaration.into(),
        }
    }

    /// Creates an invalid parameter type error.
    pub fn invalid_parameter_type(text: impl Into<String>, line: Option<usize>) -> Self {
        Self::InvalidParameterType {
            line,
            text: text.into(),
        }
    }

    /// Creates an invalid copy reference error.
    pub fn invalid_copy_from(text: impl Into<String>, line: Option<usize>) -> Self {
        Self::InvalidCopyFrom {
            line,
            text: text.into(),
        }
    }

    /// Creates a dead HTTP link error.
    pub fn dead_http_link(link: impl Into<String>, line: Option<usize>) -> Self {
        Self::DeadHttpLink {
            line,
            link: link.into(),
        }
    }

    /// Creates an absolute file link error.
    pub fn absolute_file_link(link: impl Into<String>, line: Option<usize>) -> Self {
        Self::AbsoluteFileLink {
            line,
            link: link.into(),
        }
    }

    /// Creates a dead file link error.
    pub fn dead_file_link(link: impl Into<String>, line: Option<usize>) -> Self {
        Self::DeadFileLink {
            line,
            link: link.into(),
        }
    }

    /// Returns the line number where this error occurred, if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            ValidationError::NoTitles
            | ValidationError::NoH1Title
            | ValidationError::MultipleH1Titles { .. }
            | ValidationError::InvalidH1Title { .. }
            | ValidationError::NoH2Title
            | ValidationError::InvalidH2Title { .. }
            | ValidationError::MissingH2Title { .. } => None,
            ValidationError::MultipleDeclarations { line }
            | ValidationError::InvalidDeclaration { line, .. }
            | ValidationError::MissingDeclaration { line }
            | ValidationError::ExpectedParagraph { line, .. }
            | ValidationError::ExpectedStrong { line, .. }
            | ValidationError::InvalidParameterName { line, .. }
            | ValidationError::MissingParameterContent { line }
            | ValidationError::InvalidParameterType { line, .. }
            | ValidationError::ParameterCountMismatch { line, .. }
            | ValidationError::ParameterNameMismatch { line, .. }
            | ValidationError::ParameterOptionalMismatch { line, .. }
            | ValidationError::CodeBlockInExample { line }
            | ValidationError::InvalidCopyFrom { line, .. }
            | ValidationError::DeadHttpLink { line, .. }
            | ValidationError::AbsoluteFileLink { line, .. }
            | ValidationError::DeadFileLink { line, .. } => *line,
        }
    }
}

/// A violation located in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The document source identifier.
    pub source: String,
    /// Name of the checker that reported the violation.
    pub checker: &'static str,
    /// The violation itself.
    #[serde(flatten)]
    pub error: ValidationError,
}

impl Diagnostic {
    /// Returns the line number of the violation, if known.
    pub fn line(&self) -> Option<usize> {
        self.error.line()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line() {
            Some(line) => write!(f, "{}:{}: {}", self.source, line, self.error),
            None => write!(f, "{}: {}", self.source, self.error),
        }
    }
}

/// Diagnostics collected while checking one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    source: String,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection for the given document source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entries: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Records a violation found by `checker`.
    pub fn report(&mut self, checker: &'static str, error: ValidationError) {
        self.entries.push(Diagnostic {
            source: self.source.clone(),
            checker,
            error,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Consumes the collection and returns the diagnostics in report order.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_errors_carry_no_line() {
        let error = ValidationError::MissingH2Title {
            title: "代码示例".to_string(),
        };
        assert_eq!(error.line(), None);
        assert_eq!(error.to_string(), "Required h2 title (代码示例) not found.");
    }

    #[test]
    fn invalid_h2_title_lists_allowed_titles() {
        let error = ValidationError::InvalidH2Title {
            title: "示例".to_string(),
            allowed: vec!["参数".to_string(), "返回".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Invalid h2 title (示例) found. Allowed titles: [\"参数\", \"返回\"]"
        );
    }

    #[test]
    fn optional_mismatch_message() {
        let error = ValidationError::ParameterOptionalMismatch {
            line: Some(12),
            index: 2,
            name: "y".to_string(),
            expected: true,
            found: false,
        };
        assert_eq!(error.line(), Some(12));
        assert_eq!(
            error.to_string(),
            "Expected parameter 2 (y) optional true, but got false."
        );
    }

    #[test]
    fn diagnostic_display_with_and_without_line() {
        let mut diagnostics = Diagnostics::new("docs/add_cn.rst");
        diagnostics.report("dead-link", ValidationError::dead_file_link("../x.rst", Some(7)));
        diagnostics.report("title", ValidationError::NoTitles);

        let lines: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "docs/add_cn.rst:7: Dead file link: ../x.rst".to_string(),
                "docs/add_cn.rst: No titles found.".to_string(),
            ]
        );
    }

    #[test]
    fn diagnostics_keep_report_order() {
        let mut diagnostics = Diagnostics::new("a.rst");
        assert!(diagnostics.is_empty());
        diagnostics.report("title", ValidationError::NoH1Title);
        diagnostics.report("title", ValidationError::NoH2Title);

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.into_vec()[1].error, ValidationError::NoH2Title);
    }

    #[test]
    fn diagnostic_serializes_flat() {
        let mut diagnostics = Diagnostics::new("a.rst");
        diagnostics.report("code-example", ValidationError::CodeBlockInExample { line: Some(3) });
        let json = serde_json::to_value(diagnostics.iter().next().unwrap()).unwrap();
        assert_eq!(json["source"], "a.rst");
        assert_eq!(json["checker"], "code-example");
        assert_eq!(json["type"], "code_block_in_example");
        assert_eq!(json["line"], 3);
    }
}
