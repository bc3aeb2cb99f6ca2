//! Error types for reStructuredText parsing.
//!
//! Only structural problems that leave no sensible tree are errors; everything
//! else is recorded as a system message node in the document.

use thiserror::Error;

/// A fatal error that aborts parsing of a document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A section title uses an adornment style out of sequence.
    #[error("line {line}: title level inconsistent: {title}")]
    InconsistentTitleLevel {
        /// The line number of the title text (1-based).
        line: usize,
        /// The offending title.
        title: String,
    },

    /// A section title appears inside a nested body element.
    #[error("line {line}: unexpected section title: {title}")]
    UnexpectedSectionTitle {
        /// The line number of the title text (1-based).
        line: usize,
        /// The offending title.
        title: String,
    },

    /// An overline is not followed by a title and a matching underline.
    #[error("line {line}: missing matching underline for section title overline")]
    MissingUnderline {
        /// The line number of the overline (1-based).
        line: usize,
    },

    /// Overline and underline of a title differ.
    #[error("line {line}: title overline and underline mismatch")]
    AdornmentMismatch {
        /// The line number of the overline (1-based).
        line: usize,
    },
}

impl ParseError {
    /// Returns the line number where this error occurred.
    pub fn line(&self) -> usize {
        match self {
            ParseError::InconsistentTitleLevel { line, .. } => *line,
            ParseError::UnexpectedSectionTitle { line, .. } => *line,
            ParseError::MissingUnderline { line } => *line,
            ParseError::AdornmentMismatch { line } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_inconsistent_title_level() {
        let error = ParseError::InconsistentTitleLevel {
            line: 7,
            title: "Deep".to_string(),
        };
        assert_eq!(error.line(), 7);
        assert!(error.to_string().contains("title level inconsistent"));
        assert!(error.to_string().contains("Deep"));
    }

    #[test]
    fn parse_error_missing_underline() {
        let error = ParseError::MissingUnderline { line: 3 };
        assert_eq!(error.line(), 3);
        assert_eq!(
            error.to_string(),
            "line 3: missing matching underline for section title overline"
        );
    }
}
