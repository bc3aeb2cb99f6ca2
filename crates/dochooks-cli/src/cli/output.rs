//! Output formatting for the CLI.
//!
//! This module provides human-readable and JSON output formatters for check results.

use colored::Colorize;
use dochooks_core::check::{CheckReport, Diagnostic};
use dochooks_core::spacing::SpacingIssue;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Printed after `format-cn-en-space` changed files.
pub const FORMAT_ABORT_NOTICE: &str = "\
Snuged en and cn chars have been separated by a space. Now aborting the commit.
You can check the changes made. Then simply \"git add --update .\" and re-commit
If the changes are not correct, please open an issue in https://github.com/ShigureLab/dochooks";

/// The outcome of checking one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    /// The document path.
    pub source: String,
    /// Whether every check passed.
    pub passed: bool,
    /// Why the document could not be checked at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Rule violations, in report order.
    pub diagnostics: Vec<Diagnostic>,
}

impl DocumentResult {
    /// Creates a result from a finished check.
    pub fn from_report(source: impl Into<String>, report: CheckReport) -> Self {
        Self {
            source: source.into(),
            passed: report.passed,
            error: None,
            diagnostics: report.diagnostics.into_vec(),
        }
    }

    /// Creates a result for a document that could not be read or parsed.
    pub fn failed(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            passed: false,
            error: Some(error.into()),
            diagnostics: Vec::new(),
        }
    }
}

/// JSON output format.
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    /// Number of documents checked.
    pub checked: usize,
    /// Number of documents that failed.
    pub failed: usize,
    /// Per-document results, in check order.
    pub documents: &'a [DocumentResult],
}

impl JsonOutput<'_> {
    /// Writes the JSON output to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}

/// Output formatter for human-readable console output.
pub struct HumanOutput<W: Write> {
    writer: W,
    use_colors: bool,
}

impl<W: Write> HumanOutput<W> {
    /// Creates a new human output formatter.
    pub fn new(writer: W, use_colors: bool) -> Self {
        Self { writer, use_colors }
    }

    /// Writes a single diagnostic. The location leads the line and the
    /// checker label trails it.
    pub fn write_diagnostic(&mut self, diagnostic: &Diagnostic) -> std::io::Result<()> {
        let label = format!("[{}]", diagnostic.checker);
        if self.use_colors {
            writeln!(self.writer, "{} {}", diagnostic, label.yellow().bold())?;
        } else {
            writeln!(self.writer, "{} {}", diagnostic, label)?;
        }
        Ok(())
    }

    /// Writes why a document could not be checked.
    pub fn write_document_error(&mut self, source: &str, error: &str) -> std::io::Result<()> {
        if self.use_colors {
            writeln!(self.writer, "{}: {} {}", source, error, "[error]".red().bold())?;
        } else {
            writeln!(self.writer, "{}: {} [error]", source, error)?;
        }
        Ok(())
    }

    /// Writes the result of one document. Passing documents print nothing.
    pub fn write_document(&mut self, result: &DocumentResult) -> std::io::Result<()> {
        if let Some(error) = &result.error {
            self.write_document_error(&result.source, error)?;
        }
        for diagnostic in &result.diagnostics {
            self.write_diagnostic(diagnostic)?;
        }
        Ok(())
    }

    /// Writes a summary of all documents.
    pub fn write_summary(&mut self, checked: usize, failed: usize) -> std::io::Result<()> {
        if failed == 0 {
            let message = format!("✓ {} document(s) passed", checked);
            if self.use_colors {
                writeln!(self.writer, "{}", message.green().bold())?;
            } else {
                writeln!(self.writer, "{}", message)?;
            }
        } else {
            let message = format!("✗ {} of {} document(s) failed", failed, checked);
            if self.use_colors {
                writeln!(self.writer, "{}", message.red().bold())?;
            } else {
                writeln!(self.writer, "{}", message)?;
            }
        }
        Ok(())
    }

    /// Writes a line missing CJK/Latin spacing.
    pub fn write_missing_space(&mut self, path: &Path, issue: &SpacingIssue) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "No spaces between EN and CN chars detected at: {}:{}:\t{}",
            path.display(),
            issue.line,
            issue.text
        )
    }

    /// Writes a line that was reformatted.
    pub fn write_added_space(&mut self, path: &Path, issue: &SpacingIssue) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "Add spaces between EN and CN chars in: {}:{}:\t{}",
            path.display(),
            issue.line,
            issue.text
        )
    }

    /// Writes the notice telling the user the commit was aborted.
    pub fn write_format_notice(&mut self) -> std::io::Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", FORMAT_ABORT_NOTICE)
    }

    /// Writes a startup error.
    pub fn write_error(&mut self, message: &str) -> std::io::Result<()> {
        if self.use_colors {
            writeln!(self.writer, "{} {}", "Error:".red().bold(), message)?;
        } else {
            writeln!(self.writer, "Error: {}", message)?;
        }
        Ok(())
    }
}

/// Collects the results of all checked documents.
#[derive(Debug, Default)]
pub struct DocumentResults {
    documents: Vec<DocumentResult>,
}

impl DocumentResults {
    /// Creates a new empty results collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the result of one document.
    pub fn add(&mut self, result: DocumentResult) {
        self.documents.push(result);
    }

    /// Returns the number of checked documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns the number of failed documents.
    pub fn failed(&self) -> usize {
        self.documents.iter().filter(|d| !d.passed).count()
    }

    /// Iterates over results in order.
    pub fn iter(&self) -> impl Iterator<Item = &DocumentResult> {
        self.documents.iter()
    }

    /// Writes results in human-readable format.
    pub fn write_human<W: Write>(&self, writer: &mut W, use_colors: bool) -> std::io::Result<()> {
        let mut output = HumanOutput::new(writer, use_colors);

        for result in self.iter() {
            output.write_document(result)?;
        }

        output.write_summary(self.len(), self.failed())?;

        Ok(())
    }

    /// Writes results in JSON format.
    pub fn write_json<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        JsonOutput {
            checked: self.len(),
            failed: self.failed(),
            documents: &self.documents,
        }
        .write(writer)
    }
}
