//! Code example section policy.

use super::declaration::is_valid_copy_from;
use super::{CheckConfig, Checker, Diagnostics, ValidationError};
use crate::parse::{Node, normalize_name};
use std::sync::Arc;

/// Rejects raw code blocks in the code example section and validates
/// `COPY-FROM: <full_API_path>` references there.
///
/// Every violation is reported.
#[derive(Debug)]
pub struct CodeExampleChecker {
    config: Arc<CheckConfig>,
    section_name: String,
    sections: Vec<Option<String>>,
    passed: bool,
}

impl CodeExampleChecker {
    pub fn new(config: Arc<CheckConfig>) -> Self {
        Self {
            section_name: normalize_name(&config.code_example_section),
            config,
            sections: Vec::new(),
            passed: true,
        }
    }

    fn in_code_example_section(&self) -> bool {
        self.sections
            .iter()
            .flatten()
            .any(|name| *name == self.section_name)
    }
}

impl Checker for CodeExampleChecker {
    fn name(&self) -> &'static str {
        "code-example"
    }

    fn visit_section(&mut self, node: &Node, _diagnostics: &mut Diagnostics) {
        let name = node
            .attributes
            .names
            .first()
            .or_else(|| node.attributes.dupnames.first())
            .cloned();
        self.sections.push(name);
    }

    fn depart_section(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {
        self.sections.pop();
    }

    fn visit_literal_block(&mut self, node: &Node, diagnostics: &mut Diagnostics) {
        if !self.in_code_example_section() {
            return;
        }
        if node.attributes.directive_name() == Some(self.config.raw_code_directive.as_str()) {
            self.passed = false;
            diagnostics.report(
                self.name(),
                ValidationError::CodeBlockInExample { line: node.line },
            );
        }
    }

    fn visit_paragraph(&mut self, node: &Node, diagnostics: &mut Diagnostics) {
        if !self.in_code_example_section() {
            return;
        }
        let text = &node.raw_source;
        let is_copy_from = text
            .strip_prefix(self.config.copy_from_marker.as_str())
            .is_some_and(|rest| rest.starts_with(':'));
        if is_copy_from && !is_valid_copy_from(text, &self.config.copy_from_marker) {
            self.passed = false;
            diagnostics.report(
                self.name(),
                ValidationError::invalid_copy_from(text.as_str(), node.line),
            );
        }
    }

    fn result(&self, _diagnostics: &mut Diagnostics) -> bool {
        self.passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::run_checker;
    use crate::parse::parse_rst;

    fn check(body: &str) -> (bool, Vec<ValidationError>) {
        let text = format!("add\n====\n\n代码示例\n::::::::::::\n\n{body}");
        let doc = parse_rst(&text, "add_cn.rst").unwrap();
        let mut checker = CodeExampleChecker::new(Arc::new(CheckConfig::default()));
        let report = run_checker(&mut checker, &doc);
        let errors = report.diagnostics.iter().map(|d| d.error.clone()).collect();
        (report.passed, errors)
    }

    #[test]
    fn copy_from_passes() {
        assert_eq!(check("COPY-FROM: mod.sub.func:anchor-1\n"), (true, vec![]));
    }

    #[test]
    fn malformed_copy_from_fails() {
        let (passed, errors) = check("COPY-FROM: mod..func\n");
        assert!(!passed);
        assert_eq!(
            errors,
            vec![ValidationError::InvalidCopyFrom {
                line: Some(7),
                text: "COPY-FROM: mod..func".to_string(),
            }]
        );
    }

    #[test]
    fn code_block_fails() {
        let (passed, errors) = check(".. code-block:: python\n\n    import paddle\n");
        assert!(!passed);
        assert_eq!(errors, vec![ValidationError::CodeBlockInExample { line: Some(7) }]);
    }

    #[test]
    fn every_violation_is_reported() {
        let body = ".. code-block:: python\n\n    import paddle\n\nCOPY-FROM: paddle..add\n\nCOPY-FROM: paddle.add\n";
        let (passed, errors) = check(body);
        assert!(!passed);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn other_sections_are_not_checked() {
        let text = "add\n====\n\n参数\n::::\n\n.. code-block:: python\n\n    x = 1\n\nCOPY-FROM: broken..path\n";
        let doc = parse_rst(text, "add_cn.rst").unwrap();
        let mut checker = CodeExampleChecker::new(Arc::new(CheckConfig::default()));
        assert!(run_checker(&mut checker, &doc).passed);
    }

    #[test]
    fn plain_paragraphs_and_plain_literal_blocks_pass() {
        assert_eq!(check("示例如下::\n\n    import paddle\n\nCOPY-FROMX: not a marker\n"), (true, vec![]));
    }

    #[test]
    fn configured_section_title_is_matched_like_section_names() {
        let text = "f\n====\n\nCode  Example\n-------------\n\n.. code-block:: python\n\n    f(1)\n";
        let doc = parse_rst(text, "f.rst").unwrap();
        let config = CheckConfig::new().with_code_example_section("Code Example");
        let mut checker = CodeExampleChecker::new(Arc::new(config));
        let report = run_checker(&mut checker, &doc);
        assert!(!report.passed);
        assert_eq!(
            report.diagnostics.iter().map(|d| d.error.clone()).collect::<Vec<_>>(),
            vec![ValidationError::CodeBlockInExample { line: Some(7) }]
        );
    }
}
