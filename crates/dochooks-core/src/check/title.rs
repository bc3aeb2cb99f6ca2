//! Section heading hierarchy check.

use super::declaration::is_identifier;
use super::{CheckConfig, Checker, Diagnostics, ValidationError};
use crate::parse::{Node, Tag};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Validates that a document has one identifier-like top-level title and
/// only allowed second-level titles, including the required ones.
#[derive(Debug)]
pub struct TitleChecker {
    config: Arc<CheckConfig>,
    depth: usize,
    titles: BTreeMap<usize, Vec<String>>,
}

impl TitleChecker {
    pub fn new(config: Arc<CheckConfig>) -> Self {
        Self {
            config,
            depth: 0,
            titles: BTreeMap::new(),
        }
    }

    /// Section titles collected so far, by depth (1 is the top level).
    pub fn titles(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.titles
    }

    fn evaluate(&self) -> Result<(), ValidationError> {
        if self.titles.is_empty() {
            return Err(ValidationError::NoTitles);
        }

        let h1 = match self.titles.get(&1) {
            Some(titles) if !titles.is_empty() => titles,
            _ => return Err(ValidationError::NoH1Title),
        };
        if h1.len() > 1 {
            return Err(ValidationError::MultipleH1Titles {
                titles: h1.clone(),
            });
        }
        if !is_identifier(&h1[0]) {
            return Err(ValidationError::InvalidH1Title {
                title: h1[0].clone(),
            });
        }

        let h2 = match self.titles.get(&2) {
            Some(titles) if !titles.is_empty() => titles,
            _ => return Err(ValidationError::NoH2Title),
        };
        if let Some(title) = h2
            .iter()
            .find(|title| !self.config.allowed_h2_titles.contains(title))
        {
            return Err(ValidationError::InvalidH2Title {
                title: title.clone(),
                allowed: self.config.allowed_h2_titles.clone(),
            });
        }
        if let Some(required) = self
            .config
            .required_h2_titles
            .iter()
            .find(|required| !h2.contains(required))
        {
            return Err(ValidationError::MissingH2Title {
                title: required.clone(),
            });
        }
        Ok(())
    }
}

impl Checker for TitleChecker {
    fn name(&self) -> &'static str {
        "title"
    }

    fn visit_section(&mut self, node: &Node, _diagnostics: &mut Diagnostics) {
        self.depth += 1;
        // The section title is always the first child.
        if let Some(title) = node.children.first().filter(|child| child.tag == Tag::Title) {
            self.titles
                .entry(self.depth)
                .or_default()
                .push(title.raw_source.clone());
        }
    }

    fn depart_section(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn result(&self, diagnostics: &mut Diagnostics) -> bool {
        match self.evaluate() {
            Ok(()) => true,
            Err(error) => {
                diagnostics.report(self.name(), error);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::run_checker;
    use crate::parse::parse_rst;

    fn check(text: &str) -> (bool, Vec<ValidationError>) {
        let doc = parse_rst(text, "doc.rst").unwrap();
        let mut checker = TitleChecker::new(Arc::new(CheckConfig::default()));
        let report = run_checker(&mut checker, &doc);
        let errors = report.diagnostics.iter().map(|d| d.error.clone()).collect();
        (report.passed, errors)
    }

    fn document(h1: &str, h2: &[&str]) -> String {
        let mut text = format!("{h1}\n{}\n\n", "=".repeat(h1.len().max(4)));
        for title in h2 {
            text.push_str(&format!("{title}\n{}\n\n内容。\n\n", "-".repeat(title.len())));
        }
        text
    }

    #[test]
    fn accepts_complete_document() {
        let text = document("add", &["参数", "返回", "属性", "方法", "代码示例"]);
        assert_eq!(check(&text), (true, vec![]));
    }

    #[test]
    fn accepts_required_titles_only() {
        assert!(check(&document("Linear", &["参数", "代码示例"])).0);
    }

    #[test]
    fn no_titles() {
        assert_eq!(check("Just text.\n"), (false, vec![ValidationError::NoTitles]));
    }

    #[test]
    fn multiple_h1_titles() {
        let text = format!("{}{}", document("add", &["参数"]), document("sub", &["代码示例"]));
        let (passed, errors) = check(&text);
        assert!(!passed);
        assert_eq!(
            errors,
            vec![ValidationError::MultipleH1Titles {
                titles: vec!["add".to_string(), "sub".to_string()]
            }]
        );
    }

    #[test]
    fn invalid_h1_title() {
        let (passed, errors) = check(&document("paddle.add", &["参数", "代码示例"]));
        assert!(!passed);
        assert_eq!(
            errors,
            vec![ValidationError::InvalidH1Title {
                title: "paddle.add".to_string()
            }]
        );
    }

    #[test]
    fn no_h2_title() {
        assert_eq!(
            check(&document("add", &[])),
            (false, vec![ValidationError::NoH2Title])
        );
    }

    #[test]
    fn invalid_h2_title() {
        let (passed, errors) = check(&document("add", &["参数", "说明", "代码示例"]));
        assert!(!passed);
        assert!(matches!(
            &errors[..],
            [ValidationError::InvalidH2Title { title, .. }] if title == "说明"
        ));
    }

    #[test]
    fn missing_required_h2_title() {
        for (present, missing) in [("参数", "代码示例"), ("代码示例", "参数")] {
            let (passed, errors) = check(&document("add", &[present, "返回"]));
            assert!(!passed);
            assert_eq!(
                errors,
                vec![ValidationError::MissingH2Title {
                    title: missing.to_string()
                }]
            );
        }
    }

    #[test]
    fn deeper_titles_are_ignored() {
        let text = "add\n====\n\n参数\n------\n\n细节\n~~~~\n\n内容。\n\n代码示例\n--------\n\n内容。\n";
        assert!(check(text).0);
    }
}
