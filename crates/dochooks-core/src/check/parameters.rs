//! Declaration and parameter list consistency check.
//!
//! The declaration comes from the first content line of a declaration
//! directive (`.. py:function:: paddle.add(x, y, name=None)`). The documented
//! parameters come from the outermost bullet list of the parameters section,
//! one item per parameter:
//!
//! ```rst
//! - **x** (Tensor) - 输入的 Tensor。
//! - **name** (str，可选) - 操作的名称。
//! ```
//!
//! Both are compared by position. Only names and optional flags are compared.

use super::declaration::{ApiDeclaration, ApiParameter, is_identifier, parse_declaration, parse_doc_type};
use super::{CheckConfig, Checker, Diagnostics, ValidationError};
use crate::parse::{Node, Tag, normalize_name};
use log::debug;
use std::sync::Arc;

const UNKNOWN_SECTION: &str = " <Unknown section title> ";

/// Cross-validates the declared API signature against its parameter list.
#[derive(Debug)]
pub struct ParametersChecker {
    config: Arc<CheckConfig>,
    /// `parameters_section` normalized like section names.
    section_name: String,
    sections: Vec<String>,
    list_depth: usize,
    declaration_seen: bool,
    declaration: Option<ApiDeclaration>,
    passed: bool,
}

impl ParametersChecker {
    pub fn new(config: Arc<CheckConfig>) -> Self {
        Self {
            section_name: normalize_name(&config.parameters_section),
            config,
            sections: Vec::new(),
            list_depth: 0,
            declaration_seen: false,
            declaration: None,
            passed: true,
        }
    }

    /// The declaration captured so far.
    pub fn declaration(&self) -> Option<&ApiDeclaration> {
        self.declaration.as_ref()
    }

    fn in_parameters_section(&self) -> bool {
        self.sections
            .iter()
            .any(|name| *name == self.section_name)
    }

    fn fail(&mut self, diagnostics: &mut Diagnostics, error: ValidationError) {
        self.passed = false;
        diagnostics.report(self.name(), error);
    }

    /// Extracts the documented parameter of one list item.
    fn documented_parameter(&self, item: &Node) -> Result<ApiParameter, ValidationError> {
        let line = item.line;
        let paragraph = match item.children.first() {
            Some(child) if child.tag == Tag::Paragraph && !child.children.is_empty() => child,
            other => {
                return Err(ValidationError::ExpectedParagraph {
                    line,
                    found: other.map_or("nothing", |child| child.tag.as_str()).to_string(),
                });
            }
        };

        let first = &paragraph.children[0];
        if first.tag != Tag::Strong {
            return Err(ValidationError::ExpectedStrong {
                line,
                found: first.tag.as_str().to_string(),
            });
        }

        let mut parameter = ApiParameter::default();
        let text = first.astext();
        let mut name = text.as_str();
        if let Some(rest) = name.strip_prefix("**") {
            parameter.is_keyword = true;
            name = rest;
        }
        if let Some(rest) = name.strip_prefix('*') {
            parameter.is_rest = true;
            name = rest;
        }
        if !is_identifier(name) {
            return Err(ValidationError::InvalidParameterName {
                line,
                name: name.to_string(),
            });
        }
        parameter.name = name.to_string();

        let Some(description) = paragraph.children.get(1) else {
            return Err(ValidationError::MissingParameterContent { line });
        };
        let description = description.astext();
        let description = description.trim_start();
        let doc_type = parse_doc_type(description, &self.config.optional_marker)
            .ok_or_else(|| ValidationError::invalid_parameter_type(description, line))?;
        parameter.type_name = Some(doc_type.type_name);
        parameter.optional = doc_type.optional;
        Ok(parameter)
    }

    fn check_parameter_list(&mut self, list: &Node, diagnostics: &mut Diagnostics) {
        let mut documented: Vec<Option<ApiParameter>> = Vec::new();
        for item in list.children.iter().filter(|item| item.tag == Tag::ListItem) {
            match self.documented_parameter(item) {
                Ok(parameter) => documented.push(Some(parameter)),
                Err(error) => {
                    self.fail(diagnostics, error);
                    documented.push(None);
                }
            }
        }

        let line = list.line;
        let Some(declaration) = self.declaration.as_ref() else {
            // An invalid declaration was already reported.
            if !self.declaration_seen {
                self.fail(diagnostics, ValidationError::MissingDeclaration { line });
            }
            return;
        };

        if declaration.parameters.len() != documented.len() {
            let error = ValidationError::ParameterCountMismatch {
                line,
                expected: declaration.parameters.len(),
                found: documented.len(),
            };
            self.fail(diagnostics, error);
            return;
        }

        let mismatch = documented
            .iter()
            .zip(&declaration.parameters)
            .enumerate()
            .filter_map(|(index, (doc, api))| doc.as_ref().map(|doc| (index + 1, doc, api)))
            .find_map(|(index, doc, api)| {
                if doc.name != api.name {
                    Some(ValidationError::ParameterNameMismatch {
                        line,
                        index,
                        expected: api.name.clone(),
                        found: doc.name.clone(),
                    })
                } else if doc.optional != api.optional {
                    Some(ValidationError::ParameterOptionalMismatch {
                        line,
                        index,
                        name: api.name.clone(),
                        expected: api.optional,
                        found: doc.optional,
                    })
                } else {
                    None
                }
            });
        if let Some(error) = mismatch {
            self.fail(diagnostics, error);
        }
    }
}

impl Checker for ParametersChecker {
    fn name(&self) -> &'static str {
        "parameters"
    }

    fn visit_section(&mut self, node: &Node, _diagnostics: &mut Diagnostics) {
        let name = node
            .attributes
            .names
            .first()
            .or_else(|| node.attributes.dupnames.first())
            .map_or(UNKNOWN_SECTION, String::as_str);
        self.sections.push(name.to_string());
    }

    fn depart_section(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {
        self.sections.pop();
    }

    fn visit_literal_block(&mut self, node: &Node, diagnostics: &mut Diagnostics) {
        let Some(directive) = node.attributes.directive_name() else {
            return;
        };
        if !self
            .config
            .declaration_directives
            .iter()
            .any(|name| name == directive)
        {
            return;
        }

        if self.declaration_seen {
            self.fail(diagnostics, ValidationError::MultipleDeclarations { line: node.line });
            return;
        }
        self.declaration_seen = true;

        let text = node
            .attributes
            .content()
            .first()
            .map(String::as_str)
            .unwrap_or_default();
        match parse_declaration(text) {
            Ok(declaration) => {
                debug!(
                    "Found API declaration {} with {} parameter(s)",
                    declaration.name,
                    declaration.parameters.len()
                );
                self.declaration = Some(declaration);
            }
            Err(error) => {
                debug!("Invalid API declaration {:?}: {}", text, error);
                self.fail(diagnostics, ValidationError::invalid_declaration(text, node.line));
            }
        }
    }

    fn visit_bullet_list(&mut self, node: &Node, diagnostics: &mut Diagnostics) {
        self.list_depth += 1;
        if self.list_depth == 1 && self.in_parameters_section() {
            self.check_parameter_list(node, diagnostics);
        }
    }

    fn depart_bullet_list(&mut self, _node: &Node, _diagnostics: &mut Diagnostics) {
        self.list_depth = self.list_depth.saturating_sub(1);
    }

    fn result(&self, _diagnostics: &mut Diagnostics) -> bool {
        self.passed
    }
}
