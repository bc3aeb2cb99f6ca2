//! reStructuredText parsing.
//!
//! [`Parser`] turns source text into a [`Document`] tree. Sphinx directives and
//! roles that plain reStructuredText does not know are kept as opaque nodes so
//! checkers can read their raw content. Non-fatal problems are recorded as
//! `system_message` nodes; only a broken section structure fails the parse.

mod block;
pub mod catalog;
mod error;
mod grammar;
mod inline;
mod node;
mod report;

pub use error::ParseError;
pub use grammar::{DirectiveKind, Grammar, RoleKind};
pub use inline::normalize_name;
pub use node::{Attributes, Descendants, DirectiveInfo, Document, MessageLevel, Node, Tag};

use block::{BlockParser, Line};
use log::debug;
use report::Reporter;
use std::collections::{HashMap, HashSet};

/// Maximum number of indirect target hops followed when resolving a reference.
const MAX_ALIAS_DEPTH: usize = 16;

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Messages below this level are not kept in the tree.
    pub report_level: MessageLevel,
    /// Tab stops used when expanding tabs.
    pub tab_width: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            report_level: MessageLevel::Error,
            tab_width: 4,
        }
    }
}

impl ParserConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lowest message level kept in the tree.
    pub fn with_report_level(mut self, level: MessageLevel) -> Self {
        self.report_level = level;
        self
    }

    /// Sets the tab width.
    pub fn with_tab_width(mut self, width: usize) -> Self {
        self.tab_width = width.max(1);
        self
    }
}

/// A reStructuredText parser with a fixed directive and role registry.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
    grammar: Grammar,
}

impl Parser {
    /// Creates a parser that knows the Sphinx directive and role catalog.
    pub fn new(config: ParserConfig) -> Self {
        Self::with_grammar(config, Grammar::with_domain_extensions())
    }

    /// Creates a parser with a custom registry.
    pub fn with_grammar(config: ParserConfig, grammar: Grammar) -> Self {
        Self { config, grammar }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Parses `text`; `source` identifies the document in messages and diagnostics.
    pub fn parse(&self, text: &str, source: &str) -> Result<Document, ParseError> {
        debug!("Parsing {}", source);
        let lines = split_lines(text, self.config.tab_width);
        let mut reporter = Reporter::new(source, self.config.report_level);
        let children = BlockParser::new(&self.grammar, &mut reporter).parse_document(&lines)?;

        let mut root = Node::new(Tag::Document, None)
            .with_raw(text)
            .with_children(children);
        mark_duplicate_names(&mut root);
        resolve_references(&mut root);
        Ok(Document::new(source, root))
    }
}

/// Parses `text` with the default configuration.
pub fn parse_rst(text: &str, source: &str) -> Result<Document, ParseError> {
    Parser::default().parse(text, source)
}

fn split_lines(text: &str, tab_width: usize) -> Vec<Line> {
    text.lines()
        .enumerate()
        .map(|(index, line)| Line::new(index + 1, expand_tabs(line, tab_width).trim_end()))
        .collect()
}

fn expand_tabs(line: &str, tab_width: usize) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = tab_width - column % tab_width;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

/// Section names that are used more than once, or that clash with an
/// explicit target, are moved to `dupnames` on every section carrying them.
fn mark_duplicate_names(root: &mut Node) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut explicit: HashSet<String> = HashSet::new();
    for node in root.descendants() {
        match node.tag {
            Tag::Section => {
                for name in &node.attributes.names {
                    *counts.entry(name.clone()).or_default() += 1;
                }
            }
            Tag::Target | Tag::Footnote => explicit.extend(node.attributes.names.iter().cloned()),
            _ => {}
        }
    }

    fn demote(node: &mut Node, counts: &HashMap<String, usize>, explicit: &HashSet<String>) {
        if node.tag == Tag::Section {
            let (dup, keep): (Vec<String>, Vec<String>) = node
                .attributes
                .names
                .drain(..)
                .partition(|name| counts.get(name).is_some_and(|n| *n > 1) || explicit.contains(name));
            node.attributes.names = keep;
            node.attributes.dupnames.extend(dup);
        }
        for child in &mut node.children {
            demote(child, counts, explicit);
        }
    }
    demote(root, &counts, &explicit);
}

#[derive(Debug, Clone)]
enum TargetValue {
    Uri(String),
    Alias(String),
    Internal,
}

fn target_value(node: &Node) -> TargetValue {
    match (&node.attributes.refuri, &node.attributes.refname) {
        (Some(uri), _) => TargetValue::Uri(uri.clone()),
        (None, Some(alias)) => TargetValue::Alias(alias.clone()),
        (None, None) => TargetValue::Internal,
    }
}

/// Follows indirect targets until a URI is found.
fn resolve_alias(value: &TargetValue, named: &HashMap<String, TargetValue>) -> Option<String> {
    let mut current = value.clone();
    for _ in 0..MAX_ALIAS_DEPTH {
        match current {
            TargetValue::Uri(uri) => return Some(uri),
            TargetValue::Internal => return None,
            TargetValue::Alias(name) => current = named.get(&name)?.clone(),
        }
    }
    None
}

/// Fills in `refuri` for references that point at external targets, named
/// or anonymous. References to internal targets and unknown names are left
/// unresolved.
fn resolve_references(root: &mut Node) {
    let mut named: HashMap<String, TargetValue> = HashMap::new();
    let mut anonymous: Vec<TargetValue> = Vec::new();
    for node in root.descendants() {
        if node.tag != Tag::Target {
            continue;
        }
        if node.attributes.anonymous {
            anonymous.push(target_value(node));
        } else {
            for name in &node.attributes.names {
                named.entry(name.clone()).or_insert_with(|| target_value(node));
            }
        }
    }

    fn visit(
        node: &mut Node,
        named: &HashMap<String, TargetValue>,
        anonymous: &mut std::vec::IntoIter<TargetValue>,
    ) {
        if node.tag == Tag::Reference && node.attributes.refuri.is_none() {
            let value = if node.attributes.anonymous {
                anonymous.next()
            } else {
                node.attributes
                    .refname
                    .as_ref()
                    .and_then(|name| named.get(name))
                    .cloned()
            };
            match value.and_then(|value| resolve_alias(&value, named)) {
                Some(uri) => node.attributes.refuri = Some(uri),
                None => debug!(
                    "Unresolved reference {:?} at line {:?}",
                    node.attributes.refname, node.line
                ),
            }
        }
        for child in &mut node.children {
            visit(child, named, anonymous);
        }
    }
    visit(root, &named, &mut anonymous.into_iter());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_with_line_numbers() {
        let doc = parse_rst("Title\n=====\n\nText.\n", "doc.rst").unwrap();
        assert_eq!(doc.source(), "doc.rst");
        let section = &doc.root().children[0];
        assert_eq!(section.tag, Tag::Section);
        assert_eq!(section.line, Some(1));
        assert_eq!(section.children[1].line, Some(4));
    }

    #[test]
    fn tabs_expand_to_tab_stops() {
        assert_eq!(expand_tabs("\tx", 4), "    x");
        assert_eq!(expand_tabs("ab\tx", 4), "ab  x");
        assert_eq!(expand_tabs("ab\tx", 8), "ab      x");
    }

    #[test]
    fn crlf_input_is_accepted() {
        let doc = parse_rst("Title\r\n=====\r\n\r\nText.\r\n", "doc.rst").unwrap();
        assert_eq!(doc.root().children[0].children[1].astext(), "Text.");
    }

    #[test]
    fn duplicate_section_names_become_dupnames() {
        let text = "API\n===\n\n参数\n----\n\nA.\n\n参数\n----\n\nB.\n";
        let doc = parse_rst(text, "doc.rst").unwrap();
        let api = &doc.root().children[0];
        let first = &api.children[1];
        let second = &api.children[2];
        assert!(first.attributes.names.is_empty());
        assert_eq!(first.attributes.dupnames, vec!["参数".to_string()]);
        assert!(second.attributes.names.is_empty());
        assert_eq!(api.attributes.names, vec!["api".to_string()]);
    }

    #[test]
    fn named_and_anonymous_references_resolve() {
        let text = "See `Paddle`_ and `docs <alias_>`_ and `here`__.\n\n\
                    .. _Paddle: https://www.paddlepaddle.org.cn\n\
                    .. _alias: Paddle_\n\
                    .. __: https://anon.example/\n";
        let doc = parse_rst(text, "doc.rst").unwrap();
        let uris: Vec<Option<String>> = doc
            .root()
            .descendants()
            .filter(|node| node.tag == Tag::Reference)
            .map(|node| node.attributes.refuri.clone())
            .collect();
        assert_eq!(
            uris,
            vec![
                Some("https://www.paddlepaddle.org.cn".to_string()),
                Some("https://www.paddlepaddle.org.cn".to_string()),
                Some("https://anon.example/".to_string()),
            ]
        );
    }

    #[test]
    fn unknown_reference_stays_unresolved() {
        let doc = parse_rst("See missing_.\n", "doc.rst").unwrap();
        let reference = doc
            .root()
            .descendants()
            .find(|node| node.tag == Tag::Reference)
            .unwrap();
        assert_eq!(reference.attributes.refname.as_deref(), Some("missing"));
        assert_eq!(reference.attributes.refuri, None);
    }

    #[test]
    fn report_level_controls_kept_messages() {
        let text = "Para::\n\nNo literal here.\n";
        let quiet = parse_rst(text, "doc.rst").unwrap();
        assert!(quiet.root().descendants().all(|n| n.tag != Tag::SystemMessage));

        let verbose = Parser::new(ParserConfig::new().with_report_level(MessageLevel::Warning))
            .parse(text, "doc.rst")
            .unwrap();
        assert!(verbose.root().descendants().any(|n| n.tag == Tag::SystemMessage));
    }
}
