//! Document tree types.
//!
//! The parser produces a [`Document`] whose root is a [`Node`] tagged
//! [`Tag::Document`]. Node kinds and their names follow the docutils
//! doctree so diagnostics read the same way reStructuredText tooling does.

use std::fmt;
use std::path::Path;

/// The kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Document,
    Section,
    Title,
    Paragraph,
    Text,
    Strong,
    Emphasis,
    Literal,
    Reference,
    Target,
    FootnoteReference,
    SubstitutionReference,
    TitleReference,
    Subscript,
    Superscript,
    Abbreviation,
    Math,
    Problematic,
    LiteralBlock,
    MathBlock,
    BulletList,
    EnumeratedList,
    ListItem,
    DefinitionList,
    DefinitionListItem,
    Term,
    Definition,
    FieldList,
    Field,
    FieldName,
    FieldBody,
    LineBlock,
    Line,
    BlockQuote,
    Admonition,
    Container,
    Rubric,
    Image,
    Table,
    Footnote,
    SubstitutionDefinition,
    Comment,
    Transition,
    SystemMessage,
}

impl Tag {
    /// Returns the doctree name of this tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Document => "document",
            Tag::Section => "section",
            Tag::Title => "title",
            Tag::Paragraph => "paragraph",
            Tag::Text => "#text",
            Tag::Strong => "strong",
            Tag::Emphasis => "emphasis",
            Tag::Literal => "literal",
            Tag::Reference => "reference",
            Tag::Target => "target",
            Tag::FootnoteReference => "footnote_reference",
            Tag::SubstitutionReference => "substitution_reference",
            Tag::TitleReference => "title_reference",
            Tag::Subscript => "subscript",
            Tag::Superscript => "superscript",
            Tag::Abbreviation => "abbreviation",
            Tag::Math => "math",
            Tag::Problematic => "problematic",
            Tag::LiteralBlock => "literal_block",
            Tag::MathBlock => "math_block",
            Tag::BulletList => "bullet_list",
            Tag::EnumeratedList => "enumerated_list",
            Tag::ListItem => "list_item",
            Tag::DefinitionList => "definition_list",
            Tag::DefinitionListItem => "definition_list_item",
            Tag::Term => "term",
            Tag::Definition => "definition",
            Tag::FieldList => "field_list",
            Tag::Field => "field",
            Tag::FieldName => "field_name",
            Tag::FieldBody => "field_body",
            Tag::LineBlock => "line_block",
            Tag::Line => "line",
            Tag::BlockQuote => "block_quote",
            Tag::Admonition => "admonition",
            Tag::Container => "container",
            Tag::Rubric => "rubric",
            Tag::Image => "image",
            Tag::Table => "table",
            Tag::Footnote => "footnote",
            Tag::SubstitutionDefinition => "substitution_definition",
            Tag::Comment => "comment",
            Tag::Transition => "transition",
            Tag::SystemMessage => "system_message",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a parser system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageLevel {
    Info = 1,
    Warning = 2,
    Error = 3,
    Severe = 4,
}

impl MessageLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageLevel::Info => "INFO",
            MessageLevel::Warning => "WARNING",
            MessageLevel::Error => "ERROR",
            MessageLevel::Severe => "SEVERE",
        }
    }
}

/// Metadata recorded for a directive rendered as an opaque node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveInfo {
    /// The directive name as written, lowercased.
    pub name: String,
    /// Raw content lines; the text after `::` is the first line.
    pub content: Vec<String>,
}

/// Kind-dependent node attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    /// Normalized reference names of the node (sections, targets).
    pub names: Vec<String>,
    /// Names that were dropped because another node claimed them too.
    pub dupnames: Vec<String>,
    pub classes: Vec<String>,
    /// Resolved URI of a reference or target.
    pub refuri: Option<String>,
    /// Normalized target name a reference points to.
    pub refname: Option<String>,
    /// Set for anonymous references and targets (`__`).
    pub anonymous: bool,
    /// Present when the node stands for a domain directive.
    pub directive: Option<DirectiveInfo>,
    /// Present when the node stands for a domain role.
    pub role_name: Option<String>,
    /// Present on system messages.
    pub level: Option<MessageLevel>,
}

impl Attributes {
    /// Returns true when the node was produced by a domain directive stub.
    pub fn is_directive(&self) -> bool {
        self.directive.is_some()
    }

    /// Returns the directive name when the node stands for a directive.
    pub fn directive_name(&self) -> Option<&str> {
        self.directive.as_ref().map(|d| d.name.as_str())
    }

    /// Returns the raw directive content lines, empty for other nodes.
    pub fn content(&self) -> &[String] {
        self.directive
            .as_ref()
            .map(|d| d.content.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true when the node was produced by a domain role stub.
    pub fn is_role(&self) -> bool {
        self.role_name.is_some()
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub tag: Tag,
    /// 1-based source line, when known.
    pub line: Option<usize>,
    /// Verbatim source text the node was built from.
    pub raw_source: String,
    /// Text payload; only meaningful for [`Tag::Text`].
    pub text: String,
    pub children: Vec<Node>,
    pub attributes: Attributes,
}

impl Node {
    /// Creates an empty element node.
    pub fn new(tag: Tag, line: Option<usize>) -> Self {
        Self {
            tag,
            line,
            raw_source: String::new(),
            text: String::new(),
            children: Vec::new(),
            attributes: Attributes::default(),
        }
    }

    /// Creates a text leaf.
    pub fn text(text: impl Into<String>, line: Option<usize>) -> Self {
        let text = text.into();
        Self {
            tag: Tag::Text,
            line,
            raw_source: text.clone(),
            text,
            children: Vec::new(),
            attributes: Attributes::default(),
        }
    }

    /// Creates an element holding a single text child.
    pub fn with_text(tag: Tag, line: Option<usize>, raw: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::new(tag, line).with_raw(raw);
        node.children.push(Node::text(text, line));
        node
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw_source = raw.into();
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Returns the concatenated text of this subtree.
    pub fn astext(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self.tag {
            Tag::Text => out.push_str(&self.text),
            // Paragraph-level children of body elements are separated by blank lines.
            Tag::Document
            | Tag::Section
            | Tag::BulletList
            | Tag::EnumeratedList
            | Tag::ListItem
            | Tag::BlockQuote
            | Tag::Admonition
            | Tag::Container
            | Tag::Definition
            | Tag::FieldBody
            | Tag::Footnote => {
                for (index, child) in self.children.iter().enumerate() {
                    if index > 0 {
                        out.push_str("\n\n");
                    }
                    child.collect_text(out);
                }
            }
            _ => {
                for child in &self.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Iterates over this node and all descendants in pre-order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A parsed document: the tree root plus the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    source: String,
    root: Node,
}

impl Document {
    pub(crate) fn new(source: impl Into<String>, root: Node) -> Self {
        Self {
            source: source.into(),
            root,
        }
    }

    /// The source identifier used in diagnostics and for resolving relative links.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The source identifier as a path.
    pub fn source_path(&self) -> &Path {
        Path::new(&self.source)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }
}
