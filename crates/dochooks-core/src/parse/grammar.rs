//! Directive and role registries.
//!
//! A [`Grammar`] maps directive and role names to the way the parser renders
//! them. [`Grammar::base`] knows plain reStructuredText; domain names from the
//! Sphinx catalog are added with [`Grammar::register_domain_extensions`] and
//! rendered as opaque nodes that checkers can inspect.

use super::catalog;
use super::node::Tag;
use log::trace;
use std::collections::HashMap;

/// How a directive is turned into nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Body parsed as nested blocks inside an admonition node. Titled
    /// admonitions take their title from the directive argument.
    Admonition { titled: bool },
    /// Body parsed as nested blocks inside a container node.
    Container,
    /// Body kept verbatim in a node of the given tag.
    Verbatim(Tag),
    /// Argument parsed as inline text inside a rubric node.
    Rubric,
    /// Argument taken as the image URI; figures parse their body as a caption.
    Image { figure: bool },
    /// Kept as an unparsed table node.
    Table,
    /// Produces no nodes.
    Silent,
    /// Rendered as a literal block carrying the directive name and raw content.
    Opaque,
}

/// How an interpreted-text role is turned into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    /// An inline element of the given tag holding the role text.
    Inline(Tag),
    /// Rendered as a literal carrying the role name.
    Opaque,
}

const ADMONITIONS: &[&str] = &[
    "attention",
    "caution",
    "danger",
    "error",
    "hint",
    "important",
    "note",
    "tip",
    "warning",
];

const SILENT_DIRECTIVES: &[&str] = &[
    "contents",
    "sectnum",
    "section-numbering",
    "header",
    "footer",
    "meta",
    "include",
    "replace",
    "unicode",
    "date",
    "class",
    "role",
    "default-role",
    "title",
    "target-notes",
];

/// Directive and role registry used by the parser.
#[derive(Debug, Clone)]
pub struct Grammar {
    directives: HashMap<String, DirectiveKind>,
    roles: HashMap<String, RoleKind>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::with_domain_extensions()
    }
}

impl Grammar {
    /// Creates a registry that knows only plain reStructuredText.
    pub fn base() -> Self {
        let mut directives = HashMap::new();
        for name in ADMONITIONS {
            directives.insert(name.to_string(), DirectiveKind::Admonition { titled: false });
        }
        for name in ["admonition", "topic", "sidebar"] {
            directives.insert(name.to_string(), DirectiveKind::Admonition { titled: true });
        }
        for name in ["container", "compound", "epigraph", "highlights", "pull-quote"] {
            directives.insert(name.to_string(), DirectiveKind::Container);
        }
        for name in ["code", "parsed-literal", "raw"] {
            directives.insert(name.to_string(), DirectiveKind::Verbatim(Tag::LiteralBlock));
        }
        directives.insert("math".to_string(), DirectiveKind::Verbatim(Tag::MathBlock));
        directives.insert("rubric".to_string(), DirectiveKind::Rubric);
        directives.insert("image".to_string(), DirectiveKind::Image { figure: false });
        directives.insert("figure".to_string(), DirectiveKind::Image { figure: true });
        for name in ["table", "csv-table", "list-table"] {
            directives.insert(name.to_string(), DirectiveKind::Table);
        }
        for name in SILENT_DIRECTIVES {
            directives.insert(name.to_string(), DirectiveKind::Silent);
        }

        let mut roles = HashMap::new();
        let inline_roles = [
            ("emphasis", Tag::Emphasis),
            ("strong", Tag::Strong),
            ("literal", Tag::Literal),
            ("code", Tag::Literal),
            ("math", Tag::Math),
            ("subscript", Tag::Subscript),
            ("sub", Tag::Subscript),
            ("superscript", Tag::Superscript),
            ("sup", Tag::Superscript),
            ("title-reference", Tag::TitleReference),
            ("title", Tag::TitleReference),
            ("t", Tag::TitleReference),
            ("abbreviation", Tag::Abbreviation),
            ("ab", Tag::Abbreviation),
            ("acronym", Tag::Abbreviation),
            ("ac", Tag::Abbreviation),
        ];
        for (name, tag) in inline_roles {
            roles.insert(name.to_string(), RoleKind::Inline(tag));
        }

        Self { directives, roles }
    }

    /// Creates a registry with the Sphinx catalog registered on top of the base.
    pub fn with_domain_extensions() -> Self {
        let mut grammar = Self::base();
        grammar.register_domain_extensions();
        grammar
    }

    /// Registers an opaque handler for every catalog name not yet known.
    ///
    /// Returns the number of names that were newly registered, so a second
    /// call on the same registry returns zero.
    pub fn register_domain_extensions(&mut self) -> usize {
        let mut added = 0;
        for name in catalog::directive_names() {
            if self.register_directive(name, DirectiveKind::Opaque) {
                added += 1;
            }
        }
        for name in catalog::role_names() {
            if self.register_role(name, RoleKind::Opaque) {
                added += 1;
            }
        }
        trace!("Registered {} domain directive and role names", added);
        added
    }

    /// Registers a directive unless the name is already known.
    ///
    /// Returns false when the name was already registered.
    pub fn register_directive(&mut self, name: &str, kind: DirectiveKind) -> bool {
        let key = name.to_lowercase();
        if self.directives.contains_key(&key) {
            return false;
        }
        self.directives.insert(key, kind);
        true
    }

    /// Registers a role unless the name is already known.
    ///
    /// Returns false when the name was already registered.
    pub fn register_role(&mut self, name: &str, kind: RoleKind) -> bool {
        let key = name.to_lowercase();
        if self.roles.contains_key(&key) {
            return false;
        }
        self.roles.insert(key, kind);
        true
    }

    /// Looks up a directive by name (case-insensitive).
    pub fn directive(&self, name: &str) -> Option<DirectiveKind> {
        self.directives.get(&name.to_lowercase()).copied()
    }

    /// Looks up a role by name (case-insensitive).
    pub fn role(&self, name: &str) -> Option<RoleKind> {
        self.roles.get(&name.to_lowercase()).copied()
    }
}
