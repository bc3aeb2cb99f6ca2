//! Names of Sphinx directives and roles that plain reStructuredText does not know.
//!
//! Lists are taken from the Sphinx reference pages for base markup, domains
//! and the autodoc extension. Duplicates are harmless since registration is
//! idempotent.

/// Directives from the Sphinx markup reference.
pub const SPHINX_BASE_DIRECTIVES: &[&str] = &[
    "toctree",
    "note",
    "warning",
    "versionadded",
    "versionchanged",
    "deprecated",
    "seealso",
    "rubric",
    "centered",
    "hlist",
    "highlight",
    "code-block",
    "literalinclude",
    "glossary",
    "sectionauthor",
    "codeauthor",
    "index",
    "only",
    "tabularcolumns",
    "math",
    "productionlist",
];

/// Directives from the Sphinx domains reference.
pub const SPHINX_DOMAIN_DIRECTIVES: &[&str] = &[
    "default-domain",
    "py:module",
    "py:currentmodule",
    "py:function",
    "py:data",
    "py:exception",
    "py:class",
    "py:attribute",
    "py:property",
    "py:method",
    "py:staticmethod",
    "py:classmethod",
    "py:decorator",
    "py:decoratormethod",
    "c:member",
    "c:var",
    "c:function",
    "c:macro",
    "c:struct",
    "c:union",
    "c:enum",
    "c:enumerator",
    "c:type",
    "c:alias",
    "c:namespace",
    "c:namespace-push",
    "c:namespace-pop",
    "cpp:class",
    "cpp:struct",
    "cpp:function",
    "cpp:member",
    "cpp:var",
    "cpp:type",
    "cpp:enum",
    "cpp:enum-struct",
    "cpp:enum-class",
    "cpp:enumerator",
    "cpp:union",
    "cpp:concept",
    "cpp:alias",
    "cpp:namespace",
    "cpp:namespace-push",
    "cpp:namespace-pop",
    "option",
    "envvar",
    "program",
    "describe",
    "object",
    "js:module",
    "js:function",
    "js:method",
    "js:class",
    "js:data",
    "js:attribute",
    "rst:directive",
    "rst:directive:option",
    "rst:role",
];

/// Directives from `sphinx.ext.autodoc`.
pub const SPHINX_EXT_AUTODOC_DIRECTIVES: &[&str] = &[
    "automodule",
    "autoclass",
    "autoexception",
    "autofunction",
    "autodecorator",
    "autodata",
    "automethod",
    "autoattribute",
    "autoproperty",
];

/// Roles from the Sphinx markup reference.
pub const SPHINX_BASE_ROLES: &[&str] = &[
    "any",
    "ref",
    "doc",
    "download",
    "numref",
    "envvar",
    "token",
    "keyword",
    "option",
    "term",
    "code",
    "math",
    "eq",
    "abbr",
    "command",
    "dfn",
    "file",
    "guilabel",
    "kbd",
    "mailheader",
    "makevar",
    "manpage",
    "menuselection",
    "mimetype",
    "newsgroup",
    "program",
    "regexp",
    "samp",
    "pep",
    "rfc",
    "index",
];

/// Roles from the Sphinx domains reference.
pub const SPHINX_DOMAIN_ROLES: &[&str] = &[
    "py:mod",
    "py:func",
    "py:data",
    "py:const",
    "py:class",
    "py:meth",
    "py:attr",
    "py:exc",
    "py:obj",
    "c:member",
    "c:data",
    "c:var",
    "c:func",
    "c:macro",
    "c:struct",
    "c:union",
    "c:enum",
    "c:enumerator",
    "c:type",
    "c:expr",
    "c:texpr",
    "cpp:expr",
    "cpp:texpr",
    "cpp:any",
    "cpp:class",
    "cpp:struct",
    "cpp:func",
    "cpp:member",
    "cpp:var",
    "cpp:type",
    "cpp:concept",
    "cpp:enum",
    "cpp:enumerator",
    "js:mod",
    "js:func",
    "js:meth",
    "js:class",
    "js:data",
    "js:attr",
    "rst:dir",
    "rst:role",
    "math:numref",
];

/// All catalog directive names, in registration order.
pub fn directive_names() -> impl Iterator<Item = &'static str> {
    SPHINX_BASE_DIRECTIVES
        .iter()
        .chain(SPHINX_DOMAIN_DIRECTIVES)
        .chain(SPHINX_EXT_AUTODOC_DIRECTIVES)
        .copied()
}

/// All catalog role names, in registration order.
pub fn role_names() -> impl Iterator<Item = &'static str> {
    SPHINX_BASE_ROLES
        .iter()
        .chain(SPHINX_DOMAIN_ROLES)
        .copied()
}
