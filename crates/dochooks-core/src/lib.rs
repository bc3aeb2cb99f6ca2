//! dochooks core
//!
//! A library for parsing reStructuredText API reference documents and
//! checking them against a documentation house style.
//!
//! # Features
//!
//! - **Parser**: Parse reStructuredText into a node tree, with opaque stubs
//!   for Sphinx directives and roles so domain markup never aborts parsing
//! - **Checkers**: Visitor-based checks for section titles, declaration and
//!   parameter list consistency, code examples and dead links
//! - **Chaining**: Run several checkers over one traversal
//! - **Collaborators**: CJK/Latin spacing and filename case conflicts
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use dochooks_core::check::{CheckConfig, CheckerKind, LinkProbe, chain_factory, check_document};
//! use dochooks_core::parse::parse_rst;
//!
//! let input = "\
//! add
//! ---
//!
//! .. py:function:: paddle.add(x, name=None)
//!
//! 参数
//! ::::
//!
//!     - **x** (Tensor) - 输入的 Tensor。
//!     - **name** (str，可选) - 操作的名称。
//!
//! 代码示例
//! ::::::::
//!
//! COPY-FROM: paddle.add
//! ";
//!
//! let document = parse_rst(input, "docs/api/paddle/add_cn.rst").unwrap();
//! let factory = chain_factory(
//!     &[CheckerKind::Title, CheckerKind::Parameters, CheckerKind::CodeExample],
//!     false,
//!     Arc::new(CheckConfig::default()),
//!     Arc::new(LinkProbe::offline()),
//! );
//!
//! let report = check_document(&factory, &document);
//! for diagnostic in &report.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! assert!(report.passed);
//! ```
//!
//! # Modules
//!
//! - [`parse`]: reStructuredText parser and node tree
//! - [`check`]: Checker framework and the house-style checkers
//! - [`spacing`]: Spacing between CJK and Latin characters
//! - [`case_conflict`]: Paths that collide on case-insensitive filesystems
//! - [`walk`]: Document discovery

pub mod case_conflict;
pub mod check;
#[cfg(feature = "generate")]
pub mod generate;
pub mod parse;
pub mod spacing;
pub mod walk;

// Re-export commonly used types at the crate root
pub use check::{
    CheckConfig, CheckReport, Checker, CheckerFactory, CheckerKind, Diagnostic, Diagnostics,
    LinkProbe, ValidationError, chain_factory, check_document,
};
pub use parse::{Document, Node, ParseError, Parser, ParserConfig, Tag, parse_rst};
