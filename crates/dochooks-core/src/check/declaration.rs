//! Parsers for the textual API syntax found in API reference documents.
//!
//! This module contains nom-based parsers for declaration signatures
//! (`mod.func(a: int, b=1, *args, **kwargs)`), parameter type annotations in
//! prose (`(int，可选)`) and `COPY-FROM` references.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, satisfy},
    combinator::{all_consuming, opt, recognize, rest, verify},
    multi::many0,
};
use thiserror::Error;

/// A parameter of a declared or documented API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiParameter {
    pub name: String,
    /// Type annotation, when one was written.
    pub type_name: Option<String>,
    /// Variadic positional (`*args`).
    pub is_rest: bool,
    /// Variadic keyword (`**kwargs`).
    pub is_keyword: bool,
    /// Has a default value or is variadic.
    pub optional: bool,
    /// Default expression text, verbatim.
    pub default: Option<String>,
}

/// A parsed API declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDeclaration {
    /// Dotted API path.
    pub name: String,
    pub parameters: Vec<ApiParameter>,
}

/// Why a declaration did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("expected a dotted API name followed by '('")]
    MissingName,

    #[error("expected ')' at the end of the declaration")]
    UnclosedParameters,

    #[error("unbalanced brackets or quotes in the parameter list")]
    Unbalanced,

    #[error("empty parameter")]
    EmptyParameter,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// A documented parameter type, `(type)` or `(type，可选)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocType {
    pub type_name: String,
    pub optional: bool,
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parses an identifier: `[A-Za-z_][A-Za-z0-9_]*`.
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize((satisfy(is_identifier_start), take_while(is_identifier_char))).parse(input)
}

/// Parses a dotted path: `ident(.ident)*`.
fn dotted_name(input: &str) -> IResult<&str, &str> {
    recognize((identifier, many0((char('.'), identifier)))).parse(input)
}

/// Returns true if `text` is an identifier.
pub fn is_identifier(text: &str) -> bool {
    all_consuming(identifier).parse(text).is_ok()
}

/// Parses one parameter: `[*|**]name[: type][= default]`.
fn parameter(input: &str) -> IResult<&str, ApiParameter> {
    (
        opt(alt((tag("**"), tag("*")))),
        identifier,
        multispace0,
        opt((char(':'), multispace0, identifier, multispace0)),
        opt((
            char('='),
            multispace0,
            verify(rest, |s: &str| !s.trim().is_empty()),
        )),
    )
        .map(|(stars, name, _, annotation, default)| {
            let is_keyword = stars == Some("**");
            let is_rest = stars == Some("*");
            let default = default.map(|(_, _, value)| value.trim().to_string());
            ApiParameter {
                name: name.to_string(),
                type_name: annotation.map(|(_, _, type_name, _)| type_name.to_string()),
                is_rest,
                is_keyword,
                optional: is_rest || is_keyword || default.is_some(),
                default,
            }
        })
        .parse(input)
}

/// Splits a parameter list on commas that are not nested in brackets or
/// string literals.
fn split_parameters(input: &str) -> Result<Vec<&str>, DeclarationError> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (index, c) in input.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.checked_sub(1).ok_or(DeclarationError::Unbalanced)?,
            ',' if depth == 0 => {
                segments.push(&input[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(DeclarationError::Unbalanced);
    }
    segments.push(&input[start..]);
    Ok(segments)
}

/// Parses an API declaration such as `paddle.add(x, y, name=None)`.
///
/// Positional-only and keyword-only markers (`/`, bare `*`) are rejected.
pub fn parse_declaration(text: &str) -> Result<ApiDeclaration, DeclarationError> {
    let text = text.trim();
    let (inner, name) = (dotted_name, char('('))
        .map(|(name, _)| name)
        .parse(text)
        .map_err(|_| DeclarationError::MissingName)?;
    let inner = inner
        .strip_suffix(')')
        .ok_or(DeclarationError::UnclosedParameters)?;

    let mut parameters = Vec::new();
    if inner.trim().is_empty() {
        return Ok(ApiDeclaration {
            name: name.to_string(),
            parameters,
        });
    }
    for segment in split_parameters(inner)? {
        let segment = segment.trim();
        if segment.is_empty() {
            return Err(DeclarationError::EmptyParameter);
        }
        let (_, param) = all_consuming(parameter)
            .parse(segment)
            .map_err(|_| DeclarationError::InvalidParameter(segment.to_string()))?;
        parameters.push(param);
    }
    Ok(ApiDeclaration {
        name: name.to_string(),
        parameters,
    })
}

/// Parses a documented type annotation at the start of `text`.
///
/// Trailing description text is allowed: `(int，可选) - the value.`
pub fn parse_doc_type(text: &str, optional_marker: &str) -> Option<DocType> {
    let result: IResult<&str, DocType> = (
        char('('),
        identifier,
        opt(tag(optional_marker)),
        char(')'),
    )
        .map(|(_, type_name, marker, _)| DocType {
            type_name: type_name.to_string(),
            optional: marker.is_some(),
        })
        .parse(text);
    result.ok().map(|(_, doc_type)| doc_type)
}

fn copy_from_suffix(input: &str) -> IResult<&str, &str> {
    recognize((
        char(':'),
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
    ))
    .parse(input)
}

/// Returns true if `text` is `MARKER: ident(.ident)*(:suffix)?`, where
/// `suffix` is `[A-Za-z0-9_-]+`. A single trailing newline is tolerated.
pub fn is_valid_copy_from(text: &str, marker: &str) -> bool {
    let text = text.strip_suffix('\n').unwrap_or(text);
    let result: IResult<&str, ()> = all_consuming((
        tag(marker),
        tag(": "),
        dotted_name,
        opt(copy_from_suffix),
    ))
    .map(|_| ())
    .parse(text);
    result.is_ok()
}
