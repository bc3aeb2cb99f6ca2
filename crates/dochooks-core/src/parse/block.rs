//! Block-level structure: sections, paragraphs, lists, literal blocks and
//! explicit markup.
//!
//! The parser works on pre-split [`Line`]s. Nested bodies (list items, block
//! quotes, directive content) are cut out as dedented line blocks that keep
//! their original line numbers and are parsed recursively. Section titles are
//! only allowed at the top level; everywhere else they abort the parse.

use super::error::ParseError;
use super::grammar::{DirectiveKind, Grammar};
use super::inline::{normalize_name, parse_inline, unescape};
use super::node::{Attributes, DirectiveInfo, MessageLevel, Node, Tag};
use super::report::Reporter;

const BULLETS: &[char] = &['*', '+', '-', '\u{2022}', '\u{2023}', '\u{2043}'];

/// A physical source line with tabs expanded and trailing whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    pub(crate) number: usize,
    pub(crate) text: String,
}

impl Line {
    pub(crate) fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start_matches(' ').len()
    }

    fn dedent(&self, by: usize) -> Line {
        if self.is_blank() {
            return Line::new(self.number, "");
        }
        let by = by.min(self.indent());
        Line::new(self.number, &self.text[by..])
    }
}

/// Display width of `text`; East Asian wide characters take two columns.
pub(crate) fn column_width(text: &str) -> usize {
    text.chars().map(|c| if is_wide(c) { 2 } else { 1 }).sum()
}

fn is_wide(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA000..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x20000..=0x3FFFD
    )
}

/// Returns the adornment character if `text` is a section adornment line.
fn adornment(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let first = chars.next()?;
    if !first.is_ascii_punctuation() {
        return None;
    }
    chars.all(|c| c == first).then_some(first)
}

fn joined(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn trim_trailing_blank(block: &mut Vec<Line>) {
    while block.last().is_some_and(Line::is_blank) {
        block.pop();
    }
}

fn min_indent(lines: &[Line]) -> usize {
    lines
        .iter()
        .filter(|line| !line.is_blank())
        .map(Line::indent)
        .min()
        .unwrap_or(0)
}

/// Cuts out the block of blank or indented lines starting at `start`,
/// dedented by its smallest indentation. Returns the block and the index of
/// the first line after it.
fn indented_block(lines: &[Line], start: usize) -> (Vec<Line>, usize) {
    let mut end = start;
    while end < lines.len() && (lines[end].is_blank() || lines[end].indent() > 0) {
        end += 1;
    }
    let indent = min_indent(&lines[start..end]);
    let mut block: Vec<Line> = lines[start..end].iter().map(|l| l.dedent(indent)).collect();
    trim_trailing_blank(&mut block);
    (block, end)
}

/// Like [`indented_block`], but the first line is the remainder of
/// `lines[start]` after byte `offset`; only the following lines are dedented.
fn first_known_indented(lines: &[Line], start: usize, offset: usize) -> (Vec<Line>, usize) {
    let mut end = start + 1;
    while end < lines.len() && (lines[end].is_blank() || lines[end].indent() > 0) {
        end += 1;
    }
    let indent = min_indent(&lines[start + 1..end]);
    let first = &lines[start];
    let mut block = vec![Line::new(first.number, first.text.get(offset..).unwrap_or(""))];
    block.extend(lines[start + 1..end].iter().map(|l| l.dedent(indent)));
    trim_trailing_blank(&mut block);
    (block, end)
}

/// Cuts out a block whose body is indented by exactly `indent` columns, the
/// first line starting at byte `offset`.
fn known_indented(lines: &[Line], start: usize, offset: usize, indent: usize) -> (Vec<Line>, usize) {
    let mut end = start + 1;
    while end < lines.len() && (lines[end].is_blank() || lines[end].indent() >= indent) {
        end += 1;
    }
    let first = &lines[start];
    let mut block = vec![Line::new(first.number, first.text.get(offset..).unwrap_or(""))];
    block.extend(lines[start + 1..end].iter().map(|l| l.dedent(indent)));
    trim_trailing_blank(&mut block);
    (block, end)
}

/// Byte offset of the first non-space character at or after `from`.
fn skip_spaces(text: &str, from: usize) -> usize {
    let rest = text.get(from..).unwrap_or("");
    from + (rest.len() - rest.trim_start_matches(' ').len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker {
    /// Byte offset of the item text.
    offset: usize,
    /// Column the item body is indented to.
    indent: usize,
    /// Whether any text follows the marker on its line.
    has_text: bool,
}

fn bullet_marker(text: &str) -> Option<(char, Marker)> {
    let bullet = text.chars().next()?;
    if !BULLETS.contains(&bullet) {
        return None;
    }
    let after = bullet.len_utf8();
    let rest = &text[after..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    let offset = skip_spaces(text, after);
    Some((
        bullet,
        Marker {
            offset,
            indent: 1 + (offset - after),
            has_text: offset < text.len(),
        },
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumFormat {
    Period,
    Paren,
    Parens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumSequence {
    Arabic,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Enumerator {
    format: EnumFormat,
    /// `None` for the auto-enumerator `#`.
    sequence: Option<EnumSequence>,
    ordinal: u32,
    marker: Marker,
}

fn roman_value(text: &str) -> Option<u32> {
    let digit = |c: char| match c.to_ascii_lowercase() {
        'i' => Some(1),
        'v' => Some(5),
        'x' => Some(10),
        'l' => Some(50),
        'c' => Some(100),
        'd' => Some(500),
        'm' => Some(1000),
        _ => None,
    };
    let values = text.chars().map(digit).collect::<Option<Vec<u32>>>()?;
    let mut total = 0;
    for (index, value) in values.iter().enumerate() {
        match values.get(index + 1) {
            Some(next) if next > value => total -= *value as i64,
            _ => total += *value as i64,
        }
    }
    u32::try_from(total).ok().filter(|value| *value > 0)
}

fn enumerator(text: &str) -> Option<Enumerator> {
    let (parens, body_start) = if text.starts_with('(') { (true, 1) } else { (false, 0) };
    let body = &text[body_start..];
    let token_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
        .unwrap_or(body.len());
    if token_len == 0 {
        return None;
    }
    let token = &body[..token_len];
    let closer = body[token_len..].chars().next()?;
    let format = match (parens, closer) {
        (true, ')') => EnumFormat::Parens,
        (false, ')') => EnumFormat::Paren,
        (false, '.') => EnumFormat::Period,
        _ => return None,
    };
    let after = body_start + token_len + 1;
    let rest = &text[after..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }

    let (sequence, ordinal) = if token == "#" {
        (None, 0)
    } else if token.chars().all(|c| c.is_ascii_digit()) {
        (Some(EnumSequence::Arabic), token.parse().ok()?)
    } else if token.chars().all(|c| "ivxlcdm".contains(c))
        && (token.len() > 1 || token == "i")
    {
        (Some(EnumSequence::LowerRoman), roman_value(token)?)
    } else if token.chars().all(|c| "IVXLCDM".contains(c))
        && (token.len() > 1 || token == "I")
    {
        (Some(EnumSequence::UpperRoman), roman_value(token)?)
    } else if token.len() == 1 {
        let c = token.chars().next()?;
        if c.is_ascii_lowercase() {
            (Some(EnumSequence::LowerAlpha), c as u32 - 'a' as u32 + 1)
        } else if c.is_ascii_uppercase() {
            (Some(EnumSequence::UpperAlpha), c as u32 - 'A' as u32 + 1)
        } else {
            return None;
        }
    } else {
        return None;
    };

    let offset = skip_spaces(text, after);
    Some(Enumerator {
        format,
        sequence,
        ordinal,
        marker: Marker {
            offset,
            indent: offset,
            has_text: offset < text.len(),
        },
    })
}

/// Parses a field marker `:name:`; returns the name and the byte offset of the body.
fn field_marker(text: &str) -> Option<(String, usize)> {
    let body = text.strip_prefix(':')?;
    if body.starts_with([' ', ':']) {
        return None;
    }
    let chars: Vec<(usize, char)> = body.char_indices().collect();
    let mut index = 0;
    while index < chars.len() {
        let (position, c) = chars[index];
        match c {
            '\\' => index += 1,
            ':' => {
                let next = chars.get(index + 1).map(|(_, c)| *c);
                match next {
                    None | Some(' ') => {
                        if index == 0 || chars[index - 1].1 == ' ' {
                            return None;
                        }
                        let name = &body[..position];
                        return Some((name.to_string(), skip_spaces(text, position + 2)));
                    }
                    Some('`') => return None,
                    _ => {}
                }
            }
            _ => {}
        }
        index += 1;
    }
    None
}

/// Parses `name::` at the start of an explicit markup body; returns the name
/// and the byte length consumed including the `::`.
fn directive_marker(text: &str) -> Option<(String, usize)> {
    let mut end = 0;
    let mut previous: Option<char> = None;
    for (position, c) in text.char_indices() {
        let word = c.is_alphanumeric();
        if position == 0 && !word {
            return None;
        }
        if word {
            end = position + c.len_utf8();
        } else if "-_.+:".contains(c) && previous.is_some_and(char::is_alphanumeric) {
            // Internal separators must sit between word characters.
        } else {
            break;
        }
        previous = Some(c);
    }
    if end == 0 {
        return None;
    }
    let rest = &text[end..];
    let rest = rest.strip_prefix("::")?;
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some((text[..end].to_string(), end + 2))
}

/// Parses a target name after `.. _`; returns the name (`None` when
/// anonymous) and the byte length consumed including the closing colon.
fn target_name(body: &str) -> Option<(Option<String>, usize)> {
    let terminated = |rest: &str| rest.is_empty() || rest.starts_with(' ');
    if let Some(rest) = body.strip_prefix("_:") {
        return terminated(rest).then_some((None, 2));
    }
    let chars: Vec<char> = body.chars().collect();
    if body.starts_with('`') {
        let close = body[1..].find('`')? + 1;
        let rest = body[close + 1..].strip_prefix(':')?;
        if !terminated(rest) || close == 1 {
            return None;
        }
        let name: Vec<char> = body[1..close].chars().collect();
        return Some((Some(normalize_name(&unescape(&name))), close + 2));
    }
    if chars.first().is_none_or(|c| *c == ' ') {
        return None;
    }
    let mut index = 0;
    let mut bytes = 0;
    while index < chars.len() {
        let c = chars[index];
        if c == '\\' {
            bytes += c.len_utf8() + chars.get(index + 1).map_or(0, |c| c.len_utf8());
            index += 2;
            continue;
        }
        if c == ':' && index > 0 && chars[index - 1] != ' ' && terminated(&body[bytes + 1..]) {
            let name = unescape(&chars[..index]);
            return Some((Some(normalize_name(&name)), bytes + 1));
        }
        bytes += c.len_utf8();
        index += 1;
    }
    None
}

/// Parses a footnote or citation label `[label]`; returns the label and the
/// byte length consumed.
fn footnote_label(text: &str) -> Option<(String, usize)> {
    let body = text.strip_prefix('[')?;
    let close = body.find(']')?;
    let label = &body[..close];
    let rest = &body[close + 1..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    let valid = !label.is_empty()
        && !label.starts_with(' ')
        && label
            .chars()
            .all(|c| c.is_alphanumeric() || "#*-_.+:".contains(c));
    valid.then(|| (label.to_string(), close + 2))
}

/// Splits `|name|` off a substitution definition body.
fn substitution_name(text: &str) -> Option<(String, usize)> {
    let body = text.strip_prefix('|')?;
    if body.starts_with(' ') {
        return None;
    }
    let close = body.find('|')?;
    let name = &body[..close];
    if name.is_empty() || name.ends_with(' ') {
        return None;
    }
    let rest = &body[close + 1..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some((name.to_string(), close + 2))
}

fn is_grid_table_border(text: &str) -> bool {
    (text.starts_with("+-") || text.starts_with("+="))
        && text.ends_with('+')
        && text.chars().all(|c| matches!(c, '+' | '-' | '=' | ':'))
}

fn is_simple_table_border(text: &str) -> bool {
    text.starts_with('=') && text.contains(" =") && text.chars().all(|c| c == '=' || c == ' ')
}

/// A directive body split into arguments, options and content.
#[derive(Debug, Default)]
struct DirectiveParts {
    arguments: Vec<Line>,
    content: Vec<Line>,
}

fn split_directive(mut block: Vec<Line>, takes_arguments: bool) -> DirectiveParts {
    if block.first().is_some_and(Line::is_blank) {
        block.remove(0);
    }
    let blank = block.iter().position(Line::is_blank).unwrap_or(block.len());
    let mut content = block.split_off(blank);
    let option_start = block
        .iter()
        .position(|line| line.text.starts_with(':'))
        .unwrap_or(block.len());
    block.truncate(option_start);

    if takes_arguments {
        while content.first().is_some_and(Line::is_blank) {
            content.remove(0);
        }
        DirectiveParts {
            arguments: block,
            content,
        }
    } else {
        block.extend(content);
        DirectiveParts {
            arguments: Vec::new(),
            content: block,
        }
    }
}

/// A top-level item before sections are assembled.
#[derive(Debug)]
enum Item {
    Title {
        style: (char, bool),
        line: usize,
        node: Node,
    },
    Block(Node),
}

/// Recursive block parser for one document.
pub(crate) struct BlockParser<'a> {
    grammar: &'a Grammar,
    reporter: &'a mut Reporter,
    /// Adornment styles in order of first use: (character, has overline).
    title_styles: Vec<(char, bool)>,
}

impl<'a> BlockParser<'a> {
    pub(crate) fn new(grammar: &'a Grammar, reporter: &'a mut Reporter) -> Self {
        Self {
            grammar,
            reporter,
            title_styles: Vec::new(),
        }
    }

    /// Parses a whole document body, assembling titles into nested sections.
    pub(crate) fn parse_document(&mut self, lines: &[Line]) -> Result<Vec<Node>, ParseError> {
        let items = self.parse_items(lines, true)?;
        let mut nodes = self.build_sections(items)?;
        nodes.extend(self.reporter.drain());
        Ok(nodes)
    }

    fn parse_nested(&mut self, lines: &[Line]) -> Result<Vec<Node>, ParseError> {
        let items = self.parse_items(lines, false)?;
        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Item::Block(node) => Some(node),
                Item::Title { .. } => None,
            })
            .collect())
    }

    fn inline(&mut self, text: &str, line: usize) -> Vec<Node> {
        parse_inline(text, line, self.grammar, self.reporter)
    }

    fn build_sections(&mut self, items: Vec<Item>) -> Result<Vec<Node>, ParseError> {
        let mut root: Vec<Node> = Vec::new();
        let mut open: Vec<Node> = Vec::new();

        fn close(open: &mut Vec<Node>, root: &mut Vec<Node>) {
            if let Some(done) = open.pop() {
                match open.last_mut() {
                    Some(parent) => parent.children.push(done),
                    None => root.push(done),
                }
            }
        }

        for item in items {
            match item {
                Item::Block(node) => match open.last_mut() {
                    Some(section) => section.children.push(node),
                    None => root.push(node),
                },
                Item::Title { style, line, node } => {
                    let level = match self.title_styles.iter().position(|s| *s == style) {
                        Some(index) => index + 1,
                        None => self.title_styles.len() + 1,
                    };
                    if level > open.len() + 1 {
                        return Err(ParseError::InconsistentTitleLevel {
                            line,
                            title: node.astext(),
                        });
                    }
                    if level > self.title_styles.len() {
                        self.title_styles.push(style);
                    }
                    while open.len() >= level {
                        close(&mut open, &mut root);
                    }
                    let name = normalize_name(&node.astext());
                    let mut section = Node::new(Tag::Section, Some(line)).with_children(vec![node]);
                    if !name.is_empty() {
                        section.attributes.names.push(name);
                    }
                    open.push(section);
                }
            }
        }
        while !open.is_empty() {
            close(&mut open, &mut root);
        }
        Ok(root)
    }

    fn parse_items(&mut self, lines: &[Line], allow_titles: bool) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        let mut index = 0;
        while index < lines.len() {
            let line = &lines[index];
            if line.is_blank() {
                index += 1;
                continue;
            }
            index = self.parse_block(lines, index, allow_titles, &mut items)?;
            items.extend(self.reporter.drain().into_iter().map(Item::Block));
        }
        Ok(items)
    }

    /// Parses the construct starting at `lines[index]` and returns the index after it.
    fn parse_block(
        &mut self,
        lines: &[Line],
        index: usize,
        allow_titles: bool,
        items: &mut Vec<Item>,
    ) -> Result<usize, ParseError> {
        let line = &lines[index];
        if line.indent() > 0 {
            let (block, end) = indented_block(lines, index);
            let children = self.parse_nested(&block)?;
            items.push(Item::Block(
                Node::new(Tag::BlockQuote, Some(line.number)).with_children(children),
            ));
            return Ok(end);
        }

        let text = line.text.as_str();
        if text == ".." || text.starts_with(".. ") {
            return self.explicit_markup(lines, index, items);
        }
        if let Some(c) = adornment(text) {
            if let Some(end) = self.adornment_block(lines, index, c, allow_titles, items)? {
                return Ok(end);
            }
        }
        if is_grid_table_border(text) || is_simple_table_border(text) {
            return Ok(self.table(lines, index, items));
        }
        if let Some(end) = self.bullet_list(lines, index, items)? {
            return Ok(end);
        }
        if let Some(end) = self.enumerated_list(lines, index, items)? {
            return Ok(end);
        }
        if let Some(end) = self.field_list(lines, index, items)? {
            return Ok(end);
        }
        if text == "|" || text.starts_with("| ") {
            return Ok(self.line_block(lines, index, items));
        }
        self.text_block(lines, index, allow_titles, items)
    }

    /// Handles a line made of one repeated punctuation character: a
    /// transition or the overline of a title. Returns `None` when the line is
    /// ordinary text after all.
    fn adornment_block(
        &mut self,
        lines: &[Line],
        index: usize,
        c: char,
        allow_titles: bool,
        items: &mut Vec<Item>,
    ) -> Result<Option<usize>, ParseError> {
        let overline = &lines[index];
        let short = overline.text.chars().count() < 4;
        let next = lines.get(index + 1).filter(|line| !line.is_blank());

        let Some(title_line) = next else {
            if short {
                return Ok(None);
            }
            items.push(Item::Block(
                Node::new(Tag::Transition, Some(overline.number)).with_raw(overline.text.clone()),
            ));
            return Ok(Some(index + 1));
        };
        if adornment(&title_line.text).is_some() {
            return Ok(None);
        }

        let underline = lines.get(index + 2).filter(|line| !line.is_blank());
        let matching = underline.is_some_and(|line| adornment(&line.text) == Some(c));
        if !matching {
            if short {
                return Ok(None);
            }
            return Err(ParseError::MissingUnderline {
                line: overline.number,
            });
        }
        let Some(underline) = underline else {
            return Ok(None);
        };
        if underline.text != overline.text {
            if short {
                return Ok(None);
            }
            return Err(ParseError::AdornmentMismatch {
                line: overline.number,
            });
        }

        let title = title_line.text.trim();
        if column_width(title) > overline.text.chars().count() {
            if short {
                return Ok(None);
            }
            self.reporter
                .warning(overline.number, "Title overline too short.");
        }
        if !allow_titles {
            return Err(ParseError::UnexpectedSectionTitle {
                line: title_line.number,
                title: title.to_string(),
            });
        }
        items.push(self.title_item(title, title_line.number, (c, true)));
        Ok(Some(index + 3))
    }

    fn title_item(&mut self, title: &str, line: usize, style: (char, bool)) -> Item {
        let children = self.inline(title, line);
        let node = Node::new(Tag::Title, Some(line))
            .with_raw(title)
            .with_children(children);
        Item::Title { style, line, node }
    }

    /// Text at the left margin: a title with underline, a definition list
    /// item or a paragraph.
    fn text_block(
        &mut self,
        lines: &[Line],
        index: usize,
        allow_titles: bool,
        items: &mut Vec<Item>,
    ) -> Result<usize, ParseError> {
        let line = &lines[index];
        if let Some(next) = lines.get(index + 1).filter(|l| !l.is_blank()) {
            if let Some(c) = adornment(&next.text) {
                let title = line.text.trim();
                let underline_len = next.text.chars().count();
                let fits = column_width(title) <= underline_len;
                if fits || underline_len >= 4 {
                    if !fits {
                        self.reporter.warning(next.number, "Title underline too short.");
                    }
                    if !allow_titles {
                        return Err(ParseError::UnexpectedSectionTitle {
                            line: line.number,
                            title: title.to_string(),
                        });
                    }
                    items.push(self.title_item(title, line.number, (c, false)));
                    return Ok(index + 2);
                }
                self.reporter.info(
                    next.number,
                    "Possible title underline, too short for the title.\n\
                     Treating it as ordinary text because it's so short.",
                );
            } else if next.indent() > 0 {
                return self.definition_list(lines, index, items);
            }
        }
        self.paragraph(lines, index, items)
    }

    fn paragraph(&mut self, lines: &[Line], index: usize, items: &mut Vec<Item>) -> Result<usize, ParseError> {
        let mut end = index;
        while end < lines.len() && !lines[end].is_blank() && lines[end].indent() == 0 {
            end += 1;
        }
        if end < lines.len() && !lines[end].is_blank() {
            self.reporter.error(lines[end].number, "Unexpected indentation.");
        }

        let number = lines[index].number;
        let data = joined(&lines[index..end]);
        let (text, literal_next) = match data.strip_suffix("::") {
            None => (Some(data.clone()), false),
            Some("") => (None, true),
            Some(rest) if rest.ends_with(char::is_whitespace) => (Some(rest.trim_end().to_string()), true),
            Some(_) => (Some(data[..data.len() - 1].to_string()), true),
        };
        if let Some(text) = text {
            let children = self.inline(&text, number);
            items.push(Item::Block(
                Node::new(Tag::Paragraph, Some(number))
                    .with_raw(data)
                    .with_children(children),
            ));
        }
        if literal_next {
            return Ok(self.literal_block(lines, end, items));
        }
        Ok(end)
    }

    /// The literal block expected after a paragraph ending in `::`.
    fn literal_block(&mut self, lines: &[Line], start: usize, items: &mut Vec<Item>) -> usize {
        let mut index = start;
        while index < lines.len() && lines[index].is_blank() {
            index += 1;
        }
        let Some(first) = lines.get(index) else {
            let line = lines.last().map_or(1, |l| l.number);
            self.reporter.warning(line, "Literal block expected; none found.");
            return start;
        };

        if first.indent() > 0 {
            let (block, end) = indented_block(lines, index);
            let text = joined(&block);
            items.push(Item::Block(Node::with_text(
                Tag::LiteralBlock,
                Some(first.number),
                text.clone(),
                text,
            )));
            return end;
        }

        // Quoted literal block: unindented lines sharing a leading punctuation character.
        if let Some(quote) = first.text.chars().next().filter(|c| c.is_ascii_punctuation()) {
            if index > start {
                let mut end = index;
                while end < lines.len() && !lines[end].is_blank() && lines[end].text.starts_with(quote) {
                    end += 1;
                }
                let text = joined(&lines[index..end]);
                items.push(Item::Block(Node::with_text(
                    Tag::LiteralBlock,
                    Some(first.number),
                    text.clone(),
                    text,
                )));
                return end;
            }
        }

        self.reporter
            .warning(first.number, "Literal block expected; none found.");
        start
    }

    /// Whether `lines[index]` starts a definition list item: unindented plain
    /// text followed directly by an indented line.
    fn starts_definition(&self, lines: &[Line], index: usize) -> bool {
        let (Some(term), Some(next)) = (lines.get(index), lines.get(index + 1)) else {
            return false;
        };
        let text = term.text.as_str();
        !term.is_blank()
            && term.indent() == 0
            && !next.is_blank()
            && next.indent() > 0
            && !(text == ".." || text.starts_with(".. "))
            && adornment(text).is_none()
            && bullet_marker(text).is_none()
            && enumerator(text).is_none()
            && field_marker(text).is_none()
            && !(text == "|" || text.starts_with("| "))
    }

    fn definition_list(&mut self, lines: &[Line], index: usize, items: &mut Vec<Item>) -> Result<usize, ParseError> {
        let mut entries = Vec::new();
        let mut current = index;
        loop {
            let term_line = &lines[current];
            let term_children = self.inline(term_line.text.trim(), term_line.number);
            let term = Node::new(Tag::Term, Some(term_line.number))
                .with_raw(term_line.text.trim())
                .with_children(term_children);
            let (block, end) = indented_block(lines, current + 1);
            let body = self.parse_nested(&block)?;
            let definition = Node::new(Tag::Definition, lines.get(current + 1).map(|l| l.number))
                .with_children(body);
            entries.push(
                Node::new(Tag::DefinitionListItem, Some(term_line.number))
                    .with_children(vec![term, definition]),
            );
            current = end;

            let mut next = end;
            while next < lines.len() && lines[next].is_blank() {
                next += 1;
            }
            if self.starts_definition(lines, next) {
                current = next;
            } else {
                break;
            }
        }
        items.push(Item::Block(
            Node::new(Tag::DefinitionList, Some(lines[index].number)).with_children(entries),
        ));
        Ok(current)
    }

    /// Cuts out and parses the body of one list item or field.
    fn item_body(&mut self, lines: &[Line], index: usize, marker: Marker) -> Result<(Vec<Node>, usize), ParseError> {
        let (block, end) = if marker.has_text {
            known_indented(lines, index, marker.offset, marker.indent)
        } else {
            first_known_indented(lines, index, marker.offset)
        };
        Ok((self.parse_nested(&block)?, end))
    }

    fn warn_unexpected_unindent(&mut self, lines: &[Line], end: usize, what: &str) {
        if end < lines.len() && end > 0 && !lines[end - 1].is_blank() {
            self.reporter.warning(
                lines[end].number,
                format!("{what} ends without a blank line; unexpected unindent."),
            );
        }
    }

    fn bullet_list(&mut self, lines: &[Line], index: usize, items: &mut Vec<Item>) -> Result<Option<usize>, ParseError> {
        let Some((bullet, _)) = bullet_marker(&lines[index].text) else {
            return Ok(None);
        };
        let mut entries = Vec::new();
        let mut current = index;
        let end = loop {
            let Some((_, marker)) = bullet_marker(&lines[current].text) else {
                break current;
            };
            let (children, end) = self.item_body(lines, current, marker)?;
            entries.push(Node::new(Tag::ListItem, Some(lines[current].number)).with_children(children));

            let next = lines.get(end).filter(|l| l.indent() == 0);
            match next.and_then(|l| bullet_marker(&l.text)) {
                Some((next_bullet, _)) if next_bullet == bullet => current = end,
                _ => break end,
            }
        };
        self.warn_unexpected_unindent(lines, end, "Bullet list");
        items.push(Item::Block(
            Node::new(Tag::BulletList, Some(lines[index].number)).with_children(entries),
        ));
        Ok(Some(end))
    }

    fn enumerated_list(&mut self, lines: &[Line], index: usize, items: &mut Vec<Item>) -> Result<Option<usize>, ParseError> {
        let Some(first) = enumerator(&lines[index].text) else {
            return Ok(None);
        };
        // An enumerator followed by unindented text is an ordinary paragraph.
        if let Some(next) = lines.get(index + 1) {
            if !next.is_blank()
                && next.indent() == 0
                && enumerator(&next.text).is_none_or(|e| e.format != first.format)
            {
                return Ok(None);
            }
        }

        let mut sequence = first.sequence;
        let mut ordinal = first.ordinal;
        let mut entries = Vec::new();
        let mut current = index;
        let mut marker = first.marker;
        let end = loop {
            let (children, end) = self.item_body(lines, current, marker)?;
            entries.push(Node::new(Tag::ListItem, Some(lines[current].number)).with_children(children));

            let next = lines
                .get(end)
                .filter(|l| l.indent() == 0)
                .and_then(|l| enumerator(&l.text));
            match next {
                Some(next)
                    if next.format == first.format
                        && (next.sequence.is_none() || sequence.is_none_or(|s| Some(s) == next.sequence))
                        && (next.sequence.is_none() || next.ordinal == ordinal + 1) =>
                {
                    sequence = sequence.or(next.sequence);
                    ordinal += 1;
                    marker = next.marker;
                    current = end;
                }
                _ => break end,
            }
        };
        self.warn_unexpected_unindent(lines, end, "Enumerated list");
        items.push(Item::Block(
            Node::new(Tag::EnumeratedList, Some(lines[index].number)).with_children(entries),
        ));
        Ok(Some(end))
    }

    fn field_list(&mut self, lines: &[Line], index: usize, items: &mut Vec<Item>) -> Result<Option<usize>, ParseError> {
        if field_marker(&lines[index].text).is_none() {
            return Ok(None);
        }
        let mut fields = Vec::new();
        let mut current = index;
        let end = loop {
            let Some((name, offset)) = field_marker(&lines[current].text) else {
                break current;
            };
            let number = lines[current].number;
            let name_children = self.inline(&name, number);
            let (body, end) = self.item_body(
                lines,
                current,
                Marker {
                    offset,
                    indent: 1,
                    has_text: false,
                },
            )?;
            fields.push(Node::new(Tag::Field, Some(number)).with_children(vec![
                Node::new(Tag::FieldName, Some(number))
                    .with_raw(name)
                    .with_children(name_children),
                Node::new(Tag::FieldBody, Some(number)).with_children(body),
            ]));

            match lines.get(end).filter(|l| l.indent() == 0) {
                Some(next) if field_marker(&next.text).is_some() => current = end,
                _ => break end,
            }
        };
        self.warn_unexpected_unindent(lines, end, "Field list");
        items.push(Item::Block(
            Node::new(Tag::FieldList, Some(lines[index].number)).with_children(fields),
        ));
        Ok(Some(end))
    }

    fn line_block(&mut self, lines: &[Line], index: usize, items: &mut Vec<Item>) -> usize {
        let mut entries: Vec<(usize, String)> = Vec::new();
        let mut current = index;
        while let Some(line) = lines.get(current) {
            let text = line.text.as_str();
            if text == "|" || text.starts_with("| ") {
                entries.push((line.number, text[1..].trim_start().to_string()));
            } else if !line.is_blank() && line.indent() > 0 && !entries.is_empty() {
                if let Some((_, last)) = entries.last_mut() {
                    last.push(' ');
                    last.push_str(text.trim());
                }
            } else {
                break;
            }
            current += 1;
        }
        let children = entries
            .into_iter()
            .map(|(number, text)| {
                let inline = self.inline(&text, number);
                Node::new(Tag::Line, Some(number)).with_raw(text).with_children(inline)
            })
            .collect();
        items.push(Item::Block(
            Node::new(Tag::LineBlock, Some(lines[index].number)).with_children(children),
        ));
        current
    }

    /// Tables are kept as unparsed source.
    fn table(&mut self, lines: &[Line], index: usize, items: &mut Vec<Item>) -> usize {
        let grid = is_grid_table_border(&lines[index].text);
        let mut end = index + 1;
        let mut borders = 1;
        while end < lines.len() {
            let line = &lines[end];
            if line.is_blank() && (grid || (borders >= 2 && is_simple_table_border(&lines[end - 1].text))) {
                break;
            }
            if !grid && is_simple_table_border(&line.text) {
                borders += 1;
            }
            end += 1;
        }
        items.push(Item::Block(
            Node::new(Tag::Table, Some(lines[index].number)).with_raw(joined(&lines[index..end])),
        ));
        end
    }

    /// Explicit markup: footnotes, targets, substitution definitions,
    /// directives and comments.
    fn explicit_markup(&mut self, lines: &[Line], index: usize, items: &mut Vec<Item>) -> Result<usize, ParseError> {
        let line = &lines[index];
        let text = line.text.as_str();
        let body = text.get(3..).unwrap_or("");
        let number = line.number;

        if let Some((label, consumed)) = footnote_label(body) {
            let (block, end) = first_known_indented(lines, index, skip_spaces(text, 3 + consumed));
            let children = self.parse_nested(&block)?;
            let mut node = Node::new(Tag::Footnote, Some(number))
                .with_raw(joined(&lines[index..end]))
                .with_children(children);
            node.attributes.names.push(normalize_name(&label));
            items.push(Item::Block(node));
            return Ok(end);
        }

        if let Some(target) = body.strip_prefix('_') {
            if let Some((name, consumed)) = target_name(target) {
                let (block, end) = first_known_indented(lines, index, skip_spaces(text, 4 + consumed));
                items.push(Item::Block(self.target(name, &block, number, joined(&lines[index..end]))));
                return Ok(end);
            }
        }

        if let Some((name, consumed)) = substitution_name(body) {
            let offset = skip_spaces(text, 3 + consumed);
            if let Some((directive, length)) = directive_marker(&text[offset..]) {
                let (block, end) = first_known_indented(lines, index, skip_spaces(text, offset + length));
                let raw = joined(&lines[index..end]);
                let children = self.substitution(&directive, block, number, raw.clone())?;
                let mut node = Node::new(Tag::SubstitutionDefinition, Some(number))
                    .with_raw(raw)
                    .with_children(children);
                node.attributes.names.push(normalize_name(&name));
                items.push(Item::Block(node));
                return Ok(end);
            }
        }

        if let Some((name, length)) = directive_marker(body) {
            let (block, end) = first_known_indented(lines, index, skip_spaces(text, 3 + length));
            let mut raw_lines = lines[index..end].to_vec();
            trim_trailing_blank(&mut raw_lines);
            let raw = joined(&raw_lines);
            let nodes = self.directive(&name, block, number, raw)?;
            items.extend(nodes.into_iter().map(Item::Block));
            return Ok(end);
        }

        let (block, end) = first_known_indented(lines, index, skip_spaces(text, 2));
        let comment = joined(&block);
        items.push(Item::Block(Node::with_text(
            Tag::Comment,
            Some(number),
            comment.clone(),
            comment,
        )));
        Ok(end)
    }

    fn target(&mut self, name: Option<String>, block: &[Line], number: usize, raw: String) -> Node {
        let uri: String = block.iter().map(|line| line.text.trim()).collect();
        let mut attributes = Attributes {
            anonymous: name.is_none(),
            names: name.into_iter().collect(),
            ..Default::default()
        };
        if !uri.is_empty() {
            match uri.strip_suffix('_').filter(|_| !uri.ends_with("\\_")) {
                Some(alias) => {
                    let alias: Vec<char> = alias.trim_matches('`').chars().collect();
                    attributes.refname = Some(normalize_name(&unescape(&alias)));
                }
                None => {
                    let chars: Vec<char> = uri.chars().collect();
                    attributes.refuri = Some(unescape(&chars));
                }
            }
        }
        Node::new(Tag::Target, Some(number))
            .with_raw(raw)
            .with_attributes(attributes)
    }

    fn substitution(&mut self, directive: &str, block: Vec<Line>, number: usize, raw: String) -> Result<Vec<Node>, ParseError> {
        let data = block
            .iter()
            .map(|line| line.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        match directive.to_lowercase().as_str() {
            "replace" => Ok(self.inline(&data, number)),
            "unicode" | "date" => Ok(vec![Node::text(data, Some(number))]),
            _ => self.directive(directive, block, number, raw),
        }
    }

    fn directive(&mut self, name: &str, block: Vec<Line>, number: usize, raw: String) -> Result<Vec<Node>, ParseError> {
        let name = name.to_lowercase();
        let Some(kind) = self.grammar.directive(&name) else {
            self.reporter.report_with(
                MessageLevel::Error,
                number,
                format!("Unknown directive type \"{name}\"."),
                vec![Node::with_text(Tag::LiteralBlock, Some(number), raw.clone(), raw)],
            );
            return Ok(Vec::new());
        };

        let nodes = match kind {
            DirectiveKind::Opaque => {
                let mut block = block;
                while block.first().is_some_and(Line::is_blank) {
                    block.remove(0);
                }
                let content: Vec<String> = block.into_iter().map(|line| line.text).collect();
                let text = content.join("\n");
                vec![Node::with_text(Tag::LiteralBlock, Some(number), raw, text).with_attributes(
                    Attributes {
                        classes: vec![name.clone()],
                        directive: Some(DirectiveInfo {
                            name,
                            content,
                        }),
                        ..Default::default()
                    },
                )]
            }
            DirectiveKind::Admonition { titled } => {
                let parts = split_directive(block, titled);
                let mut children = Vec::new();
                if titled {
                    let title = joined(&parts.arguments).replace('\n', " ");
                    let title_children = self.inline(&title, number);
                    children.push(
                        Node::new(Tag::Title, Some(number))
                            .with_raw(title)
                            .with_children(title_children),
                    );
                }
                if parts.content.iter().all(Line::is_blank) {
                    self.reporter.error(
                        number,
                        format!("The \"{name}\" admonition is empty; content required."),
                    );
                    return Ok(Vec::new());
                }
                children.extend(self.parse_nested(&parts.content)?);
                vec![Node::new(Tag::Admonition, Some(number))
                    .with_raw(raw)
                    .with_children(children)
                    .with_attributes(Attributes {
                        classes: vec![name],
                        ..Default::default()
                    })]
            }
            DirectiveKind::Container => {
                let parts = split_directive(block, name == "container");
                let children = self.parse_nested(&parts.content)?;
                vec![Node::new(Tag::Container, Some(number))
                    .with_raw(raw)
                    .with_children(children)
                    .with_attributes(Attributes {
                        classes: vec![name],
                        ..Default::default()
                    })]
            }
            DirectiveKind::Verbatim(tag) => {
                let parts = split_directive(block, name == "code" || name == "raw");
                let text = joined(&parts.content);
                let children = if name == "parsed-literal" {
                    let first = parts.content.first().map_or(number, |line| line.number);
                    self.inline(&text, first)
                } else {
                    vec![Node::text(text, Some(number))]
                };
                vec![Node::new(tag, Some(number))
                    .with_raw(raw)
                    .with_children(children)
                    .with_attributes(Attributes {
                        classes: vec![name],
                        ..Default::default()
                    })]
            }
            DirectiveKind::Rubric => {
                let parts = split_directive(block, true);
                let title = joined(&parts.arguments).replace('\n', " ");
                let children = self.inline(&title, number);
                vec![Node::new(Tag::Rubric, Some(number))
                    .with_raw(raw)
                    .with_children(children)]
            }
            DirectiveKind::Image { figure } => {
                let parts = split_directive(block, true);
                let uri: String = parts.arguments.iter().map(|line| line.text.trim()).collect();
                let image = Node::new(Tag::Image, Some(number)).with_raw(uri);
                if figure {
                    let mut children = vec![image];
                    children.extend(self.parse_nested(&parts.content)?);
                    vec![Node::new(Tag::Container, Some(number))
                        .with_raw(raw)
                        .with_children(children)
                        .with_attributes(Attributes {
                            classes: vec![name],
                            ..Default::default()
                        })]
                } else {
                    vec![image]
                }
            }
            DirectiveKind::Table => vec![Node::new(Tag::Table, Some(number)).with_raw(raw)],
            DirectiveKind::Silent => Vec::new(),
        };
        Ok(nodes)
    }
}
