//! Inline markup recognition.
//!
//! Inline constructs follow the reStructuredText recognition rules: a
//! start-string must begin the text or follow whitespace or punctuation and
//! be followed by non-whitespace; an end-string must follow non-whitespace and
//! be followed by whitespace, punctuation or the end of the text. CJK
//! punctuation counts as punctuation, CJK letters do not.

use super::grammar::{Grammar, RoleKind};
use super::node::{Attributes, Node, Tag};
use super::report::Reporter;

/// URI schemes recognized as standalone hyperlinks.
const URI_SCHEMES: &[&str] = &[
    "http", "https", "ftp", "ftps", "sftp", "file", "mailto", "git", "ssh", "svn", "news",
    "nntp", "telnet", "irc", "ircs", "ws", "wss", "tel", "data",
];

/// Normalizes a reference name: collapses whitespace and lowercases.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parses inline markup in `text`, whose first character sits on `first_line`.
pub(crate) fn parse_inline(
    text: &str,
    first_line: usize,
    grammar: &Grammar,
    reporter: &mut Reporter,
) -> Vec<Node> {
    Inliner::new(text, first_line, grammar, reporter).run()
}

/// Removes escaping backslashes. Escaped whitespace disappears entirely.
pub(crate) fn unescape(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut iter = chars.iter().peekable();
    while let Some(&c) = iter.next() {
        if c == '\\' {
            match iter.next() {
                Some(&next) if next.is_whitespace() => {}
                Some(&next) => out.push(next),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn is_cjk_or_general_punctuation(c: char) -> bool {
    matches!(
        c as u32,
        0x2010..=0x2027
            | 0x2030..=0x205E
            | 0x3001..=0x303F
            | 0xFF01..=0xFF0F
            | 0xFF1A..=0xFF20
            | 0xFF3B..=0xFF40
            | 0xFF5B..=0xFF65
    ) || matches!(c, '«' | '»' | '¡' | '¿' | '·')
}

fn is_ascii_delimiter(c: char) -> bool {
    matches!(
        c,
        '-' | '/' | ':' | '!' | '"' | '#' | '%' | '&' | '\'' | '*' | ',' | '.' | ';' | '?' | '@'
            | '\\'
    )
}

fn is_start_prefix(c: char) -> bool {
    c.is_whitespace()
        || matches!(c, '(' | '[' | '{' | '<')
        || is_ascii_delimiter(c)
        || is_cjk_or_general_punctuation(c)
}

fn is_end_suffix(c: char) -> bool {
    c.is_whitespace()
        || matches!(c, ')' | ']' | '}' | '>')
        || is_ascii_delimiter(c)
        || is_cjk_or_general_punctuation(c)
}

fn matching_closer(opener: char) -> Option<char> {
    let closer = match opener {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        '\'' => '\'',
        '"' => '"',
        '“' => '”',
        '‘' => '’',
        '«' => '»',
        '（' => '）',
        '【' => '】',
        '《' => '》',
        '「' => '」',
        '『' => '』',
        _ => return None,
    };
    Some(closer)
}

/// Characters allowed inside a standalone URI.
fn is_uri_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-_.!~*'()[];/:@&=+$,%#?".contains(c)
}

/// Characters a standalone URI may end with.
fn is_uri_last(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_~*/=+#".contains(c)
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric()
}

enum Scan {
    Matched(Vec<Node>, usize),
    /// A start-string without an end-string; scanning resumes at the index.
    Unterminated(usize),
    None,
}

struct Inliner<'a> {
    chars: Vec<char>,
    lines: Vec<usize>,
    grammar: &'a Grammar,
    reporter: &'a mut Reporter,
    nodes: Vec<Node>,
}

impl<'a> Inliner<'a> {
    fn new(text: &str, first_line: usize, grammar: &'a Grammar, reporter: &'a mut Reporter) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut lines = Vec::with_capacity(chars.len() + 1);
        let mut line = first_line;
        for &c in &chars {
            lines.push(line);
            if c == '\n' {
                line += 1;
            }
        }
        lines.push(line);
        Self {
            chars,
            lines,
            grammar,
            reporter,
            nodes: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Node> {
        let n = self.chars.len();
        let mut pending = 0;
        let mut i = 0;
        while i < n {
            if self.chars[i] == '\\' {
                i += 2;
                continue;
            }
            if self.start_allowed(i) {
                match self.scan_markup(i) {
                    Scan::Matched(nodes, end) => {
                        self.flush(pending, i);
                        self.nodes.extend(nodes);
                        i = end;
                        pending = end;
                        continue;
                    }
                    Scan::Unterminated(resume) => {
                        i = resume;
                        continue;
                    }
                    Scan::None => {}
                }
            }
            i += 1;
        }
        self.flush(pending, n);
        self.nodes
    }

    fn line(&self, index: usize) -> usize {
        self.lines[index.min(self.lines.len() - 1)]
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn starts_with(&self, index: usize, pattern: &str) -> bool {
        let mut at = index;
        for c in pattern.chars() {
            if self.chars.get(at) != Some(&c) {
                return false;
            }
            at += 1;
        }
        true
    }

    fn is_escaped(&self, index: usize) -> bool {
        let mut count = 0;
        let mut at = index;
        while at > 0 && self.chars[at - 1] == '\\' {
            count += 1;
            at -= 1;
        }
        count % 2 == 1
    }

    fn start_allowed(&self, index: usize) -> bool {
        index == 0 || is_start_prefix(self.chars[index - 1])
    }

    fn end_allowed(&self, index: usize) -> bool {
        match self.chars.get(index) {
            None => true,
            Some(&c) => is_end_suffix(c),
        }
    }

    /// Checks the character right after a start-string.
    fn content_starts_ok(&self, construct_start: usize, content_start: usize) -> bool {
        let Some(&first) = self.chars.get(content_start) else {
            return false;
        };
        if first.is_whitespace() {
            return false;
        }
        if construct_start > 0 {
            if let Some(closer) = matching_closer(self.chars[construct_start - 1]) {
                if first == closer {
                    return false;
                }
            }
        }
        true
    }

    /// Finds an end-string at or after `from` that satisfies the end rules.
    fn find_end(&self, from: usize, end: &str, escapable: bool) -> Option<usize> {
        let len = end.chars().count();
        let n = self.chars.len();
        let mut j = from;
        while j + len <= n {
            if self.starts_with(j, end)
                && j > 0
                && !self.chars[j - 1].is_whitespace()
                && !(escapable && self.is_escaped(j))
                && self.end_allowed(j + len)
            {
                return Some(j);
            }
            j += 1;
        }
        None
    }

    fn flush(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let text = unescape(&self.chars[start..end]);
        if text.is_empty() {
            return;
        }
        let node = Node::text(text, Some(self.line(start))).with_raw(self.slice(start, end));
        self.nodes.push(node);
    }

    fn scan_markup(&mut self, i: usize) -> Scan {
        match self.chars[i] {
            '*' if self.starts_with(i, "**") => self.delimited(i, "**", Tag::Strong, "strong"),
            '*' => self.delimited(i, "*", Tag::Emphasis, "emphasis"),
            '`' if self.starts_with(i, "``") => self.literal(i),
            '`' => self.interpreted(i, i, None),
            '_' if self.starts_with(i, "_`") => self.inline_target(i),
            ':' => self.role_prefix(i),
            '|' => self.substitution_reference(i),
            '[' => self.footnote_reference(i),
            c if is_word(c) => self.standalone(i),
            _ => Scan::None,
        }
    }

    fn delimited(&mut self, i: usize, delimiter: &str, tag: Tag, label: &str) -> Scan {
        let len = delimiter.len();
        let start = i + len;
        if !self.content_starts_ok(i, start) {
            return Scan::None;
        }
        match self.find_end(start + 1, delimiter, true) {
            Some(j) => {
                let raw = self.slice(i, j + len);
                let text = unescape(&self.chars[start..j]);
                let node = Node::with_text(tag, Some(self.line(i)), raw, text);
                Scan::Matched(vec![node], j + len)
            }
            None => {
                let line = self.line(i);
                self.reporter.warning(
                    line,
                    format!("Inline {} start-string without end-string.", label),
                );
                Scan::Unterminated(start)
            }
        }
    }

    fn literal(&mut self, i: usize) -> Scan {
        let start = i + 2;
        if !self.content_starts_ok(i, start) {
            return Scan::None;
        }
        match self.find_end(start + 1, "``", false) {
            Some(j) => {
                let raw = self.slice(i, j + 2);
                let text = self.slice(start, j);
                let node = Node::with_text(Tag::Literal, Some(self.line(i)), raw, text);
                Scan::Matched(vec![node], j + 2)
            }
            None => {
                let line = self.line(i);
                self.reporter
                    .warning(line, "Inline literal start-string without end-string.");
                Scan::Unterminated(start)
            }
        }
    }

    fn inline_target(&mut self, i: usize) -> Scan {
        let start = i + 2;
        if !self.content_starts_ok(i, start) {
            return Scan::None;
        }
        match self.find_end(start + 1, "`", true) {
            Some(j) => {
                let text = unescape(&self.chars[start..j]);
                let node = Node::with_text(Tag::Target, Some(self.line(i)), self.slice(i, j + 1), text.clone())
                    .with_attributes(Attributes {
                        names: vec![normalize_name(&text)],
                        ..Default::default()
                    });
                Scan::Matched(vec![node], j + 1)
            }
            None => {
                let line = self.line(i);
                self.reporter
                    .warning(line, "Inline target start-string without end-string.");
                Scan::Unterminated(start)
            }
        }
    }

    /// Scans a simple name starting at `from`, returning its end.
    fn simplename_end(&self, from: usize) -> Option<usize> {
        let n = self.chars.len();
        if from >= n || !is_word(self.chars[from]) {
            return None;
        }
        let mut j = from;
        while j < n && is_word(self.chars[j]) {
            j += 1;
        }
        while j + 1 < n && "-._+:".contains(self.chars[j]) && is_word(self.chars[j + 1]) {
            j += 1;
            while j < n && is_word(self.chars[j]) {
                j += 1;
            }
        }
        Some(j)
    }

    /// Scans a `:name:` role marker starting at `from`, returning the name and its end.
    fn role_marker(&self, from: usize) -> Option<(String, usize)> {
        if self.chars.get(from) != Some(&':') {
            return None;
        }
        let name_end = self.simplename_end(from + 1)?;
        if self.chars.get(name_end) != Some(&':') {
            return None;
        }
        Some((self.slice(from + 1, name_end), name_end + 1))
    }

    fn role_prefix(&mut self, i: usize) -> Scan {
        match self.role_marker(i) {
            Some((name, end)) if self.chars.get(end) == Some(&'`') && !self.starts_with(end, "``") => {
                self.interpreted(i, end, Some(name))
            }
            _ => Scan::None,
        }
    }

    /// Interpreted text or phrase reference whose opening backquote is at `tick`.
    fn interpreted(&mut self, start: usize, tick: usize, prefix: Option<String>) -> Scan {
        let content_start = tick + 1;
        if !self.content_starts_ok(start, content_start) {
            return Scan::None;
        }
        let n = self.chars.len();
        let mut j = content_start + 1;
        while j < n {
            if self.chars[j] == '`'
                && !self.chars[j - 1].is_whitespace()
                && !self.is_escaped(j)
                && self.chars.get(j + 1) != Some(&'`')
            {
                let mut k = j + 1;
                let suffix = match self.role_marker(k) {
                    Some((name, end)) => {
                        k = end;
                        Some(name)
                    }
                    None => None,
                };
                let reference = if self.starts_with(k, "__") {
                    k += 2;
                    Some(true)
                } else if self.starts_with(k, "_") {
                    k += 1;
                    Some(false)
                } else {
                    None
                };
                if self.end_allowed(k) {
                    return self.finish_interpreted(start, content_start, j, k, prefix, suffix, reference);
                }
            }
            j += 1;
        }
        let line = self.line(start);
        self.reporter.warning(
            line,
            "Inline interpreted text or phrase reference start-string without end-string.",
        );
        Scan::Unterminated(content_start)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_interpreted(
        &mut self,
        start: usize,
        content_start: usize,
        content_end: usize,
        end: usize,
        prefix: Option<String>,
        suffix: Option<String>,
        reference: Option<bool>,
    ) -> Scan {
        let line = self.line(start);
        let raw = self.slice(start, end);
        let role = match (prefix, suffix) {
            (Some(_), Some(_)) => {
                self.reporter
                    .error(line, "Multiple roles in interpreted text (both prefix and suffix present; only one allowed).");
                return Scan::Matched(vec![problematic(line, raw)], end);
            }
            (role, None) | (None, role) => role,
        };

        if let Some(anonymous) = reference {
            if role.is_some() {
                self.reporter.error(
                    line,
                    "Mismatch: both interpreted text role and reference suffix.",
                );
                return Scan::Matched(vec![problematic(line, raw)], end);
            }
            let node = self.phrase_reference(content_start, content_end, anonymous, line, raw);
            return Scan::Matched(vec![node], end);
        }

        let text = unescape(&self.chars[content_start..content_end]);
        let node = match role {
            None => Node::with_text(Tag::TitleReference, Some(line), raw, text),
            Some(name) => match self.grammar.role(&name) {
                Some(RoleKind::Inline(tag)) => Node::with_text(tag, Some(line), raw, text),
                Some(RoleKind::Opaque) => {
                    let name = name.to_lowercase();
                    Node::with_text(Tag::Literal, Some(line), raw, text).with_attributes(Attributes {
                        classes: vec![name.clone()],
                        role_name: Some(name),
                        ..Default::default()
                    })
                }
                None => {
                    self.reporter
                        .error(line, format!("Unknown interpreted text role \"{}\".", name));
                    problematic(line, raw)
                }
            },
        };
        Scan::Matched(vec![node], end)
    }

    fn phrase_reference(
        &self,
        content_start: usize,
        content_end: usize,
        anonymous: bool,
        line: usize,
        raw: String,
    ) -> Node {
        let content = &self.chars[content_start..content_end];
        let mut attributes = Attributes {
            anonymous,
            ..Default::default()
        };

        let embedded = if content.last() == Some(&'>') && !self.is_escaped(content_end - 1) {
            content
                .iter()
                .rposition(|&c| c == '<')
                .filter(|&p| p == 0 || content[p - 1].is_whitespace())
        } else {
            None
        };

        let text = match embedded {
            Some(p) => {
                let target = &content[p + 1..content.len() - 1];
                let label = unescape(&content[..p]).trim().to_string();
                let alias = target.len() > 1
                    && target.last() == Some(&'_')
                    && !self.is_escaped(content_start + p + target.len());
                let target_text: String = unescape(target).split_whitespace().collect();
                if alias {
                    attributes.refname =
                        Some(normalize_name(target_text.trim_end_matches('_')));
                } else {
                    attributes.refuri = Some(target_text.clone());
                }
                if label.is_empty() { target_text } else { label }
            }
            None => {
                let text = unescape(content);
                if !anonymous {
                    attributes.refname = Some(normalize_name(&text));
                }
                text
            }
        };

        Node::with_text(Tag::Reference, Some(line), raw, text).with_attributes(attributes)
    }

    fn substitution_reference(&mut self, i: usize) -> Scan {
        let start = i + 1;
        if !self.content_starts_ok(i, start) {
            return Scan::None;
        }
        let n = self.chars.len();
        let mut j = start + 1;
        while j < n {
            if self.chars[j] == '|' && !self.chars[j - 1].is_whitespace() && !self.is_escaped(j) {
                let mut k = j + 1;
                if self.starts_with(k, "__") {
                    k += 2;
                } else if self.starts_with(k, "_") {
                    k += 1;
                }
                if self.end_allowed(k) {
                    let text = unescape(&self.chars[start..j]);
                    let node = Node::with_text(
                        Tag::SubstitutionReference,
                        Some(self.line(i)),
                        self.slice(i, k),
                        text.clone(),
                    )
                    .with_attributes(Attributes {
                        refname: Some(normalize_name(&text)),
                        ..Default::default()
                    });
                    return Scan::Matched(vec![node], k);
                }
            }
            j += 1;
        }
        let line = self.line(i);
        self.reporter
            .warning(line, "Inline substitution_reference start-string without end-string.");
        Scan::Unterminated(start)
    }

    fn footnote_reference(&mut self, i: usize) -> Scan {
        let n = self.chars.len();
        let mut j = i + 1;
        while j < n && self.chars[j] != ']' && !self.chars[j].is_whitespace() {
            j += 1;
        }
        if j >= n || self.chars[j] != ']' || !self.starts_with(j + 1, "_") {
            return Scan::None;
        }
        let label = self.slice(i + 1, j);
        let valid = label == "*"
            || label == "#"
            || (!label.is_empty() && label.chars().all(|c| c.is_ascii_digit()))
            || label
                .strip_prefix('#')
                .map(|rest| self.is_simplename(rest))
                .unwrap_or(false)
            || self.is_simplename(&label);
        if !valid || !self.end_allowed(j + 2) {
            return Scan::None;
        }
        let node = Node::with_text(
            Tag::FootnoteReference,
            Some(self.line(i)),
            self.slice(i, j + 2),
            label.clone(),
        )
        .with_attributes(Attributes {
            refname: Some(normalize_name(&label)),
            ..Default::default()
        });
        Scan::Matched(vec![node], j + 2)
    }

    fn is_simplename(&self, text: &str) -> bool {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() || !is_word(chars[0]) || !is_word(chars[chars.len() - 1]) {
            return false;
        }
        chars
            .windows(2)
            .all(|w| is_word(w[0]) || (is_word(w[1]) && "-._+:".contains(w[0])))
            && chars.iter().all(|&c| is_word(c) || "-._+:".contains(c))
    }

    /// Standalone URIs, email addresses and `name_` references.
    fn standalone(&mut self, i: usize) -> Scan {
        if let Some(scan) = self.standalone_uri(i) {
            return scan;
        }
        if let Some(scan) = self.email(i) {
            return scan;
        }
        self.simple_reference(i)
    }

    fn standalone_uri(&self, i: usize) -> Option<Scan> {
        let n = self.chars.len();
        let mut j = i;
        while j < n && (self.chars[j].is_ascii_alphanumeric() || "+.-".contains(self.chars[j])) {
            j += 1;
        }
        if j == i || !self.chars[i].is_ascii_alphabetic() || self.chars.get(j) != Some(&':') {
            return None;
        }
        let scheme = self.slice(i, j).to_lowercase();
        if !URI_SCHEMES.contains(&scheme.as_str()) {
            return None;
        }
        let body_start = j + 1;
        let mut end = body_start;
        while end < n && is_uri_char(self.chars[end]) {
            end += 1;
        }
        while end > body_start && !is_uri_last(self.chars[end - 1]) {
            end -= 1;
        }
        if end == body_start || !self.end_allowed(end) {
            return None;
        }
        let uri = self.slice(i, end);
        let node = Node::with_text(Tag::Reference, Some(self.line(i)), uri.clone(), uri.clone())
            .with_attributes(Attributes {
                refuri: Some(uri),
                ..Default::default()
            });
        Some(Scan::Matched(vec![node], end))
    }

    fn email(&self, i: usize) -> Option<Scan> {
        let n = self.chars.len();
        let is_local = |c: char| c.is_ascii_alphanumeric() || "._%+-".contains(c);
        let is_domain = |c: char| c.is_ascii_alphanumeric() || c == '-';

        let mut j = i;
        while j < n && is_local(self.chars[j]) {
            j += 1;
        }
        if j == i || self.chars.get(j) != Some(&'@') {
            return None;
        }
        let mut end = j + 1;
        let mut labels = 0;
        loop {
            let label_start = end;
            while end < n && is_domain(self.chars[end]) {
                end += 1;
            }
            if end == label_start {
                return None;
            }
            labels += 1;
            if end + 1 < n && self.chars[end] == '.' && is_domain(self.chars[end + 1]) {
                end += 1;
            } else {
                break;
            }
        }
        if labels < 2 || !self.end_allowed(end) {
            return None;
        }
        let address = self.slice(i, end);
        let node = Node::with_text(Tag::Reference, Some(self.line(i)), address.clone(), address.clone())
            .with_attributes(Attributes {
                refuri: Some(format!("mailto:{}", address)),
                ..Default::default()
            });
        Some(Scan::Matched(vec![node], end))
    }

    fn simple_reference(&self, i: usize) -> Scan {
        let Some(name_end) = self.simplename_end(i) else {
            return Scan::None;
        };
        let (end, anonymous) = if self.starts_with(name_end, "__") {
            (name_end + 2, true)
        } else if self.starts_with(name_end, "_") {
            (name_end + 1, false)
        } else {
            return Scan::None;
        };
        if !self.end_allowed(end) {
            return Scan::None;
        }
        let name = self.slice(i, name_end);
        let mut attributes = Attributes {
            anonymous,
            ..Default::default()
        };
        if !anonymous {
            attributes.refname = Some(normalize_name(&name));
        }
        let node = Node::with_text(Tag::Reference, Some(self.line(i)), self.slice(i, end), name)
            .with_attributes(attributes);
        Scan::Matched(vec![node], end)
    }
}

fn problematic(line: usize, raw: String) -> Node {
    Node::with_text(Tag::Problematic, Some(line), raw.clone(), raw)
}
