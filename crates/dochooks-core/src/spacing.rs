//! Spacing between CJK and Latin characters.
//!
//! A CJK character (U+4E00..=U+9FA5) directly followed by a Latin letter or
//! digit, or the other way around, needs a space between them. Lines can opt
//! out with pragmas:
//!
//! - `dochooks: skip-line` skips the line that contains it.
//! - `dochooks: skip-next-line` skips the line after it.

use regex::Regex;
use std::sync::LazyLock;

const SKIP_LINE: &str = "dochooks: skip-line";
const SKIP_NEXT_LINE: &str = "dochooks: skip-next-line";

static CN_WITH_EN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<cn>[\x{4e00}-\x{9fa5}])(?P<en>[a-zA-Z0-9])").unwrap());
static EN_WITH_CN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<en>[a-zA-Z0-9])(?P<cn>[\x{4e00}-\x{9fa5}])").unwrap());

/// A line missing a space between CJK and Latin characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpacingIssue {
    /// 1-based line number.
    pub line: usize,
    /// The line text, trimmed. After formatting this is the fixed text.
    pub text: String,
}

/// Result of formatting a whole text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub text: String,
    pub issues: Vec<SpacingIssue>,
}

impl Formatted {
    /// Returns true if any line was changed.
    pub fn changed(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Returns true if `line` has a CJK and a Latin character side by side.
pub fn needs_spacing(line: &str) -> bool {
    CN_WITH_EN.is_match(line) || EN_WITH_CN.is_match(line)
}

/// Inserts a space between adjacent CJK and Latin characters.
pub fn format_text(text: &str) -> String {
    let text = CN_WITH_EN.replace_all(text, "${cn} ${en}");
    EN_WITH_CN.replace_all(&text, "${en} ${cn}").into_owned()
}

/// Tracks the skip pragmas across lines.
#[derive(Debug, Default)]
struct Pragmas {
    skip_next: bool,
}

impl Pragmas {
    /// Returns true if `line` is exempt, and arms the next-line pragma.
    fn skip(&mut self, line: &str) -> bool {
        let skip = self.skip_next || line.contains(SKIP_LINE);
        self.skip_next = line.contains(SKIP_NEXT_LINE);
        skip
    }
}

/// Finds the lines that need spacing.
pub fn check_lines<I, S>(lines: I) -> Vec<SpacingIssue>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pragmas = Pragmas::default();
    lines
        .into_iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = line.as_ref();
            if pragmas.skip(line) || !needs_spacing(line) {
                return None;
            }
            Some(SpacingIssue {
                line: index + 1,
                text: line.trim().to_string(),
            })
        })
        .collect()
}

/// Formats every line that needs spacing and joins the lines back.
///
/// Lines should keep their line terminators (see [`str::split_inclusive`]).
pub fn format_lines<I, S>(lines: I) -> Formatted
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pragmas = Pragmas::default();
    let mut text = String::new();
    let mut issues = Vec::new();
    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if pragmas.skip(line) || !needs_spacing(line) {
            text.push_str(line);
            continue;
        }
        let fixed = format_text(line);
        issues.push(SpacingIssue {
            line: index + 1,
            text: fixed.trim().to_string(),
        });
        text.push_str(&fixed);
    }
    Formatted { text, issues }
}
