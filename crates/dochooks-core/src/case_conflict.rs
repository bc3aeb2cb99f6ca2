//! Detection of paths that collide on case-insensitive filesystems.

use crate::walk::normalize_path;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Message printed when conflicts are found; `{conflicts}` is replaced with
/// the formatted conflict groups.
pub const DEFAULT_ERROR_MESSAGE: &str = "\
The following files would conflict on case-insensitive filesystems (e.g., APFS, NTFS):

{conflicts}

To fix this, you can:
1. Rename one of the conflicting files to have a different name
2. Use a case-sensitive filesystem
3. Avoid using files that differ only in case

Example conflict:
  existing: README.md
  new file: readme.md  # This would conflict!

Fix by renaming to: readme_lower.md or README_upper.md
";

/// Conflict groups keyed by the lowercased path. Every group holds at least
/// two distinct spellings.
pub type CaseConflicts = BTreeMap<String, Vec<String>>;

fn normalize(path: &str) -> String {
    normalize_path(Path::new(path)).to_string_lossy().into_owned()
}

/// Groups `paths` by their lowercased, normalized form and keeps the groups
/// with more than one distinct path.
pub fn find_case_conflicts<I, S>(paths: I) -> CaseConflicts
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: CaseConflicts = BTreeMap::new();
    for path in paths {
        let normalized = normalize(path.as_ref());
        let group = groups.entry(normalized.to_lowercase()).or_default();
        if !group.contains(&normalized) {
            group.push(normalized);
        }
    }
    groups.retain(|_, group| group.len() > 1);
    groups
}

/// Keeps only the groups that contain one of `inputs`.
pub fn relevant_conflicts<S: AsRef<str>>(conflicts: CaseConflicts, inputs: &[S]) -> CaseConflicts {
    let inputs: HashSet<String> = inputs.iter().map(|p| normalize(p.as_ref())).collect();
    conflicts
        .into_iter()
        .filter(|(_, group)| group.iter().any(|path| inputs.contains(path)))
        .collect()
}

/// Renders conflict groups, lowercase spellings first, marking paths that
/// are part of `inputs`.
pub fn format_conflicts<S: AsRef<str>>(conflicts: &CaseConflicts, inputs: &[S]) -> String {
    let inputs: HashSet<String> = inputs.iter().map(|p| normalize(p.as_ref())).collect();
    let mut lines = Vec::new();
    for (lower, group) in conflicts {
        lines.push(format!("Conflict group (lowercase: {lower}):"));
        let mut sorted: Vec<&String> = group.iter().collect();
        sorted.sort_by_key(|path| (path.to_lowercase() != **path, (*path).clone()));
        for path in sorted {
            let marker = if inputs.contains(path) { " [current commit]" } else { "" };
            lines.push(format!("  - {path}{marker}"));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Fills a message template with the formatted conflicts.
pub fn render_message(template: &str, conflicts: &str) -> String {
    template.replace("{conflicts}", conflicts.trim_end())
}
