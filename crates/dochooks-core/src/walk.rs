//! Document discovery and path helpers.
//!
//! Explicit file arguments are taken as given. Directory arguments are
//! expanded to the documents below them with the `ignore` walker.

use ignore::WalkBuilder;
use log::{debug, trace};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Configuration for expanding directories into documents.
#[derive(Debug, Clone)]
pub struct DocumentWalkerConfig {
    /// Whether to include hidden files and directories (starting with `.`).
    /// Default: false
    pub include_hidden: bool,
    /// Whether to respect `.gitignore` rules (only works in git repos).
    /// Default: true
    pub respect_gitignore: bool,
    /// File extensions, without the dot, that count as documents.
    /// Default: `rst`
    pub extensions: Vec<String>,
}

impl Default for DocumentWalkerConfig {
    fn default() -> Self {
        Self {
            include_hidden: false,
            respect_gitignore: true,
            extensions: vec!["rst".to_string()],
        }
    }
}

impl DocumentWalkerConfig {
    /// Creates a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to include hidden files.
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Sets whether to respect .gitignore rules.
    pub fn with_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Sets the document extensions.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }
}

/// Expands `inputs` into a list of documents.
///
/// Files are kept in argument order. Each directory contributes its
/// documents in sorted order. Paths are not deduplicated.
pub fn collect_documents(inputs: &[PathBuf], config: &DocumentWalkerConfig) -> Vec<PathBuf> {
    let mut documents = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            documents.push(input.clone());
            continue;
        }

        debug!(
            "Walking {:?} (hidden={}, gitignore={}, extensions={:?})",
            input, config.include_hidden, config.respect_gitignore, config.extensions
        );
        let walker = WalkBuilder::new(input)
            .hidden(!config.include_hidden)
            .ignore(false)
            .git_ignore(config.respect_gitignore)
            .git_global(config.respect_gitignore)
            .git_exclude(config.respect_gitignore)
            .follow_links(false)
            .build();

        let mut found: Vec<PathBuf> = walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| config.is_document(path))
            .collect();
        found.sort();
        debug!("Found {} document(s) in {:?}", found.len(), input);
        trace!("Documents: {:?}", found);
        documents.extend(found);
    }
    documents
}

/// Normalizes a path lexically: drops `.` components and folds `..` into
/// the preceding component. The filesystem is not consulted, so symlinks
/// are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::create_dir_all(dir.path().join("api/paddle")).unwrap();
        File::create(dir.path().join("api/paddle/add_cn.rst")).unwrap();
        File::create(dir.path().join("api/paddle/abs_cn.rst")).unwrap();
        File::create(dir.path().join("api/paddle/README.md")).unwrap();
        File::create(dir.path().join("index_cn.rst")).unwrap();

        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        File::create(dir.path().join(".cache/stale_cn.rst")).unwrap();

        dir
    }

    fn names(paths: &[PathBuf], root: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn expands_directories_to_sorted_documents() {
        let dir = setup_test_dir();
        let docs = collect_documents(&[dir.path().to_path_buf()], &DocumentWalkerConfig::default());
        assert_eq!(
            names(&docs, dir.path()),
            vec!["api/paddle/abs_cn.rst", "api/paddle/add_cn.rst", "index_cn.rst"]
        );
    }

    #[test]
    fn include_hidden_documents() {
        let dir = setup_test_dir();
        let config = DocumentWalkerConfig::new().with_hidden(true);
        let docs = collect_documents(&[dir.path().to_path_buf()], &config);
        assert!(names(&docs, dir.path()).contains(&".cache/stale_cn.rst".to_string()));
    }

    #[test]
    fn explicit_files_are_kept_as_given() {
        let dir = setup_test_dir();
        let readme = dir.path().join("api/paddle/README.md");
        let missing = dir.path().join("missing.rst");
        let docs = collect_documents(&[readme.clone(), missing.clone()], &DocumentWalkerConfig::default());
        assert_eq!(docs, vec![readme, missing]);
    }

    #[test]
    fn custom_extensions() {
        let dir = setup_test_dir();
        let config = DocumentWalkerConfig::new().with_extensions(vec!["md".to_string()]);
        let docs = collect_documents(&[dir.path().join("api")], &config);
        assert_eq!(names(&docs, dir.path()), vec!["api/paddle/README.md"]);
    }

    #[test]
    fn normalizes_lexically() {
        assert_eq!(normalize_path(Path::new("docs/./api/../guide")), PathBuf::from("docs/guide"));
        assert_eq!(normalize_path(Path::new("../x/../y")), PathBuf::from("../y"));
        assert_eq!(normalize_path(Path::new("/a/../../b")), PathBuf::from("/b"));
        assert_eq!(normalize_path(Path::new("a/..")), PathBuf::from("."));
        assert_eq!(normalize_path(Path::new("")), PathBuf::from("."));
    }
}
