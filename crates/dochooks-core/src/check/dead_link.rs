//! Link target availability check.

use super::{CheckConfig, Checker, Diagnostics, LinkProbe, ValidationError};
use crate::parse::Node;
use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

static EXTERNAL_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.\-]+://").unwrap());

static HTTP_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://").unwrap());

/// Validates every resolved reference target of a document.
///
/// Links are only collected during the walk; they are probed when the
/// result is read, in document order, and the first dead link ends the
/// check. Links with schemes other than HTTP(S) are trusted.
#[derive(Debug)]
pub struct DeadLinkChecker {
    source: PathBuf,
    config: Arc<CheckConfig>,
    probe: Arc<LinkProbe>,
    links: Vec<(Option<usize>, String)>,
}

impl DeadLinkChecker {
    pub fn new(source: impl AsRef<Path>, config: Arc<CheckConfig>, probe: Arc<LinkProbe>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            config,
            probe,
            links: Vec::new(),
        }
    }

    /// Links collected so far, with their lines.
    pub fn links(&self) -> &[(Option<usize>, String)] {
        &self.links
    }

    fn check_link(&self, line: Option<usize>, link: &str) -> Result<(), ValidationError> {
        if EXTERNAL_LINK.is_match(link) {
            if !HTTP_LINK.is_match(link) {
                debug!("Skipping link with unknown scheme: {}", link);
                return Ok(());
            }
            if !self.config.check_external_links {
                debug!("Offline, skipping {}", link);
                return Ok(());
            }
            if !self.probe.http_link_available(link) {
                return Err(ValidationError::dead_http_link(link, line));
            }
            return Ok(());
        }

        let path = strip_query_and_fragment(link);
        if path.is_empty() {
            // A pure fragment points into this document.
            return Ok(());
        }
        if Path::new(path).has_root() {
            return Err(ValidationError::absolute_file_link(link, line));
        }
        if !self.probe.path_link_available(&self.source, path) {
            return Err(ValidationError::dead_file_link(link, line));
        }
        Ok(())
    }
}

fn strip_query_and_fragment(link: &str) -> &str {
    link.find(['?', '#']).map_or(link, |index| &link[..index])
}

impl Checker for DeadLinkChecker {
    fn name(&self) -> &'static str {
        "dead-link"
    }

    fn visit_reference(&mut self, node: &Node, _diagnostics: &mut Diagnostics) {
        if let Some(uri) = &node.attributes.refuri {
            self.links.push((node.line, uri.clone()));
        }
    }

    fn result(&self, diagnostics: &mut Diagnostics) -> bool {
        for (line, link) in &self.links {
            if let Err(error) = self.check_link(*line, link) {
                diagnostics.report(self.name(), error);
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{HttpClient, ProbeError, run_checker};
    use crate::parse::parse_rst;
    use std::fs;

    struct StaticClient;

    impl HttpClient for StaticClient {
        fn head(&self, url: &str) -> Result<u16, ProbeError> {
            Ok(if url.contains("gone") { 404 } else { 200 })
        }
    }

    fn check_in(dir: &Path, text: &str, config: CheckConfig) -> (bool, Vec<ValidationError>) {
        let source = dir.join("docs").join("add_cn.rst");
        let doc = parse_rst(text, &source.to_string_lossy()).unwrap();
        let probe = Arc::new(LinkProbe::new(Box::new(StaticClient)));
        let mut checker = DeadLinkChecker::new(doc.source_path(), Arc::new(config), probe);
        let report = run_checker(&mut checker, &doc);
        let errors = report.diagnostics.iter().map(|d| d.error.clone()).collect();
        (report.passed, errors)
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs/guide")).unwrap();
        fs::write(dir.path().join("docs/guide/index.md"), "# Guide").unwrap();
        fs::write(dir.path().join("docs/sub_cn.rst"), "sub\n===\n").unwrap();
        dir
    }

    #[test]
    fn existing_targets_pass() {
        let dir = fixture();
        let text = "See `guide <guide/>`_, `sub <sub_cn.html#anchor>`_, \
                    https://ok.example/ and `ftp <ftp://files.example/x>`_.\n";
        assert_eq!(check_in(dir.path(), text, CheckConfig::default()), (true, vec![]));
    }

    #[test]
    fn missing_relative_link_fails() {
        let dir = fixture();
        let (passed, errors) = check_in(
            dir.path(),
            "See `missing <../missing.rst>`_.\n",
            CheckConfig::default(),
        );
        assert!(!passed);
        assert_eq!(errors, vec![ValidationError::dead_file_link("../missing.rst", Some(1))]);
    }

    #[test]
    fn absolute_link_fails_even_if_it_exists() {
        let dir = fixture();
        let absolute = dir.path().join("docs/sub_cn.rst");
        let text = format!("See `abs <{}>`_ and `pw </etc/passwd>`_.\n", absolute.display());
        let (passed, errors) = check_in(dir.path(), &text, CheckConfig::default());
        assert!(!passed);
        assert!(matches!(&errors[..], [ValidationError::AbsoluteFileLink { .. }]));
    }

    #[test]
    fn first_dead_link_stops_the_check() {
        let dir = fixture();
        let text = "First https://gone.example/a\n\nthen `missing <nope.rst>`_.\n";
        let (passed, errors) = check_in(dir.path(), text, CheckConfig::default());
        assert!(!passed);
        assert_eq!(
            errors,
            vec![ValidationError::dead_http_link("https://gone.example/a", Some(1))]
        );
    }

    #[test]
    fn offline_mode_skips_http() {
        let dir = fixture();
        let text = "See https://gone.example/a.\n";
        let config = CheckConfig::default().with_check_external_links(false);
        assert_eq!(check_in(dir.path(), text, config), (true, vec![]));
    }

    #[test]
    fn named_targets_are_checked() {
        let dir = fixture();
        let text = "See `Guide`_ and Missing_.\n\n.. _Guide: guide/\n.. _Missing: ../missing.md\n";
        let (passed, errors) = check_in(dir.path(), text, CheckConfig::default());
        assert!(!passed);
        assert_eq!(errors, vec![ValidationError::dead_file_link("../missing.md", Some(1))]);
    }

    #[test]
    fn strips_query_and_fragment() {
        assert_eq!(strip_query_and_fragment("a.rst#x"), "a.rst");
        assert_eq!(strip_query_and_fragment("a.rst?x=1#y"), "a.rst");
        assert_eq!(strip_query_and_fragment("#top"), "");
        assert_eq!(strip_query_and_fragment("a.rst"), "a.rst");
    }
}
