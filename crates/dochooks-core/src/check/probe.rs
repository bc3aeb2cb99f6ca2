//! Memoized availability checks for link targets.

use crate::walk::normalize_path;
use log::{debug, trace};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Files that make a directory-style link resolve.
const INDEX_FILES: [&str; 5] = ["index.rst", "index.md", "index.html", "README.rst", "README.md"];

/// Document formats a link may point to interchangeably.
const DOC_EXTENSIONS: [&str; 3] = ["rst", "md", "html"];

/// Errors raised while probing an HTTP link.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The request could not be sent or no response arrived.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The HTTP client could not be set up.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Sends HEAD requests on behalf of the dead link check.
pub trait HttpClient: Send + Sync {
    /// Returns the response status of a HEAD request to `url`.
    fn head(&self, url: &str) -> Result<u16, ProbeError>;
}

/// Answers whether HTTP and file link targets exist.
///
/// Answers are cached for the lifetime of the probe, so one probe shared
/// across documents checks each unique target once.
pub struct LinkProbe {
    client: Option<Box<dyn HttpClient>>,
    http_cache: Mutex<HashMap<String, bool>>,
    path_cache: Mutex<HashMap<(PathBuf, String), bool>>,
}

impl LinkProbe {
    /// Creates a probe that sends HTTP requests with `client`.
    pub fn new(client: Box<dyn HttpClient>) -> Self {
        Self {
            client: Some(client),
            http_cache: Mutex::new(HashMap::new()),
            path_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a probe without an HTTP client; HTTP links are treated as
    /// available.
    pub fn offline() -> Self {
        Self {
            client: None,
            http_cache: Mutex::new(HashMap::new()),
            path_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if `url` answers a HEAD request with a status below 400.
    pub fn http_link_available(&self, url: &str) -> bool {
        if let Some(&cached) = self
            .http_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
        {
            trace!("HTTP probe cache hit for {}", url);
            return cached;
        }

        let available = match &self.client {
            None => {
                debug!("No HTTP client, assuming {} is available", url);
                true
            }
            Some(client) => match client.head(url) {
                Ok(status) => {
                    debug!("HEAD {} -> {}", url, status);
                    status < 400
                }
                Err(error) => {
                    debug!("HEAD {} failed: {}", url, error);
                    false
                }
            },
        };
        self.http_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), available);
        available
    }

    /// Returns true if the relative `link` resolves from the directory of
    /// `source` to an existing target.
    pub fn path_link_available(&self, source: &Path, link: &str) -> bool {
        let base = source.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        let key = (base, link.to_string());
        if let Some(&cached) = self
            .path_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            trace!("Path probe cache hit for {}", link);
            return cached;
        }

        let available = path_target_exists(&key.0, link);
        debug!("Path link {} from {} -> {}", link, key.0.display(), available);
        self.path_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, available);
        available
    }
}

impl std::fmt::Debug for LinkProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkProbe")
            .field("client", &self.client.as_ref().map(|_| "<dyn HttpClient>"))
            .finish_non_exhaustive()
    }
}

fn path_target_exists(base: &Path, link: &str) -> bool {
    let path = normalize_path(&base.join(link));
    if link.ends_with('/') {
        return path.is_dir() || INDEX_FILES.iter().any(|name| path.join(name).exists());
    }

    let is_doc = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| DOC_EXTENSIONS.contains(&ext));
    if is_doc {
        path.exists()
            || DOC_EXTENSIONS
                .iter()
                .any(|ext| path.with_extension(ext).exists())
    } else {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClient {
        calls: Arc<AtomicUsize>,
    }

    impl HttpClient for CountingClient {
        fn head(&self, url: &str) -> Result<u16, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match url {
                "https://ok.example/" => Ok(200),
                "https://redirect.example/" => Ok(301),
                "https://gone.example/" => Ok(404),
                _ => Err(ProbeError::Transport {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    fn probe() -> (LinkProbe, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = LinkProbe::new(Box::new(CountingClient {
            calls: calls.clone(),
        }));
        (probe, calls)
    }

    #[test]
    fn http_status_decides_availability() {
        let (probe, _) = probe();
        assert!(probe.http_link_available("https://ok.example/"));
        assert!(probe.http_link_available("https://redirect.example/"));
        assert!(!probe.http_link_available("https://gone.example/"));
        assert!(!probe.http_link_available("https://down.example/"));
    }

    #[test]
    fn http_answers_are_memoized() {
        let (probe, calls) = probe();
        for _ in 0..3 {
            assert!(!probe.http_link_available("https://gone.example/"));
        }
        assert!(probe.http_link_available("https://ok.example/"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn offline_probe_accepts_http_links() {
        assert!(LinkProbe::offline().http_link_available("https://gone.example/"));
    }

    #[test]
    fn file_links_resolve_from_document_directory() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir_all(docs.join("guide")).unwrap();
        fs::create_dir_all(docs.join("empty")).unwrap();
        fs::write(docs.join("guide/index.md"), "# Guide").unwrap();
        fs::write(dir.path().join("overview.md"), "# Overview").unwrap();
        fs::write(docs.join("image.png"), b"").unwrap();
        let source = docs.join("add_cn.rst");
        let probe = LinkProbe::offline();

        assert!(probe.path_link_available(&source, "guide/"));
        assert!(probe.path_link_available(&source, "empty/"));
        assert!(!probe.path_link_available(&source, "nowhere/"));
        assert!(probe.path_link_available(&source, "../overview.md"));
        assert!(probe.path_link_available(&source, "../overview.rst"));
        assert!(probe.path_link_available(&source, "../overview.html"));
        assert!(!probe.path_link_available(&source, "../missing.rst"));
        assert!(probe.path_link_available(&source, "./image.png"));
        assert!(!probe.path_link_available(&source, "image.jpg"));
    }

    #[test]
    fn file_answers_are_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("doc.rst");
        let probe = LinkProbe::offline();
        assert!(!probe.path_link_available(&source, "later.rst"));
        fs::write(dir.path().join("later.rst"), "").unwrap();
        assert!(!probe.path_link_available(&source, "later.rst"));
    }
}
