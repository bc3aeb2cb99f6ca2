//! Configuration handling for the CLI.
//!
//! This module converts CLI arguments into the library's configuration types.

use crate::cli::CheckApiDocArgs;
use crate::cli::http::ReqwestClient;
use dochooks_core::check::{CheckConfig, CheckerKind, LinkProbe, ProbeError};
use dochooks_core::walk::{DocumentWalkerConfig, collect_documents};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A path given on the command line does not exist.
    #[error("path '{0}' does not exist")]
    MissingPath(PathBuf),

    /// The HTTP client for link probing could not be created.
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExitCode {
    /// Every document passed.
    Success = 0,
    /// At least one document failed a check, or files were reformatted.
    ValidationFailed = 1,
    /// Startup failed (wrong configuration or unreadable input).
    StartupFailure = 2,
}

impl ExitCode {
    /// Combines the outcome of two units of work, keeping the worse one.
    pub fn combine(self, other: ExitCode) -> ExitCode {
        self.max(other)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Validated and processed configuration for `check-api-doc`.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Documents to check, directories already expanded.
    pub documents: Vec<PathBuf>,
    /// Which checks to run, in order.
    pub checks: Vec<CheckerKind>,
    /// Stop evaluating a document at the first failing check.
    pub abort_on_failure: bool,
    /// Configuration shared by the checkers.
    pub check_config: CheckConfig,
    /// Timeout of a single HTTP(S) probe, if overridden.
    pub timeout: Option<Duration>,
    /// Whether to output JSON.
    pub json_output: bool,
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments.
    pub fn from_args(args: &CheckApiDocArgs) -> Result<Self, ConfigError> {
        let checks = args.effective_checks();
        if checks.is_empty() {
            return Err(ConfigError::Invalid("no checks selected".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = checks.iter().find(|kind| !seen.insert(**kind)) {
            return Err(ConfigError::Invalid(format!(
                "check '{}' selected more than once",
                duplicate
            )));
        }

        if args.timeout == Some(0) {
            return Err(ConfigError::Invalid("timeout must be at least 1 second".to_string()));
        }

        if let Some(missing) = args.paths.iter().find(|path| !path.exists()) {
            return Err(ConfigError::MissingPath(missing.clone()));
        }

        let walker_config = DocumentWalkerConfig::new().with_hidden(args.hidden);
        let documents = collect_documents(&args.paths, &walker_config);

        let check_config = CheckConfig::new().with_check_external_links(!args.offline);

        Ok(Self {
            documents,
            checks,
            abort_on_failure: args.abort_on_failure,
            check_config,
            timeout: args.timeout.map(Duration::from_secs),
            json_output: args.json,
        })
    }

    /// Returns true if HTTP(S) links will be probed.
    pub fn probes_http(&self) -> bool {
        self.check_config.check_external_links && self.checks.contains(&CheckerKind::DeadLink)
    }

    /// Creates the link probe shared by all documents. Without HTTP probing
    /// no client is built.
    pub fn link_probe(&self) -> Result<LinkProbe, ConfigError> {
        if !self.probes_http() {
            return Ok(LinkProbe::offline());
        }
        let client = ReqwestClient::new(self.timeout)?;
        Ok(LinkProbe::new(Box::new(client)))
    }

    /// Determines the exit code from the number of failed documents.
    pub fn exit_code_for_results(&self, failed_documents: usize) -> ExitCode {
        if failed_documents > 0 {
            ExitCode::ValidationFailed
        } else {
            ExitCode::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, Command};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_docs() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("api/paddle")).unwrap();
        fs::write(dir.path().join("api/paddle/add_cn.rst"), "add\n---\n").unwrap();
        fs::write(dir.path().join("api/paddle/abs_cn.rst"), "abs\n---\n").unwrap();
        fs::write(dir.path().join("api/paddle/notes.md"), "# notes\n").unwrap();
        dir
    }

    fn config_from(argv: &[&str]) -> Result<ValidatedConfig, ConfigError> {
        match Args::parse_from(argv).command {
            Command::CheckApiDoc(args) => ValidatedConfig::from_args(&args),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::ValidationFailed), 1);
        assert_eq!(i32::from(ExitCode::StartupFailure), 2);
    }

    #[test]
    fn test_exit_code_combine_keeps_worst() {
        assert_eq!(ExitCode::Success.combine(ExitCode::Success), ExitCode::Success);
        assert_eq!(
            ExitCode::ValidationFailed.combine(ExitCode::Success),
            ExitCode::ValidationFailed
        );
        assert_eq!(
            ExitCode::ValidationFailed.combine(ExitCode::StartupFailure),
            ExitCode::StartupFailure
        );
    }

    #[test]
    fn test_directories_are_expanded() {
        let dir = create_test_docs();
        let root = dir.path().to_str().unwrap();
        let config = config_from(&["dochooks", "check-api-doc", root]).unwrap();
        let names: Vec<_> = config
            .documents
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["abs_cn.rst", "add_cn.rst"]);
    }

    #[test]
    fn test_missing_path() {
        let dir = create_test_docs();
        let missing = dir.path().join("missing_cn.rst");
        let result = config_from(&["dochooks", "check-api-doc", missing.to_str().unwrap()]);
        assert!(matches!(result, Err(ConfigError::MissingPath(path)) if path == missing));
    }

    #[test]
    fn test_duplicate_checks_are_rejected() {
        let dir = create_test_docs();
        let result = config_from(&[
            "dochooks",
            "check-api-doc",
            "--checks",
            "title,title",
            dir.path().to_str().unwrap(),
        ]);
        assert!(result.unwrap_err().to_string().contains("more than once"));
    }

    #[test]
    fn test_offline_disables_http_probing() {
        let dir = create_test_docs();
        let root = dir.path().to_str().unwrap();

        let config = config_from(&["dochooks", "check-api-doc", root]).unwrap();
        assert!(config.probes_http());

        let config = config_from(&["dochooks", "check-api-doc", "--offline", root]).unwrap();
        assert!(!config.check_config.check_external_links);
        assert!(!config.probes_http());

        let config = config_from(&["dochooks", "check-api-doc", "--checks", "title", root]).unwrap();
        assert!(!config.probes_http());
    }

    #[test]
    fn test_exit_code_for_results() {
        let dir = create_test_docs();
        let config =
            config_from(&["dochooks", "check-api-doc", dir.path().to_str().unwrap()]).unwrap();
        assert_eq!(config.exit_code_for_results(0), ExitCode::Success);
        assert_eq!(config.exit_code_for_results(2), ExitCode::ValidationFailed);
    }

    #[test]
    fn test_timeout_is_only_set_when_given() {
        let dir = create_test_docs();
        let root = dir.path().to_str().unwrap();

        let config = config_from(&["dochooks", "check-api-doc", root]).unwrap();
        assert_eq!(config.timeout, None);

        let config = config_from(&["dochooks", "check-api-doc", "--timeout", "3", root]).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));

        let result = config_from(&["dochooks", "check-api-doc", "--timeout", "0", root]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
