//! CLI module for dochooks.
//!
//! Command-line argument parsing using Clap with environment variable
//! support. Every hook is a subcommand taking the files handed over by
//! pre-commit.

pub mod config;
pub mod http;
pub mod output;

use clap::{Args as ClapArgs, Parser, Subcommand};
use dochooks_core::check::CheckerKind;
use std::path::PathBuf;

/// pre-commit hooks for documentation.
///
/// Checks API reference documents against the documentation style, keeps
/// CJK and Latin characters apart and catches file names that collide on
/// case-insensitive filesystems.
#[derive(Parser, Debug)]
#[command(name = "dochooks")]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity level (-v for info, -vv for debug, -vvv for trace).
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check API reference documents against the documentation style.
    CheckApiDoc(CheckApiDocArgs),
    /// Report lines missing a space between CJK and Latin characters.
    CheckCnEnSpace(FilesArgs),
    /// Insert the missing spaces between CJK and Latin characters in place.
    FormatCnEnSpace(FilesArgs),
    /// Check for file names that conflict on case-insensitive filesystems.
    CheckCaseConflict(CaseConflictArgs),
}

#[derive(ClapArgs, Debug)]
pub struct CheckApiDocArgs {
    /// Documents to check. Directories are searched for `.rst` files.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Comma-separated list of checks to run, in order.
    /// Possible values: title, parameters, code-example, dead-link
    #[arg(long, env = "DOCHOOKS_CHECKS", value_delimiter = ',')]
    pub checks: Option<Vec<CheckerKind>>,

    /// Stop evaluating a document at the first failing check.
    #[arg(long)]
    pub abort_on_failure: bool,

    /// Do not probe HTTP(S) links.
    #[arg(long, env = "DOCHOOKS_OFFLINE")]
    pub offline: bool,

    /// Timeout in seconds for each HTTP(S) link probe. The HTTP client's
    /// default applies when unset.
    #[arg(long, env = "DOCHOOKS_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Include hidden files and directories when expanding directories.
    #[arg(long)]
    pub hidden: bool,

    /// Output results as JSON instead of human-readable format.
    #[arg(long, short = 'j')]
    pub json: bool,
}

impl CheckApiDocArgs {
    /// Returns the checks to run, defaulting to all checks.
    pub fn effective_checks(&self) -> Vec<CheckerKind> {
        self.checks.clone().unwrap_or_else(CheckerKind::all)
    }
}

#[derive(ClapArgs, Debug)]
pub struct FilesArgs {
    /// Files to process.
    pub paths: Vec<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct CaseConflictArgs {
    /// Files to check, usually the files of the current commit.
    pub paths: Vec<String>,

    /// Custom error message template; `{conflicts}` is replaced with the
    /// conflict groups.
    #[arg(long, env = "DOCHOOKS_CASE_CONFLICT_MESSAGE")]
    pub error_message: Option<String>,

    /// Do not merge in the files tracked by git.
    #[arg(long)]
    pub no_git: bool,
}

impl Args {
    /// Returns true if the selected command writes JSON to stdout.
    pub fn json_output(&self) -> bool {
        matches!(&self.command, Command::CheckApiDoc(args) if args.json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_doc_args(argv: &[&str]) -> CheckApiDocArgs {
        let args = Args::parse_from(argv);
        match args.command {
            Command::CheckApiDoc(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_default_checks() {
        let args = api_doc_args(&["dochooks", "check-api-doc", "add_cn.rst"]);
        assert_eq!(args.effective_checks(), CheckerKind::all());
        assert!(!args.abort_on_failure);
        assert!(!args.offline);
        assert_eq!(args.timeout, None);
    }

    #[test]
    fn test_specific_checks_keep_order() {
        let args = api_doc_args(&[
            "dochooks",
            "check-api-doc",
            "--checks",
            "dead-link,title",
            "add_cn.rst",
        ]);
        assert_eq!(
            args.effective_checks(),
            vec![CheckerKind::DeadLink, CheckerKind::Title]
        );
    }

    #[test]
    fn test_unknown_check_is_rejected() {
        let result = Args::try_parse_from(["dochooks", "check-api-doc", "--checks", "spelling", "a.rst"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_paths_are_required() {
        assert!(Args::try_parse_from(["dochooks", "check-api-doc"]).is_err());
        // pre-commit may pass no files to the other hooks
        assert!(Args::try_parse_from(["dochooks", "check-cn-en-space"]).is_ok());
    }

    #[test]
    fn test_flags() {
        let args = api_doc_args(&[
            "dochooks",
            "check-api-doc",
            "--abort-on-failure",
            "--offline",
            "--timeout",
            "3",
            "a.rst",
            "docs",
        ]);
        assert!(args.abort_on_failure);
        assert!(args.offline);
        assert_eq!(args.timeout, Some(3));
        assert_eq!(args.paths, vec![PathBuf::from("a.rst"), PathBuf::from("docs")]);
    }

    #[test]
    fn test_json_output_flag() {
        let args = Args::parse_from(["dochooks", "check-api-doc", "--json", "a.rst"]);
        assert!(args.json_output());

        let args = Args::parse_from(["dochooks", "check-api-doc", "-j", "a.rst"]);
        assert!(args.json_output());

        let args = Args::parse_from(["dochooks", "check-cn-en-space", "a.md"]);
        assert!(!args.json_output());
    }

    #[test]
    fn test_verbose_flag() {
        let args = Args::parse_from(["dochooks", "check-cn-en-space"]);
        assert_eq!(args.verbose, 0);

        let args = Args::parse_from(["dochooks", "-v", "check-cn-en-space"]);
        assert_eq!(args.verbose, 1);

        let args = Args::parse_from(["dochooks", "check-cn-en-space", "-vv"]);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_case_conflict_args() {
        let args = Args::parse_from([
            "dochooks",
            "check-case-conflict",
            "--no-git",
            "--error-message",
            "Conflicts: {conflicts}",
            "README.md",
            "readme.md",
        ]);
        match args.command {
            Command::CheckCaseConflict(args) => {
                assert!(args.no_git);
                assert_eq!(args.error_message.as_deref(), Some("Conflicts: {conflicts}"));
                assert_eq!(args.paths, vec!["README.md", "readme.md"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
