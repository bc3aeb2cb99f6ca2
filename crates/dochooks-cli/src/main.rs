//! dochooks CLI
//!
//! pre-commit hooks for API reference documentation.

use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode as StdExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

mod cli;

use cli::config::{ExitCode, ValidatedConfig};
use cli::output::{DocumentResult, DocumentResults, HumanOutput};
use cli::{Args, CaseConflictArgs, CheckApiDocArgs, Command};
use dochooks_core::case_conflict::{
    DEFAULT_ERROR_MESSAGE, find_case_conflicts, format_conflicts, relevant_conflicts, render_message,
};
use dochooks_core::check::{CheckerFactory, chain_factory, check_document};
use dochooks_core::parse::parse_rst;
use dochooks_core::spacing::{check_lines, format_lines};

fn main() -> StdExitCode {
    let args = Args::parse();

    init_tracing(args.verbose, args.json_output());

    let exit_code = run(args);

    StdExitCode::from(i32::from(exit_code) as u8)
}

/// Initialize tracing based on verbosity level.
fn init_tracing(verbosity: u8, json_output: bool) {
    // Don't output logs when using JSON output mode
    if json_output {
        return;
    }

    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "hyper_util=warn", "reqwest=warn"] {
        if let Ok(directive) = directive.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

/// Run the selected hook.
fn run(args: Args) -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();

    match &args.command {
        Command::CheckApiDoc(args) => run_check_api_doc(args, &mut stdout, &mut stderr),
        Command::CheckCnEnSpace(args) => check_spacing(&args.paths, &mut stdout, &mut stderr),
        Command::FormatCnEnSpace(args) => format_spacing(&args.paths, &mut stdout, &mut stderr),
        Command::CheckCaseConflict(args) => {
            let tracked = if args.no_git { Vec::new() } else { git_ls_files() };
            check_case_conflict(args, &tracked, &mut stdout)
        }
    }
}

/// Check API reference documents.
fn run_check_api_doc<O: Write, E: Write>(
    args: &CheckApiDocArgs,
    stdout: &mut O,
    stderr: &mut E,
) -> ExitCode {
    let use_colors = !args.json && io::stdout().is_terminal();

    let config = match ValidatedConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            let _ = HumanOutput::new(&mut *stderr, use_colors).write_error(&e.to_string());
            return ExitCode::StartupFailure;
        }
    };
    debug!("Validated configuration: {:?}", config);

    let probe = match config.link_probe() {
        Ok(probe) => probe,
        Err(e) => {
            let _ = HumanOutput::new(&mut *stderr, use_colors).write_error(&e.to_string());
            return ExitCode::StartupFailure;
        }
    };

    let factory = chain_factory(
        &config.checks,
        config.abort_on_failure,
        Arc::new(config.check_config.clone()),
        Arc::new(probe),
    );

    let mut results = DocumentResults::new();
    for path in &config.documents {
        results.add(check_file(&factory, path));
    }
    info!("Checked {} document(s), {} failed", results.len(), results.failed());

    let written = if config.json_output {
        results.write_json(stdout)
    } else {
        results.write_human(stdout, use_colors)
    };
    if let Err(e) = written {
        error!("Failed to write output: {}", e);
        return ExitCode::StartupFailure;
    }

    config.exit_code_for_results(results.failed())
}

/// Read, parse and check one document.
fn check_file(factory: &CheckerFactory, path: &Path) -> DocumentResult {
    let source = path.to_string_lossy().into_owned();
    info!("Checking {}", source);

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", source, e);
            return DocumentResult::failed(source, format!("failed to read document: {}", e));
        }
    };

    match parse_rst(&content, &source) {
        Ok(document) => DocumentResult::from_report(source, check_document(factory, &document)),
        Err(e) => {
            warn!("Failed to parse {}: {}", source, e);
            DocumentResult::failed(source, e.to_string())
        }
    }
}

/// Report lines missing CJK/Latin spacing.
fn check_spacing<O: Write, E: Write>(
    paths: &[PathBuf],
    stdout: &mut O,
    stderr: &mut E,
) -> ExitCode {
    let mut exit_code = ExitCode::Success;
    for path in paths {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                let message = format!("failed to read '{}': {}", path.display(), e);
                let _ = HumanOutput::new(&mut *stderr, false).write_error(&message);
                exit_code = exit_code.combine(ExitCode::StartupFailure);
                continue;
            }
        };

        let issues = check_lines(content.split_inclusive('\n'));
        debug!("{}: {} line(s) need spacing", path.display(), issues.len());
        let mut output = HumanOutput::new(&mut *stdout, false);
        for issue in &issues {
            let _ = output.write_missing_space(path, issue);
        }
        if !issues.is_empty() {
            exit_code = exit_code.combine(ExitCode::ValidationFailed);
        }
    }
    exit_code
}

/// Insert missing CJK/Latin spaces in place.
fn format_spacing<O: Write, E: Write>(
    paths: &[PathBuf],
    stdout: &mut O,
    stderr: &mut E,
) -> ExitCode {
    let mut exit_code = ExitCode::Success;
    let mut changed = false;
    for path in paths {
        let result = std::fs::read_to_string(path).and_then(|content| {
            let formatted = format_lines(content.split_inclusive('\n'));
            if formatted.changed() {
                std::fs::write(path, &formatted.text)?;
            }
            Ok(formatted)
        });
        let formatted = match result {
            Ok(formatted) => formatted,
            Err(e) => {
                let message = format!("failed to format '{}': {}", path.display(), e);
                let _ = HumanOutput::new(&mut *stderr, false).write_error(&message);
                exit_code = exit_code.combine(ExitCode::StartupFailure);
                continue;
            }
        };

        let mut output = HumanOutput::new(&mut *stdout, false);
        for issue in &formatted.issues {
            let _ = output.write_added_space(path, issue);
        }
        if formatted.changed() {
            info!("Formatted {}", path.display());
            changed = true;
            exit_code = exit_code.combine(ExitCode::ValidationFailed);
        }
    }

    if changed {
        let _ = HumanOutput::new(&mut *stdout, false).write_format_notice();
    }
    exit_code
}

/// Files tracked by git in the current directory; empty outside a repository.
fn git_ls_files() -> Vec<String> {
    match std::process::Command::new("git").arg("ls-files").output() {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect(),
        Ok(output) => {
            debug!("git ls-files exited with {}", output.status);
            Vec::new()
        }
        Err(e) => {
            debug!("git ls-files failed: {}", e);
            Vec::new()
        }
    }
}

/// Report case conflicts involving the given files.
fn check_case_conflict<O: Write>(
    args: &CaseConflictArgs,
    tracked: &[String],
    stdout: &mut O,
) -> ExitCode {
    if args.paths.is_empty() {
        return ExitCode::Success;
    }

    let conflicts = find_case_conflicts(args.paths.iter().chain(tracked));
    let relevant = relevant_conflicts(conflicts, &args.paths);
    if relevant.is_empty() {
        return ExitCode::Success;
    }

    let template = args.error_message.as_deref().unwrap_or(DEFAULT_ERROR_MESSAGE);
    let message = render_message(template, &format_conflicts(&relevant, &args.paths));
    if let Err(e) = writeln!(stdout, "{}", message) {
        error!("Failed to write output: {}", e);
    }
    ExitCode::ValidationFailed
}
