//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::io::{self, IsTerminal, Write};

use vypa_core::exit_codes;

use crate::harness::{
    BatchReporter, ConsoleReporter, HarnessConfig, JsonReporter, Runner, TestCaseSpec, ToolchainPaths,
};

use super::{Cli, CliError, CliResult, ExitCode, OutputFormat};

// ============================================================================
// Scenario selection
// ============================================================================

/// Registered scenarios whose name contains `filter`, in declared order.
pub fn select_cases(filter: Option<&str>) -> CliResult<Vec<TestCaseSpec>> {
    let cases: Vec<TestCaseSpec> = TestCaseSpec::registry()
        .into_iter()
        .filter(|spec| filter.is_none_or(|f| spec.name.contains(f)))
        .collect();
    if cases.is_empty() {
        return Err(CliError::failure(format!(
            "No scenarios match '{}'",
            filter.unwrap_or_default()
        )));
    }
    Ok(cases)
}

// ============================================================================
// Commands
// ============================================================================

/// Print the registered scenarios selected by `filter`.
pub fn list_cases(config: &HarnessConfig, filter: Option<&str>) -> CliResult<ExitCode> {
    let cases = select_cases(filter)?;
    let mut out = io::stdout().lock();
    for line in listing(config, &cases) {
        writeln!(out, "{}", line)
            .map_err(|e| CliError::failure(format!("Error: failed to write listing: {}", e)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// One line per scenario: id, fixture path, and the expected compiler exit.
fn listing(config: &HarnessConfig, cases: &[TestCaseSpec]) -> Vec<String> {
    cases
        .iter()
        .map(|spec| {
            format!(
                "{:<24} {:<28} compile {}",
                spec.name,
                config.cases_dir.join(&spec.source_file).display(),
                exit_codes::describe(spec.expected_compile_exit)
            )
        })
        .collect()
}

/// Run the selected scenarios against the toolchain named on the command line.
///
/// The exit code is the number of failed checks (saturated at 255).
pub fn run_batch(cli: &Cli) -> CliResult<ExitCode> {
    let (Some(compiler), Some(interpreter)) = (&cli.compiler, &cli.interpreter) else {
        return Err(CliError::failure("Error: COMPILER and INTERPRETER are required"));
    };
    let paths = ToolchainPaths::new(compiler, interpreter);
    let config = cli.harness_config();
    let cases = select_cases(cli.filter.as_deref())?;

    let runner = Runner::new(&paths, &config);
    runner.check_fixtures(&cases)?;

    let mut reporter: Box<dyn BatchReporter> = match cli.format {
        OutputFormat::Console => {
            let color = !cli.no_color && io::stdout().is_terminal();
            Box::new(ConsoleReporter::new(cli.verbose, color))
        }
        OutputFormat::Json => Box::new(JsonReporter::new()),
    };

    let report = runner.run_all(&cases, reporter.as_mut())?;
    Ok(ExitCode(report.exit_status()))
}

// ============================================================================
// Tests
// ============================================================================
