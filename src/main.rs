//! CLI entry point (spec §6): wires `clap` → `Config` → the library pipeline
//! and maps the result onto the exit codes the spec requires. Grounded on the
//! teacher's `main.rs` (`env_logger` init pattern) and
//! `bme-wacoisd-school-scheduling-rs`'s `clap` derive shape for this same
//! problem family (see DESIGN.md).

mod server;

use clap::{Parser, Subcommand};
use colloq::config::Config;
use colloq::error::CoreError;
use colloq::model::raw::RawInput;
use colloq::solver::SolveStatus;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "colloq", about = "Weekly timetable solver")]
struct Cli {
    /// Path to a TOML config file overlaying the built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a single week: read a `RawInput` JSON document, run the
    /// Feasibility Diagnostic, then the solver, and print the assignment
    /// table as JSON.
    Solve {
        /// Path to a `RawInput` JSON document; `-` or omitted reads stdin.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Week identifier to solve (required; spec §6 `--week`). Overrides
        /// the input document's `week_id` when both are present.
        #[arg(long)]
        week: String,
    },
    /// Run only the static Feasibility Diagnostic and print its report,
    /// without invoking the solver.
    Diagnose {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        week: String,
    },
    /// Serve the same pipeline over HTTP (spec §1: out-of-scope collaborators
    /// reach the core through this thin façade).
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
    },
}

fn read_input(path: Option<&PathBuf>) -> anyhow::Result<RawInput> {
    let text = match path {
        Some(p) if p.as_os_str() != "-" => std::fs::read_to_string(p)?,
        _ => std::io::read_to_string(std::io::stdin())?,
    };
    Ok(serde_json::from_str(&text)?)
}

fn load_instance(
    input: Option<PathBuf>,
    week: String,
    config: &Config,
) -> anyhow::Result<Result<colloq::entity_store::Instance, CoreError>> {
    let mut raw = read_input(input.as_ref())?;
    raw.week_id = week;
    Ok(colloq::entity_store::load(raw, config).map_err(CoreError::from))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind } => {
            let config = match Config::load(cli.config.as_deref()) {
                Ok(c) => c,
                Err(e) => {
                    log::error!("invalid configuration: {e}");
                    return ExitCode::from(2);
                }
            };
            let runtime = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
            runtime.block_on(server::run_server(bind, config));
            ExitCode::SUCCESS
        }
        Command::Diagnose { input, week } => {
            let config = match Config::load(cli.config.as_deref()) {
                Ok(c) => c,
                Err(e) => {
                    log::error!("invalid configuration: {e}");
                    return ExitCode::from(2);
                }
            };
            match load_instance(input, week, &config) {
                Ok(Ok(instance)) => {
                    let report = colloq::diagnostic::run(&instance);
                    print_diagnostic(&report);
                    if report.is_clean() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(1)
                    }
                }
                Ok(Err(e)) => {
                    log::error!("{e}");
                    ExitCode::from(2)
                }
                Err(e) => {
                    log::error!("reading input: {e}");
                    ExitCode::from(2)
                }
            }
        }
        Command::Solve { input, week } => {
            let config = match Config::load(cli.config.as_deref()) {
                Ok(c) => c,
                Err(e) => {
                    log::error!("invalid configuration: {e}");
                    return ExitCode::from(2);
                }
            };
            let instance = match load_instance(input, week, &config) {
                Ok(Ok(instance)) => instance,
                Ok(Err(e)) => {
                    log::error!("{e}");
                    return ExitCode::from(2);
                }
                Err(e) => {
                    log::error!("reading input: {e}");
                    return ExitCode::from(2);
                }
            };

            let diagnostic = colloq::diagnostic::run(&instance);
            if !diagnostic.is_clean() {
                log::warn!(
                    "static feasibility diagnostic found {} issue(s); proceeding so the solver can surface details",
                    diagnostic.issue_count()
                );
                print_diagnostic(&diagnostic);
            }

            let report = colloq::solver::solve(&instance, &config);
            match report.status {
                SolveStatus::Optimal => {
                    let solution = report.solution.expect("Optimal status always carries a solution");
                    match serde_json::to_string_pretty(&solution.assignments) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            log::error!("serializing assignments: {e}");
                            return ExitCode::from(2);
                        }
                    }
                    ExitCode::SUCCESS
                }
                SolveStatus::Infeasible => {
                    log::error!("solver proved the instance infeasible within the time budget");
                    if let Some(combo) = colloq::solver::diagnose_infeasibility(&instance, &config) {
                        log::error!("disabling constraint families {combo:?} would yield a feasible model");
                    }
                    ExitCode::from(1)
                }
                // SolverTimeout shares SolverInfeasible's surface (spec §7):
                // same exit code, same invitation to run the diagnostic mode.
                SolveStatus::Timeout => {
                    log::error!("time budget of {}s exhausted without a feasible solution", config.time_budget_seconds);
                    if let Some(combo) = colloq::solver::diagnose_infeasibility(&instance, &config) {
                        log::error!("disabling constraint families {combo:?} would yield a feasible model");
                    }
                    ExitCode::from(1)
                }
                SolveStatus::SolverError(message) => {
                    log::error!("solver error: {message}");
                    ExitCode::from(2)
                }
            }
        }
    }
}

fn print_diagnostic(report: &colloq::diagnostic::DiagnosticReport) {
    for issue in &report.no_valid_start {
        log::warn!("no valid start: session {} (duration {})", issue.session_id, issue.duration);
    }
    for issue in &report.no_adequate_room {
        log::warn!(
            "no adequate room: session {} requires capacity {}",
            issue.session_id,
            issue.required_size
        );
    }
    for issue in &report.group_overbooked {
        log::warn!(
            "group overbooked: {} needs {} slots but only {} are usable",
            issue.group_id,
            issue.required_slots,
            issue.usable_slots
        );
    }
}
