//! Solver Driver & Objective (spec §4.5): assembles the MIP model from the
//! Variable Builder and Constraint Compiler, configures the HiGHS backend
//! with the run's time budget and worker count, and exposes the
//! infeasibility diagnostic mode (family bisection). Grounded on the
//! teacher's top-level `solve()` orchestration in `solver.rs` for the
//! model-assembly shape, and on
//! `original_source/app.py::test_combination`/`diagnostic_automatique` for
//! the bisection-over-disabled-families diagnostic driver.

use crate::config::Config;
use crate::constraints::{self, CompiledConstraints};
use crate::entity_store::Instance;
use crate::error::SolveOutcome;
use crate::extractor::{self, ExtractedSolution};
use crate::objective;
use crate::variables::{self, Variables};
use good_lp::{default_solver, ProblemVariables, SolverModel};
use itertools::Itertools;
use log::{info, warn};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    /// A feasible (optimal within the time budget, or proven optimal) solution was found.
    Optimal,
    /// The solver proved the instance infeasible within the time budget (`SolverInfeasible`).
    Infeasible,
    /// The time budget was exhausted without a feasible solution (`SolverTimeout`). Spec §7:
    /// this shares `Infeasible`'s caller-visible surface (same exit code / HTTP status) even
    /// though it is tracked separately for logging.
    Timeout,
    /// The underlying solver reported an internal error (`SolverError`), fatal.
    SolverError(String),
}

impl SolveStatus {
    /// Whether this status shares `SolverInfeasible`'s caller-visible surface
    /// (spec §7: `SolverTimeout` — "same surface as `SolverInfeasible`").
    pub fn is_infeasible_or_timeout(&self) -> bool {
        matches!(self, SolveStatus::Infeasible | SolveStatus::Timeout)
    }
}

pub struct SolveReport {
    pub status: SolveStatus,
    pub solution: Option<ExtractedSolution>,
}

/// Runs the full pipeline with every hard family enabled.
pub fn solve(instance: &Instance, config: &Config) -> SolveReport {
    solve_with_disabled(instance, config, &[])
}

/// Runs the pipeline with the named hard families skipped entirely — the
/// mechanism the infeasibility diagnostic mode bisects over.
pub fn solve_with_disabled(instance: &Instance, config: &Config, disabled: &[&str]) -> SolveReport {
    let mut pvars = ProblemVariables::new();
    let vars: Variables = variables::build(instance, &mut pvars);
    let base_constraints = variables::base_constraints(instance, &vars);
    let compiled: CompiledConstraints = constraints::build(instance, &vars, &mut pvars, config.late_threshold_offset);
    let objective_expr = objective::build(&compiled, config);

    info!(
        "assembling model: {} sessions, {} rooms, {} teachers, {} ordering rules, disabled={:?}",
        instance.sessions.len(),
        instance.rooms.len(),
        instance.teachers.len(),
        instance.ordering_rules.len(),
        disabled,
    );

    let mut model = pvars
        .minimise(objective_expr)
        .using(default_solver)
        .set_option("threads", config.workers as i32)
        .set_option("time_limit", config.time_budget_seconds as f64)
        .set_option("random_seed", 1234);

    for c in base_constraints {
        model.add_constraint(c);
    }
    for c in compiled.enabled_constraints(disabled) {
        model.add_constraint(c);
    }

    let started = Instant::now();
    match model.solve() {
        Ok(solution) => {
            let extracted = extractor::extract(instance, &vars, &solution);
            info!("solve succeeded with {} assignments", extracted.assignments.len());
            SolveReport { status: SolveStatus::Optimal, solution: Some(extracted) }
        }
        Err(e) => {
            let elapsed_secs = started.elapsed().as_secs_f64();
            match classify_solver_error(&e.to_string(), elapsed_secs, config.time_budget_seconds) {
                SolveOutcome::Infeasible => {
                    warn!("solver proved infeasible: {e}");
                    SolveReport { status: SolveStatus::Infeasible, solution: None }
                }
                SolveOutcome::Timeout(budget) => {
                    warn!("solver exhausted its {budget}s time budget without a feasible solution");
                    SolveReport { status: SolveStatus::Timeout, solution: None }
                }
                SolveOutcome::SolverError(message) => {
                    warn!("solver error: {message}");
                    SolveReport { status: SolveStatus::SolverError(message), solution: None }
                }
            }
        }
    }
}

/// Classifies a solver failure into the three-way `SolveOutcome` taxonomy
/// (spec §7). HiGHS reports infeasibility in the error message itself; a
/// genuine timeout carries no such marker, so it is distinguished by
/// comparing elapsed wall time against the configured budget (a half-second
/// margin absorbs model-assembly and solver start-up overhead that isn't
/// itself "search time").
fn classify_solver_error(message: &str, elapsed_secs: f64, time_budget_seconds: u64) -> SolveOutcome {
    if message.to_lowercase().contains("infeasible") {
        SolveOutcome::Infeasible
    } else if elapsed_secs >= time_budget_seconds as f64 - 0.5 {
        SolveOutcome::Timeout(time_budget_seconds)
    } else {
        SolveOutcome::SolverError(message.to_string())
    }
}

/// Infeasibility diagnostic mode (spec §4.5): tries disabling every
/// singleton, then every pair, then every triple of hard families, stopping
/// at the first combination that yields a non-infeasible result. Returns the
/// combination that unblocked the model, or `None` if no combination up to
/// size 3 helped (the instance likely has a more structural problem, e.g.
/// the Feasibility Diagnostic's own checks).
pub fn diagnose_infeasibility(instance: &Instance, config: &Config) -> Option<Vec<&'static str>> {
    for size in 1..=3 {
        for combo in constraints::HARD_FAMILIES.iter().copied().combinations(size) {
            let report = solve_with_disabled(instance, config, &combo);
            if !report.status.is_infeasible_or_timeout() {
                info!("diagnostic mode: disabling {combo:?} yields a feasible model");
                return Some(combo);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::raw::{RawGroup, RawInput, RawSession, RawTeacher, SessionKind};
    use std::collections::BTreeMap;

    fn scenario_a() -> Instance {
        // 1 day, K=4, no lunch, 1 room cap 30, 1 teacher, 1 session dur=2, group 25.
        let raw = RawInput {
            week_id: "w1".into(),
            days: Some(1),
            slots_per_day: Some(4),
            lunch_window: Some(Default::default()),
            sessions: vec![RawSession {
                id: "s1".into(),
                kind: SessionKind::Cm,
                subject: "M".into(),
                duration_slots: 2,
                group_ids: vec!["G1".into()],
                allowed_teacher_ids: vec!["t1".into()],
                allowed_room_ids: None,
            }],
            rooms: BTreeMap::from([("R1".to_string(), 30)]),
            teachers: vec![RawTeacher { id: "t1".into(), display_name: "A".into() }],
            groups: vec![RawGroup { id: "G1".into(), name: "G1".into(), parent_id: None, student_count: 25 }],
            teacher_availability: vec![],
            room_availability: vec![],
            group_availability: vec![],
            session_obligations: vec![],
        };
        crate::entity_store::load(raw, &Config::default()).unwrap()
    }

    #[test]
    fn classify_solver_error_recognizes_infeasible_message_regardless_of_elapsed_time() {
        let outcome = classify_solver_error("model proved Infeasible", 0.01, 300);
        assert_eq!(outcome, SolveOutcome::Infeasible);
    }

    #[test]
    fn classify_solver_error_treats_budget_exhaustion_without_infeasible_marker_as_timeout() {
        // HiGHS's own time-limit message doesn't contain "infeasible"; elapsed
        // time at (or past) the configured budget is the only signal.
        let outcome = classify_solver_error("reached time limit", 300.1, 300);
        assert_eq!(outcome, SolveOutcome::Timeout(300));
    }

    #[test]
    fn classify_solver_error_falls_back_to_generic_solver_error_when_neither_applies() {
        let outcome = classify_solver_error("unexpected internal solver failure", 0.01, 300);
        assert_eq!(outcome, SolveOutcome::SolverError("unexpected internal solver failure".to_string()));
    }

    #[test]
    fn solve_status_surface_equates_infeasible_and_timeout() {
        assert!(SolveStatus::Infeasible.is_infeasible_or_timeout());
        assert!(SolveStatus::Timeout.is_infeasible_or_timeout());
        assert!(!SolveStatus::Optimal.is_infeasible_or_timeout());
        assert!(!SolveStatus::SolverError("x".into()).is_infeasible_or_timeout());
    }

    #[test]
    fn scenario_a_is_feasible_and_starts_at_0_or_1() {
        let instance = scenario_a();
        let report = solve(&instance, &Config::default());
        assert_eq!(report.status, SolveStatus::Optimal);
        let solution = report.solution.unwrap();
        assert_eq!(solution.assignments.len(), 1);
        assert!(solution.assignments[0].start_offset == 0 || solution.assignments[0].start_offset == 1);
    }

    #[test]
    fn obligation_pins_the_session_to_its_required_start() {
        let raw = RawInput {
            week_id: "w1".into(),
            days: Some(2),
            slots_per_day: Some(8),
            lunch_window: Some([3, 4].into_iter().collect()),
            sessions: vec![RawSession {
                id: "s1".into(),
                kind: SessionKind::Exam,
                subject: "M".into(),
                duration_slots: 2,
                group_ids: vec!["G1".into()],
                allowed_teacher_ids: vec!["t1".into()],
                allowed_room_ids: None,
            }],
            rooms: BTreeMap::from([("R1".to_string(), 30)]),
            teachers: vec![RawTeacher { id: "t1".into(), display_name: "A".into() }],
            groups: vec![RawGroup { id: "G1".into(), name: "G1".into(), parent_id: None, student_count: 25 }],
            teacher_availability: vec![],
            room_availability: vec![],
            group_availability: vec![],
            session_obligations: vec![crate::model::raw::RawObligation {
                session_id: "s1".into(),
                day: 1,
                start_offset: 6,
            }],
        };
        let instance = crate::entity_store::load(raw, &Config::default()).unwrap();
        let report = solve(&instance, &Config::default());
        assert_eq!(report.status, SolveStatus::Optimal);
        let solution = report.solution.unwrap();
        assert_eq!(solution.assignments[0].day_index, 1);
        assert_eq!(solution.assignments[0].start_offset, 6);
    }
}
