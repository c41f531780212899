//! Error taxonomy for the timetabling core (spec §7). The compiler never
//! recovers locally: every failure mode here is a returned value, not a panic.

use thiserror::Error;

/// Malformed or inconsistent input. Fatal: the solver is never invoked.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("session {0}: missing required field `{1}`")]
    MissingField(String, &'static str),

    #[error("session {0}: duration must be >= 1 slot, got {1}")]
    NonPositiveDuration(String, i64),

    #[error("dangling reference: {kind} `{id}` referenced by {referrer} does not exist")]
    DanglingReference {
        kind: &'static str,
        id: String,
        referrer: String,
    },

    #[error("session {0} has no legal teacher among the configured teacher list")]
    NoLegalTeacher(String),

    #[error("session {0} resolves to an empty allowed-room set (explicit room list is empty or no rooms are configured)")]
    NoAdequateRoom(String),

    #[error("room `{0}` has non-positive capacity {1}")]
    NonPositiveCapacity(String, i64),

    #[error("days and slots_per_day must both be >= 1, got days={0} slots_per_day={1}")]
    InvalidGridDimensions(i64, i64),

    #[error("lunch window offset {0} falls outside [0, slots_per_day)")]
    LunchWindowOutOfRange(i64),
}

/// The three non-fatal solver-side outcomes, attached to a result rather than
/// thrown: the caller decides whether to log-and-continue or abort. Used by
/// `solver::classify_solver_error` to tell a genuine timeout (spec §7:
/// `SolverTimeout` shares `SolverInfeasible`'s caller-visible surface) apart
/// from an infeasibility proof and from an unrelated solver failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveOutcome {
    #[error("solver proved the instance infeasible within the time budget")]
    Infeasible,

    #[error("time budget of {0}s exhausted without a feasible solution")]
    Timeout(u64),

    #[error("underlying solver reported an internal error: {0}")]
    SolverError(String),
}

/// Top-level error returned by the CLI / HTTP edge.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("static feasibility diagnostic found {0} blocking issue(s); aborting before solve")]
    StaticInfeasible(usize),
}
