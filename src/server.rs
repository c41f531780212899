//! Thin HTTP façade over the timetabling pipeline (spec §1: the visual
//! timetable, the constraint-editor front-end, and persistence are external
//! collaborators — this module is the boundary they talk to). Grounded on
//! the teacher's `server.rs` (`axum` route + `solve_handler` shape).

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use colloq::config::Config;
use colloq::error::CoreError;
use colloq::extractor::Assignment;
use colloq::model::raw::RawInput;
use colloq::solver::SolveStatus;
use std::sync::Arc;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

async fn solve_handler(
    State(state): State<AppState>,
    Json(raw): Json<RawInput>,
) -> Result<Json<Vec<Assignment>>, (StatusCode, String)> {
    let instance = colloq::entity_store::load(raw, &state.config)
        .map_err(CoreError::from)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let report = colloq::solver::solve(&instance, &state.config);
    match report.status {
        SolveStatus::Optimal => Ok(Json(report.solution.expect("Optimal carries a solution").assignments)),
        SolveStatus::Infeasible => Err((StatusCode::CONFLICT, "solver proved the instance infeasible".into())),
        // SolverTimeout shares SolverInfeasible's surface (spec §7): same
        // HTTP status as a proven infeasibility.
        SolveStatus::Timeout => Err((StatusCode::CONFLICT, "time budget exhausted without a feasible solution".into())),
        SolveStatus::SolverError(message) => Err((StatusCode::INTERNAL_SERVER_ERROR, message)),
    }
}

pub async fn run_server(bind: String, config: Config) {
    let state = AppState { config: Arc::new(config) };
    let app = Router::new()
        .route("/v1/schedule/solve", post(solve_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .unwrap_or_else(|e| panic!("binding {bind}: {e}"));

    log::info!("listening on http://{}", listener.local_addr().expect("bound listener has a local addr"));
    axum::serve(listener, app).await.expect("server loop exited unexpectedly");
}
