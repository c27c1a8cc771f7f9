use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use types::{OptimizeSummary, RoomFilter, WeeklyGrid};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
pub struct PlanningQuery {
    pub week: u32,
    pub year: i32,
    pub building: Option<String>,
    pub floor: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct OptimizeIn {
    pub week: u32,
    pub year: i32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

#[utoipa::path(
    get,
    path = "/v1/planning",
    params(PlanningQuery),
    responses(
        (status = 200, description = "Room-by-day grid of the week", body = WeeklyGrid),
        (status = 422, description = "Week out of range")
    )
)]
pub async fn weekly(
    State(state): State<AppState>,
    Query(q): Query<PlanningQuery>,
) -> Result<Json<WeeklyGrid>, ApiError> {
    let filter = RoomFilter {
        building: q.building,
        floor: q.floor,
    };
    let grid = state.planning.get_weekly_planning(q.week, q.year, &filter).await?;
    Ok(Json(grid))
}

#[utoipa::path(
    post,
    path = "/v1/planning/optimize",
    request_body = OptimizeIn,
    responses(
        (status = 200, description = "Rooms reassigned", body = OptimizeSummary),
        (status = 404, description = "No lessons in that week"),
        (status = 502, description = "Storage failure")
    )
)]
pub async fn optimize(
    State(state): State<AppState>,
    Json(input): Json<OptimizeIn>,
) -> Result<Json<OptimizeSummary>, ApiError> {
    let summary = state.planning.optimize_week(input.week, input.year).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/v1/planning/optimize/jobs",
    request_body = OptimizeIn,
    responses(
        (status = 202, description = "Optimization job enqueued", body = JobCreated),
        (status = 422, description = "Week out of range")
    )
)]
pub async fn enqueue_optimize(
    State(state): State<AppState>,
    Json(input): Json<OptimizeIn>,
) -> Result<(StatusCode, Json<JobCreated>), ApiError> {
    state.planning.resolve_week_range(input.week, input.year)?;
    let id = state.jobs.enqueue(input.week, input.year);
    Ok((
        StatusCode::ACCEPTED,
        Json(JobCreated {
            job_id: id.0,
            status: "queued",
        }),
    ))
}
