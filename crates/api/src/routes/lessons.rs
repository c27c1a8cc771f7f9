use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use types::{LessonEditOutcome, LessonId, LessonUpdate};

#[utoipa::path(
    put,
    path = "/v1/lessons/{id}",
    params(("id" = String, Path, description = "Lesson ID")),
    request_body = LessonUpdate,
    responses(
        (status = 200, description = "Lesson updated; room re-optimization reported separately", body = LessonEditOutcome),
        (status = 404, description = "Unknown lesson or teacher"),
        (status = 409, description = "Teacher already busy at that time"),
        (status = 422, description = "End not after start")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<LessonUpdate>,
) -> Result<Json<LessonEditOutcome>, ApiError> {
    let outcome = state.edits.update_lesson(&LessonId(id), update).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    delete,
    path = "/v1/lessons/{id}",
    params(("id" = String, Path, description = "Lesson ID")),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 404, description = "Unknown lesson")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.edits.delete_lesson(&LessonId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
