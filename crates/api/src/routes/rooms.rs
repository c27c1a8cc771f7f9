use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use types::{RoomId, TimeSlot};
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
pub struct SlotsQuery {
    /// `YYYY-MM-DD`
    #[param(value_type = String)]
    pub date: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}/slots",
    params(("id" = String, Path, description = "Room ID"), SlotsQuery),
    responses(
        (status = 200, description = "Free and occupied slots of the day", body = [TimeSlot]),
        (status = 404, description = "Unknown or disabled room")
    )
)]
pub async fn day_slots(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<SlotsQuery>,
) -> Result<Json<Vec<TimeSlot>>, ApiError> {
    let slots = state.planning.day_slots(&RoomId(id), q.date).await?;
    Ok(Json(slots))
}
