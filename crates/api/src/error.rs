use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use sched_core::ScheduleError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub ScheduleError);

impl From<ScheduleError> for ApiError {
    fn from(e: ScheduleError) -> Self {
        Self(e)
    }
}

pub fn status_of(e: &ScheduleError) -> StatusCode {
    match e {
        ScheduleError::LessonNotFound(_)
        | ScheduleError::TeacherNotFound(_)
        | ScheduleError::RoomNotFound(_)
        | ScheduleError::NoPlanningFound { .. } => StatusCode::NOT_FOUND,
        ScheduleError::TeacherNotAvailable { .. } => StatusCode::CONFLICT,
        ScheduleError::InvalidWeek { .. } | ScheduleError::InvalidTimeWindow => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ScheduleError::OptimizationFailed(_)
        | ScheduleError::ComfortDataUnavailable(_)
        | ScheduleError::Repository(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_of(&self.0);
        if self.0.is_rejection() {
            tracing::info!(error = %self.0, %status, "request rejected");
        } else {
            tracing::error!(error = %self.0, %status, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
