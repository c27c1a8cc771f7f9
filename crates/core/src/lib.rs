pub mod conflict;
pub mod interval;
pub mod ports;
pub mod scoring;
pub mod week;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

pub use ports::RepositoryError;
pub use types::{
    AssignmentDelta, ClassCohort, DateRange, Lesson, LessonId, OptimizeSummary, Room, RoomId,
    Teacher, TeacherId, TimeSlot,
};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("lesson {0} not found")]
    LessonNotFound(LessonId),
    #[error("teacher {0} not found")]
    TeacherNotFound(TeacherId),
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error("teacher {teacher} is already teaching at that time on {date}")]
    TeacherNotAvailable { teacher: TeacherId, date: NaiveDate },
    #[error("no lessons planned between {} and {}", .range.start, .range.end)]
    NoPlanningFound { range: DateRange },
    #[error("optimization failed: {0}")]
    OptimizationFailed(String),
    #[error("comfort data unavailable: {0}")]
    ComfortDataUnavailable(String),
    #[error("invalid week {week} of {year}")]
    InvalidWeek { week: u32, year: i32 },
    #[error("lesson must end after it starts")]
    InvalidTimeWindow,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ScheduleError {
    /// Lookup and validation failures, raised before anything is written.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ScheduleError::LessonNotFound(_)
                | ScheduleError::TeacherNotFound(_)
                | ScheduleError::RoomNotFound(_)
                | ScheduleError::TeacherNotAvailable { .. }
                | ScheduleError::InvalidWeek { .. }
                | ScheduleError::InvalidTimeWindow
        )
    }
}

/// Runs a full-week room optimization. Implemented by the planning service and
/// driven by the background job runner.
#[async_trait]
pub trait WeekOptimizer: Send + Sync + 'static {
    async fn optimize_week(&self, week: u32, year: i32) -> Result<OptimizeSummary, ScheduleError>;
}
