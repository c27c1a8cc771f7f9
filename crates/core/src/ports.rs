//! Collaborators the scheduling core reads from and writes to.
//!
//! Persistence, comfort telemetry and the teacher directory live outside the
//! core; these traits are the only way it reaches them.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;
use types::{
    ClassCohort, Lesson, LessonDetails, LessonId, Room, RoomAssignment, RoomComfortSnapshot,
    RoomFilter, RoomId, Teacher, TeacherId,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("{entity} {id} not found")]
    Missing { entity: &'static str, id: String },
    #[error("storage error: {0}")]
    Other(String),
}

/// Fields written back by a lesson edit.
#[derive(Clone, Debug, PartialEq)]
pub struct LessonChanges {
    pub title: String,
    pub teacher_id: TeacherId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub room_id: Option<RoomId>,
}

#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Lessons whose start lies in `[start, end]`, ordered by start.
    async fn list_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Lesson>, RepositoryError>;

    /// Applies every reassignment or none of them.
    async fn bulk_reassign_rooms(&self, changes: &[RoomAssignment]) -> Result<(), RepositoryError>;

    async fn get(&self, id: &LessonId) -> Result<Option<LessonDetails>, RepositoryError>;

    async fn update(&self, id: &LessonId, changes: LessonChanges) -> Result<(), RepositoryError>;

    async fn delete(&self, id: &LessonId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn list_enabled(&self, filter: &RoomFilter) -> Result<Vec<Room>, RepositoryError>;
}

#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn list_with_student_counts(&self) -> Result<Vec<ClassCohort>, RepositoryError>;
}

#[async_trait]
pub trait TeacherRepository: Send + Sync {
    async fn get(&self, id: &TeacherId) -> Result<Option<Teacher>, RepositoryError>;
}

/// Environmental readings per room. May fail or hang; callers fall back to
/// neutral scores.
#[async_trait]
pub trait ComfortSource: Send + Sync {
    async fn get_snapshots(&self, room_ids: &[RoomId]) -> Result<Vec<RoomComfortSnapshot>, RepositoryError>;
}

/// Comfort source for deployments without sensors.
pub struct NoComfortData;

#[async_trait]
impl ComfortSource for NoComfortData {
    async fn get_snapshots(&self, _room_ids: &[RoomId]) -> Result<Vec<RoomComfortSnapshot>, RepositoryError> {
        Ok(Vec::new())
    }
}
