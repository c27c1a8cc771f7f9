pub mod lesson_edit;
pub mod memory;
pub mod weekly;

use sched_core::ports::{ClassRepository, ComfortSource, LessonRepository, RoomRepository, TeacherRepository};
use std::sync::Arc;

pub use lesson_edit::LessonEditService;
pub use weekly::{PlanningSettings, WeeklyPlanningService};

/// Handles on the external collaborators shared by the planning services.
#[derive(Clone)]
pub struct Collaborators {
    pub lessons: Arc<dyn LessonRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub classes: Arc<dyn ClassRepository>,
    pub teachers: Arc<dyn TeacherRepository>,
    pub comfort: Arc<dyn ComfortSource>,
}

impl Collaborators {
    /// Every repository served by one in-memory store.
    pub fn in_memory(store: Arc<memory::InMemoryStore>, comfort: Arc<dyn ComfortSource>) -> Self {
        Self {
            lessons: store.clone(),
            rooms: store.clone(),
            classes: store.clone(),
            teachers: store,
            comfort,
        }
    }
}
