//! In-memory collaborators: the default store of the server and the fixture
//! backing service tests.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use sched_core::ports::{
    ClassRepository, ComfortSource, LessonChanges, LessonRepository, RepositoryError,
    RoomRepository, TeacherRepository,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use types::{
    ClassCohort, Lesson, LessonDetails, LessonId, Room, RoomAssignment, RoomComfortSnapshot,
    RoomFilter, RoomId, Teacher, TeacherId,
};

/// Initial content of an [`InMemoryStore`], as read from a JSON seed file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub classes: Vec<ClassCohort>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<StoreSeed>,
}

impl InMemoryStore {
    pub fn new(seed: StoreSeed) -> Self {
        Self {
            state: RwLock::new(seed),
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RepositoryError::Unavailable(format!("{}: {e}", path.display())))?;
        let seed: StoreSeed = serde_json::from_str(&raw)
            .map_err(|e| RepositoryError::Other(format!("invalid seed {}: {e}", path.display())))?;
        Ok(Self::new(seed))
    }

    pub fn lesson(&self, id: &LessonId) -> Option<Lesson> {
        self.state.read().lessons.iter().find(|l| &l.id == id).cloned()
    }

    pub fn lessons(&self) -> Vec<Lesson> {
        self.state.read().lessons.clone()
    }
}

#[async_trait]
impl LessonRepository for InMemoryStore {
    async fn list_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Lesson>, RepositoryError> {
        let mut out: Vec<Lesson> = self
            .state
            .read()
            .lessons
            .iter()
            .filter(|l| start <= l.start && l.start <= end)
            .cloned()
            .collect();
        out.sort_by_key(|l| l.start);
        Ok(out)
    }

    async fn bulk_reassign_rooms(&self, changes: &[RoomAssignment]) -> Result<(), RepositoryError> {
        let mut state = self.state.write();
        let known: HashSet<&LessonId> = state.lessons.iter().map(|l| &l.id).collect();
        if let Some(missing) = changes.iter().find(|c| !known.contains(&c.lesson_id)) {
            return Err(RepositoryError::Missing {
                entity: "lesson",
                id: missing.lesson_id.to_string(),
            });
        }
        for change in changes {
            if let Some(l) = state.lessons.iter_mut().find(|l| l.id == change.lesson_id) {
                l.room_id = Some(change.room_id.clone());
            }
        }
        Ok(())
    }

    async fn get(&self, id: &LessonId) -> Result<Option<LessonDetails>, RepositoryError> {
        let state = self.state.read();
        let Some(lesson) = state.lessons.iter().find(|l| &l.id == id) else {
            return Ok(None);
        };
        Ok(Some(LessonDetails {
            room: lesson
                .room_id
                .as_ref()
                .and_then(|r| state.rooms.iter().find(|x| &x.id == r))
                .cloned(),
            class: state.classes.iter().find(|c| c.id == lesson.class_id).cloned(),
            teacher: state.teachers.iter().find(|t| t.id == lesson.teacher_id).cloned(),
            lesson: lesson.clone(),
        }))
    }

    async fn update(&self, id: &LessonId, changes: LessonChanges) -> Result<(), RepositoryError> {
        let mut state = self.state.write();
        let lesson = state
            .lessons
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| RepositoryError::Missing {
                entity: "lesson",
                id: id.to_string(),
            })?;
        lesson.title = changes.title;
        lesson.teacher_id = changes.teacher_id;
        lesson.start = changes.start;
        lesson.end = changes.end;
        lesson.room_id = changes.room_id;
        Ok(())
    }

    async fn delete(&self, id: &LessonId) -> Result<(), RepositoryError> {
        let mut state = self.state.write();
        let before = state.lessons.len();
        state.lessons.retain(|l| &l.id != id);
        if state.lessons.len() == before {
            return Err(RepositoryError::Missing {
                entity: "lesson",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn list_enabled(&self, filter: &RoomFilter) -> Result<Vec<Room>, RepositoryError> {
        Ok(self
            .state
            .read()
            .rooms
            .iter()
            .filter(|r| r.enabled && filter.matches(r))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ClassRepository for InMemoryStore {
    async fn list_with_student_counts(&self) -> Result<Vec<ClassCohort>, RepositoryError> {
        Ok(self.state.read().classes.clone())
    }
}

#[async_trait]
impl TeacherRepository for InMemoryStore {
    async fn get(&self, id: &TeacherId) -> Result<Option<Teacher>, RepositoryError> {
        Ok(self.state.read().teachers.iter().find(|t| &t.id == id).cloned())
    }
}

/// Fixed comfort readings, e.g. from a seed file or a test.
#[derive(Clone, Debug, Default)]
pub struct StaticComfortSource {
    snapshots: Vec<RoomComfortSnapshot>,
}

impl StaticComfortSource {
    pub fn new(snapshots: Vec<RoomComfortSnapshot>) -> Self {
        Self { snapshots }
    }
}

#[async_trait]
impl ComfortSource for StaticComfortSource {
    async fn get_snapshots(&self, room_ids: &[RoomId]) -> Result<Vec<RoomComfortSnapshot>, RepositoryError> {
        Ok(self
            .snapshots
            .iter()
            .filter(|s| room_ids.contains(&s.room_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn store() -> InMemoryStore {
        let lesson = |id: &str, day: u32| Lesson {
            id: id.into(),
            title: id.into(),
            start: at(day, 9),
            end: at(day, 10),
            class_id: "c1".into(),
            room_id: None,
            teacher_id: "t1".into(),
        };
        InMemoryStore::new(StoreSeed {
            lessons: vec![lesson("b", 5), lesson("a", 4)],
            rooms: vec![Room {
                id: "r1".into(),
                name: "R1".into(),
                capacity: 30,
                building: Some("A".into()),
                floor: Some(0),
                enabled: true,
            }],
            classes: vec![],
            teachers: vec![Teacher { id: "t1".into(), name: "Ada".into() }],
        })
    }

    #[tokio::test]
    async fn range_listing_is_sorted_and_inclusive() {
        let s = store();
        let all = s.list_in_range(at(4, 9), at(5, 9)).await.unwrap();
        let ids: Vec<_> = all.iter().map(|l| l.id.0.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn bulk_reassign_is_all_or_nothing() {
        let s = store();
        let bad = vec![
            RoomAssignment { lesson_id: "a".into(), room_id: "r1".into() },
            RoomAssignment { lesson_id: "ghost".into(), room_id: "r1".into() },
        ];
        assert!(s.bulk_reassign_rooms(&bad).await.is_err());
        assert_eq!(s.lesson(&"a".into()).unwrap().room_id, None);

        s.bulk_reassign_rooms(&bad[..1]).await.unwrap();
        assert_eq!(s.lesson(&"a".into()).unwrap().room_id, Some("r1".into()));
    }

    #[tokio::test]
    async fn get_joins_room_and_teacher() {
        let s = store();
        s.bulk_reassign_rooms(&[RoomAssignment { lesson_id: "a".into(), room_id: "r1".into() }])
            .await
            .unwrap();
        let d = LessonRepository::get(&s, &"a".into()).await.unwrap().unwrap();
        assert_eq!(d.room.unwrap().name, "R1");
        assert_eq!(d.teacher.unwrap().name, "Ada");
        assert!(d.class.is_none());
    }

    #[tokio::test]
    async fn delete_unknown_lesson_fails() {
        let s = store();
        assert!(s.delete(&"ghost".into()).await.is_err());
        s.delete(&"a".into()).await.unwrap();
        assert!(s.lesson(&"a".into()).is_none());
    }

    #[tokio::test]
    async fn static_comfort_filters_by_room() {
        let src = StaticComfortSource::new(vec![sched_core::scoring::comfort_snapshot(
            "r1".into(),
            21.0,
            50.0,
            1015.0,
        )]);
        assert_eq!(src.get_snapshots(&["r1".into()]).await.unwrap().len(), 1);
        assert!(src.get_snapshots(&["r2".into()]).await.unwrap().is_empty());
    }
}
