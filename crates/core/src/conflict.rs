use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use types::{Lesson, LessonId, RoomId, TeacherId};

use crate::interval::overlaps;
use crate::ScheduleError;

/// True when `teacher_id` already teaches something overlapping `[new_start, new_end)`
/// on `date`. The candidate lesson itself is ignored.
pub fn has_teacher_conflict(
    teacher_id: &TeacherId,
    new_start: NaiveDateTime,
    new_end: NaiveDateTime,
    date: NaiveDate,
    candidate: &LessonId,
    day_lessons: &[Lesson],
) -> bool {
    let mut idx = OccupancyIndex::new();
    for l in day_lessons.iter().filter(|l| l.date() == date) {
        idx.book_teacher(l);
    }
    idx.teacher_conflict(teacher_id, new_start, new_end, candidate)
        .is_some()
}

/// Same check as [`has_teacher_conflict`], as a validation step.
pub fn ensure_teacher_available(
    teacher_id: &TeacherId,
    new_start: NaiveDateTime,
    new_end: NaiveDateTime,
    candidate: &LessonId,
    day_lessons: &[Lesson],
) -> Result<(), ScheduleError> {
    let date = new_start.date();
    if has_teacher_conflict(teacher_id, new_start, new_end, date, candidate, day_lessons) {
        return Err(ScheduleError::TeacherNotAvailable {
            teacher: teacher_id.clone(),
            date,
        });
    }
    Ok(())
}

/// True when no lesson mapped to `room_id` in `assignments` overlaps the window.
///
/// One-shot form of [`OccupancyIndex::room_is_free`]; the optimizer keeps an
/// index and books rooms into it as it goes instead.
pub fn is_room_free(
    room_id: &RoomId,
    new_start: NaiveDateTime,
    new_end: NaiveDateTime,
    assignments: &HashMap<LessonId, RoomId>,
    all_lessons: &[Lesson],
) -> bool {
    let mut idx = OccupancyIndex::new();
    for l in all_lessons {
        if assignments.get(&l.id) == Some(room_id) {
            idx.book_room(room_id, l);
        }
    }
    idx.room_is_free(room_id, new_start, new_end)
}

#[derive(Clone, Debug)]
struct Booking {
    lesson: LessonId,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// Room and teacher exclusivity kept as two independent interval maps.
#[derive(Clone, Debug, Default)]
pub struct OccupancyIndex {
    by_room: HashMap<RoomId, Vec<Booking>>,
    by_teacher: HashMap<TeacherId, Vec<Booking>>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every lesson by teacher, and by room where a room is set.
    pub fn from_lessons(lessons: &[Lesson]) -> Self {
        let mut idx = Self::new();
        for l in lessons {
            idx.book_teacher(l);
            if let Some(room) = &l.room_id {
                idx.book_room(room, l);
            }
        }
        idx
    }

    pub fn book_room(&mut self, room: &RoomId, lesson: &Lesson) {
        self.by_room.entry(room.clone()).or_default().push(Booking {
            lesson: lesson.id.clone(),
            start: lesson.start,
            end: lesson.end,
        });
    }

    pub fn book_teacher(&mut self, lesson: &Lesson) {
        self.by_teacher
            .entry(lesson.teacher_id.clone())
            .or_default()
            .push(Booking {
                lesson: lesson.id.clone(),
                start: lesson.start,
                end: lesson.end,
            });
    }

    pub fn room_is_free(&self, room: &RoomId, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.by_room
            .get(room)
            .map(|b| !b.iter().any(|x| overlaps(start, end, x.start, x.end)))
            .unwrap_or(true)
    }

    /// First booking of `teacher` overlapping the window, other than `exclude`.
    pub fn teacher_conflict(
        &self,
        teacher: &TeacherId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude: &LessonId,
    ) -> Option<&LessonId> {
        self.by_teacher.get(teacher).and_then(|b| {
            b.iter()
                .filter(|x| &x.lesson != exclude)
                .find(|x| overlaps(start, end, x.start, x.end))
                .map(|x| &x.lesson)
        })
    }

    /// Pairs of lessons sharing a teacher and overlapping in time, each pair once.
    pub fn teacher_double_bookings(&self) -> Vec<(LessonId, LessonId)> {
        let mut teachers: Vec<_> = self.by_teacher.keys().collect();
        teachers.sort();
        let mut out = Vec::new();
        for t in teachers {
            let b = &self.by_teacher[t];
            for i in 0..b.len() {
                for j in (i + 1)..b.len() {
                    if overlaps(b[i].start, b[i].end, b[j].start, b[j].end) {
                        out.push((b[i].lesson.clone(), b[j].lesson.clone()));
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn lesson(id: &str, teacher: &str, room: Option<&str>, start: NaiveDateTime, end: NaiveDateTime) -> Lesson {
        Lesson {
            id: id.into(),
            title: id.to_string(),
            start,
            end,
            class_id: "c1".into(),
            room_id: room.map(RoomId::from),
            teacher_id: teacher.into(),
        }
    }

    #[test]
    fn teacher_conflict_ignores_self_and_other_teachers() {
        let day = vec![
            lesson("a", "t1", Some("r1"), at(4, 9, 0), at(4, 10, 0)),
            lesson("b", "t2", Some("r2"), at(4, 9, 30), at(4, 10, 30)),
        ];
        let date = at(4, 0, 0).date();
        assert!(!has_teacher_conflict(&"t1".into(), at(4, 9, 0), at(4, 10, 0), date, &"a".into(), &day));
        assert!(has_teacher_conflict(&"t1".into(), at(4, 9, 30), at(4, 11, 0), date, &"x".into(), &day));
        assert!(!has_teacher_conflict(&"t3".into(), at(4, 9, 30), at(4, 11, 0), date, &"x".into(), &day));
        assert!(!has_teacher_conflict(&"t1".into(), at(4, 10, 0), at(4, 11, 0), date, &"x".into(), &day));
    }

    #[test]
    fn teacher_conflict_only_counts_the_given_date() {
        let day = vec![lesson("a", "t1", None, at(5, 9, 0), at(5, 10, 0))];
        let date = at(4, 0, 0).date();
        assert!(!has_teacher_conflict(&"t1".into(), at(4, 9, 0), at(4, 10, 0), date, &"x".into(), &day));
    }

    #[test]
    fn ensure_reports_teacher_and_date() {
        let day = vec![lesson("a", "t1", None, at(4, 9, 0), at(4, 10, 0))];
        let err = ensure_teacher_available(&"t1".into(), at(4, 9, 0), at(4, 9, 45), &"x".into(), &day)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::TeacherNotAvailable { ref teacher, .. } if teacher.0 == "t1"));
    }

    #[test]
    fn room_free_checks_only_assignments_of_that_room() {
        let lessons = vec![
            lesson("a", "t1", None, at(4, 9, 0), at(4, 10, 0)),
            lesson("b", "t2", None, at(4, 9, 0), at(4, 10, 0)),
        ];
        let mut assignments = HashMap::new();
        assignments.insert(LessonId::from("a"), RoomId::from("r1"));
        assert!(!is_room_free(&"r1".into(), at(4, 9, 30), at(4, 10, 30), &assignments, &lessons));
        assert!(is_room_free(&"r2".into(), at(4, 9, 30), at(4, 10, 30), &assignments, &lessons));
        assert!(is_room_free(&"r1".into(), at(4, 10, 0), at(4, 11, 0), &assignments, &lessons));
    }

    #[test]
    fn index_tracks_both_domains() {
        let a = lesson("a", "t1", Some("r1"), at(4, 9, 0), at(4, 10, 0));
        let b = lesson("b", "t1", Some("r2"), at(4, 9, 30), at(4, 10, 30));
        let idx = OccupancyIndex::from_lessons(&[a.clone(), b]);
        assert!(!idx.room_is_free(&"r1".into(), at(4, 9, 15), at(4, 9, 45)));
        assert!(idx.room_is_free(&"r3".into(), at(4, 9, 15), at(4, 9, 45)));
        assert_eq!(
            idx.teacher_conflict(&"t1".into(), a.start, a.end, &a.id),
            Some(&LessonId::from("b"))
        );
        assert_eq!(
            idx.teacher_double_bookings(),
            vec![(LessonId::from("a"), LessonId::from("b"))]
        );
    }

    #[test]
    fn validator_agrees_with_a_built_index() {
        let lessons = vec![
            lesson("a", "t1", Some("r1"), at(4, 9, 0), at(4, 10, 0)),
            lesson("b", "t2", Some("r2"), at(4, 11, 0), at(4, 12, 0)),
        ];
        let idx = OccupancyIndex::from_lessons(&lessons);
        let assignments: HashMap<LessonId, RoomId> = lessons
            .iter()
            .filter_map(|l| l.room_id.clone().map(|r| (l.id.clone(), r)))
            .collect();
        let date = at(4, 0, 0).date();
        for (start, end) in [(at(4, 8, 0), at(4, 9, 0)), (at(4, 9, 30), at(4, 11, 30)), (at(4, 12, 0), at(4, 13, 0))] {
            for room in ["r1", "r2"] {
                assert_eq!(
                    idx.room_is_free(&room.into(), start, end),
                    is_room_free(&room.into(), start, end, &assignments, &lessons)
                );
            }
            for teacher in ["t1", "t2"] {
                assert_eq!(
                    idx.teacher_conflict(&teacher.into(), start, end, &"x".into()).is_some(),
                    has_teacher_conflict(&teacher.into(), start, end, date, &"x".into(), &lessons)
                );
            }
        }
    }
}
