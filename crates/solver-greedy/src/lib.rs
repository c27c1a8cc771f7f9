//! Single-pass greedy room assignment.
//!
//! Lessons are visited in start order and each takes the best-scoring enabled
//! room that is still free for its window. There is no backtracking: a lesson
//! with no free room is left out of the plan.

use sched_core::conflict::OccupancyIndex;
use sched_core::scoring::{capacity_score, environmental_score, proximity_score, PlacementScore};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use types::{
    AssignmentDelta, ClassCohort, ClassId, Lesson, LessonId, Room, RoomAssignment,
    RoomComfortSnapshot, RoomId, TeacherId,
};

pub struct OptimizerInput<'a> {
    pub lessons: &'a [Lesson],
    pub rooms: &'a [Room],
    pub classes: &'a [ClassCohort],
    /// Comfort score per room; rooms missing here get the neutral score.
    pub comfort: &'a HashMap<RoomId, u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptimizationPlan {
    /// Chosen room per placed lesson, in placement order.
    pub assignments: Vec<RoomAssignment>,
    /// Lessons left as they are: unknown class or no free room.
    pub unassigned: Vec<LessonId>,
    /// Teacher double-bookings already present in the batch. Room choice
    /// cannot resolve these; they are reported for follow-up.
    pub teacher_conflicts: Vec<(LessonId, LessonId)>,
}

impl OptimizationPlan {
    pub fn room_for(&self, lesson: &LessonId) -> Option<&RoomId> {
        self.assignments
            .iter()
            .find(|a| &a.lesson_id == lesson)
            .map(|a| &a.room_id)
    }

    /// Placements that differ from the room currently stored on each lesson.
    pub fn delta(&self, lessons: &[Lesson]) -> AssignmentDelta {
        let current: HashMap<&LessonId, Option<&RoomId>> =
            lessons.iter().map(|l| (&l.id, l.room_id.as_ref())).collect();
        AssignmentDelta(
            self.assignments
                .iter()
                .filter(|a| current.get(&a.lesson_id).copied().flatten() != Some(&a.room_id))
                .cloned()
                .collect(),
        )
    }
}

pub fn comfort_by_room(snapshots: &[RoomComfortSnapshot]) -> HashMap<RoomId, u8> {
    snapshots
        .iter()
        .map(|s| (s.room_id.clone(), s.comfort_score))
        .collect()
}

pub struct RoomAssignmentOptimizer;

impl RoomAssignmentOptimizer {
    pub fn new() -> Self {
        Self
    }

    pub fn optimize(&self, input: &OptimizerInput<'_>) -> OptimizationPlan {
        let mut order: Vec<&Lesson> = input.lessons.iter().collect();
        order.sort_by_key(|l| l.start);

        let class_by_id: HashMap<&ClassId, &ClassCohort> =
            input.classes.iter().map(|c| (&c.id, c)).collect();
        let rooms: Vec<&Room> = input.rooms.iter().filter(|r| r.enabled).collect();

        let teacher_conflicts = OccupancyIndex::from_lessons(input.lessons).teacher_double_bookings();
        for (a, b) in &teacher_conflicts {
            warn!(lesson_a = %a, lesson_b = %b, "teacher double-booked in optimization batch");
        }

        let mut occupancy = OccupancyIndex::new();
        let mut usage_by_class: HashMap<ClassId, Vec<RoomId>> = HashMap::new();
        let mut usage_by_teacher: HashMap<TeacherId, Vec<RoomId>> = HashMap::new();
        let mut plan = OptimizationPlan {
            teacher_conflicts,
            ..Default::default()
        };

        for lesson in order {
            let Some(class) = class_by_id.get(&lesson.class_id) else {
                debug!(lesson = %lesson.id, class = %lesson.class_id, "class not found, skipping");
                plan.unassigned.push(lesson.id.clone());
                continue;
            };
            let no_history: Vec<RoomId> = Vec::new();
            let class_history = usage_by_class.get(&lesson.class_id).unwrap_or(&no_history);
            let teacher_history = usage_by_teacher.get(&lesson.teacher_id).unwrap_or(&no_history);

            let mut best: Option<(&Room, f64)> = None;
            for &room in &rooms {
                if !occupancy.room_is_free(&room.id, lesson.start, lesson.end) {
                    continue;
                }
                let score = PlacementScore {
                    capacity: capacity_score(class.student_count, room.capacity),
                    environmental: environmental_score(input.comfort.get(&room.id).copied()),
                    proximity: proximity_score(&room.id, class_history, teacher_history),
                };
                let total = score.total();
                if best.map_or(true, |(_, s)| total > s) {
                    best = Some((room, total));
                }
            }

            let Some((room, score)) = best else {
                debug!(lesson = %lesson.id, "no free room");
                plan.unassigned.push(lesson.id.clone());
                continue;
            };

            debug!(lesson = %lesson.id, room = %room.id, score, "placed");
            occupancy.book_room(&room.id, lesson);
            usage_by_class
                .entry(lesson.class_id.clone())
                .or_default()
                .push(room.id.clone());
            usage_by_teacher
                .entry(lesson.teacher_id.clone())
                .or_default()
                .push(room.id.clone());
            plan.assignments.push(RoomAssignment {
                lesson_id: lesson.id.clone(),
                room_id: room.id.clone(),
            });
        }

        info!(
            lessons = input.lessons.len(),
            rooms = rooms.len(),
            placed = plan.assignments.len(),
            unassigned = plan.unassigned.len(),
            "room optimization pass finished"
        );
        plan
    }
}

impl Default for RoomAssignmentOptimizer {
    fn default() -> Self {
        Self::new()
    }
}
