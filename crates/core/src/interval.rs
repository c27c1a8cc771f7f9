use chrono::NaiveTime;
use types::{Lesson, TimeSlot};

/// Half-open overlap test: intervals that only touch do not overlap.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && a_end > b_start
}

pub fn lessons_overlap(a: &Lesson, b: &Lesson) -> bool {
    overlaps(a.start, a.end, b.start, b.end)
}

/// Free/occupied view of one room on one day.
///
/// `lessons` must already be restricted to a single room and calendar day.
/// Lessons are ordered by start time (stable), and empty slots fill the gaps
/// between `day_start`, the lessons and `day_end`. No zero-length slot is emitted.
pub fn derive_day_slots(lessons: &[Lesson], day_start: NaiveTime, day_end: NaiveTime) -> Vec<TimeSlot> {
    if lessons.is_empty() {
        return vec![TimeSlot::empty(day_start, day_end)];
    }

    let mut sorted: Vec<&Lesson> = lessons.iter().collect();
    sorted.sort_by_key(|l| l.start);

    let mut slots = Vec::with_capacity(sorted.len() * 2 + 1);

    let first = sorted[0].start.time();
    if first > day_start {
        slots.push(TimeSlot::empty(day_start, first));
    }

    for (i, lesson) in sorted.iter().enumerate() {
        slots.push(TimeSlot::occupied((*lesson).clone()));
        if let Some(next) = sorted.get(i + 1) {
            let (gap_start, gap_end) = (lesson.end.time(), next.start.time());
            if gap_start < gap_end {
                slots.push(TimeSlot::empty(gap_start, gap_end));
            }
        }
    }

    let last = sorted[sorted.len() - 1].end.time();
    if last < day_end {
        slots.push(TimeSlot::empty(last, day_end));
    }

    slots
}
