use chrono::{Duration, NaiveDate};
use sched_core::conflict::ensure_teacher_available;
use sched_core::ports::LessonChanges;
use sched_core::week::monday_of;
use sched_core::ScheduleError;
use std::sync::Arc;
use tracing::{error, info};
use types::{DateRange, LessonDetails, LessonEditOutcome, LessonId, LessonUpdate, ReoptimizationStatus};

use crate::weekly::WeeklyPlanningService;
use crate::Collaborators;

/// Manual edits of single lessons.
pub struct LessonEditService {
    repos: Collaborators,
    planning: Arc<WeeklyPlanningService>,
}

impl LessonEditService {
    pub fn new(repos: Collaborators, planning: Arc<WeeklyPlanningService>) -> Self {
        Self { repos, planning }
    }

    /// Applies `update` to a lesson after checking the teacher is free.
    ///
    /// When the lesson moved in time, rooms are re-optimized over the days
    /// between its old and new date. That step is best effort: its outcome is
    /// reported in the result and a failure never undoes the edit.
    pub async fn update_lesson(
        &self,
        id: &LessonId,
        update: LessonUpdate,
    ) -> Result<LessonEditOutcome, ScheduleError> {
        let (current, new_date, span, guard) = loop {
            let old_date = self.load(id).await?.lesson.date();
            let new_date = effective_date(&update, old_date);
            let span = DateRange::days(old_date.min(new_date), old_date.max(new_date));
            let guard = self.planning.locks().acquire(span).await;

            // Re-read under the lock; retry if another edit moved the lesson meanwhile.
            let current = self.load(id).await?.lesson;
            if current.date() == old_date {
                break (current, new_date, span, guard);
            }
        };
        let teacher = self
            .repos
            .teachers
            .get(&update.teacher_id)
            .await?
            .ok_or_else(|| ScheduleError::TeacherNotFound(update.teacher_id.clone()))?;
        if update.start_time >= update.end_time {
            return Err(ScheduleError::InvalidTimeWindow);
        }

        let new_start = new_date.and_time(update.start_time);
        let new_end = new_date.and_time(update.end_time);
        let teacher_changed = teacher.id != current.teacher_id;
        let date_changed = new_date != current.date();
        let time_changed =
            update.start_time != current.start.time() || update.end_time != current.end.time();

        if teacher_changed || date_changed || time_changed {
            let day = DateRange::days(new_date, new_date);
            let day_lessons = self.repos.lessons.list_in_range(day.start, day.end).await?;
            ensure_teacher_available(&teacher.id, new_start, new_end, id, &day_lessons)?;
        }

        self.repos
            .lessons
            .update(
                id,
                LessonChanges {
                    title: update.title,
                    teacher_id: teacher.id.clone(),
                    start: new_start,
                    end: new_end,
                    room_id: current.room_id.clone(),
                },
            )
            .await?;
        info!(lesson = %id, teacher = %teacher.id, date = %new_date, "lesson updated");

        let optimization = if date_changed || time_changed {
            match self.planning.optimize_within(&guard).await {
                Ok(summary) => ReoptimizationStatus::Applied {
                    lessons_changed: summary.lessons_changed,
                },
                Err(e) => {
                    let failed = ScheduleError::OptimizationFailed(e.to_string());
                    error!(lesson = %id, start = %span.start, end = %span.end, error = %failed, "re-optimization after edit failed");
                    ReoptimizationStatus::Failed {
                        reason: failed.to_string(),
                    }
                }
            }
        } else {
            ReoptimizationStatus::Skipped
        };
        drop(guard);

        Ok(LessonEditOutcome {
            lesson: self.load(id).await?,
            optimization,
        })
    }

    /// Removes a lesson. Its room slot is picked up by the next optimization.
    pub async fn delete_lesson(&self, id: &LessonId) -> Result<(), ScheduleError> {
        let _guard = loop {
            let date = self.load(id).await?.lesson.date();
            let guard = self.planning.locks().acquire(DateRange::days(date, date)).await;
            // An edit may have moved the lesson while we waited.
            if self.load(id).await?.lesson.date() == date {
                break guard;
            }
        };
        self.repos.lessons.delete(id).await?;
        info!(lesson = %id, "lesson deleted");
        Ok(())
    }

    async fn load(&self, id: &LessonId) -> Result<LessonDetails, ScheduleError> {
        self.repos
            .lessons
            .get(id)
            .await?
            .ok_or_else(|| ScheduleError::LessonNotFound(id.clone()))
    }
}

/// An explicit date wins; a weekday moves the lesson inside its current
/// Monday-based week; otherwise the date is unchanged.
pub fn effective_date(update: &LessonUpdate, current: NaiveDate) -> NaiveDate {
    if let Some(date) = update.date {
        return date;
    }
    match update.day_of_week {
        Some(day) => {
            monday_of(current) + Duration::days(day.weekday().num_days_from_monday() as i64)
        }
        None => current,
    }
}
