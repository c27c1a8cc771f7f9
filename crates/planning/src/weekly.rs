use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use jobs::{RangeGuard, RangeLocks};
use sched_core::interval::derive_day_slots;
use sched_core::week::WeekRangeStrategy;
use sched_core::{ScheduleError, WeekOptimizer};
use solver_greedy::{comfort_by_room, OptimizerInput, RoomAssignmentOptimizer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use types::{
    ClassroomRow, DateRange, DayBucket, DayColumn, Lesson, OptimizeSummary, RoomFilter, RoomId,
    TimeSlot, WeeklyGrid,
};

use crate::Collaborators;

#[derive(Clone, Debug)]
pub struct PlanningSettings {
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    pub comfort_timeout: Duration,
}

impl Default for PlanningSettings {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            day_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            comfort_timeout: Duration::from_secs(2),
        }
    }
}

pub struct WeeklyPlanningService {
    repos: Collaborators,
    weeks: Arc<dyn WeekRangeStrategy>,
    locks: RangeLocks,
    optimizer: RoomAssignmentOptimizer,
    settings: PlanningSettings,
}

impl WeeklyPlanningService {
    pub fn new(
        repos: Collaborators,
        weeks: Arc<dyn WeekRangeStrategy>,
        locks: RangeLocks,
        settings: PlanningSettings,
    ) -> Self {
        Self {
            repos,
            weeks,
            locks,
            optimizer: RoomAssignmentOptimizer::new(),
            settings,
        }
    }

    pub fn locks(&self) -> &RangeLocks {
        &self.locks
    }

    pub fn resolve_week_range(&self, week: u32, year: i32) -> Result<DateRange, ScheduleError> {
        self.weeks.resolve(week, year)
    }

    /// Current room assignment of a week as one row per enabled room.
    pub async fn get_weekly_planning(
        &self,
        week: u32,
        year: i32,
        filter: &RoomFilter,
    ) -> Result<WeeklyGrid, ScheduleError> {
        let range = self.resolve_week_range(week, year)?;
        let lessons = self.repos.lessons.list_in_range(range.start, range.end).await?;
        let rooms = self.repos.rooms.list_enabled(filter).await?;

        let mut by_room: HashMap<&RoomId, Vec<&Lesson>> = HashMap::new();
        for l in &lessons {
            if let Some(room) = &l.room_id {
                by_room.entry(room).or_default().push(l);
            }
        }

        let classrooms = rooms
            .into_iter()
            .map(|room| {
                let mut days: Vec<DayColumn> = DayBucket::ALL
                    .iter()
                    .map(|&day| DayColumn { day, lessons: Vec::new() })
                    .collect();
                let mut unmapped = Vec::new();
                for l in by_room.remove(&room.id).unwrap_or_default() {
                    match DayBucket::from_date(l.date()) {
                        Some(day) => days[day as usize].lessons.push(l.clone()),
                        None => {
                            warn!(lesson = %l.id, room = %room.id, date = %l.date(), "lesson on a weekend has no planning column");
                            unmapped.push(l.clone());
                        }
                    }
                }
                ClassroomRow { room, days, unmapped }
            })
            .collect();

        Ok(WeeklyGrid {
            week,
            year,
            range,
            classrooms,
        })
    }

    pub async fn optimize_week(&self, week: u32, year: i32) -> Result<OptimizeSummary, ScheduleError> {
        let range = self.resolve_week_range(week, year)?;
        let guard = self.locks.acquire(range).await;
        info!(week, year, start = %range.start, end = %range.end, "optimizing week");
        self.optimize_within(&guard).await
    }

    /// Re-assigns rooms for every lesson in the guarded range and persists the
    /// rooms that changed in a single bulk write.
    pub(crate) async fn optimize_within(&self, guard: &RangeGuard) -> Result<OptimizeSummary, ScheduleError> {
        let range = guard.range();
        let lessons = self.repos.lessons.list_in_range(range.start, range.end).await?;
        if lessons.is_empty() {
            return Err(ScheduleError::NoPlanningFound { range });
        }
        let rooms = self.repos.rooms.list_enabled(&RoomFilter::default()).await?;
        let classes = self.repos.classes.list_with_student_counts().await?;
        let room_ids: Vec<RoomId> = rooms.iter().map(|r| r.id.clone()).collect();
        let comfort = self.comfort_scores(&room_ids).await;

        let plan = self.optimizer.optimize(&OptimizerInput {
            lessons: &lessons,
            rooms: &rooms,
            classes: &classes,
            comfort: &comfort,
        });
        let delta = plan.delta(&lessons);
        if !delta.is_empty() {
            self.repos.lessons.bulk_reassign_rooms(&delta.0).await?;
        }
        info!(
            lessons = lessons.len(),
            changed = delta.len(),
            unassigned = plan.unassigned.len(),
            teacher_conflicts = plan.teacher_conflicts.len(),
            "room assignments saved"
        );
        Ok(OptimizeSummary {
            lessons_changed: delta.len(),
        })
    }

    /// Comfort score per room; empty when the source fails or times out.
    async fn comfort_scores(&self, room_ids: &[RoomId]) -> HashMap<RoomId, u8> {
        let fetched = tokio::time::timeout(
            self.settings.comfort_timeout,
            self.repos.comfort.get_snapshots(room_ids),
        )
        .await;
        let err = match fetched {
            Ok(Ok(snapshots)) => return comfort_by_room(&snapshots),
            Ok(Err(e)) => ScheduleError::ComfortDataUnavailable(e.to_string()),
            Err(_) => ScheduleError::ComfortDataUnavailable(format!(
                "no answer within {:?}",
                self.settings.comfort_timeout
            )),
        };
        warn!(error = %err, "using neutral environmental scores");
        HashMap::new()
    }

    /// Free and occupied slots of one enabled room on one day.
    pub async fn day_slots(&self, room_id: &RoomId, date: NaiveDate) -> Result<Vec<TimeSlot>, ScheduleError> {
        let rooms = self.repos.rooms.list_enabled(&RoomFilter::default()).await?;
        if !rooms.iter().any(|r| &r.id == room_id) {
            return Err(ScheduleError::RoomNotFound(room_id.clone()));
        }
        let day = DateRange::days(date, date);
        let lessons: Vec<Lesson> = self
            .repos
            .lessons
            .list_in_range(day.start, day.end)
            .await?
            .into_iter()
            .filter(|l| l.room_id.as_ref() == Some(room_id))
            .collect();
        Ok(derive_day_slots(&lessons, self.settings.day_start, self.settings.day_end))
    }
}

#[async_trait]
impl WeekOptimizer for WeeklyPlanningService {
    async fn optimize_week(&self, week: u32, year: i32) -> Result<OptimizeSummary, ScheduleError> {
        WeeklyPlanningService::optimize_week(self, week, year).await
    }
}
