use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
            PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(LessonId);
id_newtype!(RoomId);
id_newtype!(ClassId);
id_newtype!(TeacherId);

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub fn weekday(self) -> Weekday {
        match self {
            DayOfWeek::Mon => Weekday::Mon,
            DayOfWeek::Tue => Weekday::Tue,
            DayOfWeek::Wed => Weekday::Wed,
            DayOfWeek::Thu => Weekday::Thu,
            DayOfWeek::Fri => Weekday::Fri,
            DayOfWeek::Sat => Weekday::Sat,
            DayOfWeek::Sun => Weekday::Sun,
        }
    }
}

/// Column of the weekly grid. Only school days have a column.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
    PartialOrd, Ord,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayBucket {
    Lun,
    Mar,
    Mer,
    Jeu,
    Ven,
}

impl DayBucket {
    pub const ALL: [DayBucket; 5] = [
        DayBucket::Lun,
        DayBucket::Mar,
        DayBucket::Mer,
        DayBucket::Jeu,
        DayBucket::Ven,
    ];

    /// `None` for Saturday and Sunday: weekend lessons have no column.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        match date.weekday() {
            Weekday::Mon => Some(DayBucket::Lun),
            Weekday::Tue => Some(DayBucket::Mar),
            Weekday::Wed => Some(DayBucket::Mer),
            Weekday::Thu => Some(DayBucket::Jeu),
            Weekday::Fri => Some(DayBucket::Ven),
            Weekday::Sat | Weekday::Sun => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub class_id: ClassId,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    pub teacher_id: TeacherId,
}

impl Lesson {
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassCohort {
    pub id: ClassId,
    #[serde(default)]
    pub name: String,
    pub student_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct Teacher {
    pub id: TeacherId,
    #[serde(default)]
    pub name: String,
}

/// A lesson together with the entities it references.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct LessonDetails {
    pub lesson: Lesson,
    pub room: Option<Room>,
    pub class: Option<ClassCohort>,
    pub teacher: Option<Teacher>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct RoomFilter {
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub floor: Option<i32>,
}

impl RoomFilter {
    pub fn matches(&self, room: &Room) -> bool {
        if let Some(b) = &self.building {
            if room.building.as_deref() != Some(b.as_str()) {
                return false;
            }
        }
        if let Some(f) = self.floor {
            if room.floor != Some(f) {
                return false;
            }
        }
        true
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomComfortSnapshot {
    pub room_id: RoomId,
    pub temperature: f64,
    pub humidity: f64,
    pub air_pressure: f64,
    pub comfort_score: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub lesson: Option<Lesson>,
    pub is_empty: bool,
}

impl TimeSlot {
    pub fn empty(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            start_time,
            end_time,
            lesson: None,
            is_empty: true,
        }
    }

    pub fn occupied(lesson: Lesson) -> Self {
        Self {
            start_time: lesson.start.time(),
            end_time: lesson.end.time(),
            lesson: Some(lesson),
            is_empty: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomAssignment {
    pub lesson_id: LessonId,
    pub room_id: RoomId,
}

/// Lesson to room changes relative to persisted state, in optimizer order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(transparent)]
pub struct AssignmentDelta(pub Vec<RoomAssignment>);

impl AssignmentDelta {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoomAssignment> {
        self.0.iter()
    }

    pub fn room_for(&self, lesson: &LessonId) -> Option<&RoomId> {
        self.0
            .iter()
            .find(|a| &a.lesson_id == lesson)
            .map(|a| &a.room_id)
    }
}

/// Inclusive range of instants.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// `first` 00:00 up to `last` 23:59:59.999.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: first.and_time(NaiveTime::MIN),
            end: last.and_time(end_of_day()),
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    pub fn intersects(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct DayColumn {
    pub day: DayBucket,
    pub lessons: Vec<Lesson>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct ClassroomRow {
    pub room: Room,
    pub days: Vec<DayColumn>,
    /// Lessons in this room that fall on a weekend.
    #[serde(default)]
    pub unmapped: Vec<Lesson>,
}

impl ClassroomRow {
    pub fn day(&self, day: DayBucket) -> &[Lesson] {
        self.days
            .iter()
            .find(|c| c.day == day)
            .map(|c| c.lessons.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyGrid {
    pub week: u32,
    pub year: i32,
    pub range: DateRange,
    pub classrooms: Vec<ClassroomRow>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LessonUpdate {
    pub title: String,
    pub teacher_id: TeacherId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeSummary {
    pub lessons_changed: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReoptimizationStatus {
    Applied {
        #[serde(rename = "lessonsChanged")]
        lessons_changed: usize,
    },
    Skipped,
    Failed {
        reason: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct LessonEditOutcome {
    pub lesson: LessonDetails,
    pub optimization: ReoptimizationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekend_dates_have_no_bucket() {
        // 2024-01-06 is a Saturday.
        assert_eq!(DayBucket::from_date(d(2024, 1, 6)), None);
        assert_eq!(DayBucket::from_date(d(2024, 1, 7)), None);
        assert_eq!(DayBucket::from_date(d(2024, 1, 8)), Some(DayBucket::Lun));
        assert_eq!(DayBucket::from_date(d(2024, 1, 12)), Some(DayBucket::Ven));
    }

    #[test]
    fn day_bucket_serializes_in_grid_labels() {
        let s = serde_json::to_string(&DayBucket::Mer).unwrap();
        assert_eq!(s, "\"MER\"");
    }

    #[test]
    fn day_range_is_inclusive_of_last_day() {
        let r = DateRange::days(d(2024, 1, 8), d(2024, 1, 12));
        assert!(r.contains(d(2024, 1, 12).and_hms_opt(23, 0, 0).unwrap()));
        assert!(!r.contains(d(2024, 1, 13).and_hms_opt(0, 0, 0).unwrap()));
    }

    #[test]
    fn room_filter_requires_every_given_field() {
        let room = Room {
            id: "r1".into(),
            name: "A1".into(),
            capacity: 30,
            building: Some("A".into()),
            floor: Some(1),
            enabled: true,
        };
        assert!(RoomFilter::default().matches(&room));
        assert!(RoomFilter { building: Some("A".into()), floor: Some(1) }.matches(&room));
        assert!(!RoomFilter { building: Some("A".into()), floor: Some(2) }.matches(&room));
        assert!(!RoomFilter { building: Some("B".into()), floor: None }.matches(&room));
    }

    #[test]
    fn reoptimization_status_is_tagged() {
        let v = serde_json::to_value(ReoptimizationStatus::Applied { lessons_changed: 2 }).unwrap();
        assert_eq!(v["status"], "applied");
        assert_eq!(v["lessonsChanged"], 2);
    }
}
