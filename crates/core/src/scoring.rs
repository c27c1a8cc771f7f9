use types::{RoomComfortSnapshot, RoomId};

pub const CAPACITY_WEIGHT: f64 = 40.0;
pub const ENVIRONMENT_WEIGHT: f64 = 40.0;
pub const PROXIMITY_WEIGHT: f64 = 20.0;
/// Used for rooms without a comfort snapshot.
pub const NEUTRAL_ENVIRONMENT_SCORE: f64 = 20.0;

const PROXIMITY_STEP: f64 = 2.0;
const PROXIMITY_CAP: f64 = 10.0;

/// Penalty-per-unit outside an ideal band `[lo, hi]`.
fn band_penalty(value: f64, lo: f64, hi: f64, per_unit: f64) -> f64 {
    if value < lo {
        (lo - value) * per_unit
    } else if value > hi {
        (value - hi) * per_unit
    } else {
        0.0
    }
}

/// Comfort score in `[0, 100]`.
///
/// Ideal bands: 20-22 °C, 40-60 % humidity, 1013-1020 hPa. Outside a band the
/// score loses 5 per °C, 1 per % and 2 per hPa respectively.
pub fn comfort_score(temperature: f64, humidity: f64, air_pressure: f64) -> u8 {
    let mut score = 100.0;
    score -= band_penalty(temperature, 20.0, 22.0, 5.0);
    score -= band_penalty(humidity, 40.0, 60.0, 1.0);
    score -= band_penalty(air_pressure, 1013.0, 1020.0, 2.0);
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

pub fn comfort_snapshot(
    room_id: RoomId,
    temperature: f64,
    humidity: f64,
    air_pressure: f64,
) -> RoomComfortSnapshot {
    RoomComfortSnapshot {
        comfort_score: comfort_score(temperature, humidity, air_pressure),
        room_id,
        temperature,
        humidity,
        air_pressure,
    }
}

/// Fit of a class in a room, up to 40.
///
/// Full marks between half-full and full; a linear ramp below half; nothing
/// when the class does not fit.
pub fn capacity_score(student_count: u32, capacity: u32) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    let ratio = student_count as f64 / capacity as f64;
    if ratio > 1.0 {
        0.0
    } else if ratio >= 0.5 {
        CAPACITY_WEIGHT
    } else {
        CAPACITY_WEIGHT * ratio * 2.0
    }
}

pub fn environmental_score(comfort: Option<u8>) -> f64 {
    match comfort {
        Some(c) => c as f64 / 100.0 * ENVIRONMENT_WEIGHT,
        None => NEUTRAL_ENVIRONMENT_SCORE,
    }
}

/// Continuity bonus, up to 20: every earlier placement of the same class or
/// teacher in a different room costs 2, capped at 10 per history.
pub fn proximity_score(candidate: &RoomId, class_history: &[RoomId], teacher_history: &[RoomId]) -> f64 {
    let churn = |history: &[RoomId]| -> f64 {
        let moved = history.iter().filter(|r| *r != candidate).count() as f64;
        (moved * PROXIMITY_STEP).min(PROXIMITY_CAP)
    };
    (PROXIMITY_WEIGHT - churn(class_history) - churn(teacher_history)).max(0.0)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlacementScore {
    pub capacity: f64,
    pub environmental: f64,
    pub proximity: f64,
}

impl PlacementScore {
    pub fn total(&self) -> f64 {
        self.capacity + self.environmental + self.proximity
    }
}
