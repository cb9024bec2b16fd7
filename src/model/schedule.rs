//! Schedule entity (§3, §4.8, §8): a recurring or one-off on-window for a
//! circuit.

use serde::{Deserialize, Serialize};

use super::Id;

bitflags::bitflags! {
    /// Day-of-week bitmask, bit 0 == Sunday (matches the wire convention
    /// used across the Pentair variant family).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DayMask: u8 {
        const SUNDAY    = 0b0000_0001;
        const MONDAY    = 0b0000_0010;
        const TUESDAY   = 0b0000_0100;
        const WEDNESDAY = 0b0000_1000;
        const THURSDAY  = 0b0001_0000;
        const FRIDAY    = 0b0010_0000;
        const SATURDAY  = 0b0100_0000;
        const ALL = Self::SUNDAY.bits()
            | Self::MONDAY.bits()
            | Self::TUESDAY.bits()
            | Self::WEDNESDAY.bits()
            | Self::THURSDAY.bits()
            | Self::FRIDAY.bits()
            | Self::SATURDAY.bits();
    }
}

impl DayMask {
    /// `chrono::Weekday` ordinal (Sunday == 0) to the matching bit.
    pub fn for_weekday(weekday: chrono::Weekday) -> Self {
        use chrono::Weekday::*;
        match weekday {
            Sun => Self::SUNDAY,
            Mon => Self::MONDAY,
            Tue => Self::TUESDAY,
            Wed => Self::WEDNESDAY,
            Thu => Self::THURSDAY,
            Fri => Self::FRIDAY,
            Sat => Self::SATURDAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScheduleType {
    Normal,
    RunOnce,
    Egg,
}

/// A schedule's start/end may be a fixed minutes-since-midnight value or a
/// pluggable astronomical event (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum ScheduleTime {
    Fixed(u16),
    Sunrise,
    Sunset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub id: Id,
    pub circuit: Id,
    pub start_time: ScheduleTime,
    pub end_time: ScheduleTime,
    pub days: DayMask,
    pub schedule_type: ScheduleType,
    pub heat_mode: Option<super::body::HeatMode>,
    pub set_point: Option<i16>,
    /// Explicit flag per §3: "startTime <= endTime unless the schedule
    /// wraps midnight (explicit flag)". Only meaningful for `Fixed` times;
    /// astronomical times are resolved and then compared at tick time.
    pub wraps_midnight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub id: Id,
    pub is_on: bool,
    /// Minutes-since-midnight of the next time this schedule will flip on.
    pub next_trigger_time: Option<u16>,
}

/// Normalize a raw minutes value into `[0, 1440)`, per §3.
pub fn normalize_minutes(raw: i32) -> u16 {
    raw.rem_euclid(1440) as u16
}

impl ScheduleConfig {
    /// Does `[start, end)` (resolved to fixed minutes) contain `now_minutes`?
    /// Honors `wraps_midnight`; a schedule with `start == end` never
    /// contains anything (§8 boundary behavior).
    pub fn contains(&self, start: u16, end: u16, now_minutes: u16) -> bool {
        if start == end {
            return false;
        }
        if start < end {
            now_minutes >= start && now_minutes < end
        } else {
            // wraps midnight
            now_minutes >= start || now_minutes < end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_start_and_end_never_contains() {
        let cfg = sample(10, 10, false);
        for m in 0..1440 {
            assert!(!cfg.contains(10, 10, m));
        }
    }

    #[test]
    fn non_wrapping_window() {
        let cfg = sample(480, 600, false);
        assert!(cfg.contains(480, 600, 500));
        assert!(!cfg.contains(480, 600, 600));
        assert!(!cfg.contains(480, 600, 479));
    }

    #[test]
    fn wrapping_window_crosses_midnight() {
        let cfg = sample(1380, 60, true);
        assert!(cfg.contains(1380, 60, 1400));
        assert!(cfg.contains(1380, 60, 30));
        assert!(!cfg.contains(1380, 60, 700));
    }

    #[test]
    fn normalize_wraps_into_day_range() {
        assert_eq!(normalize_minutes(1500), 60);
        assert_eq!(normalize_minutes(-30), 1410);
    }

    fn sample(start: u16, end: u16, wraps: bool) -> ScheduleConfig {
        ScheduleConfig {
            id: 1,
            circuit: 1,
            start_time: ScheduleTime::Fixed(start),
            end_time: ScheduleTime::Fixed(end),
            days: DayMask::ALL,
            schedule_type: ScheduleType::Normal,
            heat_mode: None,
            set_point: None,
            wraps_midnight: wraps,
        }
    }
}
