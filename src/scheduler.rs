//! Schedule Execution (§4.8): a once-per-second tick against local time,
//! with optional sunrise/sunset substitution, that ensures every
//! schedule-controlled circuit matches the union of its matching
//! schedules' on/off state. Commands go out through Board Dispatch at
//! background priority and respect the Delay Manager, same as any other
//! intent.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDateTime, Timelike};
use log::{debug, warn};

use crate::board::{Board, CircuitDesired, Intent};
use crate::change::ChangeEngine;
use crate::delay::{DelayKey, DelayManager, Purpose};
use crate::model::graph::{PoolConfig, PoolState};
use crate::model::schedule::{DayMask, ScheduleConfig, ScheduleTime};
use crate::model::{EntityKind, EquipmentModel, Id};
use crate::sun::SunCalculator;
use crate::transaction::{Priority, TransactionEngine};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Resolve a `ScheduleTime` to minutes-since-midnight for `date`, using
/// `sun` for the astronomical variants (§4.8).
fn resolve_time(time: ScheduleTime, date: chrono::NaiveDate, sun: &dyn SunCalculator) -> u16 {
    match time {
        ScheduleTime::Fixed(minutes) => minutes,
        ScheduleTime::Sunrise => sun.sunrise_minutes(date),
        ScheduleTime::Sunset => sun.sunset_minutes(date),
    }
}

/// For every enabled schedule whose day-mask matches `now`'s weekday,
/// resolve its window and union the on/off verdict per target circuit
/// (§4.8: "Overlapping schedules are union-ON").
pub fn desired_circuit_states(
    schedules: impl Iterator<Item = (Id, ScheduleConfig)>,
    now: NaiveDateTime,
    sun: &dyn SunCalculator,
) -> BTreeMap<Id, bool> {
    let today = DayMask::for_weekday(now.weekday());
    let now_minutes = (now.hour() * 60 + now.minute()) as u16;
    let date = now.date();

    let mut desired: BTreeMap<Id, bool> = BTreeMap::new();
    for (_id, schedule) in schedules {
        if !schedule.days.intersects(today) {
            continue;
        }
        let start = resolve_time(schedule.start_time, date, sun);
        let end = resolve_time(schedule.end_time, date, sun);
        let on = schedule.contains(start, end, now_minutes);
        let entry = desired.entry(schedule.circuit).or_insert(false);
        *entry |= on;
    }
    desired
}

pub struct Scheduler {
    sun: Box<dyn SunCalculator>,
}

impl Scheduler {
    pub fn new(sun: Box<dyn SunCalculator>) -> Self {
        Self { sun }
    }

    /// Run forever, ticking once per second until the process shuts the
    /// task down by dropping it.
    pub async fn run(
        self: Arc<Self>,
        change: Arc<ChangeEngine>,
        board: Arc<Board>,
        txn: Arc<TransactionEngine>,
        delay: Arc<DelayManager>,
    ) {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        loop {
            ticker.tick().await;
            let now = chrono::Local::now().naive_local();
            self.tick(now, &change, &board, &txn, &delay).await;
        }
    }

    async fn tick(
        &self,
        now: NaiveDateTime,
        change: &ChangeEngine,
        board: &Board,
        txn: &TransactionEngine,
        delay: &DelayManager,
    ) {
        let config: PoolConfig = change.config_snapshot().await;
        let state: PoolState = change.state_snapshot().await;

        let schedules = config
            .schedules
            .iter()
            .map(|(id, schedule)| (*id, schedule.clone()));
        let desired = desired_circuit_states(schedules, now, self.sun.as_ref());

        let model = EquipmentModel::new(config, state);

        for (circuit_id, want_on) in desired {
            let Some(current) = model.state.circuits.get(circuit_id) else {
                continue;
            };
            if current.is_on == want_on {
                continue;
            }

            let key = DelayKey {
                kind: EntityKind::Circuit,
                id: circuit_id,
                purpose: Purpose::ChangeCooldown,
            };
            if let Err(e) = delay.gate(key, false).await {
                warn!("scheduler: circuit {circuit_id} gated: {e}");
                continue;
            }

            let desired_state = if want_on {
                CircuitDesired::On
            } else {
                CircuitDesired::Off
            };
            match board
                .dispatch(
                    Intent::SetCircuitState {
                        id: circuit_id,
                        desired: desired_state,
                    },
                    &model,
                    txn,
                    delay,
                    Priority::Background,
                )
                .await
            {
                Ok(()) => {
                    debug!("scheduler: circuit {circuit_id} -> {want_on}");
                    change.set_circuit_is_on(circuit_id, want_on).await;
                    delay.start_timer(key, crate::delay::CIRCUIT_CHANGE_COOLDOWN);
                }
                Err(e) => warn!("scheduler: circuit {circuit_id} command failed: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schedule::ScheduleType;
    use crate::sun::FixedCalculator;
    use chrono::NaiveDate;

    fn schedule(id: Id, circuit: Id, start: u16, end: u16) -> ScheduleConfig {
        ScheduleConfig {
            id,
            circuit,
            start_time: ScheduleTime::Fixed(start),
            end_time: ScheduleTime::Fixed(end),
            days: DayMask::ALL,
            schedule_type: ScheduleType::Normal,
            heat_mode: None,
            set_point: None,
            wraps_midnight: false,
        }
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, 26)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn overlapping_schedules_union_on() {
        let sun = FixedCalculator { sunrise: 360, sunset: 1140 };
        let schedules = vec![
            (1, schedule(1, 6, 480, 540)),
            (2, schedule(2, 6, 500, 600)),
        ];
        let desired = desired_circuit_states(schedules.into_iter(), at(8, 30), &sun);
        assert_eq!(desired.get(&6), Some(&true));
    }

    #[test]
    fn outside_every_window_is_off() {
        let sun = FixedCalculator { sunrise: 360, sunset: 1140 };
        let schedules = vec![(1, schedule(1, 6, 480, 540))];
        let desired = desired_circuit_states(schedules.into_iter(), at(20, 0), &sun);
        assert_eq!(desired.get(&6), Some(&false));
    }

    #[test]
    fn start_equals_end_never_turns_on() {
        let sun = FixedCalculator { sunrise: 360, sunset: 1140 };
        let schedules = vec![(1, schedule(1, 6, 600, 600))];
        let desired = desired_circuit_states(schedules.into_iter(), at(10, 0), &sun);
        assert_eq!(desired.get(&6), Some(&false));
    }

    #[test]
    fn day_mask_excludes_non_matching_weekday() {
        let sun = FixedCalculator { sunrise: 360, sunset: 1140 };
        let mut only_monday = schedule(1, 6, 480, 540);
        only_monday.days = DayMask::MONDAY;
        // 2026-07-26 is a Sunday.
        let desired = desired_circuit_states(vec![(1, only_monday)].into_iter(), at(8, 30), &sun);
        assert!(desired.is_empty());
    }
}
