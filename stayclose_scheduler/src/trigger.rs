use chrono::offset::LocalResult;
use chrono::{DateTime, Datelike, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use stayclose_models::reminder::{IntervalUnit, ReminderSchedule, WeekdaySet};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriggerError {
    #[error("recurring interval value must be positive")]
    ZeroInterval,
    #[error("weekly reminder has an empty weekday set")]
    EmptyWeekdays,
}

/// Computes the next instant a reminder becomes due, or `None` when there is
/// no future occurrence. Pure and deterministic given its inputs; every call
/// site (creation, edits, the advance after a fire) goes through here.
pub fn next_fire_at(
    schedule: &ReminderSchedule,
    last_fired_at: Option<DateTime<Utc>>,
    timezone: Tz,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, TriggerError> {
    match schedule {
        ReminderSchedule::OneTime { scheduled_at } => {
            // Whether a past instant still fires is the scanner's call.
            Ok((*scheduled_at > now).then_some(*scheduled_at))
        }
        ReminderSchedule::Recurring { unit, value } => {
            if *value == 0 {
                return Err(TriggerError::ZeroInterval);
            }
            let delta = match unit {
                IntervalUnit::Hours => TimeDelta::hours(i64::from(*value)),
                IntervalUnit::Days => TimeDelta::days(i64::from(*value)),
            };
            // Anchored to the previous fire so polling delay never drifts
            // the cadence.
            Ok(Some(last_fired_at.unwrap_or(now) + delta))
        }
        ReminderSchedule::Weekly { weekdays, fire_at } => {
            if weekdays.is_empty() {
                return Err(TriggerError::EmptyWeekdays);
            }
            Ok(Some(next_local_occurrence(
                timezone,
                now,
                *fire_at.time(),
                Some(weekdays),
            )))
        }
        ReminderSchedule::Daily { fire_at } => Ok(Some(next_local_occurrence(
            timezone,
            now,
            *fire_at.time(),
            None,
        ))),
    }
}

fn next_local_occurrence(
    tz: Tz,
    now: DateTime<Utc>,
    fire_at: NaiveTime,
    weekdays: Option<&WeekdaySet>,
) -> DateTime<Utc> {
    let local_today = now.with_timezone(&tz).date_naive();
    for day_offset in 0..=7 {
        let date = local_today + TimeDelta::days(day_offset);
        if let Some(allowed) = weekdays {
            if !allowed.contains(date.weekday()) {
                continue;
            }
        }
        let Some(candidate) = resolve_local(tz, date.and_time(fire_at)) else {
            continue;
        };
        // Strictly after: a candidate equal to `now` belongs to the
        // occurrence being fired, not to the next one.
        if candidate > now {
            return candidate;
        }
    }
    unreachable!("a non-empty weekday set always matches within eight days")
}

/// Deterministic DST resolution: ambiguous local times map to the earliest
/// UTC instant, nonexistent ones are pushed past the gap.
fn resolve_local(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(instant) => Some(instant.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => tz
            .from_local_datetime(&(local + TimeDelta::hours(1)))
            .earliest()
            .map(|instant| instant.with_timezone(&Utc)),
    }
}
