use std::fmt;

use chrono::{DateTime, TimeDelta, Timelike, Utc, Weekday};
use thiserror::Error;

use crate::user::UserId;

pub type ReminderId = i64;
pub type ContactId = i64;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IntervalUnit {
    Hours,
    Days,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("weekday index {0} is out of range (expected 0-6, 0 = Sunday)")]
pub struct InvalidWeekday(pub u8);

/// Set of weekdays a weekly reminder fires on. Indices follow the client
/// convention: 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn from_indices(indices: &[u8]) -> Result<Self, InvalidWeekday> {
        let mut bits = 0u8;
        for &index in indices {
            if index > 6 {
                return Err(InvalidWeekday(index));
            }
            bits |= 1 << index;
        }
        Ok(Self(bits))
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.num_days_from_sunday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn indices(&self) -> impl Iterator<Item = u8> + '_ {
        (0u8..7).filter(|i| self.0 & (1 << i) != 0)
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        let mut first = true;
        for index in self.indices() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", NAMES[index as usize])?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderFireTime(chrono::NaiveTime);

impl ReminderFireTime {
    pub fn new(inner: chrono::NaiveTime) -> Self {
        let normalized_time = inner.with_nanosecond(0).expect("Will never fail.");
        Self(normalized_time)
    }

    pub fn time(&self) -> &chrono::NaiveTime {
        &self.0
    }

    pub fn into_time(self) -> chrono::NaiveTime {
        self.0
    }
}

/// Recurrence description. Exactly one variant per reminder; adding a kind is
/// a compile-time-checked change in every match over this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderSchedule {
    OneTime {
        scheduled_at: DateTime<Utc>,
    },
    Recurring {
        unit: IntervalUnit,
        value: u32,
    },
    Weekly {
        weekdays: WeekdaySet,
        fire_at: ReminderFireTime,
    },
    Daily {
        fire_at: ReminderFireTime,
    },
}

impl fmt::Display for ReminderSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneTime { scheduled_at } => {
                write!(f, "on {}", scheduled_at.format("%Y-%m-%d %H:%M UTC"))
            }
            Self::Recurring { unit, value } => match (unit, value) {
                (IntervalUnit::Hours, 1) => write!(f, "every hour"),
                (IntervalUnit::Hours, n) => write!(f, "every {n} hours"),
                (IntervalUnit::Days, 1) => write!(f, "every day"),
                (IntervalUnit::Days, n) => write!(f, "every {n} days"),
            },
            Self::Weekly { weekdays, fire_at } => {
                write!(f, "{} at {}", weekdays, fire_at.time().format("%H:%M"))
            }
            Self::Daily { fire_at } => {
                write!(f, "every day at {}", fire_at.time().format("%H:%M"))
            }
        }
    }
}

/// The mutable trigger fields of a reminder, grouped so a claim can compare
/// and replace them as one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerState {
    pub last_fired_at: Option<DateTime<Utc>>,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub one_time_fired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: ReminderId,
    pub user_id: UserId,
    pub contact_id: ContactId,
    pub enabled: bool,
    pub schedule: ReminderSchedule,
    pub timezone: chrono_tz::Tz,
    pub last_fired_at: Option<DateTime<Utc>>,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub one_time_fired: bool,
}

impl Reminder {
    /// The shared due-predicate. Both the system-wide sweep and the per-user
    /// on-demand check must go through this, with the same tolerance window.
    pub fn is_due(&self, now: DateTime<Utc>, tolerance: TimeDelta) -> bool {
        if !self.enabled {
            return false;
        }
        let horizon = now + tolerance;
        match &self.schedule {
            ReminderSchedule::OneTime { scheduled_at } => {
                !self.one_time_fired && *scheduled_at <= horizon
            }
            _ => matches!(self.next_fire_at, Some(t) if t <= horizon),
        }
    }

    pub fn trigger_state(&self) -> TriggerState {
        TriggerState {
            last_fired_at: self.last_fired_at,
            next_fire_at: self.next_fire_at,
            one_time_fired: self.one_time_fired,
        }
    }

    pub fn apply_trigger_state(&mut self, state: &TriggerState) {
        self.last_fired_at = state.last_fired_at;
        self.next_fire_at = state.next_fire_at;
        self.one_time_fired = state.one_time_fired;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn reminder(schedule: ReminderSchedule) -> Reminder {
        Reminder {
            id: 1,
            user_id: 10,
            contact_id: 20,
            enabled: true,
            schedule,
            timezone: chrono_tz::UTC,
            last_fired_at: None,
            next_fire_at: None,
            one_time_fired: false,
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn weekday_set_rejects_out_of_range_index() {
        assert_eq!(WeekdaySet::from_indices(&[1, 7]), Err(InvalidWeekday(7)));
    }

    #[test]
    fn weekday_set_contains_uses_sunday_based_indices() {
        let set = WeekdaySet::from_indices(&[0, 4]).unwrap();
        assert!(set.contains(Weekday::Sun));
        assert!(set.contains(Weekday::Thu));
        assert!(!set.contains(Weekday::Mon));
        assert_eq!(set.to_string(), "Sun, Thu");
    }

    #[test]
    fn disabled_reminder_is_never_due() {
        let mut r = reminder(ReminderSchedule::Daily {
            fire_at: ReminderFireTime::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
        });
        r.next_fire_at = Some(at("2025-06-10T06:00:00Z"));
        r.enabled = false;
        assert!(!r.is_due(at("2025-06-10T07:00:00Z"), TimeDelta::seconds(60)));
    }

    #[test]
    fn due_predicate_honors_tolerance_window() {
        let mut r = reminder(ReminderSchedule::Daily {
            fire_at: ReminderFireTime::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
        });
        r.next_fire_at = Some(at("2025-06-10T06:00:30Z"));
        let tolerance = TimeDelta::seconds(60);
        assert!(r.is_due(at("2025-06-10T06:00:00Z"), tolerance));

        r.next_fire_at = Some(at("2025-06-10T06:01:30Z"));
        assert!(!r.is_due(at("2025-06-10T06:00:00Z"), tolerance));
    }

    #[test]
    fn fired_one_time_is_not_due_regardless_of_schedule() {
        let mut r = reminder(ReminderSchedule::OneTime {
            scheduled_at: at("2025-06-10T06:00:00Z"),
        });
        assert!(r.is_due(at("2025-06-10T06:05:00Z"), TimeDelta::seconds(60)));
        r.one_time_fired = true;
        r.next_fire_at = None;
        assert!(!r.is_due(at("2025-06-10T06:05:00Z"), TimeDelta::seconds(60)));
    }

    #[test]
    fn stale_unclaimed_occurrence_is_still_due() {
        let mut r = reminder(ReminderSchedule::Recurring {
            unit: IntervalUnit::Hours,
            value: 6,
        });
        r.next_fire_at = Some(at("2025-06-01T00:00:00Z"));
        assert!(r.is_due(at("2025-06-10T06:00:00Z"), TimeDelta::seconds(60)));
    }

    #[test]
    fn schedule_text_describes_cadence() {
        let weekly = ReminderSchedule::Weekly {
            weekdays: WeekdaySet::from_indices(&[1, 4]).unwrap(),
            fire_at: ReminderFireTime::new(NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
        };
        assert_eq!(weekly.to_string(), "Mon, Thu at 18:00");

        let recurring = ReminderSchedule::Recurring {
            unit: IntervalUnit::Hours,
            value: 6,
        };
        assert_eq!(recurring.to_string(), "every 6 hours");

        let hourly = ReminderSchedule::Recurring {
            unit: IntervalUnit::Hours,
            value: 1,
        };
        assert_eq!(hourly.to_string(), "every hour");
    }
}
