use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use stayclose_models::{
    reminder::{ContactId, Reminder, ReminderId, ReminderSchedule, TriggerState},
    user::UserId,
};

use crate::NewReminder;

/// Stored shape of a reminder. The zone is kept as the raw IANA string it was
/// written with and parsed on the way out, so one historically bad row cannot
/// stop a sweep from processing the rest.
#[derive(Debug, Clone)]
pub(crate) struct StoredReminder {
    pub id: ReminderId,
    pub user_id: UserId,
    pub contact_id: ContactId,
    pub enabled: bool,
    pub schedule: ReminderSchedule,
    pub timezone: String,
    pub last_fired_at: Option<DateTime<Utc>>,
    pub next_fire_at: Option<DateTime<Utc>>,
    pub one_time_fired: bool,
}

impl StoredReminder {
    pub fn create(id: ReminderId, new: NewReminder) -> Self {
        Self {
            id,
            user_id: new.user_id,
            contact_id: new.contact_id,
            enabled: new.enabled,
            schedule: new.schedule,
            timezone: new.timezone.name().to_owned(),
            last_fired_at: None,
            next_fire_at: new.next_fire_at,
            one_time_fired: false,
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

impl From<&StoredReminder> for Reminder {
    fn from(value: &StoredReminder) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            contact_id: value.contact_id,
            enabled: value.enabled,
            schedule: value.schedule.clone(),
            timezone: parse_timezone(&value.timezone),
            last_fired_at: value.last_fired_at,
            next_fire_at: value.next_fire_at,
            one_time_fired: value.one_time_fired,
        }
    }
}

impl From<&Reminder> for StoredReminder {
    fn from(value: &Reminder) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            contact_id: value.contact_id,
            enabled: value.enabled,
            schedule: value.schedule.clone(),
            timezone: value.timezone.name().to_owned(),
            last_fired_at: value.last_fired_at,
            next_fire_at: value.next_fire_at,
            one_time_fired: value.one_time_fired,
        }
    }
}

pub(crate) fn parse_timezone(name: &str) -> Tz {
    name.parse().unwrap_or_else(|_| {
        log::warn!("Unknown timezone {name}, falling back to UTC");
        Tz::UTC
    })
}
