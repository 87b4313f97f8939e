use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

use crate::reminder::{
    ContactId, IntervalUnit, InvalidWeekday, ReminderFireTime, ReminderSchedule, WeekdaySet,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReminderValidationError {
    #[error("unknown reminder kind `{0}`")]
    UnknownKind(String),
    #[error("`{0}` is required for this reminder kind")]
    MissingField(&'static str),
    #[error("interval value must be at least 1")]
    ZeroInterval,
    #[error("unknown interval unit `{0}` (expected `hours` or `days`)")]
    UnknownUnit(String),
    #[error("weekly reminders need at least one weekday")]
    EmptyWeekdays,
    #[error(transparent)]
    InvalidWeekday(#[from] InvalidWeekday),
    #[error("`{0}` is not a valid HH:MM time")]
    InvalidTime(String),
    #[error("`{0}` is not a known IANA timezone")]
    UnknownTimezone(String),
}

/// A reminder definition as accepted from the CRUD surface, before any
/// validation. Invalid combinations are rejected here so nothing the
/// calculator cannot evaluate ever reaches the store.
#[derive(Debug, Clone, Deserialize)]
pub struct ReminderDraft {
    pub contact_id: ContactId,
    pub kind: String,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub value: Option<u32>,
    #[serde(default)]
    pub weekdays: Option<Vec<u8>>,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl ReminderDraft {
    pub fn validate(&self) -> Result<(ReminderSchedule, Tz), ReminderValidationError> {
        let schedule = match self.kind.as_str() {
            "one_time" => ReminderSchedule::OneTime {
                scheduled_at: self
                    .scheduled_at
                    .ok_or(ReminderValidationError::MissingField("scheduled_at"))?,
            },
            "recurring" => {
                let unit = self
                    .unit
                    .as_deref()
                    .ok_or(ReminderValidationError::MissingField("unit"))?;
                let unit = match unit {
                    "hours" => IntervalUnit::Hours,
                    "days" => IntervalUnit::Days,
                    other => {
                        return Err(ReminderValidationError::UnknownUnit(other.to_owned()));
                    }
                };
                let value = self
                    .value
                    .ok_or(ReminderValidationError::MissingField("value"))?;
                if value == 0 {
                    return Err(ReminderValidationError::ZeroInterval);
                }
                ReminderSchedule::Recurring { unit, value }
            }
            "weekly" => {
                let indices = self
                    .weekdays
                    .as_deref()
                    .ok_or(ReminderValidationError::MissingField("weekdays"))?;
                let weekdays = WeekdaySet::from_indices(indices)?;
                if weekdays.is_empty() {
                    return Err(ReminderValidationError::EmptyWeekdays);
                }
                ReminderSchedule::Weekly {
                    weekdays,
                    fire_at: self.parse_time_of_day()?,
                }
            }
            "daily" => ReminderSchedule::Daily {
                fire_at: self.parse_time_of_day()?,
            },
            other => return Err(ReminderValidationError::UnknownKind(other.to_owned())),
        };

        let timezone = match schedule {
            // Local-time kinds cannot be evaluated without a zone.
            ReminderSchedule::Weekly { .. } | ReminderSchedule::Daily { .. } => {
                let name = self
                    .timezone
                    .as_deref()
                    .ok_or(ReminderValidationError::MissingField("timezone"))?;
                parse_timezone(name)?
            }
            // Absolute-delta kinds ignore the zone entirely.
            _ => match self.timezone.as_deref() {
                Some(name) => parse_timezone(name)?,
                None => Tz::UTC,
            },
        };

        Ok((schedule, timezone))
    }

    fn parse_time_of_day(&self) -> Result<ReminderFireTime, ReminderValidationError> {
        let raw = self
            .time_of_day
            .as_deref()
            .ok_or(ReminderValidationError::MissingField("time_of_day"))?;
        NaiveTime::parse_from_str(raw, "%H:%M")
            .map(ReminderFireTime::new)
            .map_err(|_| ReminderValidationError::InvalidTime(raw.to_owned()))
    }
}

fn parse_timezone(name: &str) -> Result<Tz, ReminderValidationError> {
    name.parse()
        .map_err(|_| ReminderValidationError::UnknownTimezone(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(kind: &str) -> ReminderDraft {
        ReminderDraft {
            contact_id: 7,
            kind: kind.to_owned(),
            scheduled_at: None,
            unit: None,
            value: None,
            weekdays: None,
            time_of_day: None,
            timezone: None,
            enabled: true,
        }
    }

    #[test]
    fn one_time_requires_scheduled_at() {
        assert_eq!(
            draft("one_time").validate(),
            Err(ReminderValidationError::MissingField("scheduled_at"))
        );
    }

    #[test]
    fn recurring_rejects_zero_interval() {
        let mut d = draft("recurring");
        d.unit = Some("hours".to_owned());
        d.value = Some(0);
        assert_eq!(d.validate(), Err(ReminderValidationError::ZeroInterval));
    }

    #[test]
    fn recurring_rejects_unknown_unit() {
        let mut d = draft("recurring");
        d.unit = Some("weeks".to_owned());
        d.value = Some(2);
        assert_eq!(
            d.validate(),
            Err(ReminderValidationError::UnknownUnit("weeks".to_owned()))
        );
    }

    #[test]
    fn weekly_rejects_empty_weekday_set() {
        let mut d = draft("weekly");
        d.weekdays = Some(vec![]);
        d.time_of_day = Some("18:00".to_owned());
        d.timezone = Some("Asia/Jerusalem".to_owned());
        assert_eq!(d.validate(), Err(ReminderValidationError::EmptyWeekdays));
    }

    #[test]
    fn daily_requires_timezone() {
        let mut d = draft("daily");
        d.time_of_day = Some("09:00".to_owned());
        assert_eq!(
            d.validate(),
            Err(ReminderValidationError::MissingField("timezone"))
        );
    }

    #[test]
    fn daily_rejects_malformed_time() {
        let mut d = draft("daily");
        d.time_of_day = Some("9 o'clock".to_owned());
        d.timezone = Some("Asia/Jerusalem".to_owned());
        assert_eq!(
            d.validate(),
            Err(ReminderValidationError::InvalidTime("9 o'clock".to_owned()))
        );
    }

    #[test]
    fn unknown_timezone_is_rejected_not_coerced() {
        let mut d = draft("daily");
        d.time_of_day = Some("09:00".to_owned());
        d.timezone = Some("Mars/Olympus_Mons".to_owned());
        assert_eq!(
            d.validate(),
            Err(ReminderValidationError::UnknownTimezone(
                "Mars/Olympus_Mons".to_owned()
            ))
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(
            draft("biweekly").validate(),
            Err(ReminderValidationError::UnknownKind("biweekly".to_owned()))
        );
    }

    #[test]
    fn valid_weekly_draft_produces_schedule_and_zone() {
        let mut d = draft("weekly");
        d.weekdays = Some(vec![1, 4]);
        d.time_of_day = Some("18:00".to_owned());
        d.timezone = Some("Asia/Jerusalem".to_owned());

        let (schedule, tz) = d.validate().unwrap();
        assert_eq!(tz, chrono_tz::Asia::Jerusalem);
        match schedule {
            ReminderSchedule::Weekly { weekdays, fire_at } => {
                assert!(weekdays.contains(chrono::Weekday::Mon));
                assert!(weekdays.contains(chrono::Weekday::Thu));
                assert_eq!(
                    *fire_at.time(),
                    NaiveTime::from_hms_opt(18, 0, 0).unwrap()
                );
            }
            other => panic!("expected weekly schedule, got {other:?}"),
        }
    }

    #[test]
    fn recurring_defaults_to_utc_zone() {
        let mut d = draft("recurring");
        d.unit = Some("days".to_owned());
        d.value = Some(3);
        let (_, tz) = d.validate().unwrap();
        assert_eq!(tz, Tz::UTC);
    }
}
