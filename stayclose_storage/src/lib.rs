mod memory;

pub use memory::{InMemoryReminderStore, MemoryStoreError};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use stayclose_models::{
    reminder::{ContactId, Reminder, ReminderId, ReminderSchedule, TriggerState},
    user::UserId,
};

pub struct NewReminder {
    pub user_id: UserId,
    pub contact_id: ContactId,
    pub enabled: bool,
    pub schedule: ReminderSchedule,
    pub timezone: chrono_tz::Tz,
    /// Computed by the caller at validation time, from "no prior fire".
    pub next_fire_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ReminderStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, Self::Error>;

    /// Enabled reminders due at `now` within the tolerance window, system-wide.
    async fn list_due(
        &self,
        now: DateTime<Utc>,
        tolerance: TimeDelta,
    ) -> Result<Vec<Reminder>, Self::Error>;

    /// Same predicate as [`list_due`](Self::list_due), restricted to one user.
    async fn list_due_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        tolerance: TimeDelta,
    ) -> Result<Vec<Reminder>, Self::Error>;

    async fn insert(&self, reminder: NewReminder) -> Result<Reminder, Self::Error>;

    async fn update(&self, reminder: Reminder) -> Result<Reminder, Self::Error>;

    /// Conditional update on the trigger fields: replaces them with `next`
    /// only while they still equal `expected`, as one atomic step. `false`
    /// means another caller already claimed this occurrence.
    async fn try_claim_and_advance(
        &self,
        id: ReminderId,
        expected: &TriggerState,
        next: &TriggerState,
    ) -> Result<bool, Self::Error>;
}
