mod model;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use stayclose_models::{
    reminder::{Reminder, ReminderId, TriggerState},
    user::UserId,
};

use crate::{NewReminder, ReminderStore};
use model::StoredReminder;

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("reminder {0} does not exist")]
    NotFound(ReminderId),
}

struct Inner {
    next_id: ReminderId,
    records: HashMap<ReminderId, StoredReminder>,
}

pub struct InMemoryReminderStore {
    inner: RwLock<Inner>,
}

impl InMemoryReminderStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                records: HashMap::new(),
            }),
        }
    }

    fn collect_due(
        inner: &Inner,
        user_id: Option<UserId>,
        now: DateTime<Utc>,
        tolerance: TimeDelta,
    ) -> Vec<Reminder> {
        let mut due: Vec<Reminder> = inner
            .records
            .values()
            .filter(|record| user_id.is_none_or(|user| record.user_id == user))
            .map(Reminder::from)
            .filter(|reminder| reminder.is_due(now, tolerance))
            .collect();
        due.sort_by_key(|reminder| reminder.id);
        due
    }
}

impl Default for InMemoryReminderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReminderStore for InMemoryReminderStore {
    type Error = MemoryStoreError;

    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, Self::Error> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&id).map(Reminder::from))
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        tolerance: TimeDelta,
    ) -> Result<Vec<Reminder>, Self::Error> {
        let inner = self.inner.read().await;
        Ok(Self::collect_due(&inner, None, now, tolerance))
    }

    async fn list_due_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        tolerance: TimeDelta,
    ) -> Result<Vec<Reminder>, Self::Error> {
        let inner = self.inner.read().await;
        Ok(Self::collect_due(&inner, Some(user_id), now, tolerance))
    }

    async fn insert(&self, reminder: NewReminder) -> Result<Reminder, Self::Error> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let stored = StoredReminder::create(id, reminder);
        let created = Reminder::from(&stored);
        inner.records.insert(id, stored);
        Ok(created)
    }

    async fn update(&self, reminder: Reminder) -> Result<Reminder, Self::Error> {
        let mut inner = self.inner.write().await;
        if !inner.records.contains_key(&reminder.id) {
            return Err(MemoryStoreError::NotFound(reminder.id));
        }

        let stored = StoredReminder::from(&reminder);
        let updated = Reminder::from(&stored);
        inner.records.insert(reminder.id, stored);
        Ok(updated)
    }

    async fn try_claim_and_advance(
        &self,
        id: ReminderId,
        expected: &TriggerState,
        next: &TriggerState,
    ) -> Result<bool, Self::Error> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.records.get_mut(&id) else {
            return Ok(false);
        };
        if record.trigger_state() != *expected {
            return Ok(false);
        }
        record.apply_trigger_state(next);
        Ok(true)
    }
}
