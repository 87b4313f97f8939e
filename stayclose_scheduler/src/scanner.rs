use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use stayclose_models::{reminder::Reminder, user::UserId};
use stayclose_storage::ReminderStore;

/// Due-detection over the store. The periodic sweep and the on-demand check
/// share one instance, so the predicate and the tolerance window cannot
/// drift apart between the two entry points.
pub struct TriggerScanner<S> {
    store: Arc<S>,
    tolerance: TimeDelta,
}

impl<S: ReminderStore> TriggerScanner<S> {
    pub fn new(store: Arc<S>, tolerance: TimeDelta) -> Self {
        Self { store, tolerance }
    }

    /// Every enabled reminder due at `now`, system-wide (the sweep path).
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, S::Error> {
        self.store.list_due(now, self.tolerance).await
    }

    /// One user's due reminders (the client-polling path).
    pub async fn due_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, S::Error> {
        self.store.list_due_for_user(user_id, now, self.tolerance).await
    }
}
