use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use stayclose_models::{
    draft::ReminderDraft,
    reminder::{Reminder, ReminderId},
    user::UserId,
};
use stayclose_storage::{NewReminder, ReminderStore};

use crate::coordinator::{FireCoordinator, FireOutcome};
use crate::delivery::Notifier;
use crate::scanner::TriggerScanner;
use crate::trigger;

/// Front door of the trigger engine: both due-detection entry points (the
/// periodic sweep, the on-demand check) and the write-time validation
/// boundary, all funneled through one claim path.
pub struct TriggerService<S> {
    scanner: TriggerScanner<S>,
    coordinator: FireCoordinator<S>,
    store: Arc<S>,
}

impl<S: ReminderStore> TriggerService<S> {
    pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>, tolerance: TimeDelta) -> Self {
        Self {
            scanner: TriggerScanner::new(Arc::clone(&store), tolerance),
            coordinator: FireCoordinator::new(Arc::clone(&store), notifier),
            store,
        }
    }

    /// One sweep pass over every enabled reminder. Returns the number of
    /// occurrences this pass decided. A store failure on the read abandons
    /// the whole pass; nothing was claimed yet, so the next tick retries the
    /// same due reminders safely.
    pub async fn run_sweep_iteration(&self, now: DateTime<Utc>) -> anyhow::Result<usize> {
        let due = self.scanner.due(now).await?;
        let mut fired = 0;
        for reminder in due {
            let id = reminder.id;
            match self.coordinator.fire(reminder, now).await {
                Ok(FireOutcome::Fired(_)) => fired += 1,
                Ok(FireOutcome::Skipped) => {}
                // One bad reminder must not stop the sweep.
                Err(error) => log::error!("Failed to fire reminder {id}: {error:#}"),
            }
        }
        Ok(fired)
    }

    /// On-demand check over one user's reminders, invoked from a client
    /// request. Safe to race with an in-flight sweep and with other checks
    /// for the same user; the claim decides ownership. Returns the reminders
    /// this call actually claimed, with their advanced state.
    pub async fn check_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Reminder>> {
        let due = self.scanner.due_for_user(user_id, now).await?;
        let mut fired = Vec::new();
        for reminder in due {
            if let FireOutcome::Fired(reminder) = self.coordinator.fire(reminder, now).await? {
                fired.push(reminder);
            }
        }
        Ok(fired)
    }

    /// Write-time boundary: validates the draft and stores the reminder with
    /// its first occurrence computed from "no prior fire". Invalid drafts
    /// never reach the store.
    pub async fn create_reminder(
        &self,
        user_id: UserId,
        draft: &ReminderDraft,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Reminder> {
        let (schedule, timezone) = draft.validate()?;
        let next_fire_at = trigger::next_fire_at(&schedule, None, timezone, now)?;
        let created = self
            .store
            .insert(NewReminder {
                user_id,
                contact_id: draft.contact_id,
                enabled: draft.enabled,
                schedule,
                timezone,
                next_fire_at,
            })
            .await?;
        Ok(created)
    }

    /// User edits recompute the next occurrence from scratch, carrying over
    /// `last_fired_at`. An edited one-shot is re-armed.
    pub async fn update_reminder(
        &self,
        id: ReminderId,
        draft: &ReminderDraft,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Reminder> {
        let existing = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("no reminder with id {id}"))?;
        let (schedule, timezone) = draft.validate()?;
        let next_fire_at = trigger::next_fire_at(&schedule, existing.last_fired_at, timezone, now)?;
        let updated = self
            .store
            .update(Reminder {
                id,
                user_id: existing.user_id,
                contact_id: draft.contact_id,
                enabled: draft.enabled,
                schedule,
                timezone,
                last_fired_at: existing.last_fired_at,
                next_fire_at,
                one_time_fired: false,
            })
            .await?;
        Ok(updated)
    }
}
