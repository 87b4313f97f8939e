use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use stayclose_models::reminder::{Reminder, ReminderSchedule, TriggerState};
use stayclose_storage::ReminderStore;

use crate::delivery::{DeliveryResult, Notification, Notifier};
use crate::trigger;

#[derive(Debug)]
pub enum FireOutcome {
    /// This caller won the claim; the reminder carries its advanced state.
    Fired(Reminder),
    /// A concurrent caller owns this occurrence.
    Skipped,
}

/// Drives one due reminder through `Due -> Claiming -> {Fired, Skipped}`.
pub struct FireCoordinator<S> {
    store: Arc<S>,
    notifier: Arc<dyn Notifier>,
}

impl<S: ReminderStore> FireCoordinator<S> {
    pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Claims the occurrence and the state advance as one conditional update,
    /// then notifies. Claim-then-notify: delivery latency never sits inside
    /// the claim transaction.
    pub async fn fire(
        &self,
        reminder: Reminder,
        now: DateTime<Utc>,
    ) -> anyhow::Result<FireOutcome> {
        let expected = reminder.trigger_state();
        let advanced = advanced_state(&reminder, now);

        let claimed = self
            .store
            .try_claim_and_advance(reminder.id, &expected, &advanced)
            .await?;
        if !claimed {
            log::debug!(
                "Reminder {} was already claimed by a concurrent caller",
                reminder.id
            );
            return Ok(FireOutcome::Skipped);
        }

        let notification = build_notification(&reminder);
        if let DeliveryResult::Failed(reason) =
            self.notifier.send(reminder.user_id, &notification).await
        {
            // The occurrence is decided either way.
            log::warn!("Delivery failed for reminder {}: {}", reminder.id, reason);
        }

        let mut fired = reminder;
        fired.apply_trigger_state(&advanced);
        Ok(FireOutcome::Fired(fired))
    }
}

fn advanced_state(reminder: &Reminder, now: DateTime<Utc>) -> TriggerState {
    match reminder.schedule {
        ReminderSchedule::OneTime { .. } => TriggerState {
            last_fired_at: Some(now),
            next_fire_at: None,
            one_time_fired: true,
        },
        _ => {
            // The tolerance window lets a claim land shortly before the
            // occurrence instant. Advance from the later of the two, or the
            // calculator would re-yield the instant we just claimed.
            let fired_at = match reminder.next_fire_at {
                Some(occurrence) => now.max(occurrence),
                None => now,
            };
            let next = match trigger::next_fire_at(
                &reminder.schedule,
                Some(fired_at),
                reminder.timezone,
                fired_at,
            ) {
                Ok(next) => next,
                Err(error) => {
                    // Validation should have caught this at write time;
                    // park the reminder instead of re-firing it every
                    // sweep.
                    log::error!(
                        "Reminder {} has invalid parameters: {}",
                        reminder.id,
                        error
                    );
                    None
                }
            };
            TriggerState {
                last_fired_at: Some(fired_at),
                next_fire_at: next,
                one_time_fired: false,
            }
        }
    }
}

fn build_notification(reminder: &Reminder) -> Notification {
    let metadata = HashMap::from([
        ("reminder_id".to_owned(), reminder.id.to_string()),
        ("contact_id".to_owned(), reminder.contact_id.to_string()),
    ]);
    Notification {
        title: "Time to reach out 💌".to_owned(),
        body: format!(
            "It's time to send a message to your contact ({})",
            reminder.schedule
        ),
        metadata,
    }
}
