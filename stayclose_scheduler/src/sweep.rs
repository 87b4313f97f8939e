use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use stayclose_storage::ReminderStore;

use crate::service::TriggerService;

/// The periodic sweep as an owned background task with explicit start/stop.
/// Iterations never overlap: a tick that lands while the previous pass is
/// still in flight is delayed, not run concurrently.
pub struct SweepTask {
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl SweepTask {
    pub fn start<S>(service: Arc<TriggerService<S>>, cadence: Duration) -> Self
    where
        S: ReminderStore + 'static,
    {
        let cancellation_token = CancellationToken::new();
        let task_token = cancellation_token.child_token();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        log::info!("Reminder sweep shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        match service.run_sweep_iteration(Utc::now()).await {
                            Ok(0) => {}
                            Ok(fired) => log::info!("Sweep fired {fired} reminders"),
                            Err(error) => log::error!("Sweep iteration abandoned: {error:#}"),
                        }
                    }
                }
            }
        });

        Self {
            task,
            cancellation_token,
        }
    }

    pub async fn stop(self) {
        self.cancellation_token.cancel();
        let _ = self.task.await;
    }
}
