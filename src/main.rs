mod appsettings;
mod notifier;

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;

use stayclose_scheduler::{SweepTask, TriggerService};
use stayclose_storage::InMemoryReminderStore;

use crate::notifier::LogNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init_timed();

    let settings = appsettings::get();
    let store = Arc::new(InMemoryReminderStore::new());
    let service = Arc::new(TriggerService::new(
        store,
        Arc::new(LogNotifier),
        TimeDelta::seconds(settings.scheduler.tolerance_seconds),
    ));

    let sweep = SweepTask::start(
        Arc::clone(&service),
        Duration::from_secs(settings.scheduler.sweep_interval_seconds),
    );
    log::info!(
        "Reminder sweep running every {}s (tolerance {}s)",
        settings.scheduler.sweep_interval_seconds,
        settings.scheduler.tolerance_seconds
    );

    tokio::signal::ctrl_c().await?;
    sweep.stop().await;
    Ok(())
}
