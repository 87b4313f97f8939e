use std::sync::OnceLock;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct SchedulerSettings {
    /// Cadence of the background sweep, in seconds.
    pub sweep_interval_seconds: u64,
    /// Tolerance window applied to the due-predicate, in seconds.
    pub tolerance_seconds: i64,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub scheduler: SchedulerSettings,
}

impl AppSettings {
    fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("scheduler.sweep_interval_seconds", 60i64)?
            .set_default("scheduler.tolerance_seconds", 60i64)?
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP"))
            .build()?;

        settings.try_deserialize()
    }
}

pub fn get() -> &'static AppSettings {
    static APPSETTINGS: OnceLock<AppSettings> = OnceLock::new();
    APPSETTINGS.get_or_init(|| AppSettings::new().unwrap())
}
