pub mod coordinator;
pub mod delivery;
pub mod scanner;
pub mod service;
pub mod sweep;
pub mod trigger;

pub use coordinator::{FireCoordinator, FireOutcome};
pub use delivery::{DeliveryResult, Notification, Notifier};
pub use scanner::TriggerScanner;
pub use service::TriggerService;
pub use sweep::SweepTask;
pub use trigger::TriggerError;
