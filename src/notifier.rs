use async_trait::async_trait;

use stayclose_models::user::UserId;
use stayclose_scheduler::{DeliveryResult, Notification, Notifier};

/// Stand-in transport that writes notifications to the log. A real push
/// transport (FCM, WebPush) plugs in behind the same trait.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, user_id: UserId, notification: &Notification) -> DeliveryResult {
        log::info!(
            "[user {user_id}] {}: {} {:?}",
            notification.title,
            notification.body,
            notification.metadata
        );
        DeliveryResult::Delivered
    }
}
